//! Hashing and signature checking operations for the script interpreter.

use bu_primitives::hash::{hash160, ripemd160, sha1, sha256, sha256d};

use crate::opcodes::*;
use crate::Script;

use super::bitfield::decode_bitfield;
use super::config::MAX_PUBKEYS_PER_MULTISIG;
use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::machine::ScriptMachine;
use super::sighashtype::SigHashType;
use super::sigencoding::{
    check_data_signature_encoding, check_ecdsa_signature_encoding, check_pubkey_encoding,
    check_schnorr_signature_encoding, check_signature_encoding,
};

/// Remove every push of `sig` from `script_code`.
fn delete_signature(script_code: &mut Script, sig: &[u8]) {
    // Stack elements never exceed the push size limit, so this always builds.
    if let Ok(pattern) = Script::from_push(sig) {
        script_code.find_and_delete(&pattern);
    }
}

impl<'a> ScriptMachine<'a> {
    pub(crate) fn op_hash(&mut self, op: u8) -> Result<(), InterpreterError> {
        let buf = self.stack.pop()?;
        let digest = match op {
            OP_RIPEMD160 => ripemd160(&buf).to_vec(),
            OP_SHA1 => sha1(&buf).to_vec(),
            OP_SHA256 => sha256(&buf).to_vec(),
            OP_HASH160 => hash160(&buf).to_vec(),
            OP_HASH256 => sha256d(&buf).to_vec(),
            _ => return Err(ScriptErrorCode::BadOpcode.into()),
        };
        self.stack.push(digest);
        Ok(())
    }

    /// The part of the current script after the last executed OP_CODESEPARATOR.
    pub(crate) fn script_code(&self) -> Script {
        self.script.tail(self.begin_code_hash)
    }

    /// Multisig variant of the signature removal: FORKID signatures under
    /// the FORKID flag leave the script code untouched.
    fn cleanup_script_code(&self, script_code: &mut Script, sig: &[u8]) {
        if self.has_flag(ScriptFlags::SIGHASH_FORKID) && SigHashType::from_sig(sig).has_forkid() {
            return;
        }
        delete_signature(script_code, sig);
    }

    fn check_null_fail(&self, success: bool, sig: &[u8]) -> Result<(), InterpreterError> {
        if !success && !sig.is_empty() && self.has_flag(ScriptFlags::NULLFAIL) {
            return Err(InterpreterError::new(
                ScriptErrorCode::SigNullFail,
                "signature not empty on failed checksig".to_string(),
            ));
        }
        Ok(())
    }

    /// OP_CHECKSIG / OP_CHECKSIGVERIFY: (sig pubkey -- bool)
    pub(crate) fn op_checksig(&mut self, verify: bool) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let sig = self.stack.peek(1)?.to_vec();
        let pubkey = self.stack.peek(0)?.to_vec();

        self.sighashtype |= sig.last().copied().unwrap_or(0);

        // A signature can never sign itself.
        let mut script_code = self.script_code();
        delete_signature(&mut script_code, &sig);

        if !sig.is_empty() {
            self.stats.sig_check_count += 1;
        }

        check_signature_encoding(&sig, self.flags)?;
        check_pubkey_encoding(&pubkey, self.flags)?;

        let success = !sig.is_empty() && self.checker.check_sig(&sig, &pubkey, &script_code);
        self.check_null_fail(success, &sig)?;

        self.stack.drop_n(2)?;
        self.stack.push_bool(success);
        if verify {
            self.abstract_verify(ScriptErrorCode::CheckSigVerify)?;
        }
        Ok(())
    }

    /// OP_CHECKMULTISIG / OP_CHECKMULTISIGVERIFY:
    /// (dummy [sig ...] num_of_signatures [pubkey ...] num_of_pubkeys -- bool)
    pub(crate) fn op_checkmultisig(&mut self, verify: bool) -> Result<(), InterpreterError> {
        let idx_key_count = 1;
        self.stack.require(idx_key_count)?;

        let n_keys = self.num_at(idx_key_count - 1)?.to_i32();
        if n_keys < 0 || n_keys as usize > MAX_PUBKEYS_PER_MULTISIG {
            return Err(InterpreterError::new(
                ScriptErrorCode::PubkeyCount,
                format!("number of pubkeys {} is out of range", n_keys),
            ));
        }
        let n_keys = n_keys as usize;
        self.add_op_count(n_keys)?;

        let idx_top_key = idx_key_count + 1;
        let idx_sig_count = idx_top_key + n_keys;
        self.stack.require(idx_sig_count)?;

        let n_sigs = self.num_at(idx_sig_count - 1)?.to_i32();
        if n_sigs < 0 || n_sigs as usize > n_keys {
            return Err(InterpreterError::new(
                ScriptErrorCode::SigCount,
                format!("number of signatures {} is out of range for {} keys", n_sigs, n_keys),
            ));
        }
        let n_sigs = n_sigs as usize;

        let idx_top_sig = idx_sig_count + 1;
        let idx_dummy = idx_top_sig + n_sigs;
        self.stack.require(idx_dummy)?;

        let script_code = self.script_code();
        let dummy = self.stack.peek(idx_dummy - 1)?.to_vec();

        let success = if self.has_flag(ScriptFlags::SCHNORR_MULTISIG) && !dummy.is_empty() {
            self.schnorr_multisig(&dummy, n_keys, n_sigs, idx_top_key, idx_top_sig, &script_code)?
        } else {
            let success =
                self.legacy_multisig(n_keys, n_sigs, idx_top_key, idx_top_sig, script_code)?;
            if self.has_flag(ScriptFlags::NULLDUMMY) && !dummy.is_empty() {
                return Err(InterpreterError::new(
                    ScriptErrorCode::SigNullDummy,
                    format!("multisig dummy argument has length {} instead of 0", dummy.len()),
                ));
            }
            success
        };

        self.stack.drop_n(idx_dummy)?;

        if verify {
            if !success {
                return Err(ScriptErrorCode::CheckMultisigVerify.into());
            }
        } else {
            self.stack.push_bool(success);
        }
        Ok(())
    }

    /// Checkbits mode: the dummy selects which keys carry a Schnorr signature.
    /// Every selected signature must verify.
    fn schnorr_multisig(
        &mut self,
        dummy: &[u8],
        n_keys: usize,
        n_sigs: usize,
        idx_top_key: usize,
        idx_top_sig: usize,
        script_code: &Script,
    ) -> Result<bool, InterpreterError> {
        self.stats.sig_check_count += n_sigs;

        let check_bits = decode_bitfield(dummy, n_keys)?;
        if check_bits.count_ones() as usize != n_sigs {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidBitCount,
                format!("bitfield selects {} keys for {} signatures", check_bits.count_ones(), n_sigs),
            ));
        }

        // Signatures and keys are both matched from the bottom up.
        let idx_bottom_key = idx_top_key + n_keys - 1;
        let idx_bottom_sig = idx_top_sig + n_sigs - 1;

        let mut i_key = 0;
        for i_sig in 0..n_sigs {
            while (check_bits >> i_key) & 0x01 == 0 {
                i_key += 1;
            }

            let sig = self.stack.peek(idx_bottom_sig - i_sig - 1)?.to_vec();
            let pubkey = self.stack.peek(idx_bottom_key - i_key - 1)?.to_vec();

            check_schnorr_signature_encoding(&sig, self.flags)?;
            check_pubkey_encoding(&pubkey, self.flags)?;

            if !self.checker.check_sig(&sig, &pubkey, script_code) {
                return Err(InterpreterError::new(
                    ScriptErrorCode::SigNullFail,
                    format!("signature {} failed against key {}", i_sig, i_key),
                ));
            }
            i_key += 1;
        }
        Ok(true)
    }

    /// ECDSA / null mode: signatures must appear in the same order as their keys.
    fn legacy_multisig(
        &mut self,
        n_keys: usize,
        n_sigs: usize,
        idx_top_key: usize,
        idx_top_sig: usize,
        mut script_code: Script,
    ) -> Result<bool, InterpreterError> {
        let sigs = (0..n_sigs)
            .map(|k| self.stack.peek(idx_top_sig - 1 + k).map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;

        let all_null = sigs.iter().all(|s| s.is_empty());
        if !all_null {
            self.stats.sig_check_count += n_keys;
        }

        for sig in &sigs {
            self.cleanup_script_code(&mut script_code, sig);
        }

        let mut success = true;
        let mut sigs_remaining = n_sigs;
        let mut keys_remaining = n_keys;
        while success && sigs_remaining > 0 {
            let sig = &sigs[n_sigs - sigs_remaining];
            let pubkey = self.stack.peek(idx_top_key - 1 + n_keys - keys_remaining)?.to_vec();

            // Encoding is only checked for the pairs actually tried.
            check_ecdsa_signature_encoding(sig, self.flags)?;
            check_pubkey_encoding(&pubkey, self.flags)?;

            if self.checker.check_sig(sig, &pubkey, &script_code) {
                sigs_remaining -= 1;
            }
            keys_remaining -= 1;

            if sigs_remaining > keys_remaining {
                success = false;
            }
        }

        if !success && !all_null && self.has_flag(ScriptFlags::NULLFAIL) {
            return Err(InterpreterError::new(
                ScriptErrorCode::SigNullFail,
                "not all signatures empty on failed checkmultisig".to_string(),
            ));
        }
        Ok(success)
    }

    /// OP_CHECKDATASIG / OP_CHECKDATASIGVERIFY: (sig message pubkey -- bool)
    pub(crate) fn op_checkdatasig(&mut self, verify: bool) -> Result<(), InterpreterError> {
        self.stack.require(3)?;
        let sig = self.stack.peek(2)?.to_vec();
        let message = self.stack.peek(1)?;
        let hash = sha256(message);
        let pubkey = self.stack.peek(0)?.to_vec();

        check_data_signature_encoding(&sig, self.flags)?;
        check_pubkey_encoding(&pubkey, self.flags)?;

        let mut success = false;
        if !sig.is_empty() {
            success = self.checker.verify_signature(&sig, &pubkey, &hash);
            self.stats.sig_check_count += 1;
        }
        self.check_null_fail(success, &sig)?;

        self.stack.drop_n(3)?;
        self.stack.push_bool(success);
        if verify {
            self.abstract_verify(ScriptErrorCode::CheckDataSigVerify)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bu_primitives::ec::PrivateKey;
    use bu_primitives::hash::sha256;

    use crate::interpreter::checker::{NullChecker, SignatureChecker};
    use crate::interpreter::error::ScriptErrorCode;
    use crate::interpreter::flags::ScriptFlags;
    use crate::interpreter::machine::ScriptMachine;
    use crate::interpreter::sighashtype::SigHashType;
    use crate::opcodes::*;
    use crate::Script;

    const HASH: [u8; 32] = [0x5a; 32];

    /// Verifies transaction signatures against a fixed digest and records
    /// the script code each check was given.
    #[derive(Default)]
    struct FixedHashChecker {
        seen: RefCell<Vec<Script>>,
    }

    impl SignatureChecker for FixedHashChecker {
        fn check_sig(&self, sig: &[u8], pubkey: &[u8], script_code: &Script) -> bool {
            self.seen.borrow_mut().push(script_code.clone());
            match sig.split_last() {
                Some((_, body)) => self.verify_signature(body, pubkey, &HASH),
                None => false,
            }
        }
    }

    fn key(n: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[n; 32]).unwrap()
    }

    fn pubkey(n: u8) -> Vec<u8> {
        key(n).pub_key().to_bytes()
    }

    fn ecdsa_sig(n: u8) -> Vec<u8> {
        let mut sig = key(n).sign(&HASH).unwrap().to_der();
        sig.push(0x41);
        sig
    }

    fn schnorr_sig(n: u8) -> Vec<u8> {
        let mut sig = key(n).sign_schnorr(&HASH).unwrap().to_vec();
        sig.push(0x41);
        sig
    }

    fn script(items: &[&[u8]], ops: &[u8]) -> Script {
        let mut s = Script::new();
        for item in items {
            s.append_push_data(item).unwrap();
        }
        s.append_raw(ops);
        s
    }

    fn run(
        script: &Script,
        flags: ScriptFlags,
        checker: &dyn SignatureChecker,
    ) -> Result<(Vec<Vec<u8>>, usize), ScriptErrorCode> {
        let mut machine = ScriptMachine::new(flags, checker, 201);
        match machine.eval(script) {
            Ok(()) => Ok((machine.stack().items().to_vec(), machine.stats().sig_check_count)),
            Err(e) => Err(e.code),
        }
    }

    #[test]
    fn test_hash_ops() {
        let cases = [
            (OP_RIPEMD160, "9c1185a5c5e9fc54612808977ee8f548b2258d31"),
            (OP_SHA1, "da39a3ee5e6b4b0d3255bfef95601890afd80709"),
            (OP_SHA256, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"),
            (OP_HASH160, "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"),
            (OP_HASH256, "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"),
        ];
        for (op, expected) in cases {
            let (stack, _) = run(&Script::from_bytes(&[OP_0, op]), ScriptFlags::NONE, &NullChecker).unwrap();
            assert_eq!(hex::encode(&stack[0]), expected);
        }
        assert_eq!(
            run(&Script::from_bytes(&[OP_SHA256]), ScriptFlags::NONE, &NullChecker).unwrap_err(),
            ScriptErrorCode::InvalidStackOperation
        );
    }

    #[test]
    fn test_checksig() {
        let checker = FixedHashChecker::default();
        let good = script(&[&ecdsa_sig(1), &pubkey(1)], &[OP_CHECKSIG]);
        let (stack, sig_checks) = run(&good, ScriptFlags::NONE, &checker).unwrap();
        assert_eq!(stack, vec![vec![1u8]]);
        assert_eq!(sig_checks, 1);

        let wrong_key = script(&[&ecdsa_sig(1), &pubkey(2)], &[OP_CHECKSIG]);
        assert_eq!(run(&wrong_key, ScriptFlags::NONE, &checker).unwrap().0, vec![Vec::<u8>::new()]);
        assert_eq!(
            run(&wrong_key, ScriptFlags::NULLFAIL, &checker).unwrap_err(),
            ScriptErrorCode::SigNullFail
        );

        // An empty signature fails quietly and is not counted.
        let empty = script(&[&[], &pubkey(1)], &[OP_CHECKSIG]);
        let (stack, sig_checks) = run(&empty, ScriptFlags::NULLFAIL, &checker).unwrap();
        assert_eq!(stack, vec![Vec::<u8>::new()]);
        assert_eq!(sig_checks, 0);

        let verify = script(&[&ecdsa_sig(1), &pubkey(2)], &[OP_CHECKSIGVERIFY]);
        assert_eq!(run(&verify, ScriptFlags::NONE, &checker).unwrap_err(), ScriptErrorCode::CheckSigVerify);
        let verify = script(&[&ecdsa_sig(1), &pubkey(1)], &[OP_CHECKSIGVERIFY]);
        assert!(run(&verify, ScriptFlags::NONE, &checker).unwrap().0.is_empty());
    }

    #[test]
    fn test_checksig_encoding_checks() {
        let checker = FixedHashChecker::default();
        let bad_key = script(&[&ecdsa_sig(1), &[0x05; 33]], &[OP_CHECKSIG]);
        assert_eq!(run(&bad_key, ScriptFlags::STRICTENC, &checker).unwrap_err(), ScriptErrorCode::PubkeyType);

        let bad_der = script(&[&[0x30, 0x01, 0x41], &pubkey(1)], &[OP_CHECKSIG]);
        assert_eq!(run(&bad_der, ScriptFlags::DERSIG, &checker).unwrap_err(), ScriptErrorCode::SigDer);
        assert_eq!(run(&bad_der, ScriptFlags::NONE, &checker).unwrap().0, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_checksig_script_code() {
        let checker = FixedHashChecker::default();
        let sig = ecdsa_sig(1);
        let s = script(&[&sig, &pubkey(1)], &[OP_CHECKSIG]);
        let mut without_sig = Script::new();
        without_sig.append_push_data(&pubkey(1)).unwrap();
        without_sig.append_raw(&[OP_CHECKSIG]);

        // The signature is removed from the script code it is checked against.
        run(&s, ScriptFlags::NONE, &checker).unwrap();
        assert_eq!(checker.seen.borrow()[0], without_sig);

        // CHECKSIG drops the signature even when it uses FORKID under the FORKID flag.
        assert_eq!(SigHashType::from_sig(&sig), SigHashType::all_forkid());
        let (stack, _) = run(&s, ScriptFlags::SIGHASH_FORKID | ScriptFlags::STRICTENC, &checker).unwrap();
        assert_eq!(stack, vec![vec![1u8]]);
        assert_eq!(checker.seen.borrow()[1], without_sig);

        // Only what follows the last executed OP_CODESEPARATOR is committed to.
        let sep = script(&[&sig, &pubkey(1)], &[OP_CODESEPARATOR, OP_CHECKSIG]);
        run(&sep, ScriptFlags::NONE, &checker).unwrap();
        assert_eq!(checker.seen.borrow()[2], Script::from_bytes(&[OP_CHECKSIG]));
    }

    #[test]
    fn test_multisig_script_code_keeps_forkid_sigs() {
        let checker = FixedHashChecker::default();
        let s = multisig(&[], &[ecdsa_sig(1)], &[1]);
        let mut without_sig = Script::new();
        without_sig.append_push_data(&[]).unwrap();
        without_sig.push_int(1);
        without_sig.append_push_data(&pubkey(1)).unwrap();
        without_sig.push_int(1);
        without_sig.append_raw(&[OP_CHECKMULTISIG]);

        run(&s, ScriptFlags::NONE, &checker).unwrap();
        assert_eq!(checker.seen.borrow()[0], without_sig);

        run(&s, ScriptFlags::SIGHASH_FORKID, &checker).unwrap();
        assert_eq!(checker.seen.borrow()[1], s);
    }

    #[test]
    fn test_sighashtype_accumulates() {
        let checker = FixedHashChecker::default();
        let mut sig_a = ecdsa_sig(1);
        *sig_a.last_mut().unwrap() = 0x01;
        let mut sig_b = ecdsa_sig(1);
        *sig_b.last_mut().unwrap() = 0x82;
        let mut s = script(&[&sig_a, &pubkey(1)], &[OP_CHECKSIG, OP_DROP]);
        s.append_push_data(&sig_b).unwrap();
        s.append_push_data(&pubkey(1)).unwrap();
        s.append_raw(&[OP_CHECKSIG]);

        let mut machine = ScriptMachine::new(ScriptFlags::NONE, &checker, 201);
        machine.eval(&s).unwrap();
        assert_eq!(machine.sighashtype(), 0x83);
    }

    fn multisig(dummy: &[u8], sigs: &[Vec<u8>], keys: &[u8]) -> Script {
        let mut s = Script::new();
        s.append_push_data(dummy).unwrap();
        for sig in sigs {
            s.append_push_data(sig).unwrap();
        }
        s.push_int(sigs.len() as i64);
        for k in keys {
            s.append_push_data(&pubkey(*k)).unwrap();
        }
        s.push_int(keys.len() as i64);
        s.append_raw(&[OP_CHECKMULTISIG]);
        s
    }

    #[test]
    fn test_legacy_multisig() {
        let checker = FixedHashChecker::default();
        let ok = multisig(&[], &[ecdsa_sig(1), ecdsa_sig(3)], &[1, 2, 3]);
        let mut machine = ScriptMachine::new(ScriptFlags::NONE, &checker, 201);
        machine.eval(&ok).unwrap();
        assert_eq!(machine.stack().items(), &[vec![1]]);
        assert_eq!(machine.stats().sig_check_count, 3);
        assert_eq!(machine.op_count(), 4);

        // Signatures out of key order fail.
        let swapped = multisig(&[], &[ecdsa_sig(3), ecdsa_sig(1)], &[1, 2, 3]);
        assert_eq!(run(&swapped, ScriptFlags::NONE, &checker).unwrap().0, vec![Vec::<u8>::new()]);
        assert_eq!(
            run(&swapped, ScriptFlags::NULLFAIL, &checker).unwrap_err(),
            ScriptErrorCode::SigNullFail
        );

        // All-empty signatures fail without NULLFAIL and without sig checks.
        let null = multisig(&[], &[vec![], vec![]], &[1, 2, 3]);
        let (stack, sig_checks) = run(&null, ScriptFlags::NULLFAIL, &checker).unwrap();
        assert_eq!(stack, vec![Vec::<u8>::new()]);
        assert_eq!(sig_checks, 0);

        let zero_of_zero = Script::from_bytes(&[OP_0, OP_0, OP_0, OP_CHECKMULTISIG]);
        assert_eq!(run(&zero_of_zero, ScriptFlags::NONE, &checker).unwrap().0, vec![vec![1u8]]);
    }

    #[test]
    fn test_multisig_dummy_and_counts() {
        let checker = FixedHashChecker::default();
        let dummy = multisig(&[0x01], &[ecdsa_sig(1)], &[1]);
        assert_eq!(run(&dummy, ScriptFlags::NONE, &checker).unwrap().0, vec![vec![1u8]]);
        assert_eq!(
            run(&dummy, ScriptFlags::NULLDUMMY, &checker).unwrap_err(),
            ScriptErrorCode::SigNullDummy
        );

        let too_many_keys = Script::from_asm("OP_0 OP_0 15 OP_CHECKMULTISIG").unwrap();
        assert_eq!(run(&too_many_keys, ScriptFlags::NONE, &checker).unwrap_err(), ScriptErrorCode::PubkeyCount);

        let too_many_sigs = Script::from_asm("OP_0 OP_2 aa OP_1 OP_CHECKMULTISIG").unwrap();
        assert_eq!(run(&too_many_sigs, ScriptFlags::NONE, &checker).unwrap_err(), ScriptErrorCode::SigCount);

        let no_dummy = Script::from_bytes(&[OP_0, OP_0, OP_CHECKMULTISIG]);
        assert_eq!(
            run(&no_dummy, ScriptFlags::NONE, &checker).unwrap_err(),
            ScriptErrorCode::InvalidStackOperation
        );

        let verify = Script::from_bytes(&[OP_0, OP_0, OP_0, OP_CHECKMULTISIGVERIFY]);
        assert!(run(&verify, ScriptFlags::NONE, &checker).unwrap().0.is_empty());
        let failing = multisig(&[], &[ecdsa_sig(2)], &[1]);
        let mut failing_verify = failing.to_bytes().to_vec();
        *failing_verify.last_mut().unwrap() = OP_CHECKMULTISIGVERIFY;
        assert_eq!(
            run(&Script::from(failing_verify), ScriptFlags::NONE, &checker).unwrap_err(),
            ScriptErrorCode::CheckMultisigVerify
        );
    }

    #[test]
    fn test_legacy_multisig_rejects_schnorr_sized_sigs() {
        let checker = FixedHashChecker::default();
        let s = multisig(&[], &[schnorr_sig(1)], &[1]);
        assert_eq!(run(&s, ScriptFlags::NONE, &checker).unwrap_err(), ScriptErrorCode::SigBadLength);
    }

    #[test]
    fn test_schnorr_multisig() {
        let checker = FixedHashChecker::default();
        let flags = ScriptFlags::SCHNORR_MULTISIG;

        let ok = multisig(&[0b101], &[schnorr_sig(1), schnorr_sig(3)], &[1, 2, 3]);
        let (stack, sig_checks) = run(&ok, flags, &checker).unwrap();
        assert_eq!(stack, vec![vec![1u8]]);
        assert_eq!(sig_checks, 2);

        let bit_count = multisig(&[0b111], &[schnorr_sig(1), schnorr_sig(3)], &[1, 2, 3]);
        assert_eq!(run(&bit_count, flags, &checker).unwrap_err(), ScriptErrorCode::InvalidBitCount);

        let bit_range = multisig(&[0b1001], &[schnorr_sig(1), schnorr_sig(3)], &[1, 2, 3]);
        assert_eq!(run(&bit_range, flags, &checker).unwrap_err(), ScriptErrorCode::InvalidBitRange);

        let size = multisig(&[0b101, 0x00], &[schnorr_sig(1), schnorr_sig(3)], &[1, 2, 3]);
        assert_eq!(run(&size, flags, &checker).unwrap_err(), ScriptErrorCode::InvalidBitfieldSize);

        let wrong_key = multisig(&[0b011], &[schnorr_sig(1), schnorr_sig(3)], &[1, 2, 3]);
        assert_eq!(run(&wrong_key, flags, &checker).unwrap_err(), ScriptErrorCode::SigNullFail);

        let ecdsa = multisig(&[0b001], &[ecdsa_sig(1)], &[1, 2, 3]);
        assert_eq!(run(&ecdsa, flags, &checker).unwrap_err(), ScriptErrorCode::SigNonSchnorr);

        // Without the flag a non-empty dummy is just ignored by the legacy path.
        assert_eq!(
            run(&ok, ScriptFlags::NONE, &checker).unwrap_err(),
            ScriptErrorCode::SigBadLength
        );
    }

    #[test]
    fn test_checkdatasig() {
        let message = b"hello".to_vec();
        let digest = sha256(&message);
        let ecdsa = key(1).sign(&digest).unwrap().to_der();
        let schnorr = key(1).sign_schnorr(&digest).unwrap().to_vec();

        for sig in [&ecdsa, &schnorr] {
            let s = script(&[sig, &message, &pubkey(1)], &[OP_CHECKDATASIG]);
            let (stack, sig_checks) = run(&s, ScriptFlags::NULLFAIL, &NullChecker).unwrap();
            assert_eq!(stack, vec![vec![1u8]]);
            assert_eq!(sig_checks, 1);

            let other = script(&[sig, b"other", &pubkey(1)], &[OP_CHECKDATASIG]);
            assert_eq!(run(&other, ScriptFlags::NONE, &NullChecker).unwrap().0, vec![Vec::<u8>::new()]);
            assert_eq!(
                run(&other, ScriptFlags::NULLFAIL, &NullChecker).unwrap_err(),
                ScriptErrorCode::SigNullFail
            );
        }

        let empty = script(&[&[], &message, &pubkey(1)], &[OP_CHECKDATASIG]);
        assert_eq!(run(&empty, ScriptFlags::NULLFAIL, &NullChecker).unwrap(), (vec![Vec::<u8>::new()], 0));

        let verify = script(&[&[], &message, &pubkey(1)], &[OP_CHECKDATASIGVERIFY]);
        assert_eq!(
            run(&verify, ScriptFlags::NONE, &NullChecker).unwrap_err(),
            ScriptErrorCode::CheckDataSigVerify
        );
        assert_eq!(
            run(&Script::from_bytes(&[OP_0, OP_0, OP_CHECKDATASIG]), ScriptFlags::NONE, &NullChecker)
                .unwrap_err(),
            ScriptErrorCode::InvalidStackOperation
        );
    }
}
