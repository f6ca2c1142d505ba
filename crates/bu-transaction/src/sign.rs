//! Producing and merging scriptSigs.
//!
//! The signer walks a locking script with [`solver`], asks a
//! [`SignatureCreator`] for the signatures each template needs, and then
//! runs the result through [`verify_script`] to decide whether the input
//! is fully signed. [`combine_signatures`] merges two partial scriptSigs
//! for the same output, which is how independent cosigners of a multisig
//! output assemble their signatures.

use std::collections::{BTreeSet, HashMap};

use bu_primitives::hash::hash160;
use bu_script::interpreter::{
    eval_script, verify_script, NullChecker, ScriptFlags, SigHashType, SignatureChecker,
    MAX_OPS_PER_SCRIPT,
};
use bu_script::opcodes::OP_0;
use bu_script::Script;

use crate::checker::TransactionSignatureChecker;
use crate::keystore::KeyStore;
use crate::sighash::signature_hash;
use crate::standard::{solver, ScriptId, TxnOutType};
use crate::transaction::Transaction;
use crate::TransactionError;

/// Signature algorithm used by a [`TransactionSignatureCreator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SigType {
    #[default]
    Ecdsa,
    Schnorr,
}

/// Supplies signatures (and the checker that validates them) to the signer.
pub trait SignatureCreator {
    /// Keys and redeem scripts available for signing.
    fn key_store(&self) -> &dyn KeyStore;

    /// Checker used to verify the finished scriptSig.
    fn checker(&self) -> &dyn SignatureChecker;

    /// Create a signature, hash type byte included.
    ///
    /// # Arguments
    /// * `key_id` - HASH160 of the public key to sign with.
    /// * `script_code` - Script the signature commits to.
    ///
    /// # Returns
    /// `None` if the key is unknown or signing fails.
    fn create_sig(&self, key_id: &[u8; 20], script_code: &Script) -> Option<Vec<u8>>;
}

/// Creates real signatures for one input of a transaction.
pub struct TransactionSignatureCreator<'a> {
    key_store: &'a dyn KeyStore,
    tx: &'a Transaction,
    n_in: usize,
    amount: i64,
    sighash_type: SigHashType,
    sig_type: SigType,
    checker: TransactionSignatureChecker<'a>,
}

impl<'a> TransactionSignatureCreator<'a> {
    /// Create a signature creator.
    ///
    /// # Arguments
    /// * `key_store` - Source of private keys and redeem scripts.
    /// * `tx` - The spending transaction.
    /// * `n_in` - Index of the input being signed.
    /// * `amount` - Value of the output that input spends.
    /// * `sighash_type` - Hash type appended to each signature.
    /// * `sig_type` - ECDSA or Schnorr.
    pub fn new(
        key_store: &'a dyn KeyStore,
        tx: &'a Transaction,
        n_in: usize,
        amount: i64,
        sighash_type: SigHashType,
        sig_type: SigType,
    ) -> Self {
        let flags = digest_flags(sighash_type);
        TransactionSignatureCreator {
            key_store,
            tx,
            n_in,
            amount,
            sighash_type,
            sig_type,
            checker: TransactionSignatureChecker::new(tx, n_in, amount, flags),
        }
    }
}

/// Signatures carrying FORKID are hashed and checked with the FORKID digest.
fn digest_flags(sighash_type: SigHashType) -> ScriptFlags {
    if sighash_type.has_forkid() {
        ScriptFlags::SIGHASH_FORKID
    } else {
        ScriptFlags::NONE
    }
}

impl SignatureCreator for TransactionSignatureCreator<'_> {
    fn key_store(&self) -> &dyn KeyStore {
        self.key_store
    }

    fn checker(&self) -> &dyn SignatureChecker {
        &self.checker
    }

    fn create_sig(&self, key_id: &[u8; 20], script_code: &Script) -> Option<Vec<u8>> {
        let key = self.key_store.get_key(key_id)?;
        let hash = signature_hash(
            script_code,
            self.tx,
            self.n_in,
            self.sighash_type,
            self.amount,
            digest_flags(self.sighash_type),
        );

        let signed = match self.sig_type {
            SigType::Ecdsa => key.sign(&hash).map(|sig| sig.to_der()),
            SigType::Schnorr => key.sign_schnorr(&hash).map(|sig| sig.to_vec()),
        };
        match signed {
            Ok(mut sig) => {
                sig.push(self.sighash_type.raw() as u8);
                Some(sig)
            }
            Err(e) => {
                log::debug!("signing input {} failed: {}", self.n_in, e);
                None
            }
        }
    }
}

/// Checker that accepts every signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummySignatureChecker;

impl SignatureChecker for DummySignatureChecker {
    fn check_sig(&self, _sig: &[u8], _pubkey: &[u8], _script_code: &Script) -> bool {
        true
    }
}

/// Length of the placeholder signature made by [`DummySignatureCreator`],
/// hash type byte included.
pub const DUMMY_SIGNATURE_LEN: usize = 72;

/// Creates correctly sized placeholder signatures without any keys.
///
/// Used to estimate the size of a signed transaction before the real
/// signatures exist.
pub struct DummySignatureCreator<'a> {
    key_store: &'a dyn KeyStore,
}

impl<'a> DummySignatureCreator<'a> {
    pub fn new(key_store: &'a dyn KeyStore) -> Self {
        DummySignatureCreator { key_store }
    }
}

impl SignatureCreator for DummySignatureCreator<'_> {
    fn key_store(&self) -> &dyn KeyStore {
        self.key_store
    }

    fn checker(&self) -> &dyn SignatureChecker {
        &DummySignatureChecker
    }

    fn create_sig(&self, _key_id: &[u8; 20], _script_code: &Script) -> Option<Vec<u8>> {
        // A DER sequence holding a 33-byte R and a 32-byte S.
        let mut sig = vec![0u8; DUMMY_SIGNATURE_LEN];
        sig[0] = 0x30;
        sig[1] = 69;
        sig[2] = 0x02;
        sig[3] = 33;
        sig[4] = 0x01;
        sig[4 + 33] = 0x02;
        sig[5 + 33] = 32;
        sig[6 + 33] = 0x01;
        sig[6 + 33 + 32] = SigHashType::ALL as u8;
        Some(sig)
    }
}

/// Result of signing a single template.
struct Step {
    kind: TxnOutType,
    script: Script,
    solved: bool,
}

fn push(script: &mut Script, data: &[u8]) -> Result<(), TransactionError> {
    script.append_push_data(data)?;
    Ok(())
}

fn sign1(
    creator: &dyn SignatureCreator,
    key_id: &[u8; 20],
    script_code: &Script,
    script_sig: &mut Script,
) -> Result<bool, TransactionError> {
    match creator.create_sig(key_id, script_code) {
        Some(sig) => {
            push(script_sig, &sig)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Sign with up to `m` of the multisig keys, in key order.
fn sign_n(
    creator: &dyn SignatureCreator,
    solutions: &[Vec<u8>],
    script_code: &Script,
    script_sig: &mut Script,
) -> Result<bool, TransactionError> {
    let Some(required) = solutions.first().and_then(|m| m.first()) else {
        return Ok(false);
    };
    let required = usize::from(*required);
    let keys = &solutions[1..solutions.len().saturating_sub(1)];

    let mut signed = 0usize;
    for pubkey in keys {
        if signed >= required {
            break;
        }
        if sign1(creator, &hash160(pubkey), script_code, script_sig)? {
            signed += 1;
        }
    }
    Ok(signed == required)
}

fn sign_step(
    creator: &dyn SignatureCreator,
    script_pub_key: &Script,
    flags: ScriptFlags,
) -> Result<Step, TransactionError> {
    let (kind, solutions) = solver(script_pub_key, flags);
    let mut script = Script::new();

    let solved = match kind {
        TxnOutType::NonStandard | TxnOutType::NullData | TxnOutType::LabelPublic => false,
        TxnOutType::PubKey => sign1(creator, &hash160(&solutions[0]), script_pub_key, &mut script)?,
        TxnOutType::Cltv => sign1(creator, &hash160(&solutions[1]), script_pub_key, &mut script)?,
        TxnOutType::PubKeyHash => {
            let key_id = key_id_from(&solutions[0]);
            if sign1(creator, &key_id, script_pub_key, &mut script)? {
                let pubkey = creator
                    .key_store()
                    .get_pub_key(&key_id)
                    .map(|k| k.to_bytes())
                    .unwrap_or_default();
                push(&mut script, &pubkey)?;
                true
            } else {
                false
            }
        }
        TxnOutType::ScriptHash => {
            // The "signature" is the redeem script itself; the caller signs it.
            match ScriptId::from_slice(&solutions[0]).and_then(|id| creator.key_store().get_script(&id)) {
                Some(redeem) => {
                    script = redeem;
                    true
                }
                None => false,
            }
        }
        TxnOutType::MultiSig => {
            script.append_raw(&[OP_0]);
            sign_n(creator, &solutions, script_pub_key, &mut script)?
        }
    };

    Ok(Step { kind, script, solved })
}

fn key_id_from(solution: &[u8]) -> [u8; 20] {
    let mut key_id = [0u8; 20];
    if solution.len() == 20 {
        key_id.copy_from_slice(solution);
    }
    key_id
}

fn incomplete(script_sig: Script, reason: String) -> TransactionError {
    log::debug!("could not complete scriptSig: {}", reason);
    TransactionError::IncompleteSignature { script_sig, reason }
}

/// Produce a scriptSig that satisfies `from_pub_key`.
///
/// For P2SH outputs the redeem script is looked up in the creator's key
/// store, signed in turn, and appended as the final push.
///
/// # Arguments
/// * `creator` - Source of signatures.
/// * `from_pub_key` - The locking script being spent.
/// * `flags` - Flags used to classify the script and verify the result.
///
/// # Returns
/// The complete scriptSig, or `IncompleteSignature` carrying the partial
/// scriptSig when signing or verification fails.
pub fn produce_signature(
    creator: &dyn SignatureCreator,
    from_pub_key: &Script,
    flags: ScriptFlags,
) -> Result<Script, TransactionError> {
    let step = sign_step(creator, from_pub_key, flags)?;
    if !step.solved {
        return Err(incomplete(step.script, format!("cannot sign {} output", step.kind)));
    }

    let mut script_sig = step.script;
    if step.kind == TxnOutType::ScriptHash {
        let subscript = script_sig;
        let inner = sign_step(creator, &subscript, flags)?;
        let solved = inner.solved && inner.kind != TxnOutType::ScriptHash;

        script_sig = inner.script;
        push(&mut script_sig, subscript.to_bytes())?;
        if !solved {
            return Err(incomplete(
                script_sig,
                format!("cannot sign {} redeem script", inner.kind),
            ));
        }
    }

    match verify_script(&script_sig, from_pub_key, flags, MAX_OPS_PER_SCRIPT, creator.checker()) {
        Ok(()) => Ok(script_sig),
        Err(e) => Err(incomplete(script_sig, e.to_string())),
    }
}

/// Sign input `n_in` of `tx`, which spends `from_pub_key` holding `amount`.
///
/// The input's scriptSig is replaced by the signer's output even when it
/// is incomplete, so partial signatures can later be combined.
///
/// # Arguments
/// * `flags` - Verification flags for the finished input.
/// * `key_store` - Source of keys and redeem scripts.
/// * `from_pub_key` - Locking script of the spent output.
/// * `tx` - Transaction to sign.
/// * `n_in` - Index of the input to sign.
/// * `amount` - Value of the spent output.
/// * `sighash_type` - Hash type for new signatures.
/// * `sig_type` - ECDSA or Schnorr.
///
/// # Returns
/// `Ok(())` if the input is now fully signed.
#[allow(clippy::too_many_arguments)]
pub fn sign_signature(
    flags: ScriptFlags,
    key_store: &dyn KeyStore,
    from_pub_key: &Script,
    tx: &mut Transaction,
    n_in: usize,
    amount: i64,
    sighash_type: SigHashType,
    sig_type: SigType,
) -> Result<(), TransactionError> {
    if n_in >= tx.inputs.len() {
        return Err(TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            n_in,
            tx.inputs.len()
        )));
    }

    let result = {
        let creator =
            TransactionSignatureCreator::new(key_store, tx, n_in, amount, sighash_type, sig_type);
        produce_signature(&creator, from_pub_key, flags)
    };

    match result {
        Ok(script_sig) => {
            tx.inputs[n_in].script_sig = script_sig;
            Ok(())
        }
        Err(TransactionError::IncompleteSignature { script_sig, reason }) => {
            tx.inputs[n_in].script_sig = script_sig.clone();
            Err(TransactionError::IncompleteSignature { script_sig, reason })
        }
        Err(e) => Err(e),
    }
}

/// Sign input `n_in` of `tx_to`, taking the spent output from `tx_from`.
///
/// # Returns
/// `InvalidTransaction` if the input does not spend an output of `tx_from`,
/// otherwise as [`sign_signature`].
pub fn sign_signature_from_tx(
    flags: ScriptFlags,
    key_store: &dyn KeyStore,
    tx_from: &Transaction,
    tx_to: &mut Transaction,
    n_in: usize,
    sighash_type: SigHashType,
    sig_type: SigType,
) -> Result<(), TransactionError> {
    let input = tx_to.inputs.get(n_in).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!("input index {} out of range", n_in))
    })?;
    if input.source_txid != tx_from.tx_id() {
        return Err(TransactionError::InvalidTransaction(
            "input does not spend the given transaction".to_string(),
        ));
    }
    let spent = tx_from
        .outputs
        .get(input.source_tx_out_index as usize)
        .ok_or_else(|| {
            TransactionError::InvalidTransaction(format!(
                "spent output index {} out of range",
                input.source_tx_out_index
            ))
        })?
        .clone();

    sign_signature(
        flags,
        key_store,
        &spent.locking_script,
        tx_to,
        n_in,
        spent.satoshis,
        sighash_type,
        sig_type,
    )
}

fn push_all(values: &[Vec<u8>]) -> Result<Script, TransactionError> {
    let mut script = Script::new();
    for value in values {
        push(&mut script, value)?;
    }
    Ok(script)
}

fn combine_multisig(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    solutions: &[Vec<u8>],
    sigs1: &[Vec<u8>],
    sigs2: &[Vec<u8>],
) -> Result<Script, TransactionError> {
    let all_sigs: BTreeSet<&Vec<u8>> = sigs1
        .iter()
        .chain(sigs2)
        .filter(|sig| !sig.is_empty())
        .collect();

    let required = solutions.first().and_then(|m| m.first()).map_or(0, |m| usize::from(*m));
    let keys = &solutions[1..solutions.len().saturating_sub(1)];

    // Match each signature to the first key it is valid for that has none yet.
    let mut by_key: HashMap<&[u8], &[u8]> = HashMap::new();
    for sig in all_sigs {
        for pubkey in keys {
            if by_key.contains_key(pubkey.as_slice()) {
                continue;
            }
            if checker.check_sig(sig, pubkey, script_pub_key) {
                by_key.insert(pubkey.as_slice(), sig.as_slice());
                break;
            }
        }
    }

    let mut result = Script::new();
    result.append_raw(&[OP_0]);
    let mut have = 0usize;
    for pubkey in keys {
        if have >= required {
            break;
        }
        if let Some(sig) = by_key.get(pubkey.as_slice()) {
            push(&mut result, sig)?;
            have += 1;
        }
    }
    for _ in have..required {
        result.append_raw(&[OP_0]);
    }
    Ok(result)
}

fn combine(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    kind: TxnOutType,
    solutions: &[Vec<u8>],
    mut sigs1: Vec<Vec<u8>>,
    mut sigs2: Vec<Vec<u8>>,
    flags: ScriptFlags,
) -> Result<Script, TransactionError> {
    match kind {
        TxnOutType::NonStandard | TxnOutType::NullData => {
            if sigs1.len() >= sigs2.len() {
                push_all(&sigs1)
            } else {
                push_all(&sigs2)
            }
        }
        TxnOutType::PubKey | TxnOutType::PubKeyHash | TxnOutType::Cltv => {
            if sigs1.first().map_or(true, |s| s.is_empty()) {
                push_all(&sigs2)
            } else {
                push_all(&sigs1)
            }
        }
        TxnOutType::ScriptHash => {
            if sigs1.last().map_or(true, |s| s.is_empty()) {
                return push_all(&sigs2);
            }
            if sigs2.last().map_or(true, |s| s.is_empty()) {
                return push_all(&sigs1);
            }

            // Both carry a redeem script: merge the signatures for it.
            let redeem_bytes = sigs1.pop().unwrap_or_default();
            sigs2.pop();
            let redeem = Script::from(redeem_bytes);
            let (inner_kind, inner_solutions) = solver(&redeem, flags);
            let mut result = combine(
                &redeem,
                checker,
                inner_kind,
                &inner_solutions,
                sigs1,
                sigs2,
                flags,
            )?;
            push(&mut result, redeem.to_bytes())?;
            Ok(result)
        }
        TxnOutType::MultiSig => combine_multisig(script_pub_key, checker, solutions, &sigs1, &sigs2),
        TxnOutType::LabelPublic => Ok(Script::new()),
    }
}

fn push_stack(script_sig: &Script) -> Vec<Vec<u8>> {
    let mut stack = Vec::new();
    if let Err(e) = eval_script(
        &mut stack,
        script_sig,
        ScriptFlags::STRICTENC,
        MAX_OPS_PER_SCRIPT,
        &NullChecker,
    ) {
        log::trace!("scriptSig evaluation stopped early: {}", e);
    }
    stack
}

/// Merge two scriptSigs for the same output.
///
/// Multisig signatures from both sides are matched against the keys with
/// `checker` and re-emitted in key order. For other templates the more
/// complete of the two scriptSigs is kept.
///
/// # Arguments
/// * `script_pub_key` - The locking script both scriptSigs spend.
/// * `checker` - Checker bound to the spending input.
/// * `script_sig1` - First partial scriptSig.
/// * `script_sig2` - Second partial scriptSig.
/// * `flags` - Flags used to classify the locking script.
pub fn combine_signatures(
    script_pub_key: &Script,
    checker: &dyn SignatureChecker,
    script_sig1: &Script,
    script_sig2: &Script,
    flags: ScriptFlags,
) -> Result<Script, TransactionError> {
    let (kind, solutions) = solver(script_pub_key, flags);
    combine(
        script_pub_key,
        checker,
        kind,
        &solutions,
        push_stack(script_sig1),
        push_stack(script_sig2),
        flags,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TransactionInput;
    use crate::keystore::BasicKeyStore;
    use crate::output::TransactionOutput;
    use crate::standard::{script_for_destination, script_for_multisig, script_for_raw_pubkey, TxDestination};
    use bu_primitives::ec::PrivateKey;

    const AMOUNT: i64 = 50_000;

    fn flags() -> ScriptFlags {
        ScriptFlags::P2SH
            | ScriptFlags::STRICTENC
            | ScriptFlags::DERSIG
            | ScriptFlags::LOW_S
            | ScriptFlags::NULLFAIL
            | ScriptFlags::SIGHASH_FORKID
    }

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[seed; 32]).unwrap()
    }

    fn spending_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(TransactionInput::spending([9u8; 32], 1));
        tx.add_output(TransactionOutput::paying(AMOUNT - 500, Script::from_bytes(&[0x51])));
        tx
    }

    fn pushes(script: &Script) -> Vec<Vec<u8>> {
        script.ops().map(|chunk| chunk.unwrap().data).collect()
    }

    fn verifies(tx: &Transaction, script_pub_key: &Script) -> bool {
        let checker = TransactionSignatureChecker::new(tx, 0, AMOUNT, flags());
        verify_script(&tx.inputs[0].script_sig, script_pub_key, flags(), MAX_OPS_PER_SCRIPT, &checker)
            .is_ok()
    }

    #[test]
    fn test_sign_pubkeyhash() {
        let mut store = BasicKeyStore::new();
        let key_id = store.add_key(key(1));
        let spk = script_for_destination(&TxDestination::KeyId(key_id));
        let mut tx = spending_tx();

        sign_signature(flags(), &store, &spk, &mut tx, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa)
            .unwrap();
        assert!(verifies(&tx, &spk));

        let items = pushes(&tx.inputs[0].script_sig);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], key(1).pub_key().to_bytes());
    }

    #[test]
    fn test_sign_pubkey_schnorr() {
        let mut store = BasicKeyStore::new();
        store.add_key(key(2));
        let spk = script_for_raw_pubkey(&key(2).pub_key());
        let mut tx = spending_tx();

        sign_signature(flags(), &store, &spk, &mut tx, 0, AMOUNT, SigHashType::all_forkid(), SigType::Schnorr)
            .unwrap();
        assert_eq!(pushes(&tx.inputs[0].script_sig)[0].len(), 65);
        assert!(verifies(&tx, &spk));
    }

    #[test]
    fn test_missing_key_is_incomplete() {
        let store = BasicKeyStore::new();
        let spk = script_for_raw_pubkey(&key(3).pub_key());
        let mut tx = spending_tx();

        let err = sign_signature(flags(), &store, &spk, &mut tx, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa)
            .unwrap_err();
        match err {
            TransactionError::IncompleteSignature { script_sig, .. } => assert!(script_sig.is_empty()),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_data_output_cannot_be_signed() {
        let store = BasicKeyStore::new();
        let spk = Script::from_bytes(&[0x6a, 0x01, 0x01]);
        let mut tx = spending_tx();
        assert!(matches!(
            sign_signature(flags(), &store, &spk, &mut tx, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa),
            Err(TransactionError::IncompleteSignature { .. })
        ));
        assert!(matches!(
            sign_signature(flags(), &store, &spk, &mut tx, 5, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa),
            Err(TransactionError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_p2sh_multisig_partial_then_combined() {
        let keys = [key(4), key(5), key(6)];
        let pubkeys: Vec<_> = keys.iter().map(|k| k.pub_key()).collect();
        let redeem = script_for_multisig(2, &pubkeys).unwrap();
        let spk = script_for_destination(&TxDestination::Script(ScriptId::of(&redeem)));

        let mut store_a = BasicKeyStore::new();
        store_a.add_key(keys[2].clone());
        store_a.add_script(redeem.clone());
        let mut store_b = BasicKeyStore::new();
        store_b.add_key(keys[0].clone());
        store_b.add_script(redeem.clone());

        let mut tx_a = spending_tx();
        let err = sign_signature(flags(), &store_a, &spk, &mut tx_a, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa);
        assert!(matches!(err, Err(TransactionError::IncompleteSignature { .. })));
        // OP_0, one signature, the redeem script.
        assert_eq!(pushes(&tx_a.inputs[0].script_sig).len(), 3);
        assert!(!verifies(&tx_a, &spk));

        let mut tx_b = spending_tx();
        let err = sign_signature(flags(), &store_b, &spk, &mut tx_b, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa);
        assert!(err.is_err());

        let checker = TransactionSignatureChecker::new(&tx_a, 0, AMOUNT, flags());
        let combined = combine_signatures(
            &spk,
            &checker,
            &tx_a.inputs[0].script_sig,
            &tx_b.inputs[0].script_sig,
            flags(),
        )
        .unwrap();

        let mut tx = spending_tx();
        tx.inputs[0].script_sig = combined.clone();
        assert!(verifies(&tx, &spk));

        // Signatures come out in key order: key 0 first, then key 2.
        let items = pushes(&combined);
        assert_eq!(items.len(), 4);
        assert!(items[0].is_empty());
        assert_eq!(items[1], pushes(&tx_b.inputs[0].script_sig)[1]);
        assert_eq!(items[2], pushes(&tx_a.inputs[0].script_sig)[1]);
        assert_eq!(items[3], redeem.to_bytes());

        // Combining is symmetric.
        let reversed = combine_signatures(
            &spk,
            &checker,
            &tx_b.inputs[0].script_sig,
            &tx_a.inputs[0].script_sig,
            flags(),
        )
        .unwrap();
        assert_eq!(reversed, combined);
    }

    #[test]
    fn test_combine_single_key_prefers_signed() {
        let mut store = BasicKeyStore::new();
        let key_id = store.add_key(key(7));
        let spk = script_for_destination(&TxDestination::KeyId(key_id));
        let mut tx = spending_tx();
        sign_signature(flags(), &store, &spk, &mut tx, 0, AMOUNT, SigHashType::all_forkid(), SigType::Ecdsa)
            .unwrap();
        let signed = tx.inputs[0].script_sig.clone();

        let checker = TransactionSignatureChecker::new(&tx, 0, AMOUNT, flags());
        let empty = Script::new();
        assert_eq!(combine_signatures(&spk, &checker, &empty, &signed, flags()).unwrap(), signed);
        assert_eq!(combine_signatures(&spk, &checker, &signed, &empty, flags()).unwrap(), signed);
    }

    #[test]
    fn test_dummy_creator_sizes() {
        let mut store = BasicKeyStore::new();
        let key_id = store.add_key(key(8));
        let spk = script_for_destination(&TxDestination::KeyId(key_id));

        let creator = DummySignatureCreator::new(&store);
        let script_sig = produce_signature(&creator, &spk, flags()).unwrap();
        let items = pushes(&script_sig);
        assert_eq!(items[0].len(), DUMMY_SIGNATURE_LEN);
        assert_eq!(items[0][DUMMY_SIGNATURE_LEN - 1], SigHashType::ALL as u8);
        assert_eq!(items[1].len(), 33);
    }
}
