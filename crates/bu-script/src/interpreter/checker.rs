//! Signature checking capability handed to the interpreter.
//!
//! The interpreter does not depend on the transaction crate. Callers
//! provide a [`SignatureChecker`] bound to the spending transaction and
//! input; [`NullChecker`] stands in when there is no transaction.

use bu_primitives::ec::{schnorr, PublicKey, Signature};

use super::scriptnum::ScriptNum;
use super::sigencoding::SCHNORR_SIG_LEN;
use crate::Script;

/// Verify `sig` over a 32-byte digest.
///
/// A 64-byte signature is verified as Schnorr, anything else as a
/// (laxly parsed) DER ECDSA signature.
pub fn verify_signature(sig: &[u8], pubkey: &PublicKey, hash: &[u8; 32]) -> bool {
    if sig.len() == SCHNORR_SIG_LEN {
        return schnorr::verify(pubkey, hash, sig);
    }
    match Signature::from_der_lax(sig) {
        Ok(s) => s.verify(hash, pubkey),
        Err(_) => false,
    }
}

/// Transaction-dependent checks used by the signature and locktime opcodes.
///
/// Every method defaults to failing, so an implementation only overrides
/// what its context can answer.
pub trait SignatureChecker {
    /// Verify a transaction signature.
    ///
    /// # Arguments
    /// * `sig` - Signature with its trailing hash type byte.
    /// * `pubkey` - Serialized public key.
    /// * `script_code` - The script code the signature commits to.
    ///
    /// # Returns
    /// `true` only if the signature is valid for the bound input.
    fn check_sig(&self, _sig: &[u8], _pubkey: &[u8], _script_code: &Script) -> bool {
        false
    }

    /// Check an absolute locktime requirement (CHECKLOCKTIMEVERIFY).
    fn check_lock_time(&self, _lock_time: ScriptNum) -> bool {
        false
    }

    /// Check a relative locktime requirement (CHECKSEQUENCEVERIFY).
    fn check_sequence(&self, _sequence: ScriptNum) -> bool {
        false
    }

    /// Verify a signature over an arbitrary digest (CHECKDATASIG).
    fn verify_signature(&self, sig: &[u8], pubkey: &[u8], hash: &[u8; 32]) -> bool {
        match PublicKey::from_bytes(pubkey) {
            Ok(key) => verify_signature(sig, &key, hash),
            Err(_) => false,
        }
    }
}

/// Checker with no transaction context. Every transaction check fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChecker;

impl SignatureChecker for NullChecker {}

#[cfg(test)]
mod tests {
    use super::*;
    use bu_primitives::ec::PrivateKey;
    use bu_primitives::hash::sha256;

    #[test]
    fn test_null_checker_fails_transaction_checks() {
        let checker = NullChecker;
        assert!(!checker.check_sig(&[0x30], &[0x02; 33], &Script::new()));
        assert!(!checker.check_lock_time(ScriptNum::new(0)));
        assert!(!checker.check_sequence(ScriptNum::new(0)));
    }

    #[test]
    fn test_verify_signature_dispatches_on_length() {
        let key = PrivateKey::from_bytes(&[0x11; 32]).unwrap();
        let pubkey = key.pub_key().to_bytes();
        let hash = sha256(b"message");

        let ecdsa = key.sign(&hash).unwrap().to_der();
        assert!(NullChecker.verify_signature(&ecdsa, &pubkey, &hash));

        let schnorr = key.sign_schnorr(&hash).unwrap();
        assert!(NullChecker.verify_signature(&schnorr, &pubkey, &hash));

        let other = sha256(b"other");
        assert!(!NullChecker.verify_signature(&ecdsa, &pubkey, &other));
        assert!(!NullChecker.verify_signature(&schnorr, &pubkey, &other));
        assert!(!NullChecker.verify_signature(&ecdsa, &[0x05; 33], &hash));
    }
}
