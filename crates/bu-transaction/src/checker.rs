//! Signature checkers bound to a transaction input.
//!
//! [`TransactionSignatureChecker`] borrows a transaction and answers the
//! interpreter's signature and locktime questions for one of its inputs.
//! [`MutableTransactionSignatureChecker`] owns its transaction instead.

use std::cell::RefCell;
use std::collections::HashMap;

use bu_primitives::ec::PublicKey;
use bu_script::interpreter::checker::verify_signature;
use bu_script::interpreter::{ScriptFlags, ScriptNum, SigHashType, SignatureChecker};
use bu_script::Script;

use crate::input::{
    SEQUENCE_FINAL, SEQUENCE_LOCKTIME_DISABLE_FLAG, SEQUENCE_LOCKTIME_MASK,
    SEQUENCE_LOCKTIME_TYPE_FLAG,
};
use crate::sighash::signature_hash;
use crate::transaction::{Transaction, LOCKTIME_THRESHOLD};

/// Checker for input `n_in` of a borrowed transaction.
///
/// Computed signature hashes are cached per (hash type, script code), so
/// a multisig evaluation hashes each distinct combination once. The cache
/// is not synchronized; use one checker per verification.
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    n_in: usize,
    amount: i64,
    flags: ScriptFlags,
    sighash_cache: RefCell<HashMap<(u32, Vec<u8>), [u8; 32]>>,
}

impl<'a> TransactionSignatureChecker<'a> {
    /// Create a checker.
    ///
    /// # Arguments
    /// * `tx` - The spending transaction.
    /// * `n_in` - Index of the input being verified.
    /// * `amount` - Value of the output that input spends.
    /// * `flags` - Only `SIGHASH_FORKID` is consulted: it makes FORKID
    ///   signatures mandatory and selects the FORKID digest.
    pub fn new(tx: &'a Transaction, n_in: usize, amount: i64, flags: ScriptFlags) -> Self {
        TransactionSignatureChecker {
            tx,
            n_in,
            amount,
            flags,
            sighash_cache: RefCell::new(HashMap::new()),
        }
    }

    /// The transaction being checked.
    pub fn transaction(&self) -> &Transaction {
        self.tx
    }

    fn sighash(&self, script_code: &Script, sighash_type: SigHashType) -> [u8; 32] {
        let key = (sighash_type.raw(), script_code.to_bytes().to_vec());
        if let Some(hash) = self.sighash_cache.borrow().get(&key) {
            log::trace!("sighash cache hit for input {} type {}", self.n_in, sighash_type);
            return *hash;
        }
        log::trace!("sighash cache miss for input {} type {}", self.n_in, sighash_type);
        let hash = signature_hash(
            script_code,
            self.tx,
            self.n_in,
            sighash_type,
            self.amount,
            self.flags,
        );
        self.sighash_cache.borrow_mut().insert(key, hash);
        hash
    }
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_sig(&self, sig: &[u8], pubkey: &[u8], script_code: &Script) -> bool {
        let Ok(key) = PublicKey::from_bytes(pubkey) else {
            return false;
        };
        let Some((&hash_byte, body)) = sig.split_last() else {
            return false;
        };

        let sighash_type = SigHashType::new(u32::from(hash_byte));
        if self.flags.has_flag(ScriptFlags::SIGHASH_FORKID) && !sighash_type.has_forkid() {
            return false;
        }

        let hash = self.sighash(script_code, sighash_type);
        verify_signature(body, &key, &hash)
    }

    fn check_lock_time(&self, lock_time: ScriptNum) -> bool {
        let n_lock_time = lock_time.value();
        let tx_lock_time = i64::from(self.tx.lock_time);
        let threshold = i64::from(LOCKTIME_THRESHOLD);

        // Heights and timestamps are not comparable.
        if (tx_lock_time < threshold) != (n_lock_time < threshold) {
            return false;
        }
        if n_lock_time > tx_lock_time {
            return false;
        }

        // A final input would let the transaction bypass nLockTime entirely.
        match self.tx.inputs.get(self.n_in) {
            Some(input) => input.sequence_number != SEQUENCE_FINAL,
            None => false,
        }
    }

    fn check_sequence(&self, sequence: ScriptNum) -> bool {
        let Some(input) = self.tx.inputs.get(self.n_in) else {
            return false;
        };
        let tx_sequence = i64::from(input.sequence_number);

        // Relative locktimes need version 2 (BIP68). The comparison is on
        // the version as unsigned.
        if (self.tx.version as u32) < 2 {
            return false;
        }
        if tx_sequence & i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
            return false;
        }

        let mask = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG | SEQUENCE_LOCKTIME_MASK);
        let tx_masked = tx_sequence & mask;
        let n_masked = sequence.value() & mask;
        let type_flag = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG);

        if (tx_masked < type_flag) != (n_masked < type_flag) {
            return false;
        }
        n_masked <= tx_masked
    }
}

/// Checker that owns its transaction.
///
/// Useful while a transaction is still being assembled: the caller hands
/// over a snapshot and keeps editing its own copy.
pub struct MutableTransactionSignatureChecker {
    tx: Transaction,
    n_in: usize,
    amount: i64,
    flags: ScriptFlags,
}

impl MutableTransactionSignatureChecker {
    /// Create a checker over an owned transaction.
    pub fn new(tx: Transaction, n_in: usize, amount: i64, flags: ScriptFlags) -> Self {
        MutableTransactionSignatureChecker {
            tx,
            n_in,
            amount,
            flags,
        }
    }

    /// Borrowing checker over the owned transaction.
    pub fn as_checker(&self) -> TransactionSignatureChecker<'_> {
        TransactionSignatureChecker::new(&self.tx, self.n_in, self.amount, self.flags)
    }

    /// Give the transaction back.
    pub fn into_transaction(self) -> Transaction {
        self.tx
    }
}

impl SignatureChecker for MutableTransactionSignatureChecker {
    fn check_sig(&self, sig: &[u8], pubkey: &[u8], script_code: &Script) -> bool {
        self.as_checker().check_sig(sig, pubkey, script_code)
    }

    fn check_lock_time(&self, lock_time: ScriptNum) -> bool {
        self.as_checker().check_lock_time(lock_time)
    }

    fn check_sequence(&self, sequence: ScriptNum) -> bool {
        self.as_checker().check_sequence(sequence)
    }
}
