//! Transactions for the Bitcoin Unlimited script engine.
//!
//! Provides the transaction model and its wire format, legacy and FORKID
//! signature hashes, the transaction-bound signature checker used by the
//! interpreter, standard script templates, relay policy, and a signer that
//! produces and combines scriptSigs.

pub mod checker;
pub mod input;
pub mod keystore;
pub mod output;
pub mod policy;
pub mod sighash;
pub mod sign;
pub mod standard;
pub mod transaction;

mod error;
pub use checker::{MutableTransactionSignatureChecker, TransactionSignatureChecker};
pub use error::TransactionError;
pub use input::TransactionInput;
pub use keystore::{BasicKeyStore, KeyStore};
pub use output::TransactionOutput;
pub use policy::PolicyConfig;
pub use sign::{combine_signatures, produce_signature, sign_signature, SigType};
pub use standard::{solver, TxnOutType};
pub use transaction::Transaction;
