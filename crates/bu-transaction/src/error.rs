/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid (e.g. an input index out of range).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// A signature could not be produced (e.g. a key is missing from the keystore).
    #[error("signing error: {0}")]
    SigningError(String),
    /// The signer could not complete a scriptSig. `script_sig` holds
    /// whatever signatures it did manage to produce.
    #[error("incomplete signature: {reason}")]
    IncompleteSignature {
        script_sig: bu_script::Script,
        reason: String,
    },
    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An underlying script error (forwarded from `bu-script`).
    #[error("script error: {0}")]
    Script(#[from] bu_script::ScriptError),
    /// A script failed verification (forwarded from the interpreter).
    #[error("script verification failed: {0}")]
    Interpreter(#[from] bu_script::interpreter::InterpreterError),
    /// An underlying primitives error (forwarded from `bu-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] bu_primitives::PrimitivesError),
}
