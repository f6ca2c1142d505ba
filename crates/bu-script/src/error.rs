/// Error types for script construction and parsing.
///
/// Evaluation failures are not reported here; they use
/// [`InterpreterError`](crate::interpreter::InterpreterError).
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// An opcode name was not recognized while parsing assembly.
    #[error("unknown opcode name: {0}")]
    UnknownOpcode(String),

    /// A token in assembly text could not be parsed.
    #[error("script parse error: {0}")]
    ParseError(String),

    /// A flag name was not recognized.
    #[error("unknown script flag: {0}")]
    UnknownFlag(String),

    /// Not enough data in script to complete a push operation.
    #[error("not enough data")]
    DataTooSmall,

    /// Push data exceeds what a single push can encode.
    #[error("data too big")]
    DataTooBig,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
