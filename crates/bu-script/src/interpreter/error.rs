//! Interpreter error codes and the error value carried out of evaluation.

use std::fmt;

macro_rules! script_error_codes {
    ($( $variant:ident => $name:literal, $message:literal; )*) => {
        /// Reasons a script evaluation can fail.
        ///
        /// Exactly one code is produced per failing evaluation. `Ok` is the
        /// code of a successful evaluation and never appears inside an `Err`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ScriptErrorCode {
            $( $variant, )*
        }

        impl ScriptErrorCode {
            /// Every code, in declaration order.
            pub const ALL: &'static [ScriptErrorCode] = &[ $( ScriptErrorCode::$variant, )* ];

            /// Stable upper-snake name, as used in test vectors.
            pub fn name(self) -> &'static str {
                match self {
                    $( ScriptErrorCode::$variant => $name, )*
                }
            }

            /// Human-readable description.
            pub fn message(self) -> &'static str {
                match self {
                    $( ScriptErrorCode::$variant => $message, )*
                }
            }

            /// Look a code up by its stable name.
            pub fn from_name(name: &str) -> Option<ScriptErrorCode> {
                match name {
                    $( $name => Some(ScriptErrorCode::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

script_error_codes! {
    Ok => "OK", "No error";
    UnknownError => "UNKNOWN_ERROR", "unknown error";
    EvalFalse => "EVAL_FALSE", "Script evaluated without error but finished with a false/empty top stack element";
    OpReturn => "OP_RETURN", "OP_RETURN was encountered";

    ScriptSize => "SCRIPT_SIZE", "Script is too big";
    PushSize => "PUSH_SIZE", "Push value size limit exceeded";
    OpCount => "OP_COUNT", "Operation limit exceeded";
    StackSize => "STACK_SIZE", "Stack size limit exceeded";
    SigCount => "SIG_COUNT", "Signature count negative or greater than pubkey count";
    PubkeyCount => "PUBKEY_COUNT", "Pubkey count negative or limit exceeded";

    InvalidOperandSize => "INVALID_OPERAND_SIZE", "Invalid operand size";
    InvalidNumberRange => "INVALID_NUMBER_RANGE", "Given operand is not a number within the valid range [-2^31...2^31]";
    ImpossibleEncoding => "IMPOSSIBLE_ENCODING", "The requested encoding is impossible to satisfy";
    InvalidSplitRange => "INVALID_SPLIT_RANGE", "Invalid OP_SPLIT range";
    InvalidBitCount => "INVALID_BIT_COUNT", "Invalid number of bit set in OP_CHECKMULTISIG";

    Verify => "VERIFY", "Script failed an OP_VERIFY operation";
    EqualVerify => "EQUALVERIFY", "Script failed an OP_EQUALVERIFY operation";
    CheckMultisigVerify => "CHECKMULTISIGVERIFY", "Script failed an OP_CHECKMULTISIGVERIFY operation";
    CheckSigVerify => "CHECKSIGVERIFY", "Script failed an OP_CHECKSIGVERIFY operation";
    CheckDataSigVerify => "CHECKDATASIGVERIFY", "Script failed an OP_CHECKDATASIGVERIFY operation";
    NumEqualVerify => "NUMEQUALVERIFY", "Script failed an OP_NUMEQUALVERIFY operation";

    BadOpcode => "BAD_OPCODE", "Opcode missing or not understood";
    DisabledOpcode => "DISABLED_OPCODE", "Attempted to use a disabled opcode";
    InvalidStackOperation => "INVALID_STACK_OPERATION", "Operation not valid with the current stack size";
    InvalidAltstackOperation => "INVALID_ALTSTACK_OPERATION", "Operation not valid with the current altstack size";
    UnbalancedConditional => "UNBALANCED_CONDITIONAL", "Invalid OP_IF construction";

    NegativeLocktime => "NEGATIVE_LOCKTIME", "Negative locktime";
    UnsatisfiedLocktime => "UNSATISFIED_LOCKTIME", "Locktime requirement not satisfied";

    SigHashtype => "SIG_HASHTYPE", "Signature hash type missing or not understood";
    SigDer => "SIG_DER", "Non-canonical DER signature";
    MinimalData => "MINIMALDATA", "Data push larger than necessary";
    SigPushOnly => "SIG_PUSHONLY", "Only non-push operators allowed in signatures";
    SigHighS => "SIG_HIGH_S", "Non-canonical signature: S value is unnecessarily high";
    SigNullDummy => "SIG_NULLDUMMY", "Dummy CHECKMULTISIG argument must be zero";
    MinimalIf => "MINIMALIF", "OP_IF/NOTIF argument must be minimal";
    SigNullFail => "SIG_NULLFAIL", "Signature must be zero for failed CHECK(MULTI)SIG operation";
    PubkeyType => "PUBKEYTYPE", "Public key is neither compressed or uncompressed";
    CleanStack => "CLEANSTACK", "Script did not clean its stack";
    NonCompressedPubkey => "NONCOMPRESSED_PUBKEY", "Using non-compressed public key";
    SigBadLength => "SIG_BADLENGTH", "Signature cannot be 65 bytes in CHECKMULTISIG";
    SigNonSchnorr => "SIG_NONSCHNORR", "Only Schnorr signatures allowed in this operation";

    DiscourageUpgradableNops => "DISCOURAGE_UPGRADABLE_NOPS", "NOPx reserved for soft-fork upgrades";

    MustUseForkId => "MUST_USE_FORKID", "Signature must use SIGHASH_FORKID";

    DivByZero => "DIV_BY_ZERO", "Division by zero error";
    ModByZero => "MOD_BY_ZERO", "Modulo by zero error";
    NumberOverflow => "NUMBER_OVERFLOW", "Script number overflow";
    NumberBadEncoding => "NUMBER_BAD_ENCODING", "Non-minimally encoded script number";

    InvalidBitfieldSize => "INVALID_BITFIELD_SIZE", "Bitfield of unexpected size error";
    InvalidBitRange => "INVALID_BIT_RANGE", "Bitfield's bit out of the expected range";
}

impl fmt::Display for ScriptErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script interpreter error with an error code and description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterError {
    pub code: ScriptErrorCode,
    pub description: String,
}

impl InterpreterError {
    pub fn new(code: ScriptErrorCode, description: String) -> Self {
        InterpreterError { code, description }
    }
}

impl From<ScriptErrorCode> for InterpreterError {
    fn from(code: ScriptErrorCode) -> Self {
        InterpreterError {
            code,
            description: code.message().to_string(),
        }
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl std::error::Error for InterpreterError {}

/// Check if an error has a specific error code.
pub fn is_error_code(err: &InterpreterError, code: ScriptErrorCode) -> bool {
    err.code == code
}
