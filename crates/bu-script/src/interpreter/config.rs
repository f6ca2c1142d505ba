//! Consensus limits enforced by the interpreter.
//!
//! The operation budget is a per-call parameter; `MAX_OPS_PER_SCRIPT` is
//! the value consensus callers pass.

/// Maximum number of non-push operations per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// Maximum combined depth of the main and alt stacks.
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum script length in bytes.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum number of bytes pushable to the stack.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum number of public keys per multisig.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Default maximum byte length of a numeric operand.
pub const DEFAULT_SCRIPTNUM_SIZE: usize = 4;

/// Numeric operand width allowed for locktime opcodes.
pub const LOCKTIME_SCRIPTNUM_SIZE: usize = 5;

/// nLockTime values below this are block heights; at or above, timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;
