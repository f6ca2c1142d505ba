//! Script interpreter.
//!
//! Executes unlocking and locking scripts to verify transaction inputs under
//! a set of [`ScriptFlags`].
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate. Callers provide
//! a [`SignatureChecker`] implementation that binds signature and locktime
//! checks to a transaction input; [`NullChecker`] is used when there is none.
//!
//! [`ScriptMachine`] evaluates one script at a time and can be stepped
//! opcode by opcode. [`verify_script`] drives a machine through scriptSig,
//! scriptPubKey and an optional P2SH redeem script.
//!
//! # Example
//!
//! ```ignore
//! use bu_script::interpreter::{verify_script, NullChecker, ScriptFlags, MAX_OPS_PER_SCRIPT};
//!
//! verify_script(
//!     &script_sig,
//!     &script_pub_key,
//!     ScriptFlags::P2SH | ScriptFlags::STRICTENC,
//!     MAX_OPS_PER_SCRIPT,
//!     &NullChecker,
//! )?;
//! ```

pub mod bitfield;
pub mod checker;
pub mod config;
pub mod error;
pub mod flags;
pub mod machine;
pub mod scriptnum;
pub mod sigencoding;
pub mod sighashtype;
pub mod stack;
pub mod verify;

mod ops_arithmetic;
mod ops_crypto;
mod ops_data;
mod ops_flow;
mod ops_stack;

pub use checker::{NullChecker, SignatureChecker};
pub use config::MAX_OPS_PER_SCRIPT;
pub use error::{InterpreterError, ScriptErrorCode};
pub use flags::ScriptFlags;
pub use machine::{eval_script, ScriptMachine, ScriptStats};
pub use scriptnum::ScriptNum;
pub use sighashtype::SigHashType;
pub use stack::Stack;
pub use verify::{verify_script, verify_script_with_stats};
