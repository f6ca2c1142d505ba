//! Bitcoin Unlimited script engine - Script container, opcodes, interpreter
//! and the VerifyScript driver.
//!
//! Provides the Script type, opcode definitions, script chunk parsing, the
//! test-vector script notation parser, and a consensus script interpreter.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod script_asm;
pub mod interpreter;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use chunk::ScriptChunk;
pub use script_asm::parse_script;
