//! The script machine: a resumable interpreter over one script at a time.
//!
//! A machine keeps its stacks between scripts, so `verify_script` can run
//! scriptSig, scriptPubKey and a redeem script against the same state.
//! Evaluation can be driven to completion with [`ScriptMachine::eval`] or
//! single-stepped with `begin_step` / `step` / `end_step`, inspecting the
//! next operation with [`ScriptMachine::peek`] in between.

use crate::chunk::ScriptChunk;
use crate::opcodes::*;
use crate::Script;

use super::checker::SignatureChecker;
use super::config::{MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE, MAX_STACK_SIZE};
use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::scriptnum::ScriptNum;
use super::stack::Stack;

/// Resource usage accumulated over the lifetime of a machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptStats {
    /// Non-push operations of the most recently started script.
    pub op_count: usize,
    /// Signature checks performed with non-empty signatures, across all scripts.
    pub sig_check_count: usize,
}

/// Opcodes that fail even inside an unexecuted branch.
fn is_disabled(op: u8) -> bool {
    matches!(
        op,
        OP_2MUL | OP_2DIV | OP_INVERT | OP_MUL | OP_LSHIFT | OP_RSHIFT
    )
}

/// The execution state of one evaluation.
pub struct ScriptMachine<'a> {
    pub(crate) flags: ScriptFlags,
    pub(crate) checker: &'a dyn SignatureChecker,
    max_ops: usize,
    /// The main data stack.
    pub(crate) stack: Stack,
    /// The alternate stack used by OP_TOALTSTACK and OP_FROMALTSTACK.
    pub(crate) alt_stack: Stack,
    /// One entry per open IF; `false` while inside a branch not taken.
    pub(crate) cond_stack: Vec<bool>,
    /// The script being stepped.
    pub(crate) script: Script,
    /// Offset of the next operation.
    pub(crate) pc: usize,
    /// Start of the script code committed to by signatures.
    pub(crate) begin_code_hash: usize,
    /// Union of the hash types of every signature seen by CHECKSIG.
    pub(crate) sighashtype: u8,
    pub(crate) stats: ScriptStats,
}

impl<'a> ScriptMachine<'a> {
    /// Create a machine with empty stacks.
    ///
    /// # Arguments
    /// * `flags` - Verification flags, fixed for the machine's lifetime.
    /// * `checker` - Transaction checks for signature and locktime opcodes.
    /// * `max_ops` - Non-push operation budget per script.
    pub fn new(flags: ScriptFlags, checker: &'a dyn SignatureChecker, max_ops: usize) -> Self {
        ScriptMachine {
            flags,
            checker,
            max_ops,
            stack: Stack::new(),
            alt_stack: Stack::new(),
            cond_stack: Vec::new(),
            script: Script::new(),
            pc: 0,
            begin_code_hash: 0,
            sighashtype: 0,
            stats: ScriptStats::default(),
        }
    }

    pub fn flags(&self) -> ScriptFlags {
        self.flags
    }

    pub(crate) fn has_flag(&self, flag: ScriptFlags) -> bool {
        self.flags.has_flag(flag)
    }

    pub(crate) fn require_minimal(&self) -> bool {
        self.has_flag(ScriptFlags::MINIMALDATA)
    }

    /// True unless some enclosing IF branch is not taken.
    pub fn is_executing(&self) -> bool {
        self.cond_stack.iter().all(|&b| b)
    }

    // -----------------------------------------------------------------------
    // Whole-script evaluation
    // -----------------------------------------------------------------------

    /// Run `script` to completion against the current stacks.
    ///
    /// # Returns
    /// `Ok(())` if every operation succeeded and all conditionals closed.
    /// The stack is left as the script left it, also on error.
    pub fn eval(&mut self, script: &Script) -> Result<(), InterpreterError> {
        self.begin_step(script)?;
        while !self.is_finished() {
            self.step()?;
        }
        self.end_step()
    }

    /// Load `script` for stepping and reset per-script state.
    ///
    /// # Returns
    /// `SCRIPT_SIZE` if the script exceeds the maximum script length.
    pub fn begin_step(&mut self, script: &Script) -> Result<(), InterpreterError> {
        self.pc = 0;
        self.begin_code_hash = 0;
        self.sighashtype = 0;
        self.stats.op_count = 0;
        self.cond_stack.clear();

        if script.len() > MAX_SCRIPT_SIZE {
            self.script = Script::new();
            return Err(InterpreterError::new(
                ScriptErrorCode::ScriptSize,
                format!(
                    "script size {} is larger than the max allowed size {}",
                    script.len(),
                    MAX_SCRIPT_SIZE
                ),
            ));
        }
        self.script = script.clone();
        Ok(())
    }

    /// True once every operation of the loaded script has run.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.script.len()
    }

    /// Finish stepping. Fails if a conditional is still open.
    pub fn end_step(&mut self) -> Result<(), InterpreterError> {
        if !self.cond_stack.is_empty() {
            return Err(InterpreterError::new(
                ScriptErrorCode::UnbalancedConditional,
                "end of script reached in conditional execution".to_string(),
            ));
        }
        Ok(())
    }

    /// Inspect the next operation without running it.
    ///
    /// # Returns
    /// Whether the operation would execute, and the operation itself; or
    /// `BAD_OPCODE` for a truncated push and `PUSH_SIZE` for an oversized one.
    pub fn peek(&self) -> Result<(bool, ScriptChunk), InterpreterError> {
        let (chunk, _) = self.read_next()?;
        Ok((self.is_executing(), chunk))
    }

    /// Offset of the next operation within the loaded script.
    pub fn pos(&self) -> usize {
        self.pc
    }

    fn read_next(&self) -> Result<(ScriptChunk, usize), InterpreterError> {
        let (chunk, next) = self.script.get_op(self.pc).ok_or_else(|| {
            InterpreterError::new(
                ScriptErrorCode::BadOpcode,
                format!("malformed push at offset {}", self.pc),
            )
        })?;
        if chunk.data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(InterpreterError::new(
                ScriptErrorCode::PushSize,
                format!(
                    "element size {} exceeds max allowed size {}",
                    chunk.data.len(),
                    MAX_SCRIPT_ELEMENT_SIZE
                ),
            ));
        }
        Ok((chunk, next))
    }

    // -----------------------------------------------------------------------
    // Single operation
    // -----------------------------------------------------------------------

    /// Execute the next operation.
    pub fn step(&mut self) -> Result<(), InterpreterError> {
        let executing = self.is_executing();
        let (chunk, next) = self.read_next()?;
        self.pc = next;

        // OP_RESERVED is not counted.
        if chunk.op > OP_16 {
            self.stats.op_count += 1;
            if self.stats.op_count > self.max_ops {
                return Err(self.op_count_error());
            }
        }

        if is_disabled(chunk.op) {
            return Err(InterpreterError::new(
                ScriptErrorCode::DisabledOpcode,
                format!("attempt to execute disabled opcode {}", chunk.name()),
            ));
        }

        if executing && chunk.op <= OP_PUSHDATA4 {
            if self.require_minimal() && !chunk.is_minimal_push() {
                return Err(InterpreterError::new(
                    ScriptErrorCode::MinimalData,
                    format!("data push of {} bytes is not minimally encoded", chunk.data.len()),
                ));
            }
            self.stack.push(chunk.data);
        } else if executing || (OP_IF..=OP_ENDIF).contains(&chunk.op) {
            log::trace!(
                "pc {:>5} {} depth {} executing {}",
                self.pc,
                chunk.name(),
                self.stack.depth(),
                executing
            );
            self.execute_opcode(chunk.op, executing)?;
        }

        let combined = self.stack.depth() + self.alt_stack.depth();
        if combined > MAX_STACK_SIZE {
            return Err(InterpreterError::new(
                ScriptErrorCode::StackSize,
                format!("combined stack size {} > max allowed {}", combined, MAX_STACK_SIZE),
            ));
        }
        Ok(())
    }

    pub(crate) fn op_count_error(&self) -> InterpreterError {
        InterpreterError::new(
            ScriptErrorCode::OpCount,
            format!("exceeded max operation limit of {}", self.max_ops),
        )
    }

    pub(crate) fn add_op_count(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.stats.op_count += n;
        if self.stats.op_count > self.max_ops {
            return Err(self.op_count_error());
        }
        Ok(())
    }

    fn execute_opcode(&mut self, op: u8, executing: bool) -> Result<(), InterpreterError> {
        match op {
            OP_1NEGATE | OP_1..=OP_16 => {
                self.stack.push_int(ScriptNum::new(decode_op_n(op)));
                Ok(())
            }

            // Control
            OP_NOP => Ok(()),
            OP_CHECKLOCKTIMEVERIFY => self.op_check_lock_time_verify(),
            OP_CHECKSEQUENCEVERIFY => self.op_check_sequence_verify(),
            OP_NOP1 | OP_NOP4 | OP_NOP5 | OP_NOP6 | OP_NOP7 | OP_NOP8 | OP_NOP9 | OP_NOP10 => {
                self.op_upgradable_nop(op)
            }
            OP_IF | OP_NOTIF => self.op_if(op == OP_NOTIF, executing),
            OP_ELSE => self.op_else(),
            OP_ENDIF => self.op_endif(),
            OP_VERIFY => self.op_verify(),
            OP_RETURN => Err(ScriptErrorCode::OpReturn.into()),

            // Stack
            OP_TOALTSTACK => self.op_to_alt_stack(),
            OP_FROMALTSTACK => self.op_from_alt_stack(),
            OP_2DROP => self.stack.drop_n(2),
            OP_2DUP => self.stack.dup_n(2),
            OP_3DUP => self.stack.dup_n(3),
            OP_2OVER => self.stack.over_n(2),
            OP_2ROT => self.stack.rot_n(2),
            OP_2SWAP => self.stack.swap_n(2),
            OP_IFDUP => self.op_ifdup(),
            OP_DEPTH => {
                let depth = self.stack.depth() as i64;
                self.stack.push_int(ScriptNum::new(depth));
                Ok(())
            }
            OP_DROP => self.stack.drop_n(1),
            OP_DUP => self.stack.dup_n(1),
            OP_NIP => self.op_nip(),
            OP_OVER => self.stack.over_n(1),
            OP_PICK | OP_ROLL => self.op_pick_roll(op == OP_ROLL),
            OP_ROT => self.stack.rot_n(1),
            OP_SWAP => self.stack.swap_n(1),
            OP_TUCK => self.stack.tuck(),
            OP_SIZE => self.op_size(),

            // Byte strings
            OP_CAT => self.op_cat(),
            OP_SPLIT => self.op_split(),
            OP_REVERSEBYTES => self.op_reversebytes(),
            OP_NUM2BIN => self.op_num2bin(),
            OP_BIN2NUM => self.op_bin2num(),
            OP_AND => self.op_bitwise(|a, b| a & b),
            OP_OR => self.op_bitwise(|a, b| a | b),
            OP_XOR => self.op_bitwise(|a, b| a ^ b),
            OP_EQUAL | OP_EQUALVERIFY => self.op_equal(op == OP_EQUALVERIFY),

            // Numeric
            OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => self.op_unary_num(op),
            OP_ADD | OP_SUB | OP_DIV | OP_MOD | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL
            | OP_NUMEQUALVERIFY | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN
            | OP_LESSTHANOREQUAL | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => self.op_binary_num(op),
            OP_WITHIN => self.op_within(),

            // Crypto
            OP_RIPEMD160 | OP_SHA1 | OP_SHA256 | OP_HASH160 | OP_HASH256 => self.op_hash(op),
            OP_CODESEPARATOR => {
                self.begin_code_hash = self.pc;
                Ok(())
            }
            OP_CHECKSIG | OP_CHECKSIGVERIFY => self.op_checksig(op == OP_CHECKSIGVERIFY),
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                self.op_checkmultisig(op == OP_CHECKMULTISIGVERIFY)
            }
            OP_CHECKDATASIG | OP_CHECKDATASIGVERIFY => {
                self.op_checkdatasig(op == OP_CHECKDATASIGVERIFY)
            }

            _ => Err(InterpreterError::new(
                ScriptErrorCode::BadOpcode,
                format!("attempt to execute invalid opcode {}", opcode_to_string(op)),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Replace the main stack (last element is the top).
    pub fn set_stack(&mut self, items: Vec<Vec<u8>>) {
        self.stack.set_items(items);
    }

    pub fn alt_stack(&self) -> &Stack {
        &self.alt_stack
    }

    pub fn clear_alt_stack(&mut self) {
        self.alt_stack.clear();
    }

    /// Pop the top of the main stack.
    pub fn pop_stack(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.stack.pop()
    }

    /// Non-push operations counted in the current script.
    pub fn op_count(&self) -> usize {
        self.stats.op_count
    }

    /// Union of the hash type bytes seen by CHECKSIG in the current script.
    pub fn sighashtype(&self) -> u8 {
        self.sighashtype
    }

    pub fn stats(&self) -> ScriptStats {
        self.stats
    }

    /// Decode the element `idx` below the top as a number of default width.
    pub(crate) fn num_at(&self, idx: usize) -> Result<ScriptNum, InterpreterError> {
        ScriptNum::from_operand(self.stack.peek(idx)?, self.require_minimal())
    }

    pub(crate) fn pop_num(&mut self) -> Result<ScriptNum, InterpreterError> {
        let n = self.num_at(0)?;
        self.stack.pop()?;
        Ok(n)
    }
}

/// Evaluate a single script against `stack`.
///
/// # Arguments
/// * `stack` - Initial stack; receives the final stack, also on failure.
/// * `script` - The script to run.
/// * `flags` - Verification flags.
/// * `max_ops` - Non-push operation budget.
/// * `checker` - Transaction checks.
///
/// # Returns
/// `Ok(())` on success or the single error that stopped evaluation.
pub fn eval_script(
    stack: &mut Vec<Vec<u8>>,
    script: &Script,
    flags: ScriptFlags,
    max_ops: usize,
    checker: &dyn SignatureChecker,
) -> Result<(), InterpreterError> {
    let mut machine = ScriptMachine::new(flags, checker, max_ops);
    machine.set_stack(std::mem::take(stack));
    let result = machine.eval(script);
    *stack = machine.stack.into_items();
    result
}
