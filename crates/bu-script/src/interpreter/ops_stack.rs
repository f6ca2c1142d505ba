//! Stack manipulation operations for the script interpreter.

use super::error::{InterpreterError, ScriptErrorCode};
use super::machine::ScriptMachine;
use super::scriptnum::ScriptNum;
use super::stack::as_bool;

impl<'a> ScriptMachine<'a> {
    pub(crate) fn op_to_alt_stack(&mut self) -> Result<(), InterpreterError> {
        let data = self.stack.pop()?;
        self.alt_stack.push(data);
        Ok(())
    }

    pub(crate) fn op_from_alt_stack(&mut self) -> Result<(), InterpreterError> {
        if self.alt_stack.is_empty() {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidAltstackOperation,
                "OP_FROMALTSTACK with an empty alt stack".to_string(),
            ));
        }
        let data = self.alt_stack.pop()?;
        self.stack.push(data);
        Ok(())
    }

    pub(crate) fn op_ifdup(&mut self) -> Result<(), InterpreterError> {
        let so = self.stack.peek(0)?;
        if as_bool(so) {
            let so = so.to_vec();
            self.stack.push(so);
        }
        Ok(())
    }

    pub(crate) fn op_nip(&mut self) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        self.stack.nip_n(1)?;
        Ok(())
    }

    /// OP_PICK / OP_ROLL: copy or move the item `n` below the top.
    pub(crate) fn op_pick_roll(&mut self, is_roll: bool) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let n = self.pop_num()?.to_i32();
        if n < 0 || n as usize >= self.stack.depth() {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidStackOperation,
                format!("index {} is invalid for stack size {}", n, self.stack.depth()),
            ));
        }
        if is_roll {
            self.stack.roll_n(n as usize)
        } else {
            self.stack.pick_n(n as usize)
        }
    }

    pub(crate) fn op_size(&mut self) -> Result<(), InterpreterError> {
        let len = self.stack.peek(0)?.len();
        self.stack.push_int(ScriptNum::new(len as i64));
        Ok(())
    }
}
