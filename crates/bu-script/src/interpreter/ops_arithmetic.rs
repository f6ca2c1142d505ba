//! Arithmetic operations for the script interpreter.

use crate::opcodes::*;

use super::error::{InterpreterError, ScriptErrorCode};
use super::machine::ScriptMachine;
use super::scriptnum::ScriptNum;

impl<'a> ScriptMachine<'a> {
    pub(crate) fn op_unary_num(&mut self, op: u8) -> Result<(), InterpreterError> {
        self.stack.require(1)?;
        let m = self.pop_num()?;
        let r = match op {
            OP_1ADD => m.checked_add(ScriptNum::ONE)?,
            OP_1SUB => m.checked_sub(ScriptNum::ONE)?,
            OP_NEGATE => m.checked_neg()?,
            OP_ABS => m.abs()?,
            OP_NOT => ScriptNum::from(m.is_zero()),
            OP_0NOTEQUAL => ScriptNum::from(!m.is_zero()),
            _ => return Err(ScriptErrorCode::BadOpcode.into()),
        };
        self.stack.push_int(r);
        Ok(())
    }

    /// Two-operand numeric ops. `a` is the deeper operand, `b` the top.
    pub(crate) fn op_binary_num(&mut self, op: u8) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let a = self.num_at(1)?;
        let b = self.num_at(0)?;

        let r = match op {
            OP_ADD => a.checked_add(b)?,
            OP_SUB => a.checked_sub(b)?,
            OP_DIV => {
                if b.is_zero() {
                    return Err(InterpreterError::new(
                        ScriptErrorCode::DivByZero,
                        format!("division of {} by zero", a),
                    ));
                }
                a.checked_div(b)?
            }
            OP_MOD => {
                if b.is_zero() {
                    return Err(InterpreterError::new(
                        ScriptErrorCode::ModByZero,
                        format!("modulo of {} by zero", a),
                    ));
                }
                a.checked_rem(b)?
            }
            OP_BOOLAND => ScriptNum::from(!a.is_zero() && !b.is_zero()),
            OP_BOOLOR => ScriptNum::from(!a.is_zero() || !b.is_zero()),
            OP_NUMEQUAL | OP_NUMEQUALVERIFY => ScriptNum::from(a == b),
            OP_NUMNOTEQUAL => ScriptNum::from(a != b),
            OP_LESSTHAN => ScriptNum::from(a < b),
            OP_GREATERTHAN => ScriptNum::from(a > b),
            OP_LESSTHANOREQUAL => ScriptNum::from(a <= b),
            OP_GREATERTHANOREQUAL => ScriptNum::from(a >= b),
            OP_MIN => a.min(b),
            OP_MAX => a.max(b),
            _ => return Err(ScriptErrorCode::BadOpcode.into()),
        };

        self.stack.drop_n(2)?;
        self.stack.push_int(r);

        if op == OP_NUMEQUALVERIFY {
            self.abstract_verify(ScriptErrorCode::NumEqualVerify)?;
        }
        Ok(())
    }

    /// OP_WITHIN: (x min max -- min <= x < max)
    pub(crate) fn op_within(&mut self) -> Result<(), InterpreterError> {
        self.stack.require(3)?;
        let x = self.num_at(2)?;
        let min = self.num_at(1)?;
        let max = self.num_at(0)?;
        self.stack.drop_n(3)?;
        self.stack.push_bool(min <= x && x < max);
        Ok(())
    }
}
