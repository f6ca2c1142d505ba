//! Byte string operations: splice, conversion, bitwise logic and equality.

use super::config::{DEFAULT_SCRIPTNUM_SIZE, MAX_SCRIPT_ELEMENT_SIZE};
use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::machine::ScriptMachine;
use super::scriptnum::{is_minimally_encoded, minimally_encode};

impl<'a> ScriptMachine<'a> {
    pub(crate) fn op_cat(&mut self) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let total = self.stack.peek(0)?.len() + self.stack.peek(1)?.len();
        if total > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(InterpreterError::new(
                ScriptErrorCode::PushSize,
                format!(
                    "concatenated size {} exceeds max allowed size {}",
                    total, MAX_SCRIPT_ELEMENT_SIZE
                ),
            ));
        }
        let b = self.stack.pop()?;
        let mut a = self.stack.pop()?;
        a.extend_from_slice(&b);
        self.stack.push(a);
        Ok(())
    }

    pub(crate) fn op_split(&mut self) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let n = self.num_at(0)?.value();
        let len = self.stack.peek(1)?.len();
        if n < 0 || n as usize > len {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidSplitRange,
                format!("split position {} outside of [0, {}]", n, len),
            ));
        }
        self.stack.pop()?;
        let mut a = self.stack.pop()?;
        let b = a.split_off(n as usize);
        self.stack.push(a);
        self.stack.push(b);
        Ok(())
    }

    pub(crate) fn op_reversebytes(&mut self) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::REVERSEBYTES) {
            return Err(InterpreterError::new(
                ScriptErrorCode::BadOpcode,
                "OP_REVERSEBYTES is not enabled".to_string(),
            ));
        }
        let mut data = self.stack.pop()?;
        data.reverse();
        self.stack.push(data);
        Ok(())
    }

    /// OP_NUM2BIN: re-encode a number into exactly `size` bytes.
    pub(crate) fn op_num2bin(&mut self) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let size = self.num_at(0)?.value();
        if size < 0 || size as usize > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(InterpreterError::new(
                ScriptErrorCode::PushSize,
                format!("requested size {} exceeds max allowed size {}", size, MAX_SCRIPT_ELEMENT_SIZE),
            ));
        }
        let size = size as usize;
        self.stack.pop()?;

        let mut num = minimally_encode(&self.stack.pop()?);
        if num.len() > size {
            return Err(InterpreterError::new(
                ScriptErrorCode::ImpossibleEncoding,
                format!("cannot fit {} bytes into {}", num.len(), size),
            ));
        }

        if num.len() < size {
            let mut sign = 0x00;
            if let Some(last) = num.last_mut() {
                sign = *last & 0x80;
                *last &= 0x7f;
            }
            num.resize(size - 1, 0x00);
            num.push(sign);
        }

        self.stack.push(num);
        Ok(())
    }

    pub(crate) fn op_bin2num(&mut self) -> Result<(), InterpreterError> {
        let num = minimally_encode(&self.stack.pop()?);
        if !is_minimally_encoded(&num, DEFAULT_SCRIPTNUM_SIZE) {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidNumberRange,
                format!("{} is not a valid script number", hex::encode(&num)),
            ));
        }
        self.stack.push(num);
        Ok(())
    }

    /// OP_AND / OP_OR / OP_XOR over two equally sized operands.
    pub(crate) fn op_bitwise(&mut self, f: fn(u8, u8) -> u8) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        if self.stack.peek(0)?.len() != self.stack.peek(1)?.len() {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidOperandSize,
                "byte arrays are not the same length".to_string(),
            ));
        }
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        let c = a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect();
        self.stack.push(c);
        Ok(())
    }

    pub(crate) fn op_equal(&mut self, verify: bool) -> Result<(), InterpreterError> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        self.stack.push_bool(a == b);
        if verify {
            self.abstract_verify(ScriptErrorCode::EqualVerify)?;
        }
        Ok(())
    }
}
