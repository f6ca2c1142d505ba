//! Script execution stack.

use super::error::{InterpreterError, ScriptErrorCode};
use super::scriptnum::ScriptNum;

/// Interpret a stack element as a boolean.
///
/// Any non-zero byte makes the element true, except a lone 0x80 in the
/// last position (negative zero).
pub fn as_bool(t: &[u8]) -> bool {
    for (i, &b) in t.iter().enumerate() {
        if b != 0 {
            return !(i == t.len() - 1 && b == 0x80);
        }
    }
    false
}

/// Convert boolean to byte array.
pub fn from_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

/// A value stack of byte strings. The last element is the top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<Vec<u8>>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { items: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, data: Vec<u8>) {
        self.items.push(data);
    }

    pub fn push_int(&mut self, n: ScriptNum) {
        self.push(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push(from_bool(val));
    }

    pub fn pop(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.nip_n(0)
    }

    /// Borrow the element `idx` positions below the top.
    pub fn peek(&self, idx: usize) -> Result<&[u8], InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(&self.items[sz - idx - 1])
    }

    /// Remove and return the element `idx` positions below the top.
    pub fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.items.len();
        if idx >= sz {
            return Err(invalid_index(idx, sz));
        }
        Ok(self.items.remove(sz - idx - 1))
    }

    /// Fail with `INVALID_STACK_OPERATION` unless at least `n` items are present.
    pub fn require(&self, n: usize) -> Result<(), InterpreterError> {
        if self.items.len() < n {
            return Err(InterpreterError::new(
                ScriptErrorCode::InvalidStackOperation,
                format!("operation needs {} items but stack has {}", n, self.items.len()),
            ));
        }
        Ok(())
    }

    /// (x1 x2 -- x2 x1 x2)
    pub fn tuck(&mut self) -> Result<(), InterpreterError> {
        self.require(2)?;
        let top = self.peek(0)?.to_vec();
        let pos = self.items.len() - 2;
        self.items.insert(pos, top);
        Ok(())
    }

    pub fn drop_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.require(n)?;
        let keep = self.items.len() - n;
        self.items.truncate(keep);
        Ok(())
    }

    /// Duplicate the top `n` items, preserving order.
    pub fn dup_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.require(n)?;
        for _ in 0..n {
            let so = self.peek(n - 1)?.to_vec();
            self.push(so);
        }
        Ok(())
    }

    /// Rotate the top `3n` items left by `n`.
    pub fn rot_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.require(3 * n)?;
        let entry = 3 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push(so);
        }
        Ok(())
    }

    /// Swap the top `n` items with the `n` items below them.
    pub fn swap_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.require(2 * n)?;
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push(so);
        }
        Ok(())
    }

    /// Copy the `n` items below the top `n` items to the top.
    pub fn over_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        self.require(2 * n)?;
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.peek(entry)?.to_vec();
            self.push(so);
        }
        Ok(())
    }

    pub fn pick_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.peek(n)?.to_vec();
        self.push(so);
        Ok(())
    }

    pub fn roll_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.nip_n(n)?;
        self.push(so);
        Ok(())
    }

    /// Stack contents, bottom first.
    pub fn items(&self) -> &[Vec<u8>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Vec<u8>> {
        self.items
    }

    /// Replace the contents (last element is the top).
    pub fn set_items(&mut self, data: Vec<Vec<u8>>) {
        self.items = data;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl From<Vec<Vec<u8>>> for Stack {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Stack { items }
    }
}

fn invalid_index(idx: usize, sz: usize) -> InterpreterError {
    InterpreterError::new(
        ScriptErrorCode::InvalidStackOperation,
        format!("index {} is invalid for stack size {}", idx, sz),
    )
}
