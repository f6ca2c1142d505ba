//! Script number encoding and checked arithmetic.
//!
//! Numbers on the script stack are little-endian byte strings with the sign
//! in the most significant bit of the last byte. Numeric opcodes accept
//! operands of at most 4 bytes (5 for the locktime opcodes), so every
//! operand fits comfortably in an `i64`. Results may be wider than the
//! operands and stay valid until something tries to read them back as a
//! number.

use std::fmt;

use super::config::DEFAULT_SCRIPTNUM_SIZE;
use super::error::{InterpreterError, ScriptErrorCode};

/// Widest encoding that still decodes into an `i64`.
const MAX_NUM_BYTES: usize = 8;

/// A signed script integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScriptNum(i64);

impl ScriptNum {
    pub const ZERO: ScriptNum = ScriptNum(0);
    pub const ONE: ScriptNum = ScriptNum(1);

    pub fn new(value: i64) -> Self {
        ScriptNum(value)
    }

    /// Decode a stack element as a number.
    ///
    /// # Arguments
    /// * `bytes` - The stack element.
    /// * `require_minimal` - Reject encodings with a redundant trailing byte.
    /// * `max_len` - Maximum accepted encoding length in bytes.
    ///
    /// # Returns
    /// The decoded number, `NUMBER_OVERFLOW` if the element is longer than
    /// `max_len`, or `MINIMALDATA` if minimality is required and not met.
    pub fn from_bytes(
        bytes: &[u8],
        require_minimal: bool,
        max_len: usize,
    ) -> Result<Self, InterpreterError> {
        if bytes.len() > max_len.min(MAX_NUM_BYTES) {
            return Err(InterpreterError::new(
                ScriptErrorCode::NumberOverflow,
                format!(
                    "numeric value encoded as {} is {} bytes which exceeds the max allowed of {}",
                    hex::encode(bytes),
                    bytes.len(),
                    max_len
                ),
            ));
        }

        if require_minimal {
            check_minimal_data_encoding(bytes)?;
        }

        Ok(ScriptNum(decode_le_signed(bytes)))
    }

    /// Decode with the default operand width.
    pub fn from_operand(bytes: &[u8], require_minimal: bool) -> Result<Self, InterpreterError> {
        Self::from_bytes(bytes, require_minimal, DEFAULT_SCRIPTNUM_SIZE)
    }

    /// Minimal little-endian sign-magnitude encoding. Zero encodes as empty.
    pub fn to_bytes(self) -> Vec<u8> {
        if self.0 == 0 {
            return Vec::new();
        }

        let negative = self.0 < 0;
        let mut abs = self.0.unsigned_abs();
        let mut result = Vec::with_capacity(9);
        while abs > 0 {
            result.push((abs & 0xff) as u8);
            abs >>= 8;
        }

        // The top byte needs its high bit free for the sign.
        let last = result.len() - 1;
        if result[last] & 0x80 != 0 {
            result.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            result[last] |= 0x80;
        }

        result
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Saturating conversion to `i32`.
    pub fn to_i32(self) -> i32 {
        if self.0 > i32::MAX as i64 {
            i32::MAX
        } else if self.0 < i32::MIN as i64 {
            i32::MIN
        } else {
            self.0 as i32
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: ScriptNum) -> Result<ScriptNum, InterpreterError> {
        self.0
            .checked_add(other.0)
            .map(ScriptNum)
            .ok_or_else(|| overflow("addition", self, other))
    }

    pub fn checked_sub(self, other: ScriptNum) -> Result<ScriptNum, InterpreterError> {
        self.0
            .checked_sub(other.0)
            .map(ScriptNum)
            .ok_or_else(|| overflow("subtraction", self, other))
    }

    pub fn checked_neg(self) -> Result<ScriptNum, InterpreterError> {
        self.0
            .checked_neg()
            .map(ScriptNum)
            .ok_or_else(|| overflow("negation", self, ScriptNum::ZERO))
    }

    /// Truncating division. The caller has already rejected a zero divisor.
    pub fn checked_div(self, other: ScriptNum) -> Result<ScriptNum, InterpreterError> {
        self.0
            .checked_div(other.0)
            .map(ScriptNum)
            .ok_or_else(|| overflow("division", self, other))
    }

    /// Remainder with the sign of the dividend.
    pub fn checked_rem(self, other: ScriptNum) -> Result<ScriptNum, InterpreterError> {
        self.0
            .checked_rem(other.0)
            .map(ScriptNum)
            .ok_or_else(|| overflow("modulo", self, other))
    }

    pub fn abs(self) -> Result<ScriptNum, InterpreterError> {
        if self.0 < 0 {
            self.checked_neg()
        } else {
            Ok(self)
        }
    }
}

impl From<i64> for ScriptNum {
    fn from(v: i64) -> Self {
        ScriptNum(v)
    }
}

impl From<bool> for ScriptNum {
    fn from(v: bool) -> Self {
        ScriptNum(v as i64)
    }
}

impl fmt::Display for ScriptNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn overflow(op: &str, a: ScriptNum, b: ScriptNum) -> InterpreterError {
    InterpreterError::new(
        ScriptErrorCode::NumberOverflow,
        format!("{} of {} and {} overflows", op, a, b),
    )
}

fn decode_le_signed(bytes: &[u8]) -> i64 {
    let Some((&last, _)) = bytes.split_last() else {
        return 0;
    };

    let mut value: i64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        value |= (b as i64) << (8 * i);
    }

    if last & 0x80 != 0 {
        let mask = !(0x80_i64 << (8 * (bytes.len() - 1)));
        -(value & mask)
    } else {
        value
    }
}

/// Whether `data` is the minimal encoding of a number of at most `max_len` bytes.
pub fn is_minimally_encoded(data: &[u8], max_len: usize) -> bool {
    if data.len() > max_len {
        return false;
    }
    check_minimal_data_encoding(data).is_ok()
}

/// Rewrite `data` into the minimal encoding of the same number (used by OP_BIN2NUM).
pub fn minimally_encode(data: &[u8]) -> Vec<u8> {
    let Some((&last, _)) = data.split_last() else {
        return Vec::new();
    };

    if last & 0x7f != 0 {
        return data.to_vec();
    }

    if data.len() == 1 {
        return Vec::new();
    }

    if data[data.len() - 2] & 0x80 != 0 {
        return data.to_vec();
    }

    let mut data = data.to_vec();
    let mut i = data.len() - 1;
    while i > 0 {
        if data[i - 1] != 0 {
            if data[i - 1] & 0x80 != 0 {
                data[i] = last;
                data.truncate(i + 1);
            } else {
                data[i - 1] |= last;
                data.truncate(i);
            }
            return data;
        }
        i -= 1;
    }

    Vec::new()
}

/// Check that a numeric stack element carries no redundant trailing byte.
pub fn check_minimal_data_encoding(v: &[u8]) -> Result<(), InterpreterError> {
    let Some(&last) = v.last() else {
        return Ok(());
    };

    // The last byte may only be 0x00/0x80 when the byte before it needs
    // its high bit for magnitude.
    if last & 0x7f == 0 && (v.len() == 1 || v[v.len() - 2] & 0x80 == 0) {
        return Err(InterpreterError::new(
            ScriptErrorCode::MinimalData,
            format!("numeric value encoded as {} is not minimally encoded", hex::encode(v)),
        ));
    }

    Ok(())
}
