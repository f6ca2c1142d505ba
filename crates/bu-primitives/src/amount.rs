//! Monetary amounts in satoshis.

use std::fmt;

use crate::DeserializeError;

/// Satoshis per coin.
pub const COIN: i64 = 100_000_000;

/// No amount larger than this (in satoshi) is valid.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// Return whether `value` lies in `0..=MAX_MONEY`.
pub fn money_range(value: i64) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

/// A satoshi amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub i64);

impl Amount {
    /// Zero satoshis.
    pub const ZERO: Amount = Amount(0);

    /// Construct from satoshis.
    pub fn from_sat(sat: i64) -> Self {
        Amount(sat)
    }

    /// The value in satoshis.
    pub fn to_sat(self) -> i64 {
        self.0
    }

    /// Decode a little-endian signed amount.
    ///
    /// # Arguments
    /// * `bytes` - 1, 2, 4 or 8 bytes, sign-extended from the top byte.
    ///
    /// # Returns
    /// The amount, `BadLength` for any other width, or `OutOfRange` for a
    /// negative value or one above `MAX_MONEY`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let value = match bytes.len() {
            1 => i8::from_le_bytes([bytes[0]]) as i64,
            2 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            4 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                i64::from_le_bytes(buf)
            }
            n => return Err(DeserializeError::BadLength(n)),
        };
        if !money_range(value) {
            return Err(DeserializeError::OutOfRange(value));
        }
        Ok(Amount(value))
    }

    /// Encode as the 8-byte little-endian form used in transactions.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl From<i64> for Amount {
    fn from(sat: i64) -> Self {
        Amount(sat)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let coin = COIN as u64;
        write!(f, "{}{}.{:08}", sign, abs / coin, abs % coin)
    }
}
