//! Checkbits for Schnorr-mode CHECKMULTISIG.

use super::error::{InterpreterError, ScriptErrorCode};

/// Decode a little-endian bitfield of `size` bits.
///
/// # Arguments
/// * `data` - The dummy element, exactly `ceil(size / 8)` bytes.
/// * `size` - Number of meaningful bits (the key count, at most 32).
///
/// # Returns
/// The bitfield, or `INVALID_BITFIELD_SIZE` on a length mismatch, or
/// `INVALID_BIT_RANGE` if a bit at position `size` or above is set.
pub fn decode_bitfield(data: &[u8], size: usize) -> Result<u32, InterpreterError> {
    if size > 32 || data.len() != (size + 7) / 8 {
        return Err(InterpreterError::new(
            ScriptErrorCode::InvalidBitfieldSize,
            format!("bitfield of {} bytes for {} keys", data.len(), size),
        ));
    }

    let bitfield = data
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, b)| acc | (*b as u32) << (8 * i));

    let mask = ((1u64 << size) - 1) as u32;
    if bitfield & mask != bitfield {
        return Err(InterpreterError::new(
            ScriptErrorCode::InvalidBitRange,
            format!("bitfield {:#x} has bits beyond key {}", bitfield, size),
        ));
    }
    Ok(bitfield)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bitfield() {
        assert_eq!(decode_bitfield(&[], 0).unwrap(), 0);
        assert_eq!(decode_bitfield(&[0x03], 3).unwrap(), 0b011);
        assert_eq!(decode_bitfield(&[0xff, 0x01], 9).unwrap(), 0x1ff);
        assert_eq!(decode_bitfield(&[0xff, 0xff, 0xff, 0xff], 32).unwrap(), u32::MAX);
    }

    #[test]
    fn test_decode_bitfield_errors() {
        let size_err = |d: &[u8], n| decode_bitfield(d, n).unwrap_err().code;
        assert_eq!(size_err(&[0x01, 0x00], 3), ScriptErrorCode::InvalidBitfieldSize);
        assert_eq!(size_err(&[], 1), ScriptErrorCode::InvalidBitfieldSize);
        assert_eq!(size_err(&[0x00; 5], 33), ScriptErrorCode::InvalidBitfieldSize);
        assert_eq!(size_err(&[0x08], 3), ScriptErrorCode::InvalidBitRange);
        assert_eq!(size_err(&[0xff, 0x02], 9), ScriptErrorCode::InvalidBitRange);
    }
}
