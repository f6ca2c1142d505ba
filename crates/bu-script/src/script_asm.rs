//! Parser for the human-written script notation used by test vectors.
//!
//! The notation differs from [`Script::from_asm`]:
//!
//! * decimal numbers (`5`, `-1`, `1000`) push a minimally encoded number;
//! * `0x`-prefixed hex is inserted verbatim, **not** pushed;
//! * `'text'` pushes the bytes of `text`;
//! * opcode names are accepted with or without the `OP_` prefix.
//!
//! When a raw one-byte direct-push opcode (`0x01`..`0x4b`) or an
//! `OP_PUSHDATA*` name is followed by raw hex, the hex must be exactly as
//! long as the push announces.

use crate::opcodes::*;
use crate::{Script, ScriptError};

/// Parse test-vector script notation into a [`Script`].
///
/// # Arguments
/// * `s` - Whitespace-separated tokens.
///
/// # Returns
/// The assembled script, or a `ScriptError::ParseError` naming the first
/// token that could not be understood.
pub fn parse_script(s: &str) -> Result<Script, ScriptError> {
    let mut result = Script::new();
    let mut push_size = 0usize;
    let mut next_push_size = 0usize;
    let mut script_size = 0usize;

    for word in s.split_whitespace() {
        check_push_size(&result, script_size, push_size)?;
        script_size = result.len();
        push_size = next_push_size;
        next_push_size = 0;

        if is_decimal(word) {
            let n: i64 = word
                .parse()
                .map_err(|_| ScriptError::ParseError(format!("number out of range: {}", word)))?;
            if n == i64::MIN {
                return Err(ScriptError::ParseError(format!("{} is a forbidden value", word)));
            }
            result.push_int(n);
            continue;
        }

        if let Some(hex_str) = word.strip_prefix("0x").filter(|h| !h.is_empty()) {
            let raw = hex::decode(hex_str).map_err(|_| {
                ScriptError::ParseError(format!(
                    "hex must be formatted in full-byte chunks: {}",
                    word
                ))
            })?;
            if push_size != 0 && raw.len() != push_size {
                return Err(push_size_mismatch());
            }
            if push_size == 0 && raw.len() == 1 && raw[0] < OP_PUSHDATA1 {
                next_push_size = raw[0] as usize;
            }
            result.append_raw(&raw);
            continue;
        }

        if word.len() >= 2 && word.starts_with('\'') && word.ends_with('\'') {
            result.append_push_data(word[1..word.len() - 1].as_bytes())?;
            continue;
        }

        match string_to_opcode(word) {
            Some(op) => {
                next_push_size = match op {
                    OP_PUSHDATA1 => 1,
                    OP_PUSHDATA2 => 2,
                    OP_PUSHDATA4 => 4,
                    _ => 0,
                };
                result.push_opcode(op);
            }
            None => {
                return Err(ScriptError::ParseError(format!(
                    "unrecognized token '{}' in: {}",
                    word, s
                )))
            }
        }
    }

    check_push_size(&result, script_size, push_size)?;
    Ok(result)
}

fn is_decimal(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn check_push_size(result: &Script, script_size: usize, push_size: usize) -> Result<(), ScriptError> {
    if push_size != 0 && result.len() - script_size != push_size {
        return Err(push_size_mismatch());
    }
    Ok(())
}

fn push_size_mismatch() -> ScriptError {
    ScriptError::ParseError("hex data does not match the number of bytes being pushed".to_string())
}
