//! Script operation decoding and push encoding.
//!
//! A script is a sequence of operations: an opcode byte, optionally
//! followed by a length field and pushed bytes. This module reads one
//! operation at a time and encodes data pushes with the shortest prefix.

use crate::opcodes::*;
use crate::ScriptError;

/// A single decoded operation of a script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes), this is the length.
    pub op: u8,
    /// Pushed bytes. Empty for non-push opcodes.
    pub data: Vec<u8>,
}

impl ScriptChunk {
    /// Build a chunk for a non-push opcode.
    pub fn opcode(op: u8) -> Self {
        ScriptChunk { op, data: Vec::new() }
    }

    /// Human-readable opcode name.
    pub fn name(&self) -> &'static str {
        opcode_to_string(self.op)
    }

    /// Whether this operation carries data (`OP_0` through `OP_PUSHDATA4`).
    pub fn is_push_data(&self) -> bool {
        self.op <= OP_PUSHDATA4
    }

    /// Whether `data` was pushed using the shortest possible encoding.
    ///
    /// Only meaningful for push-data opcodes.
    pub fn is_minimal_push(&self) -> bool {
        let data = &self.data;
        match data.len() {
            0 => self.op == OP_0,
            1 if (1..=16).contains(&data[0]) => self.op == OP_1 + data[0] - 1,
            1 if data[0] == 0x81 => self.op == OP_1NEGATE,
            n if n <= OP_DATA_75 as usize => self.op as usize == n,
            n if n <= 0xff => self.op == OP_PUSHDATA1,
            n if n <= 0xffff => self.op == OP_PUSHDATA2,
            _ => true,
        }
    }

    /// Render for script assembly output.
    ///
    /// Data pushes render as hex, small integers as `OP_N`, and everything
    /// else by opcode name.
    pub fn to_asm_string(&self) -> String {
        match self.op {
            OP_0 => "OP_0".to_string(),
            OP_1NEGATE => "OP_1NEGATE".to_string(),
            op if (OP_1..=OP_16).contains(&op) => format!("OP_{}", decode_op_n(op)),
            op if op <= OP_PUSHDATA4 => hex::encode(&self.data),
            _ => self.name().to_string(),
        }
    }

    /// Serialize back into script bytes, keeping the original push opcode.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 5);
        out.push(self.op);
        match self.op {
            OP_PUSHDATA1 => out.push(self.data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(self.data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(self.data.len() as u32).to_le_bytes()),
            _ => {}
        }
        if self.is_push_data() {
            out.extend_from_slice(&self.data);
        }
        out
    }
}

/// Read the operation starting at `pos`.
///
/// # Arguments
/// * `bytes` - The raw script.
/// * `pos` - Offset of the opcode byte.
///
/// # Returns
/// The decoded chunk and the offset of the next operation, or `None` when
/// `pos` is at the end or the push is truncated.
pub fn read_op(bytes: &[u8], pos: usize) -> Option<(ScriptChunk, usize)> {
    let op = *bytes.get(pos)?;
    let mut cursor = pos + 1;

    let size = match op {
        OP_0..=OP_DATA_75 => op as usize,
        OP_PUSHDATA1 => {
            let b = *bytes.get(cursor)?;
            cursor += 1;
            b as usize
        }
        OP_PUSHDATA2 => {
            let b = bytes.get(cursor..cursor + 2)?;
            cursor += 2;
            u16::from_le_bytes([b[0], b[1]]) as usize
        }
        OP_PUSHDATA4 => {
            let b = bytes.get(cursor..cursor + 4)?;
            cursor += 4;
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
        }
        _ => return Some((ScriptChunk::opcode(op), cursor)),
    };

    let end = cursor.checked_add(size)?;
    let data = bytes.get(cursor..end)?.to_vec();
    Some((ScriptChunk { op, data }, end))
}

/// Decode a whole script into chunks.
///
/// # Returns
/// Every operation in order, or `ScriptError::DataTooSmall` if a push is
/// truncated.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (chunk, next) = read_op(bytes, pos).ok_or(ScriptError::DataTooSmall)?;
        chunks.push(chunk);
        pos = next;
    }
    Ok(chunks)
}

/// Compute the shortest push prefix for a payload of `data_len` bytes.
///
/// An empty payload is pushed with `OP_0`.
///
/// # Arguments
/// * `data_len` - The length of the data to be pushed.
///
/// # Returns
/// The prefix bytes, or `ScriptError::DataTooBig` beyond 4 GiB.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= OP_DATA_75 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xff {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xffff {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xffff_ffff {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode several payloads as consecutive pushes.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for part in parts {
        result.extend_from_slice(&push_data_prefix(part.len())?);
        result.extend_from_slice(part);
    }
    Ok(result)
}
