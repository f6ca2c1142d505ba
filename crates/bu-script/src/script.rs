/// Script type: an opcode and push-data byte string.
///
/// A `Script` is an immutable-by-convention byte buffer. Parsing happens
/// lazily, one operation at a time, so a malformed script can still be
/// held, hashed and serialized; the malformation only surfaces when the
/// interpreter reaches it.

use std::fmt;

use crate::chunk::{decode_script, push_data_prefix, read_op, ScriptChunk};
use crate::interpreter::config::{MAX_PUBKEYS_PER_MULTISIG, MAX_SCRIPT_SIZE};
use crate::interpreter::ScriptFlags;
use crate::opcodes::*;
use crate::ScriptError;

/// A script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from an assembly string.
    ///
    /// Tokens that name an opcode (`OP_DUP`, `OP_0`..`OP_16`) are emitted
    /// directly; any other token is hex data pushed with the shortest prefix.
    /// This is the inverse of [`Script::to_asm`] for minimally pushed scripts.
    ///
    /// # Arguments
    /// * `asm` - A whitespace-separated assembly string.
    ///
    /// # Returns
    /// A `Script`, or an error if a token is neither an opcode nor hex.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) if op > OP_PUSHDATA4 || op == OP_0 => script.push_opcode(op),
                _ => {
                    let data = hex::decode(token)
                        .map_err(|_| ScriptError::ParseError(format!("bad token '{}'", token)))?;
                    script.append_push_data(&data)?;
                }
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Render the script as assembly.
    ///
    /// # Returns
    /// A space-separated string, with `[error]` appended if a truncated push
    /// ends the script.
    pub fn to_asm(&self) -> String {
        let mut parts = Vec::new();
        let mut pos = 0;
        while pos < self.0.len() {
            match read_op(&self.0, pos) {
                Some((chunk, next)) => {
                    parts.push(chunk.to_asm_string());
                    pos = next;
                }
                None => {
                    parts.push("[error]".to_string());
                    break;
                }
            }
        }
        parts.join(" ")
    }

    /// Return a reference to the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // -----------------------------------------------------------------------
    // Operation access
    // -----------------------------------------------------------------------

    /// Read the operation at byte offset `pc`.
    ///
    /// # Returns
    /// The operation and the offset just past it, or `None` at the end of
    /// the script or on a truncated push.
    pub fn get_op(&self, pc: usize) -> Option<(ScriptChunk, usize)> {
        read_op(&self.0, pc)
    }

    /// Iterate over operations. The iterator yields an error once and
    /// stops if a push is truncated.
    pub fn ops(&self) -> ScriptOps<'_> {
        ScriptOps {
            bytes: &self.0,
            pos: 0,
        }
    }

    /// Parse the script into a vector of decoded chunks.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// Sub-script from byte offset `start` to the end.
    pub fn tail(&self, start: usize) -> Script {
        Script(self.0.get(start..).unwrap_or_default().to_vec())
    }

    // -----------------------------------------------------------------------
    // Script classification
    // -----------------------------------------------------------------------

    /// True if every operation is a push (anything up to and including `OP_16`).
    ///
    /// A truncated push makes the script not push-only.
    pub fn is_push_only(&self) -> bool {
        self.ops().all(|op| matches!(op, Ok(chunk) if chunk.op <= OP_16))
    }

    /// Check for a pay-to-script-hash output.
    ///
    /// Matches exactly `OP_HASH160 <20-byte direct push> OP_EQUAL`. With
    /// `P2SH_32` set, `OP_HASH256 <32-byte direct push> OP_EQUAL` also
    /// matches. Hashes pushed through `OP_PUSHDATA*` never match.
    pub fn is_pay_to_script_hash(&self, flags: ScriptFlags) -> bool {
        self.is_p2sh() || (flags.has_flag(ScriptFlags::P2SH_32) && self.is_p2sh_32())
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// `OP_HASH256 <32 bytes> OP_EQUAL`
    pub fn is_p2sh_32(&self) -> bool {
        let b = &self.0;
        b.len() == 35 && b[0] == OP_HASH256 && b[1] == OP_DATA_32 && b[34] == OP_EQUAL
    }

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Check for a segwit-style witness program: a version opcode followed
    /// by a single direct push of 2 to 40 bytes.
    pub fn is_witness_program(&self) -> bool {
        self.witness_program().is_some()
    }

    /// Split a witness program into its version and program bytes.
    pub fn witness_program(&self) -> Option<(u8, &[u8])> {
        let b = &self.0;
        if b.len() < 4 || b.len() > 42 {
            return None;
        }
        if b[0] != OP_0 && !(OP_1..=OP_16).contains(&b[0]) {
            return None;
        }
        if b[1] as usize + 2 != b.len() {
            return None;
        }
        Some((decode_op_n(b[0]) as u8, &b[2..]))
    }

    /// True if the output can provably never be spent.
    pub fn is_unspendable(&self) -> bool {
        (!self.0.is_empty() && self.0[0] == OP_RETURN) || self.0.len() > MAX_SCRIPT_SIZE
    }

    // -----------------------------------------------------------------------
    // Signature operation counting
    // -----------------------------------------------------------------------

    /// Count signature operations.
    ///
    /// # Arguments
    /// * `flags` - `CHECKDATASIG` makes the data-signature opcodes count.
    /// * `accurate` - Use the preceding `OP_N` as the multisig key count
    ///   instead of assuming the maximum.
    ///
    /// # Returns
    /// The number of signature operations, counting up to a truncated push.
    pub fn sig_op_count(&self, flags: ScriptFlags, accurate: bool) -> usize {
        let mut n = 0;
        let mut last_op = OP_INVALIDOPCODE;
        for op in self.ops() {
            let Ok(chunk) = op else { break };
            match chunk.op {
                OP_CHECKSIG | OP_CHECKSIGVERIFY => n += 1,
                OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                    if accurate && (OP_1..=OP_16).contains(&last_op) {
                        n += decode_op_n(last_op) as usize;
                    } else {
                        n += MAX_PUBKEYS_PER_MULTISIG;
                    }
                }
                OP_CHECKDATASIG | OP_CHECKDATASIGVERIFY
                    if flags.has_flag(ScriptFlags::CHECKDATASIG) =>
                {
                    n += 1
                }
                _ => {}
            }
            last_op = chunk.op;
        }
        n
    }

    /// Count signature operations of a pay-to-script-hash spend.
    ///
    /// For P2SH outputs the redeem script is the last push of `script_sig`
    /// and is counted accurately. Non-P2SH outputs count their own sigops.
    pub fn p2sh_sig_op_count(&self, flags: ScriptFlags, script_sig: &Script) -> usize {
        if !self.is_pay_to_script_hash(flags) {
            return self.sig_op_count(flags, true);
        }

        let mut last_data: &[u8] = &[];
        let mut pos = 0;
        while pos < script_sig.0.len() {
            let Some((chunk, next)) = read_op(&script_sig.0, pos) else {
                return 0;
            };
            if chunk.op > OP_16 {
                return 0;
            }
            last_data = &script_sig.0[next - chunk.data.len()..next];
            pos = next;
        }
        Script::from_bytes(last_data).sig_op_count(flags, true)
    }

    // -----------------------------------------------------------------------
    // Mutation / building
    // -----------------------------------------------------------------------

    /// Append data with the shortest push prefix.
    ///
    /// # Arguments
    /// * `data` - The data bytes to push. Empty data pushes `OP_0`.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if the data is too large.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append non-push opcodes.
    ///
    /// # Returns
    /// An error if any opcode is a data push (`OP_DATA_1`..`OP_PUSHDATA4`).
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes.iter().find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op)) {
            return Err(ScriptError::ParseError(format!(
                "push opcode {:#04x} needs data; use append_push_data",
                op
            )));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Append a single opcode byte without validation.
    pub(crate) fn push_opcode(&mut self, op: u8) {
        self.0.push(op);
    }

    /// Append the minimal push of a number.
    ///
    /// `-1..=16` use the small-integer opcodes; anything else is pushed as
    /// its script-number encoding.
    pub fn push_int(&mut self, n: i64) {
        match encode_op_n(n) {
            Some(op) => self.0.push(op),
            None => {
                let bytes = crate::interpreter::ScriptNum::new(n).to_bytes();
                // A number encodes in at most 9 bytes, always a direct push.
                self.0.push(bytes.len() as u8);
                self.0.extend_from_slice(&bytes);
            }
        }
    }

    /// Append raw bytes verbatim.
    pub fn append_raw(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Remove every occurrence of `pattern` that starts on an operation
    /// boundary.
    ///
    /// # Returns
    /// The number of occurrences removed.
    pub fn find_and_delete(&mut self, pattern: &Script) -> usize {
        let b = &pattern.0;
        if b.is_empty() {
            return 0;
        }

        let src = &self.0;
        let mut result = Vec::with_capacity(src.len());
        let mut found = 0;
        let mut pc = 0;
        let mut kept_from = 0;
        loop {
            result.extend_from_slice(&src[kept_from..pc]);
            while src.len() - pc >= b.len() && &src[pc..pc + b.len()] == b.as_slice() {
                pc += b.len();
                found += 1;
            }
            kept_from = pc;
            match read_op(src, pc) {
                Some((_, next)) => pc = next,
                None => break,
            }
        }

        if found > 0 {
            result.extend_from_slice(&src[kept_from..]);
            self.0 = result;
        }
        found
    }

    /// Script consisting of a single push of `data`.
    pub fn from_push(data: &[u8]) -> Result<Script, ScriptError> {
        let mut s = Script::new();
        s.append_push_data(data)?;
        Ok(s)
    }
}

/// Iterator over the operations of a [`Script`].
pub struct ScriptOps<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for ScriptOps<'a> {
    type Item = Result<ScriptChunk, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        match read_op(self.bytes, self.pos) {
            Some((chunk, next)) => {
                self.pos = next;
                Some(Ok(chunk))
            }
            None => {
                self.pos = self.bytes.len();
                Some(Err(ScriptError::DataTooSmall))
            }
        }
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
