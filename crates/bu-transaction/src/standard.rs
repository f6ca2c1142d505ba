//! Standard script templates.
//!
//! [`solver`] recognizes the output script templates a wallet knows how to
//! sign for and extracts their parameters (keys, hashes, multisig counts).
//! The `script_for_*` builders produce the same templates.

use std::fmt;

use bu_primitives::ec::PublicKey;
use bu_primitives::hash::{hash160, sha256d};
use bu_script::interpreter::{ScriptFlags, ScriptNum};
use bu_script::opcodes::*;
use bu_script::{Script, ScriptError};

/// Maximum payload of a relayed OP_RETURN output, not counting the
/// `OP_RETURN` itself and up to two push-prefix bytes.
pub const MAX_OP_RETURN_RELAY: usize = 223;

/// Output script template classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxnOutType {
    NonStandard,
    /// `<pubkey> OP_CHECKSIG`
    PubKey,
    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    PubKeyHash,
    /// `OP_HASH160 <20> OP_EQUAL`, or the 32-byte `OP_HASH256` form.
    ScriptHash,
    /// `m <pubkey>... n OP_CHECKMULTISIG`
    MultiSig,
    /// Frozen funds: `<locktime> OP_CHECKLOCKTIMEVERIFY OP_DROP <pubkey> OP_CHECKSIG`
    Cltv,
    /// `OP_RETURN <length> <label>`: a public label attached to a transaction.
    LabelPublic,
    /// `OP_RETURN` followed only by pushes.
    NullData,
}

impl TxnOutType {
    /// The name used in RPC output and logs.
    pub fn name(self) -> &'static str {
        match self {
            TxnOutType::NonStandard => "nonstandard",
            TxnOutType::PubKey => "pubkey",
            TxnOutType::PubKeyHash => "pubkeyhash",
            TxnOutType::ScriptHash => "scripthash",
            TxnOutType::MultiSig => "multisig",
            TxnOutType::Cltv => "cltv",
            TxnOutType::LabelPublic => "publiclabel",
            TxnOutType::NullData => "nulldata",
        }
    }
}

impl fmt::Display for TxnOutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a redeem script: its HASH160, or its double SHA-256 for
/// 32-byte P2SH.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptId {
    P2sh20([u8; 20]),
    P2sh32([u8; 32]),
}

impl ScriptId {
    /// 20-byte identifier of `script`.
    pub fn of(script: &Script) -> Self {
        ScriptId::P2sh20(hash160(script.to_bytes()))
    }

    /// 32-byte identifier of `script`.
    pub fn of_32(script: &Script) -> Self {
        ScriptId::P2sh32(sha256d(script.to_bytes()))
    }

    /// Interpret a P2SH solution (20 or 32 bytes).
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        match bytes.len() {
            20 => bytes.try_into().ok().map(ScriptId::P2sh20),
            32 => bytes.try_into().ok().map(ScriptId::P2sh32),
            _ => None,
        }
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ScriptId::P2sh20(h) => &h[..],
            ScriptId::P2sh32(h) => &h[..],
        }
    }
}

/// Where an output pays to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxDestination {
    /// HASH160 of a public key.
    KeyId([u8; 20]),
    /// A redeem script.
    Script(ScriptId),
}

/// Length a serialized public key must have given its first byte.
fn pubkey_len_for_header(header: u8) -> usize {
    match header {
        2 | 3 => 33,
        4 | 6 | 7 => 65,
        _ => 0,
    }
}

/// True if `data` has the length its header byte announces for a public key.
pub fn valid_pubkey_size(data: &[u8]) -> bool {
    match data.first() {
        Some(&header) => pubkey_len_for_header(header) == data.len(),
        None => false,
    }
}

fn is_small_positive(op: u8) -> bool {
    (OP_1..=OP_16).contains(&op)
}

/// Classify `script_pub_key` and extract its parameters.
///
/// # Arguments
/// * `script_pub_key` - The output script.
/// * `flags` - `P2SH_32` enables recognition of 32-byte script hashes.
///
/// # Returns
/// The template and its solutions:
///
/// | Template       | Solutions                                  |
/// |----------------|--------------------------------------------|
/// | `PubKey`       | `[pubkey]`                                 |
/// | `PubKeyHash`   | `[hash160]`                                |
/// | `ScriptHash`   | `[script hash]` (20 or 32 bytes)           |
/// | `MultiSig`     | `[[m], pubkey..., [n]]`                    |
/// | `Cltv`         | `[locktime, pubkey]`                       |
/// | `LabelPublic`  | `[length, label]`                          |
/// | `NullData`     | `[]`                                       |
/// | `NonStandard`  | `[]`                                       |
pub fn solver(script_pub_key: &Script, flags: ScriptFlags) -> (TxnOutType, Vec<Vec<u8>>) {
    let bytes = script_pub_key.to_bytes();

    // Script hashes are the most constrained template; check them first.
    if script_pub_key.is_p2sh() {
        return (TxnOutType::ScriptHash, vec![bytes[2..22].to_vec()]);
    }
    if flags.has_flag(ScriptFlags::P2SH_32) && script_pub_key.is_p2sh_32() {
        return (TxnOutType::ScriptHash, vec![bytes[2..34].to_vec()]);
    }

    // Must precede the generic OP_RETURN match, which would swallow it.
    if let Some(data) = match_label_public(script_pub_key) {
        return (TxnOutType::LabelPublic, data);
    }

    if bytes.first() == Some(&OP_RETURN) && script_pub_key.tail(1).is_push_only() {
        return (TxnOutType::NullData, Vec::new());
    }

    if let Some(pubkey) = match_pay_to_pubkey(bytes) {
        return (TxnOutType::PubKey, vec![pubkey]);
    }

    if script_pub_key.is_p2pkh() {
        return (TxnOutType::PubKeyHash, vec![bytes[3..23].to_vec()]);
    }

    if let Some(data) = match_freeze_cltv(script_pub_key) {
        return (TxnOutType::Cltv, data);
    }

    if let Some((required, keys)) = match_multisig(script_pub_key) {
        let n = keys.len() as u8;
        let mut solutions = Vec::with_capacity(keys.len() + 2);
        solutions.push(vec![required]);
        solutions.extend(keys);
        solutions.push(vec![n]);
        return (TxnOutType::MultiSig, solutions);
    }

    (TxnOutType::NonStandard, Vec::new())
}

fn match_pay_to_pubkey(bytes: &[u8]) -> Option<Vec<u8>> {
    for len in [65usize, 33] {
        if bytes.len() == len + 2 && bytes[0] as usize == len && bytes[len + 1] == OP_CHECKSIG {
            let pubkey = &bytes[1..len + 1];
            return valid_pubkey_size(pubkey).then(|| pubkey.to_vec());
        }
    }
    None
}

fn match_label_public(script: &Script) -> Option<Vec<Vec<u8>>> {
    if script.to_bytes().first() != Some(&OP_RETURN) || !script.tail(1).is_push_only() {
        return None;
    }

    let (id, next) = script.get_op(1)?;
    let id_num = ScriptNum::from_bytes(&id.data, true, 5).ok()?;

    let mut declared_len: u8 = 0;
    if is_small_positive(id.op) {
        declared_len = decode_op_n(id.op) as u8;
    }
    if id_num.value() > 0 {
        // Truncated to a byte after saturating to 32 bits.
        declared_len = id_num.value().min(i64::from(i32::MAX)) as u8;
    }
    if declared_len == 0 {
        return None;
    }

    let (label, _) = script.get_op(next)?;
    if label.data.len() != declared_len as usize {
        return None;
    }
    Some(vec![id.data, label.data])
}

fn match_freeze_cltv(script: &Script) -> Option<Vec<Vec<u8>>> {
    let bytes = script.to_bytes();
    if bytes.last() != Some(&OP_CHECKSIG) {
        return None;
    }

    let (lock_time, pc) = script.get_op(0)?;
    ScriptNum::from_bytes(&lock_time.data, true, 5).ok()?;
    if bytes.get(pc) != Some(&OP_CHECKLOCKTIMEVERIFY) || bytes.get(pc + 1) != Some(&OP_DROP) {
        return None;
    }

    let (pubkey, next) = script.get_op(pc + 2)?;
    if !valid_pubkey_size(&pubkey.data) || next + 1 != bytes.len() {
        return None;
    }
    Some(vec![lock_time.data, pubkey.data])
}

fn match_multisig(script: &Script) -> Option<(u8, Vec<Vec<u8>>)> {
    let bytes = script.to_bytes();
    if bytes.last() != Some(&OP_CHECKMULTISIG) {
        return None;
    }

    let (first, mut pc) = script.get_op(0)?;
    if !is_small_positive(first.op) {
        return None;
    }
    let required = decode_op_n(first.op) as u8;

    let mut keys = Vec::new();
    let last_op = loop {
        let (chunk, next) = script.get_op(pc)?;
        pc = next;
        if !valid_pubkey_size(&chunk.data) {
            break chunk.op;
        }
        if chunk.op > OP_PUSHDATA4 || !chunk.is_minimal_push() {
            return None;
        }
        keys.push(chunk.data);
    };

    if !is_small_positive(last_op) {
        return None;
    }
    let n_keys = decode_op_n(last_op) as usize;
    if keys.len() != n_keys || n_keys < required as usize {
        return None;
    }
    (pc + 1 == bytes.len()).then_some((required, keys))
}

/// The destination an output pays to, for single-destination templates.
///
/// # Returns
/// `None` for multisig, data outputs, and pubkeys that do not parse.
pub fn extract_destination(script_pub_key: &Script, flags: ScriptFlags) -> Option<TxDestination> {
    let (kind, solutions) = solver(script_pub_key, flags);
    match kind {
        TxnOutType::PubKey => key_destination(&solutions[0]),
        TxnOutType::Cltv => key_destination(&solutions[1]),
        TxnOutType::PubKeyHash => solutions[0].as_slice().try_into().ok().map(TxDestination::KeyId),
        TxnOutType::ScriptHash => ScriptId::from_slice(&solutions[0]).map(TxDestination::Script),
        _ => None,
    }
}

/// All destinations of an output and how many of them must sign.
///
/// # Returns
/// `(template, destinations, required)`, or `None` for data outputs,
/// non-standard scripts, and multisig scripts without a valid key.
pub fn extract_destinations(
    script_pub_key: &Script,
    flags: ScriptFlags,
) -> Option<(TxnOutType, Vec<TxDestination>, usize)> {
    let (kind, solutions) = solver(script_pub_key, flags);
    match kind {
        TxnOutType::NonStandard | TxnOutType::NullData => None,
        TxnOutType::MultiSig => {
            let required = solutions[0][0] as usize;
            let destinations: Vec<_> = solutions[1..solutions.len() - 1]
                .iter()
                .filter_map(|key| key_destination(key))
                .collect();
            (!destinations.is_empty()).then_some((kind, destinations, required))
        }
        _ => extract_destination(script_pub_key, flags).map(|d| (kind, vec![d], 1)),
    }
}

fn key_destination(pubkey: &[u8]) -> Option<TxDestination> {
    PublicKey::from_bytes(pubkey)
        .ok()
        .map(|_| TxDestination::KeyId(hash160(pubkey)))
}

// -----------------------------------------------------------------------
// Template builders
// -----------------------------------------------------------------------

/// Output script paying to `dest`.
pub fn script_for_destination(dest: &TxDestination) -> Script {
    let mut script = Script::new();
    match dest {
        TxDestination::KeyId(key_id) => {
            script.append_raw(&[OP_DUP, OP_HASH160, OP_DATA_20]);
            script.append_raw(key_id);
            script.append_raw(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        }
        TxDestination::Script(ScriptId::P2sh20(hash)) => {
            script.append_raw(&[OP_HASH160, OP_DATA_20]);
            script.append_raw(hash);
            script.append_raw(&[OP_EQUAL]);
        }
        TxDestination::Script(ScriptId::P2sh32(hash)) => {
            script.append_raw(&[OP_HASH256, OP_DATA_32]);
            script.append_raw(hash);
            script.append_raw(&[OP_EQUAL]);
        }
    }
    script
}

/// `<pubkey> OP_CHECKSIG`
pub fn script_for_raw_pubkey(pubkey: &PublicKey) -> Script {
    let mut script = Script::new();
    let key = pubkey.to_bytes();
    script.append_raw(&[key.len() as u8]);
    script.append_raw(&key);
    script.append_raw(&[OP_CHECKSIG]);
    script
}

/// `m <pubkey>... n OP_CHECKMULTISIG`
///
/// # Returns
/// `ScriptError::ParseError` unless `1 <= required <= keys.len() <= 16`.
pub fn script_for_multisig(required: usize, keys: &[PublicKey]) -> Result<Script, ScriptError> {
    if required == 0 || required > keys.len() || keys.len() > 16 {
        return Err(ScriptError::ParseError(format!(
            "cannot build {}-of-{} multisig",
            required,
            keys.len()
        )));
    }
    let mut script = Script::new();
    script.push_int(required as i64);
    for key in keys {
        script.append_push_data(&key.to_bytes())?;
    }
    script.push_int(keys.len() as i64);
    script.append_raw(&[OP_CHECKMULTISIG]);
    Ok(script)
}

/// `<lock_time> OP_CHECKLOCKTIMEVERIFY OP_DROP <pubkey> OP_CHECKSIG`
pub fn script_for_freeze(lock_time: i64, pubkey: &PublicKey) -> Script {
    let mut script = Script::new();
    script.push_int(lock_time);
    script.append_raw(&[OP_CHECKLOCKTIMEVERIFY, OP_DROP]);
    let key = pubkey.to_bytes();
    script.append_raw(&[key.len() as u8]);
    script.append_raw(&key);
    script.append_raw(&[OP_CHECKSIG]);
    script
}

/// `OP_RETURN <len(label)> <label>`, or an empty script for an empty label.
pub fn script_for_label_public(label: &str) -> Result<Script, ScriptError> {
    let mut script = Script::new();
    if label.is_empty() {
        return Ok(script);
    }
    script.append_raw(&[OP_RETURN]);
    script.push_int(label.len() as i64);
    script.append_push_data(label.as_bytes())?;
    Ok(script)
}
