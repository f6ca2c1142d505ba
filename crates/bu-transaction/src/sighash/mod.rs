//! Signature hash computation for transaction signing.
//!
//! Computes the digest a signature commits to. Two algorithms exist:
//!
//! * the legacy algorithm, which serializes a modified copy of the
//!   transaction, and
//! * the BIP143-style FORKID algorithm introduced with replay protection,
//!   which commits to the spent amount and hashes prevouts, sequences and
//!   outputs separately.
//!
//! [`signature_hash`] selects between them from the hash type and flags.
//!
//! See <https://github.com/bitcoincashorg/bitcoincash.org/blob/master/spec/replay-protected-sighash.md>

use bu_primitives::hash::sha256d;
use bu_primitives::util::{VarInt, WireWriter};
use bu_script::interpreter::{ScriptFlags, SigHashType};
use bu_script::opcodes::OP_CODESEPARATOR;
use bu_script::Script;

use crate::input::TransactionInput;
use crate::transaction::Transaction;
use crate::TransactionError;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// The digest returned for signature requests that cannot be satisfied:
/// the number one as a little-endian 256-bit integer.
pub const SIGHASH_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Compute the signature hash for input `n_in` of `tx`.
///
/// The FORKID algorithm is used when `flags` has `SIGHASH_FORKID` and the
/// hash type carries the FORKID bit; otherwise the legacy algorithm.
///
/// # Arguments
/// * `script_code` - The script the signature commits to.
/// * `tx` - The spending transaction.
/// * `n_in` - Index of the input being signed.
/// * `sighash_type` - Hash type of the signature.
/// * `amount` - Value of the output being spent.
/// * `flags` - Verification flags in force.
///
/// # Returns
/// The 32-byte digest. An out-of-range input yields [`SIGHASH_ONE`].
pub fn signature_hash(
    script_code: &Script,
    tx: &Transaction,
    n_in: usize,
    sighash_type: SigHashType,
    amount: i64,
    flags: ScriptFlags,
) -> [u8; 32] {
    if sighash_type.has_forkid() && flags.has_flag(ScriptFlags::SIGHASH_FORKID) {
        signature_hash_forkid(script_code, tx, n_in, sighash_type, amount)
    } else {
        signature_hash_legacy(script_code, tx, n_in, sighash_type)
    }
}

// -----------------------------------------------------------------------
// BIP143-style (FORKID) signature hash
// -----------------------------------------------------------------------

/// Compute the FORKID signature hash.
///
/// # Returns
/// The double-SHA256 of [`calc_preimage`], or [`SIGHASH_ONE`] if the hash
/// type lacks the FORKID bit or `n_in` is out of range.
pub fn signature_hash_forkid(
    script_code: &Script,
    tx: &Transaction,
    n_in: usize,
    sighash_type: SigHashType,
    amount: i64,
) -> [u8; 32] {
    if !sighash_type.has_forkid() {
        return SIGHASH_ONE;
    }
    match calc_preimage(tx, n_in, script_code.to_bytes(), sighash_type, amount) {
        Ok(preimage) => sha256d(&preimage),
        Err(_) => SIGHASH_ONE,
    }
}

/// Compute the pre-image bytes for the FORKID sighash before double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE) - amount of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - sha256d of all outputs or one output
/// 9. nLocktime (4 bytes LE)
/// 10. sighashType (4 bytes LE)
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `script_code` - The script code being satisfied.
/// * `sighash_type` - The hash type, written verbatim as the last field.
/// * `amount` - The value of the output being spent.
///
/// # Returns
/// The raw preimage bytes, or `InvalidTransaction` if the index is out of range.
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_type: SigHashType,
    amount: i64,
) -> Result<Vec<u8>, TransactionError> {
    let input = tx.inputs.get(input_index).ok_or_else(|| {
        TransactionError::InvalidTransaction(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        ))
    })?;

    let base_type = sighash_type.raw() & SIGHASH_MASK;
    let anyone_can_pay = sighash_type.has_anyonecanpay();

    let hash_prevouts = if !anyone_can_pay {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_sequence = if !anyone_can_pay
        && base_type != SigHashType::SINGLE
        && base_type != SigHashType::NONE
    {
        sequence_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_outputs = if base_type != SigHashType::SINGLE && base_type != SigHashType::NONE {
        outputs_hash(tx, None)
    } else if base_type == SigHashType::SINGLE && input_index < tx.outputs.len() {
        outputs_hash(tx, Some(input_index))
    } else {
        [0u8; 32]
    };

    let mut writer = WireWriter::with_capacity(160 + script_code.len());
    writer.write_i32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.write_outpoint(&mut writer);
    writer.write_varint(VarInt::from(script_code.len()));
    writer.write_bytes(script_code);
    writer.write_i64_le(amount);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type.raw());

    Ok(writer.into_bytes())
}

/// Double-SHA256 of all input outpoints concatenated.
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.write_outpoint(&mut writer);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of all input sequence numbers concatenated.
fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// Double-SHA256 of the serialized outputs, or of the single output at
/// `only` (SIGHASH_SINGLE).
fn outputs_hash(tx: &Transaction, only: Option<usize>) -> [u8; 32] {
    let mut writer = WireWriter::new();
    match only {
        Some(n) => tx.outputs[n].write_to(&mut writer),
        None => {
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }
    sha256d(writer.as_bytes())
}

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Compute the legacy (pre-FORKID) signature hash.
///
/// Serializes a copy of the transaction in which:
///
/// * every scriptSig is empty except input `n_in`, which carries the script
///   code with all `OP_CODESEPARATOR`s removed;
/// * under NONE the outputs are dropped and other inputs' sequences zeroed;
/// * under SINGLE the outputs are cut after `n_in`, earlier ones blanked to
///   value `-1` with an empty script, and other inputs' sequences zeroed;
/// * under ANYONECANPAY only input `n_in` remains.
///
/// The hash type is appended as 4 bytes before double-hashing.
///
/// # Returns
/// The digest, or [`SIGHASH_ONE`] if `n_in` is out of range or SINGLE
/// has no matching output.
pub fn signature_hash_legacy(
    script_code: &Script,
    tx: &Transaction,
    n_in: usize,
    sighash_type: SigHashType,
) -> [u8; 32] {
    if n_in >= tx.inputs.len() {
        return SIGHASH_ONE;
    }

    let base_type = sighash_type.raw() & SIGHASH_MASK;
    if base_type == SigHashType::SINGLE && n_in >= tx.outputs.len() {
        return SIGHASH_ONE;
    }

    let mut stripped = script_code.clone();
    stripped.find_and_delete(&Script::from_bytes(&[OP_CODESEPARATOR]));

    let zero_other_sequences =
        base_type == SigHashType::NONE || base_type == SigHashType::SINGLE;
    let sequence_of = |idx: usize, input: &TransactionInput| {
        if zero_other_sequences && idx != n_in {
            0
        } else {
            input.sequence_number
        }
    };

    let mut writer = WireWriter::with_capacity(256);
    writer.write_i32_le(tx.version);

    if sighash_type.has_anyonecanpay() {
        writer.write_varint(VarInt::from(1u64));
        let input = &tx.inputs[n_in];
        input.write_with_script(&mut writer, stripped.to_bytes(), input.sequence_number);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (idx, input) in tx.inputs.iter().enumerate() {
            let script: &[u8] = if idx == n_in { stripped.to_bytes() } else { &[] };
            input.write_with_script(&mut writer, script, sequence_of(idx, input));
        }
    }

    match base_type {
        SigHashType::NONE => writer.write_varint(VarInt::from(0u64)),
        SigHashType::SINGLE => {
            writer.write_varint(VarInt::from(n_in + 1));
            for _ in 0..n_in {
                writer.write_i64_le(-1);
                writer.write_varint(VarInt::from(0u64));
            }
            tx.outputs[n_in].write_to(&mut writer);
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_type.raw());
    sha256d(writer.as_bytes())
}
