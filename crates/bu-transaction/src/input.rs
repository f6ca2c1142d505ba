//! Transaction input referencing a previous output.
//!
//! Contains the source transaction ID, output index, scriptSig and
//! sequence number, along with the BIP68 sequence constants. Provides
//! binary serialization/deserialization following the Bitcoin wire format.

use bu_primitives::util::{VarInt, WireReader, WireWriter};
use bu_script::Script;

use crate::TransactionError;

/// Sequence number of a finalized input. Disables locktime checks for it.
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// If set, the sequence number carries no relative locktime.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;

/// If set, the relative locktime counts 512-second units instead of blocks.
pub const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;

/// Bits of the sequence number holding the relative locktime value.
pub const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000_FFFF;

/// A single input of a transaction.
///
/// Each input references an output from a previous transaction by its
/// transaction ID (`source_txid`) and output index (`source_tx_out_index`).
/// The `script_sig` supplies the data required to satisfy the referenced
/// output's scriptPubKey.
///
/// # Wire format
///
/// | Field              | Size             |
/// |--------------------|------------------|
/// | source_txid        | 32 bytes (LE)    |
/// | source_tx_out_index| 4 bytes (LE)     |
/// | script length      | VarInt           |
/// | script_sig         | variable         |
/// | sequence_number    | 4 bytes (LE)     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    /// The 32-byte transaction ID of the output being spent, in internal
    /// (little-endian) byte order.
    pub source_txid: [u8; 32],

    /// Index of the output within the source transaction.
    pub source_tx_out_index: u32,

    /// The unlocking script. Empty when the input has not been signed.
    pub script_sig: Script,

    /// Sequence number. Defaults to [`SEQUENCE_FINAL`].
    pub sequence_number: u32,
}

impl TransactionInput {
    /// Create a new `TransactionInput` with default values.
    ///
    /// The source txid is zeroed, output index is 0, the scriptSig is empty
    /// and the sequence is final.
    pub fn new() -> Self {
        TransactionInput {
            source_txid: [0u8; 32],
            source_tx_out_index: 0,
            script_sig: Script::new(),
            sequence_number: SEQUENCE_FINAL,
        }
    }

    /// Create an input spending output `vout` of transaction `txid`.
    ///
    /// # Arguments
    /// * `txid` - Source transaction ID in internal byte order.
    /// * `vout` - Output index within the source transaction.
    pub fn spending(txid: [u8; 32], vout: u32) -> Self {
        TransactionInput {
            source_txid: txid,
            source_tx_out_index: vout,
            ..Self::new()
        }
    }

    /// Deserialize a `TransactionInput` from a `WireReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(TransactionInput)` on success, or a `TransactionError` if the
    /// data is truncated or malformed.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let source_txid = reader.read_array::<32>().map_err(|e| {
            TransactionError::SerializationError(format!("reading source txid: {}", e))
        })?;

        let source_tx_out_index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {}", e))
        })?;

        let script_bytes = reader.read_var_bytes().map_err(|e| {
            TransactionError::SerializationError(format!("reading scriptSig: {}", e))
        })?;

        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        Ok(TransactionInput {
            source_txid,
            source_tx_out_index,
            script_sig: Script::from_bytes(script_bytes),
            sequence_number,
        })
    }

    /// Serialize this `TransactionInput` into a `WireWriter`.
    ///
    /// # Arguments
    /// * `writer` - The writer to append serialized bytes to.
    pub fn write_to(&self, writer: &mut WireWriter) {
        self.write_outpoint(writer);
        writer.write_var_bytes(self.script_sig.to_bytes());
        writer.write_u32_le(self.sequence_number);
    }

    /// Serialize this input with `script_sig` in place of its own scriptSig.
    ///
    /// Used when building legacy signature preimages.
    pub fn write_with_script(&self, writer: &mut WireWriter, script_sig: &[u8], sequence: u32) {
        self.write_outpoint(writer);
        writer.write_varint(VarInt::from(script_sig.len()));
        writer.write_bytes(script_sig);
        writer.write_u32_le(sequence);
    }

    /// Write the 36-byte outpoint (txid followed by output index).
    pub fn write_outpoint(&self, writer: &mut WireWriter) {
        writer.write_bytes(&self.source_txid);
        writer.write_u32_le(self.source_tx_out_index);
    }

    /// True if this input is final and therefore ignores nLockTime.
    pub fn is_final(&self) -> bool {
        self.sequence_number == SEQUENCE_FINAL
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        Self::new()
    }
}
