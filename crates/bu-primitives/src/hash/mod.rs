//! Hash function primitives.
//!
//! Provides the digests the script interpreter exposes as opcodes
//! (RIPEMD-160, SHA-1, SHA-256, Hash160, Hash256) plus the double
//! SHA-256 used for transaction ids and signature hashes.

use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute double SHA-256 (SHA-256d) hash of the input data.
///
/// This is the digest behind `OP_HASH256`, transaction ids and
/// signature hashes. Computes SHA-256(SHA-256(data)).
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte double-SHA-256 digest.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute RIPEMD-160 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 20-byte RIPEMD-160 digest.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-1 hash of the input data.
///
/// Only reachable through `OP_SHA1`.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute Hash160: RIPEMD-160(SHA-256(data)).
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 20-byte Hash160 digest.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// Incremental double SHA-256 writer.
///
/// Signature hash preimages are streamed through this instead of being
/// collected into a buffer first.
#[derive(Clone, Default)]
pub struct Hash256Writer {
    inner: Sha256,
}

impl Hash256Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the running digest.
    pub fn write(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish the stream and return SHA-256(SHA-256(stream)).
    pub fn finalize(self) -> [u8; 32] {
        let first: [u8; 32] = self.inner.finalize().into();
        sha256(&first)
    }
}
