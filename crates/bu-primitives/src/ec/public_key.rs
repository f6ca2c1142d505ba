//! secp256k1 public key.
//!
//! Parses every SEC1 form the consensus rules allow (compressed,
//! uncompressed and hybrid) and verifies ECDSA and Schnorr signatures.

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::ProjectivePoint;
use std::fmt;

use crate::ec::schnorr;
use crate::ec::signature::Signature;
use crate::hash::hash160;
use crate::PrimitivesError;

/// Length of a compressed public key in bytes (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed public key in bytes (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

/// A secp256k1 public key.
///
/// Remembers whether it was parsed from a compressed encoding so that
/// `to_bytes` reproduces the form that was hashed into a script.
#[derive(Clone, Debug)]
pub struct PublicKey {
    /// The underlying k256 verifying key.
    inner: VerifyingKey,
    compressed: bool,
}

impl PublicKey {
    /// Parse a SEC1 encoded public key.
    ///
    /// Accepts compressed (02/03), uncompressed (04) and hybrid (06/07)
    /// encodings. Hybrid keys must carry a tag whose parity matches y.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the bytes don't represent a valid point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let invalid = |msg: &str| PrimitivesError::InvalidPublicKey(msg.to_string());
        match (bytes.len(), bytes.first()) {
            (COMPRESSED_LEN, Some(0x02 | 0x03)) | (UNCOMPRESSED_LEN, Some(0x04)) => {
                let inner = VerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
                Ok(PublicKey {
                    inner,
                    compressed: bytes.len() == COMPRESSED_LEN,
                })
            }
            (UNCOMPRESSED_LEN, Some(tag @ (0x06 | 0x07))) => {
                if (bytes[64] & 1) != (tag & 1) {
                    return Err(invalid("hybrid key parity mismatch"));
                }
                let mut canonical = [0u8; UNCOMPRESSED_LEN];
                canonical.copy_from_slice(bytes);
                canonical[0] = 0x04;
                let inner = VerifyingKey::from_sec1_bytes(&canonical)
                    .map_err(|e| PrimitivesError::InvalidPublicKey(e.to_string()))?;
                Ok(PublicKey {
                    inner,
                    compressed: false,
                })
            }
            (0, _) => Err(invalid("pubkey is empty")),
            _ => Err(invalid("unrecognized encoding")),
        }
    }

    /// Parse a hex-encoded SEC1 public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    pub(crate) fn from_verifying_key(inner: VerifyingKey, compressed: bool) -> Self {
        PublicKey { inner, compressed }
    }

    /// Serialize in compressed SEC1 format (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize in uncompressed SEC1 format (65 bytes).
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Serialize in the form this key was created with.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.compressed {
            self.to_compressed().to_vec()
        } else {
            self.to_uncompressed().to_vec()
        }
    }

    /// Whether `to_bytes` yields the compressed form.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Hash160 of `to_bytes()`, the key id used in pay-to-pubkey-hash scripts.
    pub fn hash160(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }

    /// Verify an ECDSA signature over a 32-byte digest.
    ///
    /// High-S signatures are accepted; low-S is a script policy concern.
    pub fn verify(&self, hash: &[u8; 32], sig: &Signature) -> bool {
        sig.verify(hash, self)
    }

    /// Verify a 64-byte BCH Schnorr signature over a 32-byte digest.
    pub fn verify_schnorr(&self, hash: &[u8; 32], sig: &[u8]) -> bool {
        schnorr::verify(self, hash, sig)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }

    pub(crate) fn point(&self) -> ProjectivePoint {
        ProjectivePoint::from(*self.inner.as_affine())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}
