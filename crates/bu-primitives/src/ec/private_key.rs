//! secp256k1 private key.
//!
//! Wraps a k256 signing key and exposes ECDSA and Schnorr signing over
//! precomputed 32-byte digests.

use k256::ecdsa::SigningKey;
use k256::Scalar;
use rand::rngs::OsRng;

use crate::ec::public_key::PublicKey;
use crate::ec::schnorr;
use crate::ec::signature::Signature;
use crate::PrimitivesError;

/// Length of a serialized private key in bytes.
const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// A secp256k1 private key.
///
/// Carries a flag recording whether its public key should be serialized
/// compressed, mirroring how keys are stored alongside scripts.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    /// The underlying k256 signing key.
    inner: SigningKey,
    compressed: bool,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    pub fn new() -> Self {
        PrivateKey {
            inner: SigningKey::random(&mut OsRng),
            compressed: true,
        }
    }

    /// Create a private key from a raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte big-endian scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` if the scalar is in `1..n`, or an error otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != PRIVATE_KEY_BYTES_LEN {
            return Err(PrimitivesError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES_LEN,
                bytes.len()
            )));
        }
        let inner = SigningKey::from_slice(bytes)
            .map_err(|e| PrimitivesError::InvalidPrivateKey(e.to_string()))?;
        Ok(PrivateKey {
            inner,
            compressed: true,
        })
    }

    /// Create a private key from a hexadecimal string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Err(PrimitivesError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Return a copy of this key whose public key serializes uncompressed.
    pub fn uncompressed(mut self) -> Self {
        self.compressed = false;
        self
    }

    /// Whether the public key serializes in compressed form.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Serialize the private key as a 32-byte big-endian scalar.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    pub fn pub_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.inner.verifying_key().clone(), self.compressed)
    }

    /// Sign a 32-byte digest with ECDSA using RFC6979 nonces.
    ///
    /// # Arguments
    /// * `hash` - The digest to sign.
    ///
    /// # Returns
    /// A low-S normalized signature.
    pub fn sign(&self, hash: &[u8; 32]) -> Result<Signature, PrimitivesError> {
        Signature::sign(hash, self)
    }

    /// Sign a 32-byte digest with BCH Schnorr.
    ///
    /// # Returns
    /// The 64-byte `r || s` signature.
    pub fn sign_schnorr(&self, hash: &[u8; 32]) -> Result<[u8; 64], PrimitivesError> {
        schnorr::sign(self, hash)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.inner
    }

    pub(crate) fn scalar(&self) -> Scalar {
        *self.inner.as_nonzero_scalar().as_ref()
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes() && self.compressed == other.compressed
    }
}

impl Eq for PrivateKey {}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "eaf02ca348c524e6392655ba4d29603cd1a7347d9d65cfe93ce1ebffdca22694";

    #[test]
    fn test_priv_key_sign_verify() {
        let priv_key = PrivateKey::from_hex(KEY_HEX).unwrap();
        let pub_key = priv_key.pub_key();
        let hash = crate::hash::sha256(b"message");
        let sig = priv_key.sign(&hash).unwrap();
        assert!(pub_key.verify(&hash, &sig));
        assert_eq!(priv_key.to_hex(), KEY_HEX);
    }

    #[test]
    fn test_bytes_round_trip() {
        let pk = PrivateKey::new();
        assert_eq!(PrivateKey::from_bytes(&pk.to_bytes()).unwrap(), pk);
    }

    #[test]
    fn test_invalid_keys() {
        assert!(PrivateKey::from_hex("").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
        assert!(PrivateKey::from_bytes(&[0u8; 32]).is_err());
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_uncompressed_pub_key() {
        let pk = PrivateKey::from_hex(KEY_HEX).unwrap().uncompressed();
        assert_eq!(pk.pub_key().to_bytes().len(), 65);
        assert_eq!(pk.pub_key().to_bytes()[0], 0x04);
    }
}
