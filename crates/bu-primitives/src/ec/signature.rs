//! ECDSA signature with DER serialization and RFC6979 deterministic nonces.
//!
//! Parsing follows the permissive rules consensus code has always
//! accepted. Strict DER is a script policy check, done before a
//! signature ever reaches this type.

use k256::ecdsa;
use k256::ecdsa::signature::hazmat::PrehashVerifier;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::PrimitivesError;

/// The secp256k1 curve order N.
/// N = FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
pub(crate) const CURVE_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// Half of the secp256k1 curve order (N/2), the largest low S value.
const HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// An ECDSA signature with R and S components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// The R component of the signature (32 bytes, big-endian).
    r: [u8; 32],
    /// The S component of the signature (32 bytes, big-endian).
    s: [u8; 32],
}

impl Signature {
    /// Create a signature from raw R and S 32-byte arrays.
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// Access the R component of the signature.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// Access the S component of the signature.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Whether S lies in the upper half of the curve order.
    pub fn has_high_s(&self) -> bool {
        is_greater_than(&self.s, &HALF_ORDER)
    }

    /// Parse a DER-like encoded signature using lax rules.
    ///
    /// Tolerates long-form lengths, excess padding and trailing garbage
    /// the same way the reference secp256k1 lax parser does. R or S that
    /// overflow 32 bytes or the curve order yield an all-zero signature,
    /// which never verifies.
    ///
    /// # Arguments
    /// * `bytes` - Encoded signature bytes, without a sighash byte.
    ///
    /// # Returns
    /// `Ok(Signature)` if the structure could be walked, otherwise an error.
    pub fn from_der_lax(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let malformed = |msg: &str| PrimitivesError::InvalidSignature(msg.to_string());
        let mut pos = 0usize;

        if bytes.get(pos) != Some(&0x30) {
            return Err(malformed("no sequence header"));
        }
        pos += 1;
        let seq_len = *bytes.get(pos).ok_or_else(|| malformed("truncated"))?;
        pos += 1;
        if seq_len & 0x80 != 0 {
            let n = (seq_len & 0x7f) as usize;
            if n > bytes.len() - pos {
                return Err(malformed("sequence length overruns"));
            }
            pos += n;
        }

        let (r_pos, r_len) = read_lax_integer(bytes, &mut pos).ok_or_else(|| malformed("bad R"))?;
        let (s_pos, s_len) = read_lax_integer(bytes, &mut pos).ok_or_else(|| malformed("bad S"))?;

        let r = trimmed_32(&bytes[r_pos..r_pos + r_len]);
        let s = trimmed_32(&bytes[s_pos..s_pos + s_len]);
        match (r, s) {
            (Some(r), Some(s)) if is_less_than(&r, &CURVE_ORDER) && is_less_than(&s, &CURVE_ORDER) => {
                Ok(Signature { r, s })
            }
            _ => Ok(Signature {
                r: [0u8; 32],
                s: [0u8; 32],
            }),
        }
    }

    /// Serialize the signature in strict DER format with low-S normalization.
    pub fn to_der(&self) -> Vec<u8> {
        let s = if self.has_high_s() {
            subtract_from_order(&self.s)
        } else {
            self.s
        };

        let rb = canonicalize_int(&self.r);
        let sb = canonicalize_int(&s);

        let total_len = 6 + rb.len() + sb.len();
        let mut out = Vec::with_capacity(total_len);
        out.push(0x30);
        out.push((total_len - 2) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Sign a 32-byte digest using RFC6979 deterministic nonces.
    ///
    /// # Returns
    /// A low-S normalized signature.
    pub fn sign(hash: &[u8; 32], priv_key: &PrivateKey) -> Result<Self, PrimitivesError> {
        let (k256_sig, _recovery_id) = priv_key
            .signing_key()
            .sign_prehash_recoverable(hash)
            .map_err(|e| PrimitivesError::InvalidSignature(e.to_string()))?;

        let (r_bytes, s_bytes) = k256_sig.split_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        s.copy_from_slice(&s_bytes);
        if is_greater_than(&s, &HALF_ORDER) {
            s = subtract_from_order(&s);
        }
        Ok(Signature { r, s })
    }

    /// Verify this signature against a 32-byte digest and public key.
    ///
    /// S is normalized first, so both low and high S forms verify.
    pub fn verify(&self, hash: &[u8; 32], pub_key: &PublicKey) -> bool {
        let s = if self.has_high_s() {
            subtract_from_order(&self.s)
        } else {
            self.s
        };
        let k256_sig = match ecdsa::Signature::from_scalars(
            k256::FieldBytes::from(self.r),
            k256::FieldBytes::from(s),
        ) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        pub_key
            .verifying_key()
            .verify_prehash(hash, &k256_sig)
            .is_ok()
    }
}

/// Walk one lax-encoded INTEGER, returning the offset and length of its body.
fn read_lax_integer(bytes: &[u8], pos: &mut usize) -> Option<(usize, usize)> {
    if bytes.get(*pos) != Some(&0x02) {
        return None;
    }
    *pos += 1;
    let len_byte = *bytes.get(*pos)?;
    *pos += 1;
    let len = if len_byte & 0x80 != 0 {
        let mut n = (len_byte & 0x7f) as usize;
        if n > bytes.len() - *pos {
            return None;
        }
        while n > 0 && bytes[*pos] == 0 {
            *pos += 1;
            n -= 1;
        }
        if n >= std::mem::size_of::<usize>() {
            return None;
        }
        let mut len = 0usize;
        while n > 0 {
            len = (len << 8) + bytes[*pos] as usize;
            *pos += 1;
            n -= 1;
        }
        len
    } else {
        len_byte as usize
    };
    if len > bytes.len() - *pos {
        return None;
    }
    let start = *pos;
    *pos += len;
    Some((start, len))
}

/// Strip leading zeros and left-pad to 32 bytes, or `None` on overflow.
fn trimmed_32(bytes: &[u8]) -> Option<[u8; 32]> {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[first..];
    if trimmed.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - trimmed.len()..].copy_from_slice(trimmed);
    Some(out)
}

/// Canonicalize a 32-byte integer for DER encoding.
///
/// Strips leading zeros and adds a 0x00 byte if the high bit is set.
fn canonicalize_int(val: &[u8; 32]) -> Vec<u8> {
    let mut start = 0;
    while start < 31 && val[start] == 0 {
        start += 1;
    }
    let trimmed = &val[start..];
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}

/// Compare two 32-byte big-endian integers: a < b.
pub(crate) fn is_less_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a < b
}

/// Compare two 32-byte big-endian integers: a > b.
fn is_greater_than(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a > b
}

/// Compute N - val for a 32-byte big-endian integer.
fn subtract_from_order(val: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = CURVE_ORDER[i] as i16 - val[i] as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[i] = diff as u8;
    }
    out
}
