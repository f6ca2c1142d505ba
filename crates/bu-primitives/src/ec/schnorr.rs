//! BCH Schnorr signatures over secp256k1.
//!
//! A signature is `r || s`, 64 bytes. The challenge is
//! `e = SHA256(r || compressed(P) || m) mod n` and the nonce point must
//! have a y coordinate that is a quadratic residue mod p.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, Scalar, U256};
use num_bigint::BigUint;
use num_traits::One;

use crate::ec::private_key::PrivateKey;
use crate::ec::public_key::PublicKey;
use crate::hash::sha256;
use crate::PrimitivesError;

/// Length of a Schnorr signature without a sighash byte.
pub const SCHNORR_SIG_LEN: usize = 64;

/// Tag appended to the nonce derivation input.
const NONCE_TAG: &[u8; 16] = b"Schnorr+SHA256  ";

/// The secp256k1 field prime p.
const FIELD_PRIME: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF,
    0xFC, 0x2F,
];

/// Verify a BCH Schnorr signature.
///
/// # Arguments
/// * `pub_key` - The signer's public key.
/// * `hash` - The 32-byte message digest.
/// * `sig` - The signature; anything other than 64 bytes fails.
///
/// # Returns
/// `true` iff the signature is valid.
pub fn verify(pub_key: &PublicKey, hash: &[u8; 32], sig: &[u8]) -> bool {
    if sig.len() != SCHNORR_SIG_LEN {
        return false;
    }
    let mut r = [0u8; 32];
    r.copy_from_slice(&sig[..32]);
    if r >= FIELD_PRIME {
        return false;
    }
    let s = match scalar_from_canonical(&sig[32..]) {
        Some(s) => s,
        None => return false,
    };

    let e = challenge(&r, pub_key, hash);
    let big_r = ProjectivePoint::GENERATOR * s - pub_key.point() * e;
    if big_r == ProjectivePoint::IDENTITY {
        return false;
    }
    let (x, y) = match affine_coordinates(&big_r) {
        Some(coords) => coords,
        None => return false,
    };
    is_quadratic_residue(&y) && x == r
}

/// Produce a BCH Schnorr signature with a deterministic nonce.
///
/// # Arguments
/// * `priv_key` - The signing key.
/// * `hash` - The 32-byte message digest.
///
/// # Returns
/// The 64-byte `r || s` signature.
pub fn sign(priv_key: &PrivateKey, hash: &[u8; 32]) -> Result<[u8; 64], PrimitivesError> {
    let d = priv_key.scalar();

    let mut nonce_input = Vec::with_capacity(32 + 32 + NONCE_TAG.len());
    nonce_input.extend_from_slice(&priv_key.to_bytes());
    nonce_input.extend_from_slice(hash);
    nonce_input.extend_from_slice(NONCE_TAG);
    let mut k = reduce(&sha256(&nonce_input));
    if bool::from(k.is_zero()) {
        return Err(PrimitivesError::InvalidSignature(
            "derived nonce is zero".to_string(),
        ));
    }

    let big_r = ProjectivePoint::GENERATOR * k;
    let (r, y) = affine_coordinates(&big_r)
        .ok_or_else(|| PrimitivesError::InvalidSignature("nonce point at infinity".to_string()))?;
    if !is_quadratic_residue(&y) {
        k = -k;
    }

    let e = challenge(&r, &priv_key.pub_key(), hash);
    let s = k + e * d;

    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&r);
    out[32..].copy_from_slice(&s.to_bytes());
    Ok(out)
}

/// e = SHA256(r || compressed(P) || m) mod n.
fn challenge(r: &[u8; 32], pub_key: &PublicKey, hash: &[u8; 32]) -> Scalar {
    let mut data = Vec::with_capacity(32 + 33 + 32);
    data.extend_from_slice(r);
    data.extend_from_slice(&pub_key.to_compressed());
    data.extend_from_slice(hash);
    reduce(&sha256(&data))
}

fn reduce(bytes: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(bytes))
}

/// Parse a scalar, rejecting values at or above the curve order.
fn scalar_from_canonical(bytes: &[u8]) -> Option<Scalar> {
    let repr = FieldBytes::clone_from_slice(bytes);
    Option::from(Scalar::from_repr(repr))
}

fn affine_coordinates(point: &ProjectivePoint) -> Option<([u8; 32], [u8; 32])> {
    let encoded = point.to_affine().to_encoded_point(false);
    let (x, y) = (encoded.x()?, encoded.y()?);
    let mut xo = [0u8; 32];
    let mut yo = [0u8; 32];
    xo.copy_from_slice(x);
    yo.copy_from_slice(y);
    Some((xo, yo))
}

/// Euler's criterion: y^((p-1)/2) == 1 mod p.
fn is_quadratic_residue(y: &[u8; 32]) -> bool {
    let p = BigUint::from_bytes_be(&FIELD_PRIME);
    let exp = (&p - BigUint::one()) >> 1u32;
    BigUint::from_bytes_be(y).modpow(&exp, &p).is_one()
}
