//! Cryptographic primitives, hashing and wire-format utilities for the
//! script interpreter.
//!
//! This crate provides the foundational building blocks:
//! - Hash functions (SHA-1, SHA-256, SHA-256d, RIPEMD-160, Hash160)
//! - secp256k1 keys with ECDSA and BCH Schnorr signatures
//! - Compact-size integers and little-endian wire reader/writer
//! - Satoshi amounts with range-checked decoding

pub mod amount;
pub mod ec;
pub mod hash;
pub mod util;

mod error;
pub use error::{DeserializeError, PrimitivesError};
