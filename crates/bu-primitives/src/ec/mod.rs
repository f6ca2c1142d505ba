//! Elliptic curve cryptography on secp256k1.
//!
//! Private and public keys, ECDSA signatures and BCH Schnorr signatures.

pub mod private_key;
pub mod public_key;
pub mod schnorr;
pub mod signature;

pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use signature::Signature;
