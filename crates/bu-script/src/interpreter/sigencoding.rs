//! Signature and public key encoding rules.
//!
//! These checks run before any cryptography. They turn malleable or
//! non-standard encodings into hard script errors, depending on flags.

use num_bigint::{BigInt, Sign};

use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::sighashtype::SigHashType;

/// Length of a Schnorr signature body.
pub const SCHNORR_SIG_LEN: usize = 64;

/// secp256k1 group order divided by two.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Check strict DER (BIP66) for a signature without a trailing hash type.
///
/// Format: `0x30 <len> 0x02 <lenR> <R> 0x02 <lenS> <S>`, where R and S are
/// positive and carry no superfluous leading zero.
pub fn is_valid_der_encoding(sig: &[u8]) -> bool {
    if sig.len() < 8 || sig.len() > 72 {
        return false;
    }
    if sig[0] != 0x30 || sig[1] as usize != sig.len() - 2 {
        return false;
    }

    let len_r = sig[3] as usize;
    if sig[2] != 0x02 || len_r == 0 || sig[4] & 0x80 != 0 {
        return false;
    }
    if len_r > sig.len() - 7 {
        return false;
    }
    if len_r > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return false;
    }

    let start_s = len_r + 4;
    if sig[start_s] != 0x02 {
        return false;
    }
    let len_s = sig[start_s + 1] as usize;
    if len_s == 0 || start_s + len_s + 2 != sig.len() {
        return false;
    }
    if sig[start_s + 2] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && sig[start_s + 2] == 0x00 && sig[start_s + 3] & 0x80 == 0 {
        return false;
    }
    true
}

/// S of a strictly DER-encoded signature is at most half the group order.
fn has_low_s(der: &[u8]) -> bool {
    let start_s = der[3] as usize + 4;
    let len_s = der[start_s + 1] as usize;
    let s = BigInt::from_bytes_be(Sign::Plus, &der[start_s + 2..start_s + 2 + len_s]);
    s <= BigInt::from_bytes_be(Sign::Plus, &HALF_ORDER)
}

fn encoding_error(code: ScriptErrorCode, detail: &str) -> InterpreterError {
    InterpreterError::new(code, detail.to_string())
}

fn check_encoding(sig: &[u8], flags: ScriptFlags, with_hashtype: bool) -> Result<(), InterpreterError> {
    if sig.is_empty() {
        return Ok(());
    }

    let strict = flags.has_flag(ScriptFlags::STRICTENC);
    let hashtype = SigHashType::from_sig(sig);

    if sig.len() == SCHNORR_SIG_LEN + with_hashtype as usize {
        if with_hashtype && strict {
            if !hashtype.is_defined() {
                return Err(encoding_error(ScriptErrorCode::SigHashtype, "undefined hash type"));
            }
            if flags.has_flag(ScriptFlags::SIGHASH_FORKID) && !hashtype.has_forkid() {
                return Err(encoding_error(
                    ScriptErrorCode::MustUseForkId,
                    "schnorr signature without FORKID",
                ));
            }
        }
        return Ok(());
    }

    let der = if with_hashtype { &sig[..sig.len() - 1] } else { sig };
    let needs_der = flags.has_any(&[ScriptFlags::DERSIG, ScriptFlags::LOW_S, ScriptFlags::STRICTENC]);
    if needs_der && !is_valid_der_encoding(der) {
        return Err(encoding_error(ScriptErrorCode::SigDer, "signature is not strict DER"));
    }

    if flags.has_flag(ScriptFlags::LOW_S) {
        if !has_low_s(der) {
            return Err(encoding_error(ScriptErrorCode::SigHighS, "signature S above half order"));
        }
    } else if with_hashtype && strict && !hashtype.is_defined() {
        return Err(encoding_error(ScriptErrorCode::SigHashtype, "undefined hash type"));
    }
    Ok(())
}

/// Check a transaction signature (with trailing hash type) for CHECKSIG.
///
/// # Arguments
/// * `sig` - Signature bytes including the hash type byte.
/// * `flags` - Active verification flags.
///
/// # Returns
/// `Ok(())` if the encoding is acceptable under `flags`.
pub fn check_signature_encoding(sig: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
    check_encoding(sig, flags, true)
}

/// Check a CHECKDATASIG signature, which carries no hash type.
pub fn check_data_signature_encoding(sig: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
    check_encoding(sig, flags, false)
}

/// Check a signature used by legacy-mode CHECKMULTISIG.
///
/// 65-byte signatures are Schnorr-sized and rejected with `SIG_BADLENGTH`.
pub fn check_ecdsa_signature_encoding(sig: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
    if sig.len() == SCHNORR_SIG_LEN + 1 {
        return Err(encoding_error(
            ScriptErrorCode::SigBadLength,
            "65-byte signature in ECDSA-only context",
        ));
    }
    check_encoding(sig, flags, true)
}

/// Check a signature used by Schnorr-mode CHECKMULTISIG.
pub fn check_schnorr_signature_encoding(sig: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
    if sig.len() != SCHNORR_SIG_LEN + 1 {
        return Err(encoding_error(
            ScriptErrorCode::SigNonSchnorr,
            "schnorr multisig requires 65-byte signatures",
        ));
    }
    check_encoding(sig, flags, true)
}

/// Check a public key encoding.
///
/// `STRICTENC` allows 33-byte compressed (02/03) and 65-byte uncompressed
/// (04) keys. `COMPRESSED_PUBKEYTYPE` allows compressed keys only.
pub fn check_pubkey_encoding(pubkey: &[u8], flags: ScriptFlags) -> Result<(), InterpreterError> {
    let compressed = pubkey.len() == 33 && matches!(pubkey[0], 0x02 | 0x03);
    let uncompressed = pubkey.len() == 65 && pubkey[0] == 0x04;

    if flags.has_flag(ScriptFlags::STRICTENC) && !compressed && !uncompressed {
        return Err(encoding_error(ScriptErrorCode::PubkeyType, "unsupported public key type"));
    }
    if flags.has_flag(ScriptFlags::COMPRESSED_PUBKEYTYPE) && !compressed {
        return Err(encoding_error(
            ScriptErrorCode::NonCompressedPubkey,
            "public key is not compressed",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(r: Result<(), InterpreterError>) -> ScriptErrorCode {
        match r {
            Ok(()) => ScriptErrorCode::Ok,
            Err(e) => e.code,
        }
    }

    fn with_hashtype(der: &[u8], ht: u8) -> Vec<u8> {
        let mut v = der.to_vec();
        v.push(ht);
        v
    }

    const MIN_DER: [u8; 8] = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];

    fn high_s_der() -> Vec<u8> {
        let mut v = vec![0x30, 38, 0x02, 0x01, 0x01, 0x02, 33, 0x00];
        v.extend_from_slice(&[0xff; 32]);
        v
    }

    #[test]
    fn test_der_rules() {
        assert!(is_valid_der_encoding(&MIN_DER));
        assert!(is_valid_der_encoding(&high_s_der()));

        let mut bad_tag = MIN_DER;
        bad_tag[0] = 0x31;
        assert!(!is_valid_der_encoding(&bad_tag));

        let mut negative_r = MIN_DER;
        negative_r[4] = 0x81;
        assert!(!is_valid_der_encoding(&negative_r));

        // R padded with a zero it does not need.
        let padded_r = [0x30, 0x07, 0x02, 0x02, 0x00, 0x01, 0x02, 0x01, 0x01];
        assert!(!is_valid_der_encoding(&padded_r));

        // Declared S length runs past the end.
        let long_s = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x02, 0x01];
        assert!(!is_valid_der_encoding(&long_s));
    }

    #[test]
    fn test_empty_signature_always_accepted() {
        let all = ScriptFlags::STRICTENC | ScriptFlags::DERSIG | ScriptFlags::LOW_S;
        assert_eq!(code(check_signature_encoding(&[], all)), ScriptErrorCode::Ok);
        assert_eq!(code(check_data_signature_encoding(&[], all)), ScriptErrorCode::Ok);
    }

    #[test]
    fn test_ecdsa_flags() {
        let good = with_hashtype(&MIN_DER, 0x41);
        assert_eq!(code(check_signature_encoding(&good, ScriptFlags::STRICTENC)), ScriptErrorCode::Ok);

        let junk = vec![0x31, 0x00, 0x01];
        assert_eq!(code(check_signature_encoding(&junk, ScriptFlags::NONE)), ScriptErrorCode::Ok);
        assert_eq!(code(check_signature_encoding(&junk, ScriptFlags::DERSIG)), ScriptErrorCode::SigDer);

        let high = with_hashtype(&high_s_der(), 0x01);
        assert_eq!(code(check_signature_encoding(&high, ScriptFlags::DERSIG)), ScriptErrorCode::Ok);
        assert_eq!(code(check_signature_encoding(&high, ScriptFlags::LOW_S)), ScriptErrorCode::SigHighS);

        let undefined = with_hashtype(&MIN_DER, 0x05);
        assert_eq!(code(check_signature_encoding(&undefined, ScriptFlags::DERSIG)), ScriptErrorCode::Ok);
        assert_eq!(
            code(check_signature_encoding(&undefined, ScriptFlags::STRICTENC)),
            ScriptErrorCode::SigHashtype
        );
    }

    #[test]
    fn test_schnorr_sized_signatures() {
        let mut sig = vec![0u8; 64];
        sig.push(0x41);
        let strict_forkid = ScriptFlags::STRICTENC | ScriptFlags::SIGHASH_FORKID;
        assert_eq!(code(check_signature_encoding(&sig, strict_forkid)), ScriptErrorCode::Ok);

        sig[64] = 0x01;
        assert_eq!(code(check_signature_encoding(&sig, strict_forkid)), ScriptErrorCode::MustUseForkId);
        assert_eq!(code(check_signature_encoding(&sig, ScriptFlags::STRICTENC)), ScriptErrorCode::Ok);

        sig[64] = 0x00;
        assert_eq!(code(check_signature_encoding(&sig, strict_forkid)), ScriptErrorCode::SigHashtype);

        // 64-byte data signature skips DER checks.
        assert_eq!(
            code(check_data_signature_encoding(&[0u8; 64], ScriptFlags::LOW_S)),
            ScriptErrorCode::Ok
        );
    }

    #[test]
    fn test_multisig_length_rules() {
        let schnorr = vec![0x41u8; 65];
        assert_eq!(
            code(check_ecdsa_signature_encoding(&schnorr, ScriptFlags::NONE)),
            ScriptErrorCode::SigBadLength
        );
        let ecdsa = with_hashtype(&MIN_DER, 0x41);
        assert_eq!(
            code(check_schnorr_signature_encoding(&ecdsa, ScriptFlags::NONE)),
            ScriptErrorCode::SigNonSchnorr
        );
        assert_eq!(code(check_schnorr_signature_encoding(&schnorr, ScriptFlags::NONE)), ScriptErrorCode::Ok);
    }

    #[test]
    fn test_pubkey_encoding() {
        let mut compressed = vec![0x02];
        compressed.extend_from_slice(&[0x11; 32]);
        let mut uncompressed = vec![0x04];
        uncompressed.extend_from_slice(&[0x11; 64]);
        let mut hybrid = uncompressed.clone();
        hybrid[0] = 0x06;

        assert_eq!(code(check_pubkey_encoding(&compressed, ScriptFlags::STRICTENC)), ScriptErrorCode::Ok);
        assert_eq!(code(check_pubkey_encoding(&uncompressed, ScriptFlags::STRICTENC)), ScriptErrorCode::Ok);
        assert_eq!(
            code(check_pubkey_encoding(&hybrid, ScriptFlags::STRICTENC)),
            ScriptErrorCode::PubkeyType
        );
        assert_eq!(code(check_pubkey_encoding(&hybrid, ScriptFlags::NONE)), ScriptErrorCode::Ok);
        assert_eq!(
            code(check_pubkey_encoding(&uncompressed, ScriptFlags::COMPRESSED_PUBKEYTYPE)),
            ScriptErrorCode::NonCompressedPubkey
        );
        assert_eq!(
            code(check_pubkey_encoding(&compressed, ScriptFlags::COMPRESSED_PUBKEYTYPE)),
            ScriptErrorCode::Ok
        );
    }
}
