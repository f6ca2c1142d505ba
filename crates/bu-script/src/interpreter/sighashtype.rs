//! Signature hash type byte.

use std::fmt;

/// The hash type appended to every transaction signature.
///
/// The low five bits select the base type (`ALL`, `NONE`, `SINGLE`);
/// `FORKID` and `ANYONECANPAY` are modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigHashType(pub u32);

impl SigHashType {
    pub const ALL: u32 = 0x01;
    pub const NONE: u32 = 0x02;
    pub const SINGLE: u32 = 0x03;
    pub const FORKID: u32 = 0x40;
    pub const ANYONECANPAY: u32 = 0x80;

    const BASE_MASK: u32 = 0x1f;

    pub fn new(raw: u32) -> Self {
        SigHashType(raw)
    }

    /// `ALL|FORKID`, the type produced by default when signing.
    pub fn all_forkid() -> Self {
        SigHashType(Self::ALL | Self::FORKID)
    }

    /// Read the hash type from the trailing byte of a signature.
    pub fn from_sig(sig: &[u8]) -> Self {
        SigHashType(sig.last().copied().unwrap_or(0) as u32)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Base type with both modifiers removed.
    pub fn base_type(self) -> u32 {
        self.0 & Self::BASE_MASK
    }

    pub fn has_forkid(self) -> bool {
        self.0 & Self::FORKID != 0
    }

    pub fn has_anyonecanpay(self) -> bool {
        self.0 & Self::ANYONECANPAY != 0
    }

    pub fn with_forkid(self) -> Self {
        SigHashType(self.0 | Self::FORKID)
    }

    pub fn with_anyonecanpay(self) -> Self {
        SigHashType(self.0 | Self::ANYONECANPAY)
    }

    /// True if, after masking `ANYONECANPAY` and `FORKID`, the type is
    /// `ALL`, `NONE` or `SINGLE`.
    pub fn is_defined(self) -> bool {
        let base = self.0 & !(Self::ANYONECANPAY | Self::FORKID);
        (Self::ALL..=Self::SINGLE).contains(&base)
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType(Self::ALL)
    }
}

impl fmt::Display for SigHashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base_type() {
            Self::ALL => "ALL",
            Self::NONE => "NONE",
            Self::SINGLE => "SINGLE",
            _ => return write!(f, "{:#04x}", self.0),
        };
        f.write_str(base)?;
        if self.has_forkid() {
            f.write_str("|FORKID")?;
        }
        if self.has_anyonecanpay() {
            f.write_str("|ANYONECANPAY")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_types() {
        assert!(SigHashType::new(0x01).is_defined());
        assert!(SigHashType::new(0x41).is_defined());
        assert!(SigHashType::new(0xc3).is_defined());
        assert!(!SigHashType::new(0x00).is_defined());
        assert!(!SigHashType::new(0x04).is_defined());
        assert!(!SigHashType::new(0x21).is_defined());
    }

    #[test]
    fn test_modifiers() {
        let t = SigHashType::new(SigHashType::SINGLE).with_forkid().with_anyonecanpay();
        assert_eq!(t.raw(), 0xc3);
        assert_eq!(t.base_type(), SigHashType::SINGLE);
        assert!(t.has_forkid() && t.has_anyonecanpay());
        assert_eq!(t.to_string(), "SINGLE|FORKID|ANYONECANPAY");
        assert_eq!(SigHashType::from_sig(&[0x30, 0x41]), SigHashType::all_forkid());
        assert_eq!(SigHashType::from_sig(&[]).raw(), 0);
    }
}
