//! Script verification flags (bitmask).

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

use crate::ScriptError;

/// Script verification flags controlling interpreter behavior.
///
/// A flag set is fixed for the whole of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate P2SH subscripts.
    pub const P2SH: ScriptFlags = ScriptFlags(1 << 0);
    /// Require strict signature, hashtype and pubkey encodings.
    pub const STRICTENC: ScriptFlags = ScriptFlags(1 << 1);
    /// Require strict DER signatures.
    pub const DERSIG: ScriptFlags = ScriptFlags(1 << 2);
    /// Require S in the lower half of the curve order.
    pub const LOW_S: ScriptFlags = ScriptFlags(1 << 3);
    /// Require an empty legacy CHECKMULTISIG dummy.
    pub const NULLDUMMY: ScriptFlags = ScriptFlags(1 << 4);
    /// Require scriptSig to be push-only.
    pub const SIGPUSHONLY: ScriptFlags = ScriptFlags(1 << 5);
    /// Require minimal pushes and minimal numeric encodings.
    pub const MINIMALDATA: ScriptFlags = ScriptFlags(1 << 6);
    /// Fail on NOP1 and NOP4..NOP10.
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 7);
    /// Require exactly one stack element after evaluation.
    pub const CLEANSTACK: ScriptFlags = ScriptFlags(1 << 8);
    /// Interpret OP_CHECKLOCKTIMEVERIFY.
    pub const CHECKLOCKTIMEVERIFY: ScriptFlags = ScriptFlags(1 << 9);
    /// Interpret OP_CHECKSEQUENCEVERIFY.
    pub const CHECKSEQUENCEVERIFY: ScriptFlags = ScriptFlags(1 << 10);
    /// Require OP_IF/OP_NOTIF operands to be empty or 0x01.
    pub const MINIMALIF: ScriptFlags = ScriptFlags(1 << 13);
    /// Require failing signature checks to use empty signatures.
    pub const NULLFAIL: ScriptFlags = ScriptFlags(1 << 14);
    /// Require compressed public keys.
    pub const COMPRESSED_PUBKEYTYPE: ScriptFlags = ScriptFlags(1 << 15);
    /// Use the FORKID signature hash.
    pub const SIGHASH_FORKID: ScriptFlags = ScriptFlags(1 << 16);
    /// Replay protection fork marker.
    pub const REPLAY_PROTECTION: ScriptFlags = ScriptFlags(1 << 17);
    /// OP_CHECKDATASIG activation marker.
    pub const CHECKDATASIG: ScriptFlags = ScriptFlags(1 << 18);
    /// Reject P2SH spends of witness programs.
    pub const DISALLOW_SEGWIT_RECOVERY: ScriptFlags = ScriptFlags(1 << 20);
    /// Enable the Schnorr checkbits multisig mode.
    pub const SCHNORR_MULTISIG: ScriptFlags = ScriptFlags(1 << 21);
    /// Enable OP_REVERSEBYTES.
    pub const REVERSEBYTES: ScriptFlags = ScriptFlags(1 << 23);
    /// Also treat `OP_HASH256 <32 bytes> OP_EQUAL` as P2SH.
    pub const P2SH_32: ScriptFlags = ScriptFlags(1 << 26);

    /// Every named flag with its textual name.
    pub const NAMED: &'static [(&'static str, ScriptFlags)] = &[
        ("P2SH", ScriptFlags::P2SH),
        ("STRICTENC", ScriptFlags::STRICTENC),
        ("DERSIG", ScriptFlags::DERSIG),
        ("LOW_S", ScriptFlags::LOW_S),
        ("NULLDUMMY", ScriptFlags::NULLDUMMY),
        ("SIGPUSHONLY", ScriptFlags::SIGPUSHONLY),
        ("MINIMALDATA", ScriptFlags::MINIMALDATA),
        ("DISCOURAGE_UPGRADABLE_NOPS", ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS),
        ("CLEANSTACK", ScriptFlags::CLEANSTACK),
        ("CHECKLOCKTIMEVERIFY", ScriptFlags::CHECKLOCKTIMEVERIFY),
        ("CHECKSEQUENCEVERIFY", ScriptFlags::CHECKSEQUENCEVERIFY),
        ("MINIMALIF", ScriptFlags::MINIMALIF),
        ("NULLFAIL", ScriptFlags::NULLFAIL),
        ("COMPRESSED_PUBKEYTYPE", ScriptFlags::COMPRESSED_PUBKEYTYPE),
        ("SIGHASH_FORKID", ScriptFlags::SIGHASH_FORKID),
        ("REPLAY_PROTECTION", ScriptFlags::REPLAY_PROTECTION),
        ("CHECKDATASIG", ScriptFlags::CHECKDATASIG),
        ("DISALLOW_SEGWIT_RECOVERY", ScriptFlags::DISALLOW_SEGWIT_RECOVERY),
        ("SCHNORR_MULTISIG", ScriptFlags::SCHNORR_MULTISIG),
        ("REVERSEBYTES", ScriptFlags::REVERSEBYTES),
        ("P2SH_32", ScriptFlags::P2SH_32),
    ];

    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }

    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }

    /// Return the set with `flag` cleared.
    pub fn without(self, flag: ScriptFlags) -> ScriptFlags {
        ScriptFlags(self.0 & !flag.0)
    }

    /// Parse a comma separated list of flag names.
    ///
    /// `""` and `"NONE"` both yield an empty set. Unknown names are an error.
    pub fn parse(text: &str) -> Result<ScriptFlags, ScriptError> {
        let mut flags = ScriptFlags::NONE;
        for word in text.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            if word == "NONE" {
                continue;
            }
            let (_, flag) = Self::NAMED
                .iter()
                .find(|(name, _)| *name == word)
                .ok_or_else(|| ScriptError::UnknownFlag(word.to_string()))?;
            flags |= *flag;
        }
        Ok(flags)
    }

    /// Format as a comma separated list of flag names.
    pub fn format(self) -> String {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(_, flag)| self.has_flag(*flag))
            .map(|(name, _)| *name)
            .collect();
        if names.is_empty() {
            "NONE".to_string()
        } else {
            names.join(",")
        }
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}

impl Not for ScriptFlags {
    type Output = Self;
    fn not(self) -> Self {
        ScriptFlags(!self.0)
    }
}

impl FromStr for ScriptFlags {
    type Err = ScriptError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScriptFlags::parse(s)
    }
}

impl fmt::Display for ScriptFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}
