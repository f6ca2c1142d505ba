//! Relay policy: which scripts and transactions are standard.
//!
//! Nothing here affects consensus validity. A node applies these rules
//! before accepting a transaction into its mempool, and uses
//! [`STANDARD_SCRIPT_VERIFY_FLAGS`] rather than the consensus flags when
//! verifying its inputs.

use bu_script::interpreter::{eval_script, NullChecker, ScriptFlags, MAX_OPS_PER_SCRIPT};
use bu_script::Script;

use crate::output::TransactionOutput;
use crate::standard::{solver, TxnOutType, MAX_OP_RETURN_RELAY};
use crate::transaction::Transaction;

/// Flags every block must satisfy.
pub const MANDATORY_SCRIPT_VERIFY_FLAGS: ScriptFlags = ScriptFlags(
    ScriptFlags::P2SH.0
        | ScriptFlags::STRICTENC.0
        | ScriptFlags::SIGHASH_FORKID.0
        | ScriptFlags::LOW_S.0
        | ScriptFlags::NULLFAIL.0
        | ScriptFlags::MINIMALDATA.0
        | ScriptFlags::SCHNORR_MULTISIG.0,
);

/// Flags used when verifying transactions for relay.
pub const STANDARD_SCRIPT_VERIFY_FLAGS: ScriptFlags = ScriptFlags(
    MANDATORY_SCRIPT_VERIFY_FLAGS.0
        | ScriptFlags::DERSIG.0
        | ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS.0
        | ScriptFlags::CLEANSTACK.0
        | ScriptFlags::CHECKLOCKTIMEVERIFY.0
        | ScriptFlags::CHECKSEQUENCEVERIFY.0
        | ScriptFlags::SIGPUSHONLY.0
        | ScriptFlags::CHECKDATASIG.0
        | ScriptFlags::DISALLOW_SEGWIT_RECOVERY.0,
);

/// Standard flags that are not consensus rules.
pub const STANDARD_NOT_MANDATORY_VERIFY_FLAGS: ScriptFlags =
    ScriptFlags(STANDARD_SCRIPT_VERIFY_FLAGS.0 & !MANDATORY_SCRIPT_VERIFY_FLAGS.0);

pub const MAX_STANDARD_TX_SIZE: usize = 100_000;

/// Large enough for a 15-of-15 P2SH multisig spend with compressed keys.
pub const MAX_TX_IN_SCRIPT_SIG_SIZE: usize = 1650;

pub const MAX_P2SH_SIGOPS: usize = 15;

pub const DEFAULT_DUST_THRESHOLD: i64 = 546;

/// Most keys a bare (non-P2SH) multisig output may list.
pub const MAX_BARE_MULTISIG_KEYS: u8 = 3;

/// Tunable relay policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Relay OP_RETURN data outputs at all.
    pub accept_datacarrier: bool,
    /// Largest OP_RETURN payload relayed.
    pub max_datacarrier_bytes: usize,
    /// Outputs below this many satoshis are dust.
    pub dust_threshold: i64,
    pub max_standard_tx_size: usize,
    pub max_tx_in_script_sig_size: usize,
    pub max_p2sh_sigops: usize,
    /// Relay bare multisig outputs.
    pub permit_bare_multisig: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            accept_datacarrier: true,
            max_datacarrier_bytes: MAX_OP_RETURN_RELAY,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            max_standard_tx_size: MAX_STANDARD_TX_SIZE,
            max_tx_in_script_sig_size: MAX_TX_IN_SCRIPT_SIG_SIZE,
            max_p2sh_sigops: MAX_P2SH_SIGOPS,
            permit_bare_multisig: true,
        }
    }
}

/// Why a transaction is not standard. The messages are the reject reasons
/// reported to peers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonStandardReason {
    #[error("version")]
    Version,
    #[error("tx-size")]
    TxSize,
    #[error("scriptsig-size")]
    ScriptSigSize,
    #[error("scriptsig-not-pushonly")]
    ScriptSigNotPushOnly,
    #[error("scriptpubkey")]
    ScriptPubKey,
    #[error("bare-multisig")]
    BareMultisig,
    #[error("dust")]
    Dust,
    #[error("multi-op-return")]
    MultiOpReturn,
    #[error("missing-inputs")]
    MissingInputs,
    #[error("nonstandard-input")]
    NonStandardInput,
    #[error("bad-p2sh-scriptsig")]
    BadP2shScriptSig,
    #[error("bad-txns-nonstandard-inputs: {0} p2sh sigops")]
    P2shSigops(usize),
}

/// Classify an output script and decide whether it is standard.
///
/// # Arguments
/// * `script_pub_key` - The output script.
/// * `config` - Relay policy.
///
/// # Returns
/// The script's template, or `None` if it is not relayed.
pub fn is_standard(script_pub_key: &Script, config: &PolicyConfig) -> Option<TxnOutType> {
    let (kind, solutions) = solver(script_pub_key, STANDARD_SCRIPT_VERIFY_FLAGS);
    match kind {
        TxnOutType::NonStandard => None,
        TxnOutType::MultiSig => {
            let m = solutions.first()?.first().copied()?;
            let n = solutions.last()?.first().copied()?;
            // Bare multisig beyond 1-of-3 is not relayed.
            if !(1..=MAX_BARE_MULTISIG_KEYS).contains(&n) || m < 1 || m > n {
                return None;
            }
            Some(kind)
        }
        TxnOutType::NullData | TxnOutType::LabelPublic => {
            if !config.accept_datacarrier
                || script_pub_key.len() > config.max_datacarrier_bytes + 3
            {
                return None;
            }
            Some(kind)
        }
        _ => Some(kind),
    }
}

/// Whether `output` is too small to be worth spending.
///
/// Provably unspendable outputs are never dust.
pub fn is_dust(output: &TransactionOutput, config: &PolicyConfig) -> bool {
    !output.locking_script.is_unspendable() && output.satoshis < config.dust_threshold
}

/// Check the transaction-level relay rules.
///
/// Inputs are only checked for scriptSig size and push-only form; see
/// [`are_inputs_standard`] for the rules that need the spent outputs.
pub fn is_standard_tx(tx: &Transaction, config: &PolicyConfig) -> Result<(), NonStandardReason> {
    if !(1..=2).contains(&tx.version) {
        return Err(NonStandardReason::Version);
    }
    if tx.size() > config.max_standard_tx_size {
        return Err(NonStandardReason::TxSize);
    }

    for input in &tx.inputs {
        if input.script_sig.len() > config.max_tx_in_script_sig_size {
            return Err(NonStandardReason::ScriptSigSize);
        }
        if !input.script_sig.is_push_only() {
            return Err(NonStandardReason::ScriptSigNotPushOnly);
        }
    }

    let mut data_outputs = 0usize;
    for output in &tx.outputs {
        let kind = is_standard(&output.locking_script, config).ok_or(NonStandardReason::ScriptPubKey)?;
        match kind {
            TxnOutType::NullData | TxnOutType::LabelPublic => data_outputs += 1,
            TxnOutType::MultiSig if !config.permit_bare_multisig => {
                return Err(NonStandardReason::BareMultisig);
            }
            _ if is_dust(output, config) => return Err(NonStandardReason::Dust),
            _ => {}
        }
    }

    if data_outputs > 1 {
        return Err(NonStandardReason::MultiOpReturn);
    }
    Ok(())
}

/// Check the input rules that depend on the outputs being spent.
///
/// # Arguments
/// * `tx` - The spending transaction.
/// * `spent_outputs` - The output spent by each input, in input order.
/// * `config` - Relay policy.
///
/// # Returns
/// `Ok(())` if every input spends a standard script and no P2SH redeem
/// script has more than `max_p2sh_sigops` signature operations.
pub fn are_inputs_standard(
    tx: &Transaction,
    spent_outputs: &[TransactionOutput],
    config: &PolicyConfig,
) -> Result<(), NonStandardReason> {
    if tx.is_coinbase() {
        return Ok(());
    }
    if spent_outputs.len() != tx.inputs.len() {
        return Err(NonStandardReason::MissingInputs);
    }

    for (input, spent) in tx.inputs.iter().zip(spent_outputs) {
        let (kind, _) = solver(&spent.locking_script, STANDARD_SCRIPT_VERIFY_FLAGS);
        match kind {
            TxnOutType::NonStandard => return Err(NonStandardReason::NonStandardInput),
            TxnOutType::ScriptHash => {
                let mut stack = Vec::new();
                if eval_script(
                    &mut stack,
                    &input.script_sig,
                    ScriptFlags::NONE,
                    MAX_OPS_PER_SCRIPT,
                    &NullChecker,
                )
                .is_err()
                {
                    return Err(NonStandardReason::BadP2shScriptSig);
                }
                let redeem = match stack.pop() {
                    Some(bytes) => Script::from(bytes),
                    None => return Err(NonStandardReason::BadP2shScriptSig),
                };
                let sigops = redeem.sig_op_count(STANDARD_SCRIPT_VERIFY_FLAGS, true);
                if sigops > config.max_p2sh_sigops {
                    log::debug!("input redeem script has {} sigops", sigops);
                    return Err(NonStandardReason::P2shSigops(sigops));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TransactionInput;
    use crate::standard::{
        script_for_destination, script_for_label_public, script_for_multisig, ScriptId,
        TxDestination,
    };
    use bu_primitives::ec::PrivateKey;

    fn pubkeys(n: u8) -> Vec<bu_primitives::ec::PublicKey> {
        (1..=n)
            .map(|i| PrivateKey::from_bytes(&[i; 32]).unwrap().pub_key())
            .collect()
    }

    fn p2pkh(seed: u8) -> Script {
        script_for_destination(&TxDestination::KeyId([seed; 20]))
    }

    fn base_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(TransactionInput::spending([1u8; 32], 0));
        tx.add_output(TransactionOutput::paying(10_000, p2pkh(2)));
        tx
    }

    #[test]
    fn test_flag_sets() {
        assert!(STANDARD_SCRIPT_VERIFY_FLAGS.has_flag(MANDATORY_SCRIPT_VERIFY_FLAGS));
        assert!(STANDARD_NOT_MANDATORY_VERIFY_FLAGS.has_flag(ScriptFlags::CLEANSTACK));
        assert!(!STANDARD_NOT_MANDATORY_VERIFY_FLAGS.has_flag(ScriptFlags::P2SH));
        assert_eq!(
            STANDARD_NOT_MANDATORY_VERIFY_FLAGS.0 | MANDATORY_SCRIPT_VERIFY_FLAGS.0,
            STANDARD_SCRIPT_VERIFY_FLAGS.0
        );
    }

    #[test]
    fn test_is_standard_templates() {
        let config = PolicyConfig::default();
        assert_eq!(is_standard(&p2pkh(1), &config), Some(TxnOutType::PubKeyHash));

        let p2sh = script_for_destination(&TxDestination::Script(ScriptId::P2sh20([3; 20])));
        assert_eq!(is_standard(&p2sh, &config), Some(TxnOutType::ScriptHash));

        assert_eq!(is_standard(&Script::from_bytes(&[0x51]), &config), None);
    }

    #[test]
    fn test_bare_multisig_limits() {
        let config = PolicyConfig::default();
        let keys = pubkeys(4);
        let two_of_three = script_for_multisig(2, &keys[..3]).unwrap();
        assert_eq!(is_standard(&two_of_three, &config), Some(TxnOutType::MultiSig));

        let one_of_four = script_for_multisig(1, &keys).unwrap();
        assert_eq!(is_standard(&one_of_four, &config), None);

        let mut tx = base_tx();
        tx.add_output(TransactionOutput::paying(10_000, two_of_three));
        assert_eq!(is_standard_tx(&tx, &config), Ok(()));

        let strict = PolicyConfig {
            permit_bare_multisig: false,
            ..PolicyConfig::default()
        };
        assert_eq!(is_standard_tx(&tx, &strict), Err(NonStandardReason::BareMultisig));
    }

    #[test]
    fn test_data_outputs() {
        let config = PolicyConfig::default();
        let mut data = vec![0x6a, 0x4c, 200];
        data.extend_from_slice(&[0xab; 200]);
        let data = Script::from(data);
        assert_eq!(is_standard(&data, &config), Some(TxnOutType::NullData));

        let mut big = vec![0x6a, 0x4c, 230];
        big.extend_from_slice(&[0xab; 230]);
        assert_eq!(is_standard(&Script::from(big), &config), None);

        let no_data = PolicyConfig {
            accept_datacarrier: false,
            ..PolicyConfig::default()
        };
        assert_eq!(is_standard(&data, &no_data), None);

        let mut tx = base_tx();
        tx.add_output(TransactionOutput::paying(0, data.clone()));
        assert_eq!(is_standard_tx(&tx, &config), Ok(()));
        tx.add_output(TransactionOutput::paying(0, script_for_label_public("hello").unwrap()));
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::MultiOpReturn));
    }

    #[test]
    fn test_is_standard_tx_rules() {
        let config = PolicyConfig::default();
        assert_eq!(is_standard_tx(&base_tx(), &config), Ok(()));

        let mut tx = base_tx();
        tx.version = 3;
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::Version));

        let mut tx = base_tx();
        tx.inputs[0].script_sig = Script::from_bytes(&[0x51, 0x76]);
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::ScriptSigNotPushOnly));

        let mut tx = base_tx();
        let mut sig = Script::new();
        sig.append_push_data(&[0x11; 1000]).unwrap();
        sig.append_push_data(&[0x22; 1000]).unwrap();
        tx.inputs[0].script_sig = sig;
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::ScriptSigSize));

        let mut tx = base_tx();
        tx.outputs[0].satoshis = 545;
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::Dust));

        let mut tx = base_tx();
        tx.add_output(TransactionOutput::paying(1_000, Script::from_bytes(&[0x51])));
        assert_eq!(is_standard_tx(&tx, &config), Err(NonStandardReason::ScriptPubKey));

        let small = PolicyConfig {
            max_standard_tx_size: 50,
            ..PolicyConfig::default()
        };
        assert_eq!(is_standard_tx(&base_tx(), &small), Err(NonStandardReason::TxSize));
    }

    #[test]
    fn test_dust() {
        let config = PolicyConfig::default();
        assert!(is_dust(&TransactionOutput::paying(545, p2pkh(1)), &config));
        assert!(!is_dust(&TransactionOutput::paying(546, p2pkh(1)), &config));
        assert!(!is_dust(&TransactionOutput::paying(0, Script::from_bytes(&[0x6a])), &config));
    }

    #[test]
    fn test_p2sh_sigop_limit() {
        let config = PolicyConfig::default();
        let heavy = Script::from(vec![0xac; 16]);
        let light = Script::from(vec![0xac; 15]);

        for (redeem, expect) in [
            (heavy, Err(NonStandardReason::P2shSigops(16))),
            (light, Ok(())),
        ] {
            let spent = TransactionOutput::paying(
                10_000,
                script_for_destination(&TxDestination::Script(ScriptId::of(&redeem))),
            );
            let mut tx = base_tx();
            let mut script_sig = Script::new();
            script_sig.append_push_data(redeem.to_bytes()).unwrap();
            tx.inputs[0].script_sig = script_sig;
            assert_eq!(are_inputs_standard(&tx, &[spent], &config), expect);
        }
    }

    #[test]
    fn test_inputs_must_be_known_and_standard() {
        let config = PolicyConfig::default();
        let tx = base_tx();
        assert_eq!(are_inputs_standard(&tx, &[], &config), Err(NonStandardReason::MissingInputs));

        let odd = TransactionOutput::paying(10_000, Script::from_bytes(&[0x51]));
        assert_eq!(
            are_inputs_standard(&tx, &[odd], &config),
            Err(NonStandardReason::NonStandardInput)
        );

        let ok = TransactionOutput::paying(10_000, p2pkh(1));
        assert_eq!(are_inputs_standard(&tx, &[ok], &config), Ok(()));
    }
}
