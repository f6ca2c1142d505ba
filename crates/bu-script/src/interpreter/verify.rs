//! VerifyScript: run scriptSig, scriptPubKey and an optional P2SH redeem
//! script over one shared stack and judge the result.

use crate::Script;

use super::checker::SignatureChecker;
use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::machine::{ScriptMachine, ScriptStats};
use super::stack::as_bool;

/// Verify that `script_sig` satisfies `script_pub_key`.
///
/// # Arguments
/// * `script_sig` - The unlocking script of the spending input.
/// * `script_pub_key` - The locking script of the output being spent.
/// * `flags` - Verification flags.
/// * `max_ops` - Non-push operation budget per script.
/// * `checker` - Transaction checks for the spending input.
///
/// # Returns
/// `Ok(())` if the spend is valid, otherwise the single error that decided it.
/// `CLEANSTACK` is only meaningful together with `P2SH`; setting it alone
/// fails any spend that would otherwise pass with `UNKNOWN_ERROR`.
pub fn verify_script(
    script_sig: &Script,
    script_pub_key: &Script,
    flags: ScriptFlags,
    max_ops: usize,
    checker: &dyn SignatureChecker,
) -> Result<(), InterpreterError> {
    verify_script_with_stats(script_sig, script_pub_key, flags, max_ops, checker).map(|_| ())
}

/// Like [`verify_script`], also reporting the resources the spend used.
pub fn verify_script_with_stats(
    script_sig: &Script,
    script_pub_key: &Script,
    flags: ScriptFlags,
    max_ops: usize,
    checker: &dyn SignatureChecker,
) -> Result<ScriptStats, InterpreterError> {
    let result = run_verify(script_sig, script_pub_key, flags, max_ops, checker);
    if let Err(e) = &result {
        log::debug!(
            "script verification failed: {} (scriptSig {}, scriptPubKey {}, flags {})",
            e,
            script_sig,
            script_pub_key,
            flags.format()
        );
    }
    result
}

fn run_verify(
    script_sig: &Script,
    script_pub_key: &Script,
    flags: ScriptFlags,
    max_ops: usize,
    checker: &dyn SignatureChecker,
) -> Result<ScriptStats, InterpreterError> {
    if flags.has_flag(ScriptFlags::SIGPUSHONLY) && !script_sig.is_push_only() {
        return Err(sig_push_only());
    }

    let mut machine = ScriptMachine::new(flags, checker, max_ops);
    machine.eval(script_sig)?;
    let stack_copy = if flags.has_flag(ScriptFlags::P2SH) {
        machine.stack().items().to_vec()
    } else {
        Vec::new()
    };

    machine.clear_alt_stack();
    machine.eval(script_pub_key)?;
    require_true_top(&machine)?;

    if flags.has_flag(ScriptFlags::P2SH) && script_pub_key.is_pay_to_script_hash(flags) {
        if !script_sig.is_push_only() {
            return Err(sig_push_only());
        }

        // The P2SH template hashes the top element, so a passing scriptPubKey
        // guarantees the copied stack is non-empty.
        machine.set_stack(stack_copy);
        let redeem_script = Script::from(machine.pop_stack()?);

        if !flags.has_flag(ScriptFlags::DISALLOW_SEGWIT_RECOVERY)
            && machine.stack().is_empty()
            && redeem_script.is_witness_program()
        {
            return Ok(machine.stats());
        }

        machine.clear_alt_stack();
        machine.eval(&redeem_script)?;
        require_true_top(&machine)?;
    }

    let stats = machine.stats();

    if flags.has_flag(ScriptFlags::CLEANSTACK) {
        if !flags.has_flag(ScriptFlags::P2SH) {
            return Err(InterpreterError::new(
                ScriptErrorCode::UnknownError,
                "CLEANSTACK requires P2SH".to_string(),
            ));
        }
        if machine.stack().depth() != 1 {
            return Err(InterpreterError::new(
                ScriptErrorCode::CleanStack,
                format!("stack contains {} unexpected items", machine.stack().depth() - 1),
            ));
        }
    }

    Ok(stats)
}

fn require_true_top(machine: &ScriptMachine<'_>) -> Result<(), InterpreterError> {
    match machine.stack().items().last() {
        Some(top) if as_bool(top) => Ok(()),
        Some(_) => Err(InterpreterError::new(
            ScriptErrorCode::EvalFalse,
            "false stack entry at end of script execution".to_string(),
        )),
        None => Err(InterpreterError::new(
            ScriptErrorCode::EvalFalse,
            "stack empty at end of script execution".to_string(),
        )),
    }
}

fn sig_push_only() -> InterpreterError {
    InterpreterError::new(
        ScriptErrorCode::SigPushOnly,
        "signature script is not push only".to_string(),
    )
}
