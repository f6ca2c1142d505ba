//! Flow control and locktime operations for the script interpreter.

use super::config::LOCKTIME_SCRIPTNUM_SIZE;
use super::error::{InterpreterError, ScriptErrorCode};
use super::flags::ScriptFlags;
use super::machine::ScriptMachine;
use super::scriptnum::ScriptNum;
use super::stack::as_bool;
use crate::opcodes::opcode_to_string;

/// Sequence lock time disabled bit.
pub(crate) const SEQUENCE_LOCKTIME_DISABLE_FLAG: i64 = 1 << 31;

impl<'a> ScriptMachine<'a> {
    pub(crate) fn op_upgradable_nop(&self, op: u8) -> Result<(), InterpreterError> {
        if self.has_flag(ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(InterpreterError::new(
                ScriptErrorCode::DiscourageUpgradableNops,
                format!("{} reserved for soft-fork upgrades", opcode_to_string(op)),
            ));
        }
        Ok(())
    }

    /// Read the IF/NOTIF operand, enforcing MINIMALIF.
    fn pop_if_bool(&mut self) -> Result<bool, InterpreterError> {
        let b = self.stack.pop()?;
        if self.has_flag(ScriptFlags::MINIMALIF) && (b.len() > 1 || (b.len() == 1 && b[0] != 1)) {
            return Err(InterpreterError::new(
                ScriptErrorCode::MinimalIf,
                format!("conditional operand {} is not minimal", hex::encode(&b)),
            ));
        }
        Ok(as_bool(&b))
    }

    pub(crate) fn op_if(&mut self, negate: bool, executing: bool) -> Result<(), InterpreterError> {
        let mut value = false;
        if executing {
            if self.stack.is_empty() {
                return Err(InterpreterError::new(
                    ScriptErrorCode::UnbalancedConditional,
                    "conditional with an empty stack".to_string(),
                ));
            }
            value = self.pop_if_bool()? != negate;
        }
        self.cond_stack.push(value);
        Ok(())
    }

    pub(crate) fn op_else(&mut self) -> Result<(), InterpreterError> {
        match self.cond_stack.last_mut() {
            Some(top) => {
                *top = !*top;
                Ok(())
            }
            None => Err(unmatched("OP_ELSE")),
        }
    }

    pub(crate) fn op_endif(&mut self) -> Result<(), InterpreterError> {
        self.cond_stack.pop().map(|_| ()).ok_or_else(|| unmatched("OP_ENDIF"))
    }

    pub(crate) fn op_verify(&mut self) -> Result<(), InterpreterError> {
        self.abstract_verify(ScriptErrorCode::Verify)
    }

    /// Pop the top element and fail with `code` unless it is true.
    pub(crate) fn abstract_verify(&mut self, code: ScriptErrorCode) -> Result<(), InterpreterError> {
        self.stack.require(1)?;
        if !as_bool(self.stack.peek(0)?) {
            return Err(InterpreterError::new(code, format!("{} failed", code)));
        }
        self.stack.pop()?;
        Ok(())
    }

    /// Decode the (unpopped) locktime operand, which may be 5 bytes wide.
    fn locktime_operand(&self) -> Result<ScriptNum, InterpreterError> {
        self.stack.require(1)?;
        let n = ScriptNum::from_bytes(
            self.stack.peek(0)?,
            self.require_minimal(),
            LOCKTIME_SCRIPTNUM_SIZE,
        )?;
        if n.value() < 0 {
            return Err(InterpreterError::new(
                ScriptErrorCode::NegativeLocktime,
                format!("negative lock time: {}", n),
            ));
        }
        Ok(n)
    }

    pub(crate) fn op_check_lock_time_verify(&mut self) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::CHECKLOCKTIMEVERIFY) {
            return Ok(());
        }

        let lock_time = self.locktime_operand()?;
        if !self.checker.check_lock_time(lock_time) {
            return Err(InterpreterError::new(
                ScriptErrorCode::UnsatisfiedLocktime,
                format!("lock time {} not satisfied", lock_time),
            ));
        }
        Ok(())
    }

    pub(crate) fn op_check_sequence_verify(&mut self) -> Result<(), InterpreterError> {
        if !self.has_flag(ScriptFlags::CHECKSEQUENCEVERIFY) {
            return Ok(());
        }

        let sequence = self.locktime_operand()?;

        // Operands with the disable bit behave as a NOP.
        if sequence.value() & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return Ok(());
        }

        if !self.checker.check_sequence(sequence) {
            return Err(InterpreterError::new(
                ScriptErrorCode::UnsatisfiedLocktime,
                format!("relative lock time {} not satisfied", sequence),
            ));
        }
        Ok(())
    }
}

fn unmatched(name: &str) -> InterpreterError {
    InterpreterError::new(
        ScriptErrorCode::UnbalancedConditional,
        format!(
            "encountered opcode {} with no matching opcode to begin conditional execution",
            name
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::checker::{NullChecker, SignatureChecker};
    use crate::interpreter::config::MAX_OPS_PER_SCRIPT;
    use crate::Script;

    struct LockChecker {
        lock_time: i64,
        sequence: i64,
    }

    impl SignatureChecker for LockChecker {
        fn check_lock_time(&self, lock_time: ScriptNum) -> bool {
            lock_time.value() <= self.lock_time
        }

        fn check_sequence(&self, sequence: ScriptNum) -> bool {
            sequence.value() <= self.sequence
        }
    }

    fn run_with(
        asm: &str,
        flags: ScriptFlags,
        checker: &dyn SignatureChecker,
    ) -> Result<Vec<Vec<u8>>, ScriptErrorCode> {
        let script = Script::from_asm(asm).unwrap();
        let mut machine = ScriptMachine::new(flags, checker, MAX_OPS_PER_SCRIPT);
        match machine.eval(&script) {
            Ok(()) => Ok(machine.stack().items().to_vec()),
            Err(e) => Err(e.code),
        }
    }

    fn run(asm: &str, flags: ScriptFlags) -> Result<Vec<Vec<u8>>, ScriptErrorCode> {
        run_with(asm, flags, &NullChecker)
    }

    #[test]
    fn test_if_else_endif() {
        assert_eq!(run("OP_1 OP_IF OP_2 OP_ELSE OP_3 OP_ENDIF", ScriptFlags::NONE).unwrap(), vec![vec![2]]);
        assert_eq!(run("OP_0 OP_IF OP_2 OP_ELSE OP_3 OP_ENDIF", ScriptFlags::NONE).unwrap(), vec![vec![3]]);
        assert_eq!(run("OP_0 OP_NOTIF OP_2 OP_ENDIF", ScriptFlags::NONE).unwrap(), vec![vec![2]]);
        // Multiple ELSE toggles the branch each time.
        assert_eq!(
            run("OP_1 OP_IF OP_2 OP_ELSE OP_3 OP_ELSE OP_4 OP_ENDIF", ScriptFlags::NONE).unwrap(),
            vec![vec![2], vec![4]]
        );
        // Nested IF inside an unexecuted branch does not pop.
        assert_eq!(
            run("OP_0 OP_IF OP_IF OP_2 OP_ENDIF OP_ENDIF OP_5", ScriptFlags::NONE).unwrap(),
            vec![vec![5]]
        );
    }

    #[test]
    fn test_conditional_errors() {
        assert_eq!(run("OP_IF OP_ENDIF", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::UnbalancedConditional);
        assert_eq!(run("OP_ELSE", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::UnbalancedConditional);
        assert_eq!(run("OP_ENDIF", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::UnbalancedConditional);
    }

    #[test]
    fn test_minimal_if() {
        assert!(run("02 OP_IF OP_ENDIF", ScriptFlags::NONE).is_ok());
        assert_eq!(run("02 OP_IF OP_ENDIF", ScriptFlags::MINIMALIF).unwrap_err(), ScriptErrorCode::MinimalIf);
        assert_eq!(run("0100 OP_IF OP_ENDIF", ScriptFlags::MINIMALIF).unwrap_err(), ScriptErrorCode::MinimalIf);
        assert!(run("OP_1 OP_IF OP_ENDIF OP_0 OP_IF OP_ENDIF", ScriptFlags::MINIMALIF).is_ok());
    }

    #[test]
    fn test_verify_and_return() {
        assert!(run("OP_1 OP_VERIFY", ScriptFlags::NONE).unwrap().is_empty());
        assert_eq!(run("OP_0 OP_VERIFY", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::Verify);
        assert_eq!(run("OP_VERIFY", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::InvalidStackOperation);
        assert_eq!(run("OP_1 OP_RETURN", ScriptFlags::NONE).unwrap_err(), ScriptErrorCode::OpReturn);
        assert!(run("OP_0 OP_IF OP_RETURN OP_ENDIF", ScriptFlags::NONE).is_ok());
    }

    #[test]
    fn test_upgradable_nops() {
        assert!(run("OP_NOP1 OP_NOP10", ScriptFlags::NONE).is_ok());
        assert_eq!(
            run("OP_NOP5", ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS).unwrap_err(),
            ScriptErrorCode::DiscourageUpgradableNops
        );
        assert!(run("OP_0 OP_IF OP_NOP5 OP_ENDIF", ScriptFlags::DISCOURAGE_UPGRADABLE_NOPS).is_ok());
    }

    #[test]
    fn test_checklocktimeverify() {
        let checker = LockChecker { lock_time: 100, sequence: 0 };
        let cltv = ScriptFlags::CHECKLOCKTIMEVERIFY;

        // Without the flag the opcode is a NOP.
        assert!(run_with("OP_CHECKLOCKTIMEVERIFY", ScriptFlags::NONE, &checker).is_ok());

        assert_eq!(
            run_with("OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap_err(),
            ScriptErrorCode::InvalidStackOperation
        );
        assert_eq!(
            run_with("OP_1NEGATE OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap_err(),
            ScriptErrorCode::NegativeLocktime
        );
        // Operand stays on the stack.
        assert_eq!(run_with("64 OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap(), vec![vec![100]]);
        assert_eq!(
            run_with("65 OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap_err(),
            ScriptErrorCode::UnsatisfiedLocktime
        );
        // Five-byte operands are accepted, six are not.
        assert_eq!(
            run_with("0000000001 OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap_err(),
            ScriptErrorCode::UnsatisfiedLocktime
        );
        assert_eq!(
            run_with("000000000001 OP_CHECKLOCKTIMEVERIFY", cltv, &checker).unwrap_err(),
            ScriptErrorCode::NumberOverflow
        );
    }

    #[test]
    fn test_checksequenceverify() {
        let checker = LockChecker { lock_time: 0, sequence: 10 };
        let csv = ScriptFlags::CHECKSEQUENCEVERIFY;

        assert!(run_with("OP_10 OP_CHECKSEQUENCEVERIFY", csv, &checker).is_ok());
        assert_eq!(
            run_with("OP_11 OP_CHECKSEQUENCEVERIFY", csv, &checker).unwrap_err(),
            ScriptErrorCode::UnsatisfiedLocktime
        );
        // Disable bit set: the check is skipped.
        assert!(run_with("0000008000 OP_CHECKSEQUENCEVERIFY", csv, &checker).is_ok());
        assert_eq!(
            run_with("OP_1NEGATE OP_CHECKSEQUENCEVERIFY", csv, &checker).unwrap_err(),
            ScriptErrorCode::NegativeLocktime
        );
        // The null checker refuses every sequence.
        assert_eq!(
            run("OP_1 OP_CHECKSEQUENCEVERIFY", csv).unwrap_err(),
            ScriptErrorCode::UnsatisfiedLocktime
        );
    }
}
