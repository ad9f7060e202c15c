//! Cooperative execution deadline.
//!
//! The interpreter has no preemption; it checks this deadline at the top
//! of every statement and once per loop iteration. Between check points
//! the budget can be exceeded, which is the accepted cost of keeping the
//! checks off the expression-evaluation hot path.

use std::time::{Duration, Instant};

use crate::error::{ErrorKind, RunResult, ScriptError};

/// Wall-clock budget for one interpretation run.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
    budget_ms: u64,
}

impl Deadline {
    /// Start the clock with a budget in milliseconds.
    #[must_use]
    pub fn starting_now(budget_ms: u64) -> Self {
        Self {
            expires_at: Instant::now() + Duration::from_millis(budget_ms),
            budget_ms,
        }
    }

    /// Fail if the budget is exhausted.
    pub fn check(&self) -> RunResult<()> {
        if Instant::now() >= self.expires_at {
            Err(ScriptError::new(
                ErrorKind::Timeout,
                format!(
                    "Execution timed out after {} ms; simplify the script or raise the execution timeout",
                    self.budget_ms
                ),
            ))
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generous_budget_passes() {
        let deadline = Deadline::starting_now(60_000);
        assert!(deadline.check().is_ok());
    }

    #[test]
    fn zero_budget_fails_immediately() {
        let deadline = Deadline::starting_now(0);
        let err = deadline.check().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("0 ms"), "message: {}", err.message);
    }
}
