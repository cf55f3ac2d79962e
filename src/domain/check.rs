// Check bookkeeping - hard and soft verification results
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("hard check failed: {0}")]
    HardCheckFailed(String),
    #[error("task {task} did not finish within {ttl_secs}s")]
    TaskTimeout { task: String, ttl_secs: u64 },
    #[error("task {task} failed on the backend")]
    TaskFailed { task: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSeverity {
    /// Failure is recorded and later checks keep running.
    Soft,
    /// Failure aborts the remaining steps of the running flow.
    Hard,
}

#[derive(Debug, Clone)]
pub struct CheckEntry {
    pub description: String,
    pub passed: bool,
    pub severity: CheckSeverity,
}

/// Ordered record of every check a run performed.
#[derive(Debug, Default)]
pub struct CheckContext {
    entries: Vec<CheckEntry>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a soft check. Returns `ok` so callers can guard follow-up
    /// steps that only make sense when the check passed.
    pub fn soft(&mut self, ok: bool, description: impl Into<String>) -> bool {
        let description = description.into();
        if !ok {
            tracing::error!("check failed: {description}");
        }
        self.entries.push(CheckEntry {
            description,
            passed: ok,
            severity: CheckSeverity::Soft,
        });
        ok
    }

    /// Record a hard check; a failure aborts the flow via `?`.
    pub fn hard(&mut self, ok: bool, description: impl Into<String>) -> Result<(), CheckError> {
        let description = description.into();
        if ok {
            self.entries.push(CheckEntry {
                description,
                passed: true,
                severity: CheckSeverity::Hard,
            });
            Ok(())
        } else {
            Err(self.fail_hard(description))
        }
    }

    /// Record an unconditional hard failure and hand back the error to return.
    pub fn fail_hard(&mut self, description: impl Into<String>) -> CheckError {
        let description = description.into();
        tracing::error!("hard check failed: {description}");
        self.entries.push(CheckEntry {
            description: description.clone(),
            passed: false,
            severity: CheckSeverity::Hard,
        });
        CheckError::HardCheckFailed(description)
    }

    pub fn entries(&self) -> &[CheckEntry] {
        &self.entries
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.passed).count()
    }

    pub fn failed(&self) -> bool {
        self.failure_count() > 0
    }
}
