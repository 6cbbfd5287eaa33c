//! Error types for the playcheck engine
//!
//! Domain errors use thiserror; binaries convert to anyhow at their
//! boundary. All three kinds are terminal: the engine never retries,
//! never recovers locally, and never returns partial success.

use thiserror::Error;

/// Script validation failure, raised only by the parser before any driver
/// interaction. Either the whole script is accepted or nothing is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid script at {path}: {reason}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `steps[3].input.x`.
    pub path: String,
    /// Human-readable description of the violated rule.
    pub reason: String,
}

impl ValidationError {
    /// Build a validation error for the given field path.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result alias for parse operations
pub type ParseResult<T> = std::result::Result<T, ValidationError>;

/// Wall-clock budget overrun, raised only by the executor. Steps already
/// applied to the driver stay applied; there is no compensating rollback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("runtime budget of {budget_seconds}s exceeded at step {step}")]
pub struct BudgetError {
    /// Index of the step in flight when the budget was exceeded.
    pub step: usize,
    /// The configured budget in seconds.
    pub budget_seconds: u64,
}

/// Failure surfaced by a driver call, propagated verbatim through the
/// executor and aborting the remaining steps.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("driver failed during {operation}: {message}")]
pub struct DriverError {
    /// The driver operation that failed (e.g. `captureSnapshot`).
    pub operation: String,
    /// Host-provided failure description.
    pub message: String,
}

impl DriverError {
    /// Build a driver error for the named operation.
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Convenience result alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors terminating a script execution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    /// The wall-clock budget ran out mid-replay.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// A driver call failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Convenience result alias for executor operations
pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// Top-level engine error for callers funnelling both phases through one
/// `Result`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The script was rejected at parse time; zero side effects occurred.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The run aborted after some steps were applied to the driver.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl From<BudgetError> for EngineError {
    fn from(err: BudgetError) -> Self {
        Self::Exec(ExecError::Budget(err))
    }
}

impl From<DriverError> for EngineError {
    fn from(err: DriverError) -> Self {
        Self::Exec(ExecError::Driver(err))
    }
}

/// Result type using [`EngineError`]
pub type Result<T> = std::result::Result<T, EngineError>;
