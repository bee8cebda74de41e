//! Runtime error types.

use thiserror::Error;

/// Execution errors.
///
/// The kinds are disjoint and none are caught or retried internally;
/// each propagates unchanged to the caller of `execute`. The single
/// exception is [`ExecError::DryRunMutation`], which the executor
/// catches at its one assignment site to record a would-set trace
/// event instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// Unsupported node, malformed step, or other general failure.
    #[error("execution error: {0}")]
    Execution(String),

    /// A variable was read before any scope bound it.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// `if` / `while` condition did not evaluate to a boolean.
    #[error("condition must be a boolean, got {0}")]
    NonBooleanCondition(String),

    /// Operator outside the supported set.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Operator applied to operand types it does not support.
    #[error("operator '{op}' not supported for {left} and {right}")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
    },

    /// `for` target did not evaluate to a list.
    #[error("cannot iterate over {0}")]
    NotIterable(String),

    /// A gated call was attempted without its capability.
    #[error("capability '{capability}' required by '{call}' is not granted")]
    MissingCapability { capability: String, call: String },

    /// A loop exceeded the configured iteration budget.
    #[error("iteration budget of {0} exceeded")]
    IterationBudgetExceeded(u64),

    /// A write was attempted while dry-run is active.
    #[error("dry run: refusing to set '{0}'")]
    DryRunMutation(String),

    /// A builtin function rejected its arguments.
    #[error("builtin error: {0}")]
    Builtin(String),
}

/// Result alias for runtime operations.
pub type ExecResult<T> = Result<T, ExecError>;
