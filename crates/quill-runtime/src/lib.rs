//! Quill runtime: sandboxed, capability-gated tree-walking execution
//! with tracing, explanation, and replay validation.

pub mod builtins;
pub mod context;
pub mod error;
pub mod executor;
pub mod explain;
pub mod policy;
pub mod replay;
pub mod trace;
pub mod value;

pub use builtins::BuiltinRegistry;
pub use context::{ExecutionContext, DEFAULT_MAX_ITERATIONS};
pub use error::{ExecError, ExecResult};
pub use executor::RuntimeExecutor;
pub use explain::{ExplanationEngine, ExplanationOutput, ExplanationStep};
pub use policy::CapabilityPolicy;
pub use replay::{ReplayEngine, ReplayError};
pub use trace::{Phase, TraceCollector, TraceEvent};
pub use value::Value;
