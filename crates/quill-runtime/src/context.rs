//! Scoped execution context.

use crate::error::{ExecError, ExecResult};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Default loop-iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// A single scope level.
#[derive(Debug, Clone)]
struct Scope {
    bindings: BTreeMap<String, Value>,
}

impl Scope {
    fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }
}

/// Execution context: a stack of lexical scopes plus the execution
/// configuration.
///
/// Variables are looked up from the innermost scope outward. The
/// capability set, dry-run flag and iteration budget are fixed at
/// creation (builder methods consume `self`); nothing mutates them
/// mid-execution. Scopes form a stack — one child per loop iteration
/// and per conditional block entry, discarded when the block returns —
/// so the scope tree has no cycles and no shared mutable state.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    scopes: Vec<Scope>,
    capabilities: BTreeSet<String>,
    dry_run: bool,
    max_iterations: u64,
}

impl ExecutionContext {
    /// Create a context with one root scope, no capabilities, dry-run
    /// off, and the default iteration budget.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            capabilities: BTreeSet::new(),
            dry_run: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    // ── Configuration (creation time only) ───────────────────────────

    /// Grant a capability. Only usable at creation; the set is fixed
    /// afterwards.
    pub fn allow(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Enable dry-run: writes through [`ExecutionContext::assign`] are
    /// refused.
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Override the loop-iteration budget.
    pub fn with_max_iterations(mut self, limit: u64) -> Self {
        self.max_iterations = limit;
        self
    }

    /// Returns `true` if the capability was granted at creation.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    // ── Scopes ───────────────────────────────────────────────────────

    /// Push a child scope (loop iteration, conditional block).
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Current scope depth (1 = root only). Useful for asserting that
    /// blocks restore the stack they found.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    // ── Variables ────────────────────────────────────────────────────

    /// Look up a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<&Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
        }
        None
    }

    /// Assign a variable: updates the innermost scope that already
    /// binds `name`, else defines it in the current scope.
    ///
    /// In dry-run this always fails with
    /// [`ExecError::DryRunMutation`] — the executor decides at its one
    /// call site whether to catch it and record a would-set instead.
    pub fn assign(&mut self, name: &str, value: Value) -> ExecResult<()> {
        if self.dry_run {
            return Err(ExecError::DryRunMutation(name.to_string()));
        }
        for scope in self.scopes.iter_mut().rev() {
            if scope.bindings.contains_key(name) {
                scope.bindings.insert(name.to_string(), value);
                return Ok(());
            }
        }
        self.define(name, value);
        Ok(())
    }

    /// Bind a variable in the current (innermost) scope.
    ///
    /// This is scope construction (loop variables, task inputs), not a
    /// tracked write, so it is exempt from the dry-run rule.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), value);
        }
    }

    /// All currently visible bindings, innermost shadowing outermost.
    /// Used for trace snapshots.
    pub fn visible_bindings(&self) -> BTreeMap<String, Value> {
        let mut bindings = BTreeMap::new();
        for scope in &self.scopes {
            for (name, value) in &scope.bindings {
                bindings.insert(name.clone(), value.clone());
            }
        }
        bindings
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_binding_vanishes_on_pop() {
        let mut ctx = ExecutionContext::new();
        ctx.push_scope();
        ctx.define("temp", Value::Int(1));
        assert!(ctx.get("temp").is_some());
        ctx.pop_scope();
        assert!(ctx.get("temp").is_none());
    }

    #[test]
    fn test_assign_writes_through_to_outer_binding() {
        let mut ctx = ExecutionContext::new();
        ctx.define("counter", Value::Int(0));
        ctx.push_scope();
        ctx.assign("counter", Value::Int(1)).unwrap();
        ctx.pop_scope();
        assert_eq!(ctx.get("counter"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_define_shadows_outer_binding() {
        let mut ctx = ExecutionContext::new();
        ctx.define("x", Value::Int(1));
        ctx.push_scope();
        ctx.define("x", Value::Int(2));
        assert_eq!(ctx.get("x"), Some(&Value::Int(2)));
        ctx.pop_scope();
        assert_eq!(ctx.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_root_scope_is_never_popped() {
        let mut ctx = ExecutionContext::new();
        ctx.define("x", Value::Int(1));
        ctx.pop_scope();
        ctx.pop_scope();
        assert_eq!(ctx.get("x"), Some(&Value::Int(1)));
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_dry_run_assign_is_refused() {
        let mut ctx = ExecutionContext::new().with_dry_run();
        let err = ctx.assign("x", Value::Int(1)).unwrap_err();
        assert_eq!(err, ExecError::DryRunMutation("x".to_string()));
        assert!(ctx.get("x").is_none());
    }

    #[test]
    fn test_dry_run_define_still_binds() {
        let mut ctx = ExecutionContext::new().with_dry_run();
        ctx.define("item", Value::Int(1));
        assert_eq!(ctx.get("item"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_capabilities_are_fixed_at_creation() {
        let ctx = ExecutionContext::new().allow("io.read");
        assert!(ctx.has_capability("io.read"));
        assert!(!ctx.has_capability("io.write"));
    }

    #[test]
    fn test_visible_bindings_shadowing() {
        let mut ctx = ExecutionContext::new();
        ctx.define("a", Value::Int(1));
        ctx.push_scope();
        ctx.define("a", Value::Int(2));
        ctx.define("b", Value::Int(3));
        let visible = ctx.visible_bindings();
        assert_eq!(visible.get("a"), Some(&Value::Int(2)));
        assert_eq!(visible.get("b"), Some(&Value::Int(3)));
    }
}
