//! The tree-walking executor.
//!
//! Dispatches purely on the closed AST node set and never evaluates or
//! compiles text supplied at runtime. Capability policy and builtin
//! registry are explicit constructor values, never global state, so
//! every run is configured in isolation.

use crate::builtins::BuiltinRegistry;
use crate::context::ExecutionContext;
use crate::error::{ExecError, ExecResult};
use crate::policy::CapabilityPolicy;
use crate::trace::{snapshot_bindings, Phase, TraceCollector, TraceEvent};
use crate::value::Value;
use quill_parser::{parse_step_action, StepAction};
use quill_types::ast::*;
use quill_types::NodeKind;
use std::collections::BTreeMap;

/// The Quill runtime executor.
///
/// One executor runs one program at a time; the iteration counter and
/// trace collector belong to the current run. Independent concurrent
/// executions each get their own executor and context.
pub struct RuntimeExecutor {
    policy: CapabilityPolicy,
    builtins: BuiltinRegistry,
    trace: Option<TraceCollector>,
    /// Iterations consumed by the current run, across all loops.
    iterations: u64,
    /// Metadata to merge into the next exit event (would-set records).
    pending_exit_metadata: BTreeMap<String, serde_json::Value>,
}

impl RuntimeExecutor {
    /// Create an executor with the given policy and builtin registry.
    pub fn new(policy: CapabilityPolicy, builtins: BuiltinRegistry) -> Self {
        Self {
            policy,
            builtins,
            trace: None,
            iterations: 0,
            pending_exit_metadata: BTreeMap::new(),
        }
    }

    /// An executor with the standard policy and standard builtins.
    pub fn standard() -> Self {
        Self::new(CapabilityPolicy::standard(), BuiltinRegistry::standard())
    }

    /// Attach a fresh trace collector.
    pub fn with_tracing(mut self) -> Self {
        self.trace = Some(TraceCollector::new());
        self
    }

    /// The attached collector, if tracing is on.
    pub fn trace(&self) -> Option<&TraceCollector> {
        self.trace.as_ref()
    }

    /// Detach and return the collector, leaving tracing off.
    pub fn take_trace(&mut self) -> Option<TraceCollector> {
        self.trace.take()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════

    /// Run every flow of a module, in order. Returns the last flow's
    /// value.
    pub fn run_module(&mut self, module: &Module, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        self.iterations = 0;
        self.record(NodeKind::Module, Phase::Enter, ctx, None);
        let mut result = Ok(Value::Null);
        for flow in &module.flows {
            result = self.run_block(NodeKind::Flow, &flow.steps, ctx);
            if result.is_err() {
                break;
            }
        }
        self.record_outcome(NodeKind::Module, ctx, &result);
        result
    }

    /// Run one task. The task's steps execute against the given
    /// context; the result is the last step's value (`Null` when a
    /// task has no return step).
    pub fn run_task(&mut self, task: &TaskDef, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        self.iterations = 0;
        self.run_block(NodeKind::Task, &task.steps, ctx)
    }

    /// Run one flow.
    pub fn run_flow(&mut self, flow: &FlowDef, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        self.iterations = 0;
        self.run_block(NodeKind::Flow, &flow.steps, ctx)
    }

    /// Execute a single statement.
    pub fn execute(&mut self, stmt: &Stmt, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        let kind = stmt.kind();
        self.record(kind, Phase::Enter, ctx, None);
        let result = match stmt {
            Stmt::Step(step) => self.exec_step(step, ctx),
            Stmt::If(node) => self.exec_if(node, ctx),
            Stmt::While(node) => self.exec_while(node, ctx),
            Stmt::For(node) => self.exec_for(node, ctx),
        };
        self.record_outcome(kind, ctx, &result);
        result
    }

    /// Trace `kind` enter/exit around a top-level statement block.
    fn run_block(
        &mut self,
        kind: NodeKind,
        stmts: &[Stmt],
        ctx: &mut ExecutionContext,
    ) -> ExecResult<Value> {
        self.record(kind, Phase::Enter, ctx, None);
        let result = self.exec_block(stmts, ctx);
        self.record_outcome(kind, ctx, &result);
        result
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    /// Execute statements in the current scope. The block's value is
    /// the last statement's value, or `Null` for an empty block.
    fn exec_block(&mut self, stmts: &[Stmt], ctx: &mut ExecutionContext) -> ExecResult<Value> {
        let mut last = Value::Null;
        for stmt in stmts {
            last = self.execute(stmt, ctx)?;
        }
        Ok(last)
    }

    /// Execute statements in a fresh child scope, popped on the way
    /// out even when the block fails.
    fn exec_block_scoped(
        &mut self,
        stmts: &[Stmt],
        ctx: &mut ExecutionContext,
    ) -> ExecResult<Value> {
        ctx.push_scope();
        let result = self.exec_block(stmts, ctx);
        ctx.pop_scope();
        result
    }

    /// A dash step: parse the action text and perform it, then run any
    /// substeps. The step's value is the last substep's value when
    /// substeps exist, else the action's value.
    fn exec_step(&mut self, step: &Step, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        let action = parse_step_action(&step.action)
            .map_err(|err| ExecError::Execution(format!("cannot evaluate step action: {err}")))?;
        let action_value = match action {
            StepAction::Assign { name, value } => {
                let value = self.eval_expr(&value, ctx)?;
                match ctx.assign(&name, value) {
                    Ok(()) => Value::Null,
                    // the one place a dry-run refusal is absorbed:
                    // record a would-set and skip the write
                    Err(ExecError::DryRunMutation(_)) => {
                        self.note_would_set(&name);
                        Value::Null
                    }
                    Err(other) => return Err(other),
                }
            }
            StepAction::Return(expr) => self.eval_expr(&expr, ctx)?,
            StepAction::Call { name, args } => self.exec_call(&name, &args, ctx)?,
            StepAction::Opaque(_) => Value::Null,
        };

        if step.substeps.is_empty() {
            Ok(action_value)
        } else {
            self.exec_block(&step.substeps, ctx)
        }
    }

    fn exec_if(&mut self, node: &If, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        if self.eval_condition(&node.condition, ctx)? {
            return self.exec_block_scoped(&node.body, ctx);
        }
        for (condition, body) in &node.elif_branches {
            if self.eval_condition(condition, ctx)? {
                return self.exec_block_scoped(body, ctx);
            }
        }
        if let Some(body) = &node.else_body {
            return self.exec_block_scoped(body, ctx);
        }
        Ok(Value::Null)
    }

    fn exec_while(&mut self, node: &While, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        let mut last = Value::Null;
        while self.eval_condition(&node.condition, ctx)? {
            self.charge_iteration(ctx)?;
            last = self.exec_block_scoped(&node.body, ctx)?;
        }
        Ok(last)
    }

    fn exec_for(&mut self, node: &For, ctx: &mut ExecutionContext) -> ExecResult<Value> {
        // the iterable is evaluated exactly once
        let iterable = self.eval_expr(&node.iterable, ctx)?;
        let Value::List(items) = iterable else {
            return Err(ExecError::NotIterable(iterable.type_name().to_string()));
        };
        let mut last = Value::Null;
        for item in items {
            self.charge_iteration(ctx)?;
            ctx.push_scope();
            ctx.define(&node.iterator, item);
            let result = self.exec_block(&node.body, ctx);
            ctx.pop_scope();
            last = result?;
        }
        Ok(last)
    }

    /// Consume one unit of the iteration budget. Charged once per body
    /// execution, so a loop that terminates within exactly N
    /// iterations fits a budget of N and the (N+1)-th body entry
    /// fails. A condition check that exits the loop costs nothing.
    fn charge_iteration(&mut self, ctx: &ExecutionContext) -> ExecResult<()> {
        self.iterations += 1;
        if self.iterations > ctx.max_iterations() {
            Err(ExecError::IterationBudgetExceeded(ctx.max_iterations()))
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    /// A `call NAME with args` step action.
    ///
    /// Builtins are deterministic and never gated. Gated calls require
    /// their capability and are effect placeholders — the runtime
    /// itself performs no I/O.
    fn exec_call(
        &mut self,
        name: &str,
        args: &[Expr],
        ctx: &mut ExecutionContext,
    ) -> ExecResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, ctx)?);
        }

        if let Some(function) = self.builtins.lookup(name) {
            return function(&values);
        }

        if let Some(capability) = self.policy.required_capability(name) {
            if !ctx.has_capability(capability) {
                return Err(ExecError::MissingCapability {
                    capability: capability.to_string(),
                    call: name.to_string(),
                });
            }
            return Ok(Value::Null);
        }

        Err(ExecError::Execution(format!("unknown call: {name}")))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a value.
    pub fn eval_expr(&mut self, expr: &Expr, ctx: &ExecutionContext) -> ExecResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Identifier(name) => ctx
                .get(name)
                .cloned()
                .ok_or_else(|| ExecError::UnknownVariable(name.clone())),
            ExprKind::Binary { left, op, right } => {
                let lhs = self.eval_expr(left, ctx)?;
                let rhs = self.eval_expr(right, ctx)?;
                apply_binop(*op, &lhs, &rhs)
            }
        }
    }

    /// Evaluate a condition, which must be strictly boolean.
    fn eval_condition(&mut self, expr: &Expr, ctx: &ExecutionContext) -> ExecResult<bool> {
        match self.eval_expr(expr, ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExecError::NonBooleanCondition(
                other.type_name().to_string(),
            )),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Tracing
    // ══════════════════════════════════════════════════════════════════════

    fn record(
        &mut self,
        kind: NodeKind,
        phase: Phase,
        ctx: &ExecutionContext,
        result: Option<&Value>,
    ) {
        self.record_with(kind, phase, ctx, result, BTreeMap::new());
    }

    fn record_with(
        &mut self,
        kind: NodeKind,
        phase: Phase,
        ctx: &ExecutionContext,
        result: Option<&Value>,
        metadata: BTreeMap<String, serde_json::Value>,
    ) {
        if let Some(collector) = self.trace.as_mut() {
            collector.record(TraceEvent {
                node_kind: kind,
                phase,
                snapshot: snapshot_bindings(&ctx.visible_bindings()),
                result: result.map(Value::to_json),
                metadata,
            });
        }
    }

    /// Record the exit event for a finished node. On failure the event
    /// carries the error text in metadata before the error propagates,
    /// so a partial trace survives abnormal termination.
    fn record_outcome(
        &mut self,
        kind: NodeKind,
        ctx: &ExecutionContext,
        result: &ExecResult<Value>,
    ) {
        let mut metadata = std::mem::take(&mut self.pending_exit_metadata);
        match result {
            Ok(value) => self.record_with(kind, Phase::Exit, ctx, Some(value), metadata),
            Err(err) => {
                metadata.insert(
                    "error".to_string(),
                    serde_json::Value::from(err.to_string()),
                );
                self.record_with(kind, Phase::Exit, ctx, None, metadata);
            }
        }
    }

    /// Mark the next exit event with a suppressed dry-run write.
    fn note_would_set(&mut self, name: &str) {
        self.pending_exit_metadata
            .insert("would_set".to_string(), serde_json::Value::from(name));
    }
}

/// Convert a source literal into a runtime value.
fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(n) => Value::Float(*n),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

/// Apply a binary operator.
///
/// Fixed semantics: Int op Int stays integral except `/`, which always
/// divides as float; mixed numerics promote to float; `+` concatenates
/// strings; comparisons work on numbers and strings; `==`/`!=` are
/// structural with numeric cross-type equality; `and`/`or` are
/// strictly boolean.
fn apply_binop(op: BinOp, lhs: &Value, rhs: &Value) -> ExecResult<Value> {
    use BinOp::*;

    let invalid = || ExecError::InvalidOperands {
        op: op.as_str().to_string(),
        left: lhs.type_name().to_string(),
        right: rhs.type_name().to_string(),
    };

    match op {
        Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| ExecError::Execution("integer overflow in '+'".to_string())),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => numeric_float(lhs, rhs, invalid, |a, b| a + b),
        },
        Sub => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_sub(*b)
                .map(Value::Int)
                .ok_or_else(|| ExecError::Execution("integer overflow in '-'".to_string())),
            _ => numeric_float(lhs, rhs, invalid, |a, b| a - b),
        },
        Mul => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_mul(*b)
                .map(Value::Int)
                .ok_or_else(|| ExecError::Execution("integer overflow in '*'".to_string())),
            _ => numeric_float(lhs, rhs, invalid, |a, b| a * b),
        },
        // division is always float division
        Div => {
            let (a, b) = both_numbers(lhs, rhs, invalid)?;
            if b == 0.0 {
                return Err(ExecError::Execution("division by zero".to_string()));
            }
            Ok(Value::Float(a / b))
        }
        Mod => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    Err(ExecError::Execution("modulo by zero".to_string()))
                } else {
                    Ok(Value::Int(a.rem_euclid(*b)))
                }
            }
            _ => {
                let (a, b) = both_numbers(lhs, rhs, invalid)?;
                if b == 0.0 {
                    return Err(ExecError::Execution("modulo by zero".to_string()));
                }
                Ok(Value::Float(a.rem_euclid(b)))
            }
        },

        Less | Greater | LessEq | GreaterEq => {
            if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
                Ok(Value::Bool(compare(op, a.partial_cmp(&b))))
            } else if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
                Ok(Value::Bool(compare(op, Some(a.cmp(b)))))
            } else {
                Err(invalid())
            }
        }

        Eq => Ok(Value::Bool(values_equal(lhs, rhs))),
        NotEq => Ok(Value::Bool(!values_equal(lhs, rhs))),

        And | Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(invalid()),
        },
    }
}

fn numeric_float(
    lhs: &Value,
    rhs: &Value,
    invalid: impl Fn() -> ExecError,
    f: fn(f64, f64) -> f64,
) -> ExecResult<Value> {
    let (a, b) = both_numbers(lhs, rhs, invalid)?;
    Ok(Value::Float(f(a, b)))
}

fn both_numbers(
    lhs: &Value,
    rhs: &Value,
    invalid: impl Fn() -> ExecError,
) -> ExecResult<(f64, f64)> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(invalid()),
    }
}

fn compare(op: BinOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match (op, ordering) {
        (BinOp::Less, Some(Less)) => true,
        (BinOp::Greater, Some(Greater)) => true,
        (BinOp::LessEq, Some(Less | Equal)) => true,
        (BinOp::GreaterEq, Some(Greater | Equal)) => true,
        _ => false,
    }
}

/// Structural equality with numeric cross-type equality (`1 == 1.0`).
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs == rhs,
    }
}
