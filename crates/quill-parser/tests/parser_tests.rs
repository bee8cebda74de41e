//! Parser tests for Quill.
//!
//! Covers: module headers, import ordering, all declaration forms,
//! steps with substeps, control flow, the minimal expression grammar,
//! constraints and deviation blocks, error reporting, and structural
//! determinism.

use quill_parser::parse;
use quill_types::ast::*;
use quill_types::SyntaxError;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn parse_ok(source: &str) -> Module {
    parse(source, "test.quill").expect("source should parse")
}

fn parse_err(source: &str) -> SyntaxError {
    parse(source, "test.quill").expect_err("source should fail to parse")
}

const ORDER_MODULE: &str = "\
module orders

import std.math
import audit

entity Order:
    id: Int
    total: Float
    constraints:
        - total >= 0

enum Status:
    - Pending
    - Shipped
    - Cancelled

task compute_total:
    inputs:
        base: Float
    outputs:
        total: Float
    steps:
        - set total to base * 2
        - return total

flow fulfillment:
    steps:
        - receive the order
        if ready:
            - ship the order
        else:
            - hold the order

policy refunds:
    rules:
        - refunds require a manager approval
        - no refunds after 90 days
";

// ─────────────────────────────────────────────────────────────────────
// Top level
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_full_module() {
    let module = parse_ok(ORDER_MODULE);
    assert_eq!(module.name, "orders");
    assert!(module.has_module_declaration);
    assert_eq!(module.imports.len(), 2);
    assert_eq!(module.entities.len(), 1);
    assert_eq!(module.enums.len(), 1);
    assert_eq!(module.tasks.len(), 1);
    assert_eq!(module.flows.len(), 1);
    assert_eq!(module.policies.len(), 1);
}

#[test]
fn test_module_header_is_optional() {
    let module = parse_ok("task t:\n    steps:\n        - return 1\n");
    assert!(!module.has_module_declaration);
    assert_eq!(module.name, "");
}

#[test]
fn test_empty_source_is_empty_module() {
    let module = parse_ok("");
    assert!(module.tasks.is_empty());
    assert!(module.imports.is_empty());
}

#[test]
fn test_dotted_import() {
    let module = parse_ok("import std.strings\n");
    assert_eq!(module.imports[0].parts, vec!["std", "strings"]);
    assert_eq!(module.imports[0].module_name(), "std");
    assert!(module.imports[0].is_specific_symbol());
}

#[test]
fn test_import_after_declaration_is_rejected() {
    let source = "task t:\n    steps:\n        - return 1\n\nimport math\n";
    let err = parse_err(source);
    assert!(
        err.message.contains("imports must appear before"),
        "{}",
        err.message
    );
    assert_eq!(err.span.start_line, 5);
}

#[test]
fn test_import_before_declaration_is_accepted() {
    let module = parse_ok("import math\n\ntask t:\n    steps:\n        - return 1\n");
    assert_eq!(module.imports.len(), 1);
    assert_eq!(module.tasks.len(), 1);
}

#[test]
fn test_unknown_top_level_token() {
    let err = parse_err("42\n");
    assert!(err.message.contains("expected declaration"), "{}", err.message);
    assert_eq!(err.token.as_deref(), Some("42"));
}

// ─────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_entity_fields_and_constraints() {
    let module = parse_ok(ORDER_MODULE);
    let entity = &module.entities[0];
    assert_eq!(entity.name, "Order");
    assert_eq!(entity.fields.len(), 2);
    assert_eq!(entity.fields[0].name, "id");
    assert_eq!(entity.fields[0].type_name, "Int");
    assert_eq!(entity.constraints.len(), 1);
    match &entity.constraints[0] {
        Constraint::Rule { expression, .. } => assert_eq!(expression, "total >= 0"),
        other => panic!("expected rule, got {other:?}"),
    }
}

#[test]
fn test_enum_values() {
    let module = parse_ok(ORDER_MODULE);
    assert_eq!(
        module.enums[0].values,
        vec!["Pending", "Shipped", "Cancelled"]
    );
}

#[test]
fn test_task_sections() {
    let module = parse_ok(ORDER_MODULE);
    let task = &module.tasks[0];
    assert_eq!(task.name, "compute_total");
    assert_eq!(task.inputs.len(), 1);
    assert_eq!(task.outputs.len(), 1);
    assert_eq!(task.steps.len(), 2);
    match &task.steps[0] {
        Stmt::Step(step) => assert_eq!(step.action, "set total to base * 2"),
        other => panic!("expected step, got {other:?}"),
    }
}

#[test]
fn test_policy_rules_keep_text() {
    let module = parse_ok(ORDER_MODULE);
    let policy = &module.policies[0];
    assert_eq!(policy.name, "refunds");
    assert_eq!(policy.rules.len(), 2);
    assert_eq!(policy.rules[1], "no refunds after 90 days");
}

#[test]
fn test_deviation_block() {
    let source = "\
task audit:
    constraints:
        - total >= 0
        - allow deviation:
            scope: rounding of totals
            mode: bounded
            bounds:
                - at most 1 cent per line
                - never negative
            rationale: legacy invoices round half down
";
    let module = parse_ok(source);
    let constraints = &module.tasks[0].constraints;
    assert_eq!(constraints.len(), 2);
    match &constraints[1] {
        Constraint::Deviation(dev) => {
            assert_eq!(dev.scope, "rounding of totals");
            assert_eq!(dev.mode, "bounded");
            assert_eq!(dev.bounds.len(), 2);
            assert_eq!(dev.rationale.as_deref(), Some("legacy invoices round half down"));
        }
        other => panic!("expected deviation, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_step_substeps() {
    let source = "\
flow f:
    steps:
        - prepare the workspace
            - set attempts to 0
            - clear the cache
        - done
";
    let module = parse_ok(source);
    let steps = &module.flows[0].steps;
    assert_eq!(steps.len(), 2);
    match &steps[0] {
        Stmt::Step(step) => {
            assert_eq!(step.action, "prepare the workspace");
            assert_eq!(step.substeps.len(), 2);
        }
        other => panic!("expected step, got {other:?}"),
    }
}

#[test]
fn test_if_elif_else() {
    let source = "\
task t:
    steps:
        if x < 0:
            - return 0
        else if x == 0:
            - return 1
        else:
            - return 2
";
    let module = parse_ok(source);
    match &module.tasks[0].steps[0] {
        Stmt::If(node) => {
            assert!(matches!(node.condition.kind, ExprKind::Binary { .. }));
            assert_eq!(node.body.len(), 1);
            assert_eq!(node.elif_branches.len(), 1);
            assert!(node.else_body.is_some());
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_while_and_for() {
    let source = "\
task t:
    steps:
        while counter < 5:
            - set counter to counter + 1
        for item in items:
            - inspect the item
";
    let module = parse_ok(source);
    let steps = &module.tasks[0].steps;
    assert!(matches!(steps[0], Stmt::While(_)));
    match &steps[1] {
        Stmt::For(node) => {
            assert_eq!(node.iterator, "item");
            assert_eq!(node.iterable.kind, ExprKind::Identifier("items".to_string()));
        }
        other => panic!("expected for, got {other:?}"),
    }
}

#[test]
fn test_stmt_kinds() {
    let source = "\
task t:
    steps:
        - a step
        if true:
            - x
        while false:
            - x
        for i in xs:
            - x
";
    let module = parse_ok(source);
    let kinds: Vec<NodeKind> = module.tasks[0].steps.iter().map(Stmt::kind).collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Step, NodeKind::If, NodeKind::While, NodeKind::For]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_expression_forms() {
    let source = "\
task t:
    steps:
        if ready and armed:
            - x
        while total >= 9.5:
            - x
        if name == \"alice\":
            - x
        if flag != true:
            - x
";
    parse_ok(source);
}

#[test]
fn test_negative_literal() {
    let source = "task t:\n    steps:\n        if x > -3:\n            - y\n";
    let module = parse_ok(source);
    match &module.tasks[0].steps[0] {
        Stmt::If(node) => match &node.condition.kind {
            ExprKind::Binary { right, .. } => {
                assert_eq!(right.kind, ExprKind::Literal(Literal::Int(-3)));
            }
            other => panic!("expected binary, got {other:?}"),
        },
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn test_operator_chain_is_rejected() {
    // exactly one binary operator per expression
    let err = parse_err("task t:\n    steps:\n        if a + b + c:\n            - x\n");
    assert!(err.message.contains("expected"), "{}", err.message);
}

#[test]
fn test_missing_condition_is_rejected() {
    let err = parse_err("task t:\n    steps:\n        if :\n            - x\n");
    assert!(err.message.contains("expected expression"), "{}", err.message);
}

// ─────────────────────────────────────────────────────────────────────
// Errors & strictness
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_colon_after_task_name() {
    let err = parse_err("task t\n    steps:\n        - x\n");
    assert!(err.message.contains("':'"), "{}", err.message);
    assert_eq!(err.span.start_line, 1);
}

#[test]
fn test_error_carries_offending_token() {
    let err = parse_err("entity E:\n    field 42\n");
    assert_eq!(err.token.as_deref(), Some("42"));
    assert_eq!(err.span.start_line, 2);
}

#[test]
fn test_first_error_wins() {
    // both lines are bad; only the first is ever reported
    let err = parse_err("task a\ntask b\n");
    assert_eq!(err.span.start_line, 1);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_parsing_is_deterministic() {
    let first = parse_ok(ORDER_MODULE);
    for _ in 0..20 {
        assert_eq!(parse_ok(ORDER_MODULE), first);
    }
}
