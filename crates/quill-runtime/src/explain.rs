//! Human-readable explanations of a recorded trace.
//!
//! A pure function from trace to an ordered explanation list. Each
//! enter event is paired with the nearest following unconsumed exit
//! event of the same node kind; every event or event pair yields
//! exactly one entry, so nothing in the trace is silently dropped.

use crate::trace::{Phase, TraceCollector, TraceEvent};
use quill_types::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One explained step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationStep {
    /// 1-based ordinal within the explanation.
    pub step: usize,
    /// What happened, e.g. `evaluated conditional`.
    pub action: String,
    /// Why or with what outcome.
    pub reason: String,
    /// Visible bindings when the node was entered.
    pub inputs: BTreeMap<String, serde_json::Value>,
    /// Visible bindings when the node exited.
    pub outputs: BTreeMap<String, serde_json::Value>,
}

/// The full explanation of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationOutput {
    pub trace_id: String,
    /// Caller-supplied status, e.g. `completed` or `failed`.
    pub status: String,
    pub decisions: Vec<ExplanationStep>,
    /// Error texts carried by exit events, in trace order.
    pub errors: Vec<String>,
}

/// Turns traces into explanations.
pub struct ExplanationEngine;

impl ExplanationEngine {
    /// Explain a recorded trace.
    pub fn explain(trace: &TraceCollector, status: &str) -> ExplanationOutput {
        let events = trace.events();
        let mut consumed = vec![false; events.len()];
        let mut decisions = Vec::new();
        let mut errors = Vec::new();

        for (index, event) in events.iter().enumerate() {
            if let Some(error) = event.error_text() {
                errors.push(format!("{}: {error}", event.node_kind));
            }
            match event.phase {
                Phase::Enter => {
                    let exit = find_matching_exit(events, &mut consumed, index);
                    decisions.push(explain_pair(decisions.len() + 1, event, exit));
                }
                Phase::Exit if !consumed[index] => {
                    consumed[index] = true;
                    decisions.push(explain_lone_exit(decisions.len() + 1, event));
                }
                Phase::Exit => {}
            }
        }

        ExplanationOutput {
            trace_id: trace.trace_id().to_string(),
            status: status.to_string(),
            decisions,
            errors,
        }
    }
}

/// The nearest following unconsumed exit of the same node kind.
fn find_matching_exit<'a>(
    events: &'a [TraceEvent],
    consumed: &mut [bool],
    enter_index: usize,
) -> Option<&'a TraceEvent> {
    let kind = events[enter_index].node_kind;
    for (index, event) in events.iter().enumerate().skip(enter_index + 1) {
        if !consumed[index] && event.phase == Phase::Exit && event.node_kind == kind {
            consumed[index] = true;
            return Some(event);
        }
    }
    None
}

/// One entry for a paired enter/exit.
fn explain_pair(step: usize, enter: &TraceEvent, exit: Option<&TraceEvent>) -> ExplanationStep {
    let kind = enter.node_kind;
    let action = action_for(kind);
    let reason = match exit {
        Some(exit) => reason_for(kind, exit),
        None => format!("entered {kind} but never saw it finish"),
    };
    ExplanationStep {
        step,
        action,
        reason,
        inputs: enter.snapshot.clone(),
        outputs: exit.map(|e| e.snapshot.clone()).unwrap_or_default(),
    }
}

/// One entry for an exit that no enter claimed.
fn explain_lone_exit(step: usize, exit: &TraceEvent) -> ExplanationStep {
    ExplanationStep {
        step,
        action: format!("exited {}", exit.node_kind),
        reason: "no matching enter event was recorded".to_string(),
        inputs: BTreeMap::new(),
        outputs: exit.snapshot.clone(),
    }
}

fn action_for(kind: NodeKind) -> String {
    match kind {
        NodeKind::Module => "executed module".to_string(),
        NodeKind::Task => "executed task".to_string(),
        NodeKind::Flow => "executed flow".to_string(),
        NodeKind::Step => "performed step".to_string(),
        NodeKind::If => "evaluated conditional".to_string(),
        NodeKind::While => "ran while loop".to_string(),
        NodeKind::For => "iterated over collection".to_string(),
        // no dedicated handler: generic entered/exited explanation
        other => format!("entered and exited {other}"),
    }
}

fn reason_for(kind: NodeKind, exit: &TraceEvent) -> String {
    if let Some(error) = exit.error_text() {
        return format!("failed: {error}");
    }
    if let Some(name) = exit.metadata.get("would_set").and_then(|v| v.as_str()) {
        return format!("dry run: would set '{name}' but the write was skipped");
    }
    match kind {
        NodeKind::If => match &exit.result {
            Some(result) => format!("a branch ran and produced {result}"),
            None => "no branch condition held".to_string(),
        },
        NodeKind::While => "looped until its condition became false".to_string(),
        NodeKind::For => "visited each element of the iterable".to_string(),
        NodeKind::Step => match &exit.result {
            Some(result) if !result.is_null() => format!("produced {result}"),
            _ => "completed with no value".to_string(),
        },
        _ => match &exit.result {
            Some(result) if !result.is_null() => format!("finished with {result}"),
            _ => "finished".to_string(),
        },
    }
}
