//! Execution tracing.
//!
//! The executor records an enter and an exit event around every node
//! it runs. Events carry a flattened snapshot of the visible bindings,
//! never live references, so a trace stays valid after the execution
//! context is gone.

use crate::value::Value;
use quill_types::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Which side of a node's execution an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Enter,
    Exit,
}

impl Phase {
    /// Stable lowercase name used in fingerprints and explanations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Enter => "enter",
            Phase::Exit => "exit",
        }
    }
}

/// One recorded execution event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// The kind of node this event belongs to.
    pub node_kind: NodeKind,
    pub phase: Phase,
    /// Visible bindings at the time of the event, flattened to
    /// primitives (see [`snapshot_bindings`]).
    pub snapshot: BTreeMap<String, serde_json::Value>,
    /// The node's result, present on successful exit events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Free-form extras: error text, would-set records, node details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TraceEvent {
    /// Returns the `error` metadata entry, if the node failed.
    pub fn error_text(&self) -> Option<&str> {
        self.metadata.get("error").and_then(|v| v.as_str())
    }
}

/// Append-only, ordered event log for a single execution.
///
/// One collector per execution; collectors are never shared across
/// concurrent runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceCollector {
    trace_id: String,
    events: Vec<TraceEvent>,
}

impl TraceCollector {
    /// Create a collector with a fresh random trace id.
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            events: Vec::new(),
        }
    }

    /// The collection's unique id.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Append an event.
    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// The recorded events, in order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for TraceCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten bindings for a snapshot.
///
/// Deliberately conservative: primitive values are copied verbatim,
/// and complex values (lists, maps) are reduced to a type-tag string.
/// This shallowness is what keeps structural and determinism
/// comparisons over traces well-defined; do not deepen it.
pub fn snapshot_bindings(
    bindings: &BTreeMap<String, Value>,
) -> BTreeMap<String, serde_json::Value> {
    bindings
        .iter()
        .map(|(name, value)| (name.clone(), snapshot_value(value)))
        .collect()
}

fn snapshot_value(value: &Value) -> serde_json::Value {
    if value.is_primitive() {
        value.to_json()
    } else {
        serde_json::Value::from(format!("<{}>", value.type_name()))
    }
}
