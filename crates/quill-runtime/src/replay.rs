//! Replay validation of recorded traces.
//!
//! Two checks: structural validation (every exit closes the enter on
//! top of the stack) and determinism validation (two traces agree on
//! their (node kind, phase) sequence). Fingerprints condense that
//! sequence into a SHA-256 digest for cheap comparison and audit logs.

use crate::trace::{Phase, TraceEvent};
use quill_types::NodeKind;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Replay validation failures. Every kind names the offending event
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// An exit event's kind does not match the innermost open enter.
    #[error("structural mismatch at event {index}: exit '{found}' does not close '{expected}'")]
    StructuralMismatch {
        index: usize,
        expected: NodeKind,
        found: NodeKind,
    },

    /// An exit event arrived with no enter open at all.
    #[error("exit without enter at event {index}")]
    ExitWithoutEnter { index: usize },

    /// Enters left open at the end of the trace; `index` is the
    /// innermost unclosed enter.
    #[error("{count} unclosed event(s) at end of trace, innermost at event {index}")]
    UnclosedEvents { index: usize, count: usize },

    /// Two traces stopped agreeing.
    #[error("traces diverge at event {index}")]
    Divergence { index: usize },
}

/// Validates traces after the fact.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Structural validation: walk the trace with a stack, pushing on
    /// enter and popping on a matching exit.
    pub fn validate(events: &[TraceEvent]) -> Result<(), ReplayError> {
        let mut stack: Vec<(usize, NodeKind)> = Vec::new();
        for (index, event) in events.iter().enumerate() {
            match event.phase {
                Phase::Enter => stack.push((index, event.node_kind)),
                Phase::Exit => match stack.pop() {
                    Some((_, kind)) if kind == event.node_kind => {}
                    Some((_, kind)) => {
                        return Err(ReplayError::StructuralMismatch {
                            index,
                            expected: kind,
                            found: event.node_kind,
                        });
                    }
                    None => return Err(ReplayError::ExitWithoutEnter { index }),
                },
            }
        }
        if let Some((index, _)) = stack.last().copied() {
            return Err(ReplayError::UnclosedEvents {
                index,
                count: stack.len(),
            });
        }
        Ok(())
    }

    /// Determinism validation: the two traces must have equal length
    /// and a pairwise-identical (node kind, phase) sequence.
    pub fn verify_determinism(
        first: &[TraceEvent],
        second: &[TraceEvent],
    ) -> Result<(), ReplayError> {
        for (index, (a, b)) in first.iter().zip(second.iter()).enumerate() {
            if a.node_kind != b.node_kind || a.phase != b.phase {
                return Err(ReplayError::Divergence { index });
            }
        }
        if first.len() != second.len() {
            return Err(ReplayError::Divergence {
                index: first.len().min(second.len()),
            });
        }
        Ok(())
    }

    /// SHA-256 hex digest of the (node kind, phase) sequence. Two
    /// deterministic runs of the same program produce equal
    /// fingerprints.
    pub fn fingerprint(events: &[TraceEvent]) -> String {
        let mut hasher = Sha256::new();
        for event in events {
            hasher.update(event.node_kind.as_str().as_bytes());
            hasher.update(b":");
            hasher.update(event.phase.as_str().as_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }
}
