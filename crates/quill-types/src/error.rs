use crate::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A syntax error produced by the lexer or parser.
///
/// Quill is strict: the first error terminates the front end, so one
/// error type carrying the offending token and its location is all the
/// callers ever see. There is no recovery and no error collection.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{file}:{span}: {message}")]
pub struct SyntaxError {
    /// Source name for diagnostics (file path or `<input>`).
    pub file: String,
    /// Human-readable error message.
    pub message: String,
    /// The offending token's text, if one was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
}

impl SyntaxError {
    /// Create a new syntax error at the given span.
    pub fn new(file: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            token: None,
            span,
        }
    }

    /// Attach the offending token's text.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
