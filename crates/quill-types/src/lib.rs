//! Shared types for the Quill toolchain.
//!
//! This crate defines the AST node types, source spans, and the syntax
//! error type used by both the lexer and the parser. The runtime crate
//! defines its own execution error types on top of these.

mod error;
mod span;
pub mod ast;

pub use ast::NodeKind;
pub use error::SyntaxError;
pub use span::Span;

/// Result type used by the Quill front end.
pub type Result<T> = std::result::Result<T, SyntaxError>;
