//! Quill lexer: converts source text into an indentation-aware token stream.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, KEYWORDS};
