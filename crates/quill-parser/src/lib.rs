//! Quill parser: token stream → AST.
//!
//! Recursive descent, one routine per production, fail-fast: the first
//! error terminates parsing with a [`quill_types::SyntaxError`].

pub mod parser;
pub mod step;

mod parse_decl;
mod parse_expr;
mod parse_stmt;

pub use parser::Parser;
pub use step::{parse_step_action, StepAction};

use quill_lexer::Lexer;
use quill_types::{ast::Module, Result};

/// Lex and parse a complete Quill source file.
pub fn parse(source: &str, file_name: &str) -> Result<Module> {
    let tokens = Lexer::new(source, file_name).lex()?;
    Parser::new(tokens, file_name).parse_module()
}
