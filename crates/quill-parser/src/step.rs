//! The step-action sub-language.
//!
//! A dash step's action text is one line of its own small grammar:
//!
//! - `set NAME to EXPR` — assignment
//! - `return EXPR` — yield a value
//! - `call NAME [with EXPR {, EXPR}]` — builtin or capability-gated call
//! - anything else — an opaque descriptive step (a no-op)
//!
//! The action is parsed directly from its text with the ordinary lexer
//! and expression parser; no wrapper source is ever synthesized and the
//! module grammar is never re-entered. Whether a line is structured is
//! decided by its head alone: `return` and `call` commit on the
//! keyword, `set` commits on the full `set NAME to` shape (so free
//! prose like `- set up the environment` stays a descriptive step).
//! Once the head commits, a malformed remainder is an error, never a
//! silent no-op.

use quill_lexer::{Lexer, TokenKind};
use quill_types::ast::Expr;
use quill_types::Result;

use crate::parser::Parser;

/// A parsed step action.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// `set NAME to EXPR`
    Assign { name: String, value: Expr },
    /// `return EXPR`
    Return(Expr),
    /// `call NAME [with args]` — `name` is the dotted call path.
    Call { name: String, args: Vec<Expr> },
    /// Descriptive text with no runtime effect.
    Opaque(String),
}

/// Parse a step's action text.
///
/// Lines whose head does not commit to a structured form are
/// [`StepAction::Opaque`]; committed lines fail on a malformed tail.
pub fn parse_step_action(action: &str) -> Result<StepAction> {
    let text = action.trim();
    if !has_structured_head(text) {
        return Ok(StepAction::Opaque(text.to_string()));
    }

    let tokens = Lexer::new(text, "<step>").lex()?;
    let mut parser = Parser::new(tokens, "<step>");

    let action = match parser.peek_kind() {
        TokenKind::Set => {
            parser.advance();
            let (name, _) = parser.expect_identifier()?;
            parser.expect(TokenKind::To)?;
            let value = parser.parse_expr()?;
            StepAction::Assign { name, value }
        }
        TokenKind::Return => {
            parser.advance();
            StepAction::Return(parser.parse_expr()?)
        }
        TokenKind::Call => {
            parser.advance();
            let name = parse_call_path(&mut parser)?;
            let mut args = Vec::new();
            if parser.eat(TokenKind::With) {
                args.push(parser.parse_expr()?);
                while parser.eat(TokenKind::Comma) {
                    args.push(parser.parse_expr()?);
                }
            }
            StepAction::Call { name, args }
        }
        _ => return Ok(StepAction::Opaque(text.to_string())),
    };

    // The structured form must consume the whole line.
    parser.expect(TokenKind::Newline)?;
    Ok(action)
}

/// Whether the line's head commits it to a structured form. Checked on
/// the raw words so even an unlexable tail still reports an error once
/// the head has committed.
fn has_structured_head(text: &str) -> bool {
    let mut words = text.split_whitespace();
    match words.next() {
        Some("return" | "call") => true,
        Some("set") => words.next().is_some() && words.next() == Some("to"),
        _ => false,
    }
}

/// A dotted call path: `NAME (. NAME)*`, e.g. `std.math.add`.
fn parse_call_path(parser: &mut Parser) -> Result<String> {
    let (first, _) = parser.expect_identifier()?;
    let mut path = first;
    while parser.eat(TokenKind::Dot) {
        let (part, _) = parser.expect_identifier()?;
        path.push('.');
        path.push_str(&part);
    }
    Ok(path)
}
