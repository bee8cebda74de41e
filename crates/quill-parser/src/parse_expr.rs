//! Expression parsing.
//!
//! The grammar is deliberately minimal: a primary, optionally followed
//! by exactly one binary operator and a second primary. No precedence
//! climbing and no parenthesized grouping; chains like `a + b + c` are
//! rejected rather than disambiguated. The same routine serves module
//! conditions/iterables and the step-action sub-language.

use quill_lexer::TokenKind;
use quill_types::ast::{BinOp, Expr, ExprKind, Literal};
use quill_types::Result;

use crate::parser::Parser;

impl Parser {
    /// `primary [binop primary]`
    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        let left = self.parse_primary()?;
        let Some(op) = binop_for(self.peek_kind()) else {
            return Ok(left);
        };
        self.advance();
        let right = self.parse_primary()?;
        let span = left.span.merge(right.span);
        Ok(Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        ))
    }

    /// A literal, identifier, or negated numeric literal.
    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind() {
            TokenKind::Number => self.parse_number(false),
            TokenKind::Dash if self.look_ahead(1) == TokenKind::Number => {
                self.advance();
                self.parse_number(true)
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Str(token.string_value())),
                    token.span,
                ))
            }
            TokenKind::True => {
                let token = self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Bool(true)),
                    token.span,
                ))
            }
            TokenKind::False => {
                let token = self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Bool(false)),
                    token.span,
                ))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Identifier(token.text), token.span))
            }
            _ => Err(self.error_at_current(format!("expected expression, got '{}'", self.peek()))),
        }
    }

    /// An integer or float literal. `negate` is set when a leading `-`
    /// was consumed.
    fn parse_number(&mut self, negate: bool) -> Result<Expr> {
        let token = self.advance();
        let literal = if token.text.contains('.') {
            let value: f64 = token
                .text
                .parse()
                .map_err(|_| self.error_at_current("malformed float literal"))?;
            Literal::Float(if negate { -value } else { value })
        } else {
            let value: i64 = token
                .text
                .parse()
                .map_err(|_| self.error_at_current("integer literal out of range"))?;
            Literal::Int(if negate { -value } else { value })
        };
        Ok(Expr::new(ExprKind::Literal(literal), token.span))
    }
}

/// Map a token kind to its binary operator, if it is one.
fn binop_for(kind: TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Dash => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        TokenKind::Less => BinOp::Less,
        TokenKind::Greater => BinOp::Greater,
        TokenKind::LessEq => BinOp::LessEq,
        TokenKind::GreaterEq => BinOp::GreaterEq,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::NotEq => BinOp::NotEq,
        TokenKind::And => BinOp::And,
        TokenKind::Or => BinOp::Or,
        _ => return None,
    };
    Some(op)
}
