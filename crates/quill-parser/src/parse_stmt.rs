//! Statement parsing: dash steps, `if` / `else if` / `else`, `while`,
//! `for`.

use quill_lexer::TokenKind;
use quill_types::ast::*;
use quill_types::Result;

use crate::parser::Parser;

impl Parser {
    /// `steps:` followed by an indented statement block.
    pub(crate) fn parse_steps_section(&mut self) -> Result<Vec<Stmt>> {
        self.expect_block_start()?;
        let stmts = self.parse_stmts_until_dedent()?;
        self.expect_block_end()?;
        Ok(stmts)
    }

    /// `: NEWLINE INDENT stmts DEDENT` — the body of a control-flow
    /// statement.
    fn parse_body(&mut self) -> Result<Vec<Stmt>> {
        self.expect_block_start()?;
        let stmts = self.parse_stmts_until_dedent()?;
        self.expect_block_end()?;
        Ok(stmts)
    }

    /// Statements until the current block's dedent.
    fn parse_stmts_until_dedent(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    /// A single statement.
    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::Dash => Ok(Stmt::Step(self.parse_step()?)),
            TokenKind::If => Ok(Stmt::If(self.parse_if()?)),
            TokenKind::While => Ok(Stmt::While(self.parse_while()?)),
            TokenKind::For => Ok(Stmt::For(self.parse_for()?)),
            _ => Err(self.error_at_current(format!(
                "expected step or control flow, got '{}'",
                self.peek()
            ))),
        }
    }

    /// `- action text`, with optional indented substeps.
    ///
    /// The action text is kept verbatim as the step's sub-language and
    /// interpreted at execution time by the step-action parser.
    fn parse_step(&mut self) -> Result<Step> {
        let start = self.current_span();
        self.advance(); // dash
        let action = self.take_line_text();
        let span = start.merge(self.previous_span());
        self.expect_newline()?;

        let mut substeps = Vec::new();
        if self.eat(TokenKind::Indent) {
            substeps = self.parse_stmts_until_dedent()?;
            self.expect_block_end()?;
        }

        Ok(Step {
            action,
            substeps,
            span,
        })
    }

    /// `if cond: BODY [else if cond: BODY]* [else: BODY]`
    fn parse_if(&mut self) -> Result<If> {
        let start = self.current_span();
        self.advance(); // if
        let condition = self.parse_expr()?;
        let body = self.parse_body()?;

        let mut elif_branches = Vec::new();
        let mut else_body = None;
        while self.check(TokenKind::Else) {
            self.advance(); // else
            if self.eat(TokenKind::If) {
                let elif_condition = self.parse_expr()?;
                let elif_body = self.parse_body()?;
                elif_branches.push((elif_condition, elif_body));
            } else {
                else_body = Some(self.parse_body()?);
                break;
            }
        }

        Ok(If {
            condition,
            body,
            elif_branches,
            else_body,
            span: start.merge(self.previous_span()),
        })
    }

    /// `while cond: BODY`
    fn parse_while(&mut self) -> Result<While> {
        let start = self.current_span();
        self.advance(); // while
        let condition = self.parse_expr()?;
        let body = self.parse_body()?;
        Ok(While {
            condition,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    /// `for item in iterable: BODY`
    fn parse_for(&mut self) -> Result<For> {
        let start = self.current_span();
        self.advance(); // for
        let (iterator, _) = self.expect_identifier()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_body()?;
        Ok(For {
            iterator,
            iterable,
            body,
            span: start.merge(self.previous_span()),
        })
    }
}
