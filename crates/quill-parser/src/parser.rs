//! Core parser infrastructure: token cursor, error reporting, helpers.

use quill_lexer::{Token, TokenKind};
use quill_types::{Result, Span, SyntaxError};

/// The Quill parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Strict and fail-fast: the first error aborts parsing, there is no
/// recovery and no error collection.
pub struct Parser {
    /// The token stream, terminated by `Eof`.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source name for error messages.
    file_name: String,
}

impl Parser {
    /// Create a new parser from a token stream.
    pub fn new(tokens: Vec<Token>, file_name: impl Into<String>) -> Self {
        Self {
            tokens,
            pos: 0,
            file_name: file_name.into(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .expect("token stream should end with Eof")
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// Check if the current token matches the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from the current position.
    pub(crate) fn look_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    // ── Newline Handling ──────────────────────────────────────────────────────

    /// Skip all consecutive newline tokens.
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Expect a newline (or end of file), then skip any blank lines.
    pub(crate) fn expect_newline(&mut self) -> Result<()> {
        if self.at_end() {
            return Ok(());
        }
        if self.check(TokenKind::Newline) {
            self.advance();
            self.skip_newlines();
            Ok(())
        } else {
            Err(self.error_at_current(format!("expected newline, got '{}'", self.peek())))
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind and return the consumed token.
    pub(crate) fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(format!("expected '{expected}', got '{}'", self.peek())))
        }
    }

    /// Expect an identifier token. Returns the name and its span.
    pub(crate) fn expect_identifier(&mut self) -> Result<(String, Span)> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok((token.text, token.span))
        } else {
            Err(self.error_at_current(format!("expected identifier, got '{}'", self.peek())))
        }
    }

    /// Expect a `:` followed by a newline and an indented block start.
    pub(crate) fn expect_block_start(&mut self) -> Result<()> {
        self.expect(TokenKind::Colon)?;
        self.expect_newline()?;
        self.expect(TokenKind::Indent)?;
        Ok(())
    }

    /// Expect the dedent that closes the current block.
    pub(crate) fn expect_block_end(&mut self) -> Result<()> {
        self.expect(TokenKind::Dedent)?;
        Ok(())
    }

    // ── Raw Line Text ─────────────────────────────────────────────────────────

    /// Consume tokens up to (not including) the line's newline and
    /// reconstruct their source text, space-separated. Used for step
    /// actions, policy rules and free-text constraints, whose content
    /// is a sub-language parsed later.
    pub(crate) fn take_line_text(&mut self) -> String {
        let mut parts: Vec<String> = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
            parts.push(self.advance().to_string());
        }
        parts.join(" ")
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    /// Build an error pointing at the current token.
    pub(crate) fn error_at_current(&self, message: impl Into<String>) -> SyntaxError {
        let token = self.peek();
        let err = SyntaxError::new(&self.file_name, message, token.span);
        if token.text.is_empty() {
            err
        } else {
            err.with_token(token.text.clone())
        }
    }
}
