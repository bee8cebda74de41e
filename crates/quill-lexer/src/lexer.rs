//! Core Quill lexer — converts source text to a token stream.
//!
//! Indentation is significant: each logical line's leading-whitespace
//! width is compared against a stack of open block widths, emitting
//! explicit [`TokenKind::Indent`] / [`TokenKind::Dedent`] tokens.
//! Blank and comment-only lines never touch the stack. The lexer is
//! strict: the first malformed construct terminates lexing with a
//! [`SyntaxError`] carrying line and column.

use quill_types::{Span, SyntaxError};

use crate::token::{Token, TokenKind};

/// The Quill lexer.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Source name for diagnostics.
    file_name: String,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Stack of open indentation widths. Always starts with 0.
    indent_stack: Vec<u32>,
    /// Tokens emitted so far.
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, file_name: impl Into<String>) -> Self {
        Self {
            source: source.as_bytes(),
            file_name: file_name.into(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            tokens: Vec::new(),
        }
    }

    /// Lex the entire source into a token stream.
    ///
    /// The stream always ends with the pending [`TokenKind::Dedent`]s
    /// followed by [`TokenKind::Eof`]. Fails fast on the first error.
    pub fn lex(mut self) -> Result<Vec<Token>, SyntaxError> {
        while !self.at_end() {
            self.lex_logical_line()?;
        }

        // Terminate the last line if the file did not end with a newline.
        if matches!(
            self.tokens.last(),
            Some(t) if t.kind != TokenKind::Newline && t.kind != TokenKind::Dedent
        ) {
            self.emit(TokenKind::Newline, "", self.current_span());
        }

        // Close every still-open block.
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.emit(TokenKind::Dedent, "", self.current_span());
        }
        self.emit(TokenKind::Eof, "", self.current_span());

        Ok(self.tokens)
    }

    // ─────────────────────────────────────────────────────────────
    // Logical lines & indentation
    // ─────────────────────────────────────────────────────────────

    /// Lex one logical line: indentation handling, then tokens up to
    /// and including the newline.
    fn lex_logical_line(&mut self) -> Result<(), SyntaxError> {
        let width = self.measure_indentation()?;

        // Blank or comment-only lines are skipped without affecting
        // the indentation stack.
        match self.peek() {
            None => return Ok(()),
            Some(b'\n') => {
                self.advance();
                return Ok(());
            }
            Some(b'#') => {
                self.skip_comment();
                if self.peek() == Some(b'\n') {
                    self.advance();
                }
                return Ok(());
            }
            Some(_) => {}
        }

        self.apply_indentation(width)?;

        // Scan tokens until end of line.
        loop {
            self.skip_inline_whitespace();
            match self.peek() {
                None => {
                    self.emit(TokenKind::Newline, "", self.current_span());
                    return Ok(());
                }
                Some(b'\n') => {
                    let span = self.current_span();
                    self.advance();
                    self.emit(TokenKind::Newline, "", span);
                    return Ok(());
                }
                Some(b'#') => {
                    self.skip_comment();
                }
                Some(_) => self.scan_token()?,
            }
        }
    }

    /// Measure the leading-whitespace width of the current line.
    /// Tabs are rejected — mixed-width indentation is ambiguous.
    fn measure_indentation(&mut self) -> Result<u32, SyntaxError> {
        let mut width = 0u32;
        loop {
            match self.peek() {
                Some(b' ') => {
                    self.advance();
                    width += 1;
                }
                Some(b'\t') => {
                    return Err(self.error_here("tab character in indentation; use spaces"));
                }
                _ => return Ok(width),
            }
        }
    }

    /// Compare a line's indentation width against the stack, emitting
    /// block-start / block-end tokens.
    fn apply_indentation(&mut self, width: u32) -> Result<(), SyntaxError> {
        let top = *self.indent_stack.last().unwrap_or(&0);
        if width > top {
            self.indent_stack.push(width);
            self.emit(TokenKind::Indent, "", Span::point(self.line, 1));
        } else if width < top {
            while width < *self.indent_stack.last().unwrap_or(&0) {
                self.indent_stack.pop();
                self.emit(TokenKind::Dedent, "", Span::point(self.line, 1));
            }
            if width != *self.indent_stack.last().unwrap_or(&0) {
                return Err(self.error_here(format!(
                    "unindent to width {width} does not match any outer indentation level"
                )));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan a single non-structural token.
    fn scan_token(&mut self) -> Result<(), SyntaxError> {
        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Ok(());
        };

        match ch {
            b'"' => self.scan_string(start_pos, start_line, start_col),
            b'0'..=b'9' => {
                self.scan_number(start_pos, start_line, start_col);
                Ok(())
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.scan_identifier(start_pos, start_line, start_col);
                Ok(())
            }

            b'+' => self.emit_simple(TokenKind::Plus, start_pos, start_line, start_col),
            b'-' => self.emit_simple(TokenKind::Dash, start_pos, start_line, start_col),
            b'*' => self.emit_simple(TokenKind::Star, start_pos, start_line, start_col),
            b'/' => self.emit_simple(TokenKind::Slash, start_pos, start_line, start_col),
            b'%' => self.emit_simple(TokenKind::Percent, start_pos, start_line, start_col),
            b':' => self.emit_simple(TokenKind::Colon, start_pos, start_line, start_col),
            b'.' => self.emit_simple(TokenKind::Dot, start_pos, start_line, start_col),
            b',' => self.emit_simple(TokenKind::Comma, start_pos, start_line, start_col),

            b'<' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.emit_simple(TokenKind::LessEq, start_pos, start_line, start_col)
                } else {
                    self.emit_simple(TokenKind::Less, start_pos, start_line, start_col)
                }
            }
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.emit_simple(TokenKind::GreaterEq, start_pos, start_line, start_col)
                } else {
                    self.emit_simple(TokenKind::Greater, start_pos, start_line, start_col)
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.emit_simple(TokenKind::EqEq, start_pos, start_line, start_col)
                } else {
                    Err(self
                        .error_at(start_line, start_col, "unexpected character '='; use '=='")
                        .with_token("="))
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    self.emit_simple(TokenKind::NotEq, start_pos, start_line, start_col)
                } else {
                    Err(self
                        .error_at(start_line, start_col, "unexpected character '!'; use '!='")
                        .with_token("!"))
                }
            }

            _ => Err(self
                .error_at(
                    start_line,
                    start_col,
                    format!("unexpected character '{}'", ch as char),
                )
                .with_token((ch as char).to_string())),
        }
    }

    /// Scan a number: digits with an optional fractional part.
    fn scan_number(&mut self, start_pos: usize, start_line: u32, start_col: u32) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b'0'..=b'9')) {
            self.advance();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.advance();
            }
        }
        let text = self.slice_from(start_pos);
        let span = self.span_from(start_line, start_col);
        self.emit(TokenKind::Number, text, span);
    }

    /// Scan an identifier or keyword. The distinction is a fixed table
    /// lookup in [`TokenKind::from_keyword`].
    fn scan_identifier(&mut self, start_pos: usize, start_line: u32, start_col: u32) {
        while matches!(
            self.peek(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.advance();
        }
        let text = self.slice_from(start_pos);
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier);
        let span = self.span_from(start_line, start_col);
        self.emit(kind, text, span);
    }

    /// Scan a string literal. The opening quote is already consumed;
    /// the token text keeps the surrounding quotes so step-action text
    /// can be reconstructed verbatim.
    fn scan_string(
        &mut self,
        start_pos: usize,
        start_line: u32,
        start_col: u32,
    ) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(self
                        .error_at(start_line, start_col, "unterminated string literal")
                        .with_token(self.slice_from(start_pos)));
                }
                Some(b'"') => {
                    self.advance();
                    let text = self.slice_from(start_pos);
                    let span = self.span_from(start_line, start_col);
                    self.emit(TokenKind::Str, text, span);
                    return Ok(());
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n' | b't' | b'"' | b'\\') => {}
                        Some(other) => {
                            return Err(self.error_here(format!(
                                "invalid escape sequence '\\{}'",
                                other as char
                            )));
                        }
                        None => {
                            return Err(self.error_at(
                                start_line,
                                start_col,
                                "unterminated string literal",
                            ));
                        }
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Skip spaces and tabs between tokens (not newlines).
    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.advance();
        }
    }

    /// Skip a `#` comment up to (not including) the newline.
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn slice_from(&self, start_pos: usize) -> String {
        String::from_utf8_lossy(&self.source[start_pos..self.pos]).into_owned()
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit(&mut self, kind: TokenKind, text: impl Into<String>, span: Span) {
        self.tokens.push(Token::new(kind, text, span));
    }

    fn emit_simple(
        &mut self,
        kind: TokenKind,
        start_pos: usize,
        start_line: u32,
        start_col: u32,
    ) -> Result<(), SyntaxError> {
        let text = self.slice_from(start_pos);
        let span = self.span_from(start_line, start_col);
        self.emit(kind, text, span);
        Ok(())
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(&self.file_name, message, self.current_span())
    }

    fn error_at(&self, line: u32, col: u32, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(&self.file_name, message, Span::point(line, col))
    }
}
