//! Lexer tests for Quill.
//!
//! Covers: reserved keywords, operators, literals, comments,
//! indentation tracking (Indent/Dedent balance, mismatched unindent,
//! tab rejection), blank and comment-only lines, string escapes, and
//! error positions.

use quill_lexer::{Lexer, Token, TokenKind};
use quill_types::SyntaxError;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Lex source text and return the full token stream.
fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source, "test.quill")
        .lex()
        .expect("source should lex cleanly")
}

/// Lex source text and return just the token kinds (excluding Eof).
fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

/// Lex and return the error.
fn lex_err(source: &str) -> SyntaxError {
    Lexer::new(source, "test.quill")
        .lex()
        .expect_err("source should fail to lex")
}

// ─────────────────────────────────────────────────────────────────────
// Keywords
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_structural_keywords() {
    let pairs = [
        ("module", TokenKind::Module),
        ("import", TokenKind::Import),
        ("entity", TokenKind::Entity),
        ("enum", TokenKind::Enum),
        ("task", TokenKind::Task),
        ("flow", TokenKind::Flow),
        ("policy", TokenKind::Policy),
        ("inputs", TokenKind::Inputs),
        ("outputs", TokenKind::Outputs),
        ("steps", TokenKind::Steps),
        ("constraints", TokenKind::Constraints),
        ("rules", TokenKind::Rules),
    ];
    for (src, expected) in &pairs {
        let k = kinds(src);
        assert_eq!(k, vec![*expected, TokenKind::Newline], "keyword '{src}'");
    }
}

#[test]
fn test_control_and_expression_keywords() {
    let pairs = [
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("for", TokenKind::For),
        ("in", TokenKind::In),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("set", TokenKind::Set),
        ("to", TokenKind::To),
        ("return", TokenKind::Return),
        ("call", TokenKind::Call),
        ("with", TokenKind::With),
        ("allow", TokenKind::Allow),
    ];
    for (src, expected) in &pairs {
        let k = kinds(src);
        assert_eq!(k, vec![*expected, TokenKind::Newline], "keyword '{src}'");
    }
}

#[test]
fn test_keyword_prefixes_are_identifiers() {
    for src in ["modules", "taske", "whiles", "iffy", "foreach", "settings"] {
        let tokens = lex(src);
        assert_eq!(tokens[0].kind, TokenKind::Identifier, "'{src}'");
        assert_eq!(tokens[0].text, *src);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Operators & punctuation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_operators() {
    let k = kinds("+ - * / % < > <= >= == != : . ,");
    assert_eq!(
        k,
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEq,
            TokenKind::GreaterEq,
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::Colon,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn test_lone_equals_is_rejected() {
    let err = lex_err("set x = 1");
    assert!(err.message.contains("'='"), "{}", err.message);
}

#[test]
fn test_lone_bang_is_rejected() {
    let err = lex_err("x ! y");
    assert!(err.message.contains("'!'"), "{}", err.message);
}

#[test]
fn test_unexpected_character_reports_position() {
    let err = lex_err("task run:\n    @oops\n");
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.span.start_col, 5);
    assert!(err.message.contains('@'));
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_integer_and_float_literals() {
    let tokens = lex("42 3.25 0");
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].text, "42");
    assert_eq!(tokens[1].kind, TokenKind::Number);
    assert_eq!(tokens[1].text, "3.25");
    assert_eq!(tokens[2].text, "0");
}

#[test]
fn test_dot_after_number_without_digits_is_member_access() {
    // `1.` followed by a non-digit must not absorb the dot.
    let k = kinds("1.x");
    assert_eq!(
        k,
        vec![
            TokenKind::Number,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn test_string_literal_keeps_quotes_in_text() {
    let tokens = lex("\"hello\"");
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, "\"hello\"");
    assert_eq!(tokens[0].string_value(), "hello");
}

#[test]
fn test_string_escapes() {
    let tokens = lex(r#""a\nb\t\"c\\d""#);
    assert_eq!(tokens[0].string_value(), "a\nb\t\"c\\d");
}

#[test]
fn test_invalid_escape_is_rejected() {
    let err = lex_err(r#""bad \q escape""#);
    assert!(err.message.contains("escape"), "{}", err.message);
}

#[test]
fn test_unterminated_string() {
    let err = lex_err("set x to \"oops\n");
    assert!(err.message.contains("unterminated"), "{}", err.message);
    assert_eq!(err.span.start_line, 1);
    assert_eq!(err.span.start_col, 10);
}

// ─────────────────────────────────────────────────────────────────────
// Comments & blank lines
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_trailing_comment_is_skipped() {
    let k = kinds("set x to 1  # the answer\n");
    assert_eq!(
        k,
        vec![
            TokenKind::Set,
            TokenKind::Identifier,
            TokenKind::To,
            TokenKind::Number,
            TokenKind::Newline,
        ]
    );
}

#[test]
fn test_comment_only_and_blank_lines_emit_nothing() {
    let tokens = lex("# header\n\n   \n# another\n");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn test_indented_comment_line_does_not_open_block() {
    let source = "task run:\n        # note\n    steps:\n";
    let k = kinds(source);
    assert_eq!(
        k,
        vec![
            TokenKind::Task,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Steps,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Dedent,
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Indentation
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_indent_dedent_pair() {
    let source = "task run:\n    steps:\n";
    let k = kinds(source);
    assert_eq!(
        k,
        vec![
            TokenKind::Task,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Steps,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Dedent,
        ]
    );
}

#[test]
fn test_nested_blocks_balance() {
    let source = "task run:\n    steps:\n        - set x to 1\n";
    let toks = kinds(source);
    let indents = toks.iter().filter(|k| **k == TokenKind::Indent).count();
    let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
}

#[test]
fn test_multi_level_dedent_at_eof() {
    let source = "a:\n    b:\n        c:\n            d\n";
    let toks = kinds(source);
    // three Indents opened, all three closed at end of input
    let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(dedents, 3);
    assert_eq!(
        &toks[toks.len() - 3..],
        &[TokenKind::Dedent, TokenKind::Dedent, TokenKind::Dedent]
    );
}

#[test]
fn test_partial_dedent_to_outer_level() {
    let source = "a:\n    b:\n        c\n    d\n";
    let toks = kinds(source);
    // dropping from width 8 to width 4 emits exactly one Dedent there,
    // plus the final one at end of input
    let dedents = toks.iter().filter(|k| **k == TokenKind::Dedent).count();
    assert_eq!(dedents, 2);
}

#[test]
fn test_mismatched_unindent_is_rejected() {
    let source = "a:\n        b\n   c\n";
    let err = lex_err(source);
    assert!(
        err.message.contains("does not match"),
        "{}",
        err.message
    );
    assert_eq!(err.span.start_line, 3);
}

#[test]
fn test_tab_in_indentation_is_rejected() {
    let err = lex_err("a:\n\tb\n");
    assert!(err.message.contains("tab"), "{}", err.message);
    assert_eq!(err.span.start_line, 2);
}

#[test]
fn test_missing_trailing_newline_is_synthesized() {
    let toks = kinds("set x to 1");
    assert_eq!(toks.last(), Some(&TokenKind::Newline));
}

#[test]
fn test_stream_always_ends_with_eof() {
    for src in ["", "x", "a:\n    b\n", "# only comments\n"] {
        let tokens = lex(src);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}

// ─────────────────────────────────────────────────────────────────────
// Spans
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_token_spans_are_one_based() {
    let tokens = lex("set count to 9\n");
    assert_eq!(tokens[0].span.start_line, 1);
    assert_eq!(tokens[0].span.start_col, 1);
    assert_eq!(tokens[1].span.start_col, 5);
    assert_eq!(tokens[1].text, "count");
    assert_eq!(tokens[3].span.start_col, 14);
}

#[test]
fn test_determinism() {
    let source = "task greet:\n    steps:\n        - set msg to \"hi\"\n        - return msg\n";
    let first = lex(source);
    for _ in 0..100 {
        assert_eq!(lex(source), first);
    }
}
