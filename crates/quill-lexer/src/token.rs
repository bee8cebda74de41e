//! Token types for the Quill lexer.
//!
//! Every token pairs a [`TokenKind`] with the raw lexeme text and a
//! source [`Span`]. Tokens are immutable once produced.

use quill_types::Span;
use std::fmt;

/// Reserved words in Quill.
///
/// These cannot be used as user-defined names. The lexer recognises
/// each one with a fixed table lookup and emits a specific keyword
/// token instead of [`TokenKind::Identifier`].
pub const KEYWORDS: &[&str] = &[
    // Declarations
    "module", "import", "entity", "enum", "task", "flow", "policy",
    // Sections
    "inputs", "outputs", "steps", "constraints", "rules",
    // Control flow
    "if", "else", "while", "for", "in",
    // Literals & logic
    "true", "false", "and", "or",
    // Step actions
    "set", "to", "return", "call", "with",
    // Deviation blocks
    "allow", "deviation", "scope", "mode", "bounds", "rationale",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Quill lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The raw lexeme text as it appeared in the source. For string
    /// literals this includes the surrounding quotes; structural
    /// tokens (newline, indent, dedent, eof) carry an empty string.
    pub text: String,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }

    /// The unquoted, unescaped value of a string-literal token.
    ///
    /// Only meaningful for [`TokenKind::Str`]; the lexer has already
    /// validated the escapes, so this cannot fail.
    pub fn string_value(&self) -> String {
        debug_assert_eq!(self.kind, TokenKind::Str);
        let inner = self
            .text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(&self.text);
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => out.push(other),
                    None => {}
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            f.write_str(&self.text)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the Quill language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ── Literals & names ──
    /// Numeric literal: `42`, `3.14`
    Number,
    /// String literal: `"hello"`
    Str,
    /// User-defined name.
    Identifier,

    // ── Declaration keywords ──
    Module,
    Import,
    Entity,
    Enum,
    Task,
    Flow,
    Policy,

    // ── Section keywords ──
    Inputs,
    Outputs,
    Steps,
    Constraints,
    Rules,

    // ── Control flow keywords ──
    If,
    Else,
    While,
    For,
    In,

    // ── Literal / logic keywords ──
    True,
    False,
    And,
    Or,

    // ── Step-action keywords ──
    Set,
    To,
    Return,
    Call,
    With,

    // ── Deviation keywords ──
    Allow,
    Deviation,
    Scope,
    Mode,
    Bounds,
    Rationale,

    // ── Operators & punctuation ──
    Plus,
    /// `-` — both the step bullet and the subtraction operator.
    Dash,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    EqEq,
    NotEq,
    Colon,
    Dot,
    Comma,

    // ── Structure ──
    /// End of a logical line.
    Newline,
    /// Increase in indentation level (block start).
    Indent,
    /// Decrease in indentation level (block end).
    Dedent,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a keyword by its source text.
    pub fn from_keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "module" => TokenKind::Module,
            "import" => TokenKind::Import,
            "entity" => TokenKind::Entity,
            "enum" => TokenKind::Enum,
            "task" => TokenKind::Task,
            "flow" => TokenKind::Flow,
            "policy" => TokenKind::Policy,
            "inputs" => TokenKind::Inputs,
            "outputs" => TokenKind::Outputs,
            "steps" => TokenKind::Steps,
            "constraints" => TokenKind::Constraints,
            "rules" => TokenKind::Rules,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "set" => TokenKind::Set,
            "to" => TokenKind::To,
            "return" => TokenKind::Return,
            "call" => TokenKind::Call,
            "with" => TokenKind::With,
            "allow" => TokenKind::Allow,
            "deviation" => TokenKind::Deviation,
            "scope" => TokenKind::Scope,
            "mode" => TokenKind::Mode,
            "bounds" => TokenKind::Bounds,
            "rationale" => TokenKind::Rationale,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for reserved keywords.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Module
                | TokenKind::Import
                | TokenKind::Entity
                | TokenKind::Enum
                | TokenKind::Task
                | TokenKind::Flow
                | TokenKind::Policy
                | TokenKind::Inputs
                | TokenKind::Outputs
                | TokenKind::Steps
                | TokenKind::Constraints
                | TokenKind::Rules
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::In
                | TokenKind::True
                | TokenKind::False
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Set
                | TokenKind::To
                | TokenKind::Return
                | TokenKind::Call
                | TokenKind::With
                | TokenKind::Allow
                | TokenKind::Deviation
                | TokenKind::Scope
                | TokenKind::Mode
                | TokenKind::Bounds
                | TokenKind::Rationale
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Module => "module",
            TokenKind::Import => "import",
            TokenKind::Entity => "entity",
            TokenKind::Enum => "enum",
            TokenKind::Task => "task",
            TokenKind::Flow => "flow",
            TokenKind::Policy => "policy",
            TokenKind::Inputs => "inputs",
            TokenKind::Outputs => "outputs",
            TokenKind::Steps => "steps",
            TokenKind::Constraints => "constraints",
            TokenKind::Rules => "rules",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Set => "set",
            TokenKind::To => "to",
            TokenKind::Return => "return",
            TokenKind::Call => "call",
            TokenKind::With => "with",
            TokenKind::Allow => "allow",
            TokenKind::Deviation => "deviation",
            TokenKind::Scope => "scope",
            TokenKind::Mode => "mode",
            TokenKind::Bounds => "bounds",
            TokenKind::Rationale => "rationale",
            TokenKind::Plus => "+",
            TokenKind::Dash => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}
