//! AST node types for the Quill language.
//!
//! The node set is closed and finite: every executable construct is one
//! of the variants below, and the runtime dispatches on [`NodeKind`]
//! exhaustively. Every node carries a [`Span`] for diagnostics.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete Quill module: optional `module` header, imports, then
/// declarations in any order (imports must come first — the parser
/// enforces this).
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name; empty when the file has no `module` header.
    pub name: String,
    /// `true` when the file opened with a `module NAME` declaration.
    pub has_module_declaration: bool,
    pub imports: Vec<Import>,
    pub entities: Vec<EntityDef>,
    pub enums: Vec<EnumDef>,
    pub tasks: Vec<TaskDef>,
    pub flows: Vec<FlowDef>,
    pub policies: Vec<PolicyDef>,
    pub span: Span,
}

impl Module {
    /// An empty module rooted at the start of the file.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            has_module_declaration: false,
            imports: Vec::new(),
            entities: Vec::new(),
            enums: Vec::new(),
            tasks: Vec::new(),
            flows: Vec::new(),
            policies: Vec::new(),
            span: Span::point(1, 1),
        }
    }
}

/// `import math` or `import strings.upper`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Dotted path segments: `["strings", "upper"]`.
    pub parts: Vec<String>,
    pub span: Span,
}

impl Import {
    /// The module name (first segment).
    pub fn module_name(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or("")
    }

    /// `true` when importing a specific symbol rather than a whole module.
    pub fn is_specific_symbol(&self) -> bool {
        self.parts.len() > 1
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations
// ══════════════════════════════════════════════════════════════════════════════

/// `entity Name:` with fields and an optional constraints section.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

/// `enum Name:` with `- Value` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
    pub span: Span,
}

/// `task Name:` with inputs / outputs / steps / constraints sections.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDef {
    pub name: String,
    pub inputs: Vec<FieldDef>,
    pub outputs: Vec<FieldDef>,
    pub steps: Vec<Stmt>,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

/// `flow Name:` with steps / constraints sections.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDef {
    pub name: String,
    pub steps: Vec<Stmt>,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

/// `policy Name:` with a rules section of free-text lines.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDef {
    pub name: String,
    pub rules: Vec<String>,
    pub span: Span,
}

/// A field declaration: `name: Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_name: String,
    pub span: Span,
}

/// One entry in a `constraints:` section — either a free-text constraint
/// expression or a controlled-deviation block.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `- total >= 0`
    Rule { expression: String, span: Span },
    /// `- allow deviation:` with scope / mode / bounds / rationale.
    Deviation(Deviation),
}

/// A controlled-deviation block inside a constraints section.
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    pub scope: String,
    pub mode: String,
    pub bounds: Vec<String>,
    pub rationale: Option<String>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement inside a steps section or control-flow body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `- action text`, with optional indented substeps.
    Step(Step),
    /// `if cond: ... [else if cond: ...]* [else: ...]`
    If(If),
    /// `while cond: ...`
    While(While),
    /// `for item in iterable: ...`
    For(For),
}

impl Stmt {
    /// The node kind, for trace events and diagnostics.
    pub fn kind(&self) -> NodeKind {
        match self {
            Stmt::Step(_) => NodeKind::Step,
            Stmt::If(_) => NodeKind::If,
            Stmt::While(_) => NodeKind::While,
            Stmt::For(_) => NodeKind::For,
        }
    }

    /// The statement's source span.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Step(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
        }
    }
}

/// A dash step. The action text is the step's sub-language, parsed by
/// the step-action parser at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub action: String,
    pub substeps: Vec<Stmt>,
    pub span: Span,
}

/// `if` / `else if` / `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    /// `else if` branches in source order.
    pub elif_branches: Vec<(Expr, Vec<Stmt>)>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// `while cond:` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `for item in iterable:` loop.
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub iterator: String,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node.
///
/// The grammar is deliberately minimal: a primary, optionally followed
/// by exactly one binary operator and another primary. There is no
/// precedence climbing and no grouping; ambiguity is rejected rather
/// than resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `42`, `3.14`, `"text"`, `true`
    Literal(Literal),
    /// `counter`
    Identifier(String),
    /// `counter < 5`
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
}

/// A literal value in source form.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Node Kinds
// ══════════════════════════════════════════════════════════════════════════════

/// Every executable node kind. Trace events and replay validation key
/// on this; the set is closed and never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Module,
    Task,
    Flow,
    Step,
    If,
    While,
    For,
    Expr,
}

impl NodeKind {
    /// Stable lowercase name used in traces and explanations.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Task => "task",
            NodeKind::Flow => "flow",
            NodeKind::Step => "step",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::For => "for",
            NodeKind::Expr => "expr",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
