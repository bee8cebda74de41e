//! Top-level and declaration parsing.
//!
//! Handles the optional `module` header, imports (which must precede
//! every other declaration), and the `entity` / `enum` / `task` /
//! `flow` / `policy` declarations with their sections.

use quill_lexer::TokenKind;
use quill_types::ast::*;
use quill_types::{Result, Span};

use crate::parser::Parser;

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Module
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a complete source file into a [`Module`].
    pub fn parse_module(mut self) -> Result<Module> {
        let start = self.current_span();
        let mut module = Module::empty();
        self.skip_newlines();

        if self.eat(TokenKind::Module) {
            let (name, _) = self.expect_identifier()?;
            module.name = name;
            module.has_module_declaration = true;
            self.expect_newline()?;
        }

        let mut seen_declaration = false;
        loop {
            self.skip_newlines();
            if self.at_end() {
                break;
            }
            match self.peek_kind() {
                TokenKind::Import => {
                    if seen_declaration {
                        return Err(self.error_at_current(
                            "imports must appear before all other declarations",
                        ));
                    }
                    module.imports.push(self.parse_import()?);
                }
                TokenKind::Entity => {
                    seen_declaration = true;
                    module.entities.push(self.parse_entity()?);
                }
                TokenKind::Enum => {
                    seen_declaration = true;
                    module.enums.push(self.parse_enum()?);
                }
                TokenKind::Task => {
                    seen_declaration = true;
                    module.tasks.push(self.parse_task()?);
                }
                TokenKind::Flow => {
                    seen_declaration = true;
                    module.flows.push(self.parse_flow()?);
                }
                TokenKind::Policy => {
                    seen_declaration = true;
                    module.policies.push(self.parse_policy()?);
                }
                _ => {
                    return Err(self.error_at_current(format!(
                        "expected declaration, got '{}'",
                        self.peek()
                    )));
                }
            }
        }

        module.span = start.merge(self.previous_span());
        Ok(module)
    }

    /// `import NAME` or `import NAME.NAME`.
    fn parse_import(&mut self) -> Result<Import> {
        let start = self.current_span();
        self.advance(); // import
        let (first, _) = self.expect_identifier()?;
        let mut parts = vec![first];
        while self.eat(TokenKind::Dot) {
            let (part, _) = self.expect_identifier()?;
            parts.push(part);
        }
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Ok(Import { parts, span })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Entity & Enum
    // ══════════════════════════════════════════════════════════════════════════

    /// `entity NAME:` with field lines and an optional `constraints:` section.
    fn parse_entity(&mut self) -> Result<EntityDef> {
        let start = self.current_span();
        self.advance(); // entity
        let (name, _) = self.expect_identifier()?;
        self.expect_block_start()?;

        let mut fields = Vec::new();
        let mut constraints = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.check(TokenKind::Constraints) {
                constraints = self.parse_constraints_section()?;
            } else {
                fields.push(self.parse_field()?);
            }
            self.skip_newlines();
        }
        self.expect_block_end()?;

        Ok(EntityDef {
            name,
            fields,
            constraints,
            span: start.merge(self.previous_span()),
        })
    }

    /// `enum NAME:` with `- Value` lines.
    fn parse_enum(&mut self) -> Result<EnumDef> {
        let start = self.current_span();
        self.advance(); // enum
        let (name, _) = self.expect_identifier()?;
        self.expect_block_start()?;

        let mut values = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.expect(TokenKind::Dash)?;
            let (value, _) = self.expect_identifier()?;
            values.push(value);
            self.expect_newline()?;
        }
        self.expect_block_end()?;

        Ok(EnumDef {
            name,
            values,
            span: start.merge(self.previous_span()),
        })
    }

    /// A field line: `name: TypeName`.
    fn parse_field(&mut self) -> Result<FieldDef> {
        let (name, span) = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let (type_name, _) = self.expect_identifier()?;
        let span = span.merge(self.previous_span());
        self.expect_newline()?;
        Ok(FieldDef {
            name,
            type_name,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Task & Flow
    // ══════════════════════════════════════════════════════════════════════════

    /// `task NAME:` with `inputs` / `outputs` / `steps` / `constraints`
    /// sections, in any order, each at most once.
    fn parse_task(&mut self) -> Result<TaskDef> {
        let start = self.current_span();
        self.advance(); // task
        let (name, _) = self.expect_identifier()?;
        self.expect_block_start()?;

        let mut task = TaskDef {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            steps: Vec::new(),
            constraints: Vec::new(),
            span: start,
        };

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            match self.peek_kind() {
                TokenKind::Inputs => {
                    self.advance();
                    task.inputs = self.parse_field_section()?;
                }
                TokenKind::Outputs => {
                    self.advance();
                    task.outputs = self.parse_field_section()?;
                }
                TokenKind::Steps => {
                    self.advance();
                    task.steps = self.parse_steps_section()?;
                }
                TokenKind::Constraints => {
                    task.constraints = self.parse_constraints_section()?;
                }
                _ => {
                    return Err(self.error_at_current(format!(
                        "expected task section, got '{}'",
                        self.peek()
                    )));
                }
            }
            self.skip_newlines();
        }
        self.expect_block_end()?;

        task.span = start.merge(self.previous_span());
        Ok(task)
    }

    /// `flow NAME:` with `steps` / `constraints` sections.
    fn parse_flow(&mut self) -> Result<FlowDef> {
        let start = self.current_span();
        self.advance(); // flow
        let (name, _) = self.expect_identifier()?;
        self.expect_block_start()?;

        let mut flow = FlowDef {
            name,
            steps: Vec::new(),
            constraints: Vec::new(),
            span: start,
        };

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            match self.peek_kind() {
                TokenKind::Steps => {
                    self.advance();
                    flow.steps = self.parse_steps_section()?;
                }
                TokenKind::Constraints => {
                    flow.constraints = self.parse_constraints_section()?;
                }
                _ => {
                    return Err(self.error_at_current(format!(
                        "expected flow section, got '{}'",
                        self.peek()
                    )));
                }
            }
            self.skip_newlines();
        }
        self.expect_block_end()?;

        flow.span = start.merge(self.previous_span());
        Ok(flow)
    }

    /// An indented list of field lines following `inputs:` / `outputs:`.
    fn parse_field_section(&mut self) -> Result<Vec<FieldDef>> {
        self.expect_block_start()?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            fields.push(self.parse_field()?);
        }
        self.expect_block_end()?;
        Ok(fields)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Policy
    // ══════════════════════════════════════════════════════════════════════════

    /// `policy NAME:` with a `rules:` section of `- text` lines.
    fn parse_policy(&mut self) -> Result<PolicyDef> {
        let start = self.current_span();
        self.advance(); // policy
        let (name, _) = self.expect_identifier()?;
        self.expect_block_start()?;

        let mut rules = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.expect(TokenKind::Rules)?;
            self.expect_block_start()?;
            while !self.check(TokenKind::Dedent) && !self.at_end() {
                self.expect(TokenKind::Dash)?;
                rules.push(self.take_line_text());
                self.expect_newline()?;
            }
            self.expect_block_end()?;
            self.skip_newlines();
        }
        self.expect_block_end()?;

        Ok(PolicyDef {
            name,
            rules,
            span: start.merge(self.previous_span()),
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Constraints & Deviations
    // ══════════════════════════════════════════════════════════════════════════

    /// `constraints:` with `- expression` lines and `- allow deviation:`
    /// blocks.
    fn parse_constraints_section(&mut self) -> Result<Vec<Constraint>> {
        self.advance(); // constraints
        self.expect_block_start()?;

        let mut constraints = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            let start = self.current_span();
            self.expect(TokenKind::Dash)?;
            if self.check(TokenKind::Allow) && self.look_ahead(1) == TokenKind::Deviation {
                constraints.push(Constraint::Deviation(self.parse_deviation(start)?));
            } else {
                let expression = self.take_line_text();
                let span = start.merge(self.previous_span());
                self.expect_newline()?;
                constraints.push(Constraint::Rule { expression, span });
            }
        }
        self.expect_block_end()?;
        Ok(constraints)
    }

    /// `allow deviation:` with `scope` / `mode` / `bounds` / `rationale`
    /// entries. The leading dash is already consumed.
    fn parse_deviation(&mut self, start: Span) -> Result<Deviation> {
        self.advance(); // allow
        self.advance(); // deviation
        self.expect_block_start()?;

        let mut deviation = Deviation {
            scope: String::new(),
            mode: String::new(),
            bounds: Vec::new(),
            rationale: None,
            span: start,
        };

        while !self.check(TokenKind::Dedent) && !self.at_end() {
            match self.peek_kind() {
                TokenKind::Scope => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    deviation.scope = self.take_line_text();
                    self.expect_newline()?;
                }
                TokenKind::Mode => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    deviation.mode = self.take_line_text();
                    self.expect_newline()?;
                }
                TokenKind::Rationale => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    deviation.rationale = Some(self.take_line_text());
                    self.expect_newline()?;
                }
                TokenKind::Bounds => {
                    self.advance();
                    self.expect_block_start()?;
                    while !self.check(TokenKind::Dedent) && !self.at_end() {
                        self.expect(TokenKind::Dash)?;
                        deviation.bounds.push(self.take_line_text());
                        self.expect_newline()?;
                    }
                    self.expect_block_end()?;
                }
                _ => {
                    return Err(self.error_at_current(format!(
                        "expected deviation entry, got '{}'",
                        self.peek()
                    )));
                }
            }
        }
        self.expect_block_end()?;

        deviation.span = start.merge(self.previous_span());
        Ok(deviation)
    }
}
