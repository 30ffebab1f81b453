//! CFG construction from structured function bodies
//!
//! Walks the body statement by statement, maintaining the current block,
//! a stack of enclosing loops (for `continue`), a stack of breakable
//! constructs (loops and switches, for `break`), and a list of pending
//! exceptional edges from `do` bodies to their catch blocks, applied at
//! finalization. Any block left open after the walk receives an implicit
//! `return nil` and an edge to `exit`.

use rustc_hash::FxHashMap;

use super::use_def::{expr_effects, expr_reads, render_expr};
use crate::features::flow_graph::domain::cfg::{
    BasicBlock, CfgStatement, ControlFlowGraph, Terminator, ENTRY_BLOCK, EXIT_BLOCK,
};
use crate::shared::models::Location;
use crate::shared::ports::syntax::{BodyStmt, CatchClause, ExprNode, FunctionBody, SwitchCase};

/// Enclosing loop context for `continue` resolution.
struct LoopFrame {
    continue_target: String,
    label: Option<String>,
}

/// Enclosing breakable construct (loop or switch) for `break` resolution.
struct BreakFrame {
    target: String,
    label: Option<String>,
}

/// Stateful CFG builder; one instance per function body.
pub struct CfgBuilder {
    function: String,
    blocks: FxHashMap<String, BasicBlock>,
    order: Vec<String>,
    current: String,
    counter: usize,
    loop_stack: Vec<LoopFrame>,
    break_stack: Vec<BreakFrame>,
    pending_edges: Vec<(String, String)>,
    fallthrough_target: Option<String>,
}

impl CfgBuilder {
    /// Build the CFG for one function, initializer, or closure body.
    pub fn build(body: &FunctionBody) -> ControlFlowGraph {
        let mut builder = Self {
            function: body.name.clone(),
            blocks: FxHashMap::default(),
            order: Vec::new(),
            current: ENTRY_BLOCK.to_string(),
            counter: 0,
            loop_stack: Vec::new(),
            break_stack: Vec::new(),
            pending_edges: Vec::new(),
            fallthrough_target: None,
        };

        builder.insert_block(ENTRY_BLOCK.to_string());
        builder.insert_block(EXIT_BLOCK.to_string());

        // Parameters are initialized definitions at function entry.
        for parameter in &body.parameters {
            let mut statement =
                CfgStatement::new(format!("parameter {parameter}"), body.location.clone());
            statement.defs.push(parameter.clone());
            statement.assigned_value = Some("<argument>".to_string());
            statement.is_initial_binding = true;
            builder.push_statement(statement);
        }

        builder.walk_statements(&body.statements);
        builder.finalize()
    }

    // ------------------------------------------------------------------
    // Block plumbing
    // ------------------------------------------------------------------

    fn insert_block(&mut self, id: String) {
        self.blocks.insert(id.clone(), BasicBlock::new(id.clone()));
        self.order.push(id);
    }

    fn add_block(&mut self, hint: &str) -> String {
        self.counter += 1;
        let id = format!("{}_{}", hint, self.counter);
        self.insert_block(id.clone());
        id
    }

    fn link(&mut self, from: &str, to: &str) {
        if let Some(source) = self.blocks.get_mut(from) {
            if !source.successors.iter().any(|s| s == to) {
                source.successors.push(to.to_string());
            }
        }
        if let Some(target) = self.blocks.get_mut(to) {
            if !target.predecessors.iter().any(|p| p == from) {
                target.predecessors.push(from.to_string());
            }
        }
    }

    /// Set a terminator and add the edges it implies. A block keeps its
    /// first terminator; later calls are ignored.
    fn terminate(&mut self, block: &str, terminator: Terminator) {
        let targets: Vec<String> = terminator
            .targets()
            .into_iter()
            .map(str::to_string)
            .collect();
        match self.blocks.get_mut(block) {
            Some(entry) if entry.terminator.is_none() => {
                entry.terminator = Some(terminator);
            }
            _ => return,
        }
        for target in targets {
            self.link(block, &target);
        }
    }

    fn current_terminated(&self) -> bool {
        self.blocks[&self.current].terminator.is_some()
    }

    /// Statements after a terminator are unreachable; park them in a fresh
    /// predecessor-less block so the walk can continue.
    fn ensure_open(&mut self) {
        if self.current_terminated() {
            self.current = self.add_block("unreachable");
        }
    }

    fn push_statement(&mut self, statement: CfgStatement) {
        self.ensure_open();
        if let Some(block) = self.blocks.get_mut(&self.current) {
            block.statements.push(statement);
        }
    }

    fn push_condition(&mut self, keyword: &str, condition: &ExprNode, location: &Location) {
        let mut statement = CfgStatement::new(
            format!("{keyword} {}", render_expr(condition)),
            location.clone(),
        );
        statement.uses = expr_reads(condition);
        self.push_statement(statement);
    }

    fn push_binding(&mut self, name: &str, value: String, location: &Location) {
        let mut statement = CfgStatement::new(format!("let {name} = {value}"), location.clone());
        statement.defs.push(name.to_string());
        statement.assigned_value = Some(value);
        statement.is_initial_binding = true;
        self.push_statement(statement);
    }

    // ------------------------------------------------------------------
    // Statement walk
    // ------------------------------------------------------------------

    fn walk_statements(&mut self, statements: &[BodyStmt]) {
        for statement in statements {
            self.walk_statement(statement);
        }
    }

    fn walk_statement(&mut self, statement: &BodyStmt) {
        match statement {
            BodyStmt::Expression { expr, location } => self.walk_expression(expr, location),
            BodyStmt::Declare {
                name,
                type_annotation,
                initializer,
                location,
            } => self.walk_declare(name, type_annotation.as_deref(), initializer.as_ref(), location),
            BodyStmt::If {
                condition,
                bindings,
                then_body,
                else_body,
                location,
            } => self.walk_if(condition, bindings, then_body, else_body.as_deref(), location),
            BodyStmt::Guard {
                condition,
                bindings,
                else_body,
                location,
            } => self.walk_guard(condition, bindings, else_body, location),
            BodyStmt::While {
                label,
                condition,
                body,
                location,
            } => self.walk_while(label.as_deref(), condition, body, location),
            BodyStmt::For {
                label,
                variable,
                sequence,
                body,
                location,
            } => self.walk_for(label.as_deref(), variable, sequence, body, location),
            BodyStmt::RepeatWhile {
                label,
                body,
                condition,
                location,
            } => self.walk_repeat_while(label.as_deref(), body, condition, location),
            BodyStmt::Switch {
                subject,
                cases,
                default_body,
                location,
            } => self.walk_switch(subject, cases, default_body.as_deref(), location),
            BodyStmt::Return { value, location } => self.walk_return(value.as_ref(), location),
            BodyStmt::Throw { value, location } => self.walk_throw(value, location),
            BodyStmt::Break { label, location: _ } => self.walk_break(label.as_deref()),
            BodyStmt::Continue { label, location: _ } => self.walk_continue(label.as_deref()),
            BodyStmt::Fallthrough { location: _ } => self.walk_fallthrough(),
            BodyStmt::DoCatch {
                body,
                catches,
                location,
            } => self.walk_do_catch(body, catches, location),
            BodyStmt::Defer { body, location: _ } => self.walk_defer(body),
        }
    }

    fn walk_expression(&mut self, expr: &ExprNode, location: &Location) {
        let effects = expr_effects(expr);
        let mut statement = CfgStatement::new(render_expr(expr), location.clone());
        statement.uses = effects.uses;
        statement.defs = effects.defs;
        if let ExprNode::Assign { target, value, .. } = expr {
            if matches!(target.as_ref(), ExprNode::Identifier { .. }) {
                statement.assigned_value = Some(render_expr(value));
            }
        }
        self.push_statement(statement);
    }

    fn walk_declare(
        &mut self,
        name: &str,
        type_annotation: Option<&str>,
        initializer: Option<&ExprNode>,
        location: &Location,
    ) {
        let text = match (type_annotation, initializer) {
            (Some(annotation), Some(init)) => {
                format!("var {name}: {annotation} = {}", render_expr(init))
            }
            (Some(annotation), None) => format!("var {name}: {annotation}"),
            (None, Some(init)) => format!("var {name} = {}", render_expr(init)),
            (None, None) => format!("var {name}"),
        };

        let mut statement = CfgStatement::new(text, location.clone());
        if let Some(init) = initializer {
            statement.uses = expr_reads(init);
            statement.assigned_value = Some(render_expr(init));
        }
        statement.defs.push(name.to_string());
        statement.is_initial_binding = true;
        self.push_statement(statement);
    }

    fn walk_if(
        &mut self,
        condition: &ExprNode,
        bindings: &[String],
        then_body: &[BodyStmt],
        else_body: Option<&[BodyStmt]>,
        location: &Location,
    ) {
        self.push_condition("if", condition, location);

        let then_block = self.add_block("then");
        let merge_block = self.add_block("merge");
        let else_block = match else_body {
            Some(_) => self.add_block("else"),
            None => merge_block.clone(),
        };

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::ConditionalBranch {
                condition: render_expr(condition),
                true_target: then_block.clone(),
                false_target: else_block.clone(),
            },
        );

        self.current = then_block;
        for binding in bindings {
            self.push_binding(binding, render_expr(condition), location);
        }
        self.walk_statements(then_body);
        if !self.current_terminated() {
            let open = self.current.clone();
            self.terminate(
                &open,
                Terminator::Branch {
                    target: merge_block.clone(),
                },
            );
        }

        if let Some(else_statements) = else_body {
            self.current = else_block;
            self.walk_statements(else_statements);
            if !self.current_terminated() {
                let open = self.current.clone();
                self.terminate(
                    &open,
                    Terminator::Branch {
                        target: merge_block.clone(),
                    },
                );
            }
        }

        self.current = merge_block;
    }

    fn walk_guard(
        &mut self,
        condition: &ExprNode,
        bindings: &[String],
        else_body: &[BodyStmt],
        location: &Location,
    ) {
        self.push_condition("guard", condition, location);

        let else_block = self.add_block("guard_else");
        let continue_block = self.add_block("guard_cont");

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::ConditionalBranch {
                condition: render_expr(condition),
                true_target: continue_block.clone(),
                false_target: else_block.clone(),
            },
        );

        // The guard else must exit the scope; a fall-through else is
        // marked unreachable rather than silently joined.
        self.current = else_block;
        self.walk_statements(else_body);
        if !self.current_terminated() {
            let open = self.current.clone();
            self.terminate(&open, Terminator::Unreachable);
        }

        self.current = continue_block;
        for binding in bindings {
            self.push_binding(binding, render_expr(condition), location);
        }
    }

    fn walk_while(
        &mut self,
        label: Option<&str>,
        condition: &ExprNode,
        body: &[BodyStmt],
        location: &Location,
    ) {
        let header = self.add_block("loop_header");
        let body_block = self.add_block("loop_body");
        let exit_block = self.add_block("loop_exit");

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::Branch {
                target: header.clone(),
            },
        );

        self.current = header.clone();
        if let Some(block) = self.blocks.get_mut(&header) {
            block.is_loop_header = true;
        }
        self.push_condition("while", condition, location);
        self.terminate(
            &header,
            Terminator::ConditionalBranch {
                condition: render_expr(condition),
                true_target: body_block.clone(),
                false_target: exit_block.clone(),
            },
        );

        self.enter_loop(header.clone(), exit_block.clone(), label);
        self.current = body_block;
        self.walk_statements(body);
        if !self.current_terminated() {
            let open = self.current.clone();
            self.terminate(
                &open,
                Terminator::Branch {
                    target: header.clone(),
                },
            );
        }
        self.leave_loop();

        self.current = exit_block;
    }

    fn walk_for(
        &mut self,
        label: Option<&str>,
        variable: &str,
        sequence: &ExprNode,
        body: &[BodyStmt],
        location: &Location,
    ) {
        let header = self.add_block("loop_header");
        let body_block = self.add_block("loop_body");
        let exit_block = self.add_block("loop_exit");

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::Branch {
                target: header.clone(),
            },
        );

        // The header binds the iteration variable from the sequence.
        self.current = header.clone();
        if let Some(block) = self.blocks.get_mut(&header) {
            block.is_loop_header = true;
        }
        let rendered_sequence = render_expr(sequence);
        let mut statement = CfgStatement::new(
            format!("for {variable} in {rendered_sequence}"),
            location.clone(),
        );
        statement.uses = expr_reads(sequence);
        statement.defs.push(variable.to_string());
        statement.assigned_value = Some(rendered_sequence.clone());
        statement.is_initial_binding = true;
        self.push_statement(statement);

        self.terminate(
            &header,
            Terminator::ConditionalBranch {
                condition: format!("{variable} in {rendered_sequence}"),
                true_target: body_block.clone(),
                false_target: exit_block.clone(),
            },
        );

        self.enter_loop(header.clone(), exit_block.clone(), label);
        self.current = body_block;
        self.walk_statements(body);
        if !self.current_terminated() {
            let open = self.current.clone();
            self.terminate(
                &open,
                Terminator::Branch {
                    target: header.clone(),
                },
            );
        }
        self.leave_loop();

        self.current = exit_block;
    }

    fn walk_repeat_while(
        &mut self,
        label: Option<&str>,
        body: &[BodyStmt],
        condition: &ExprNode,
        location: &Location,
    ) {
        let body_block = self.add_block("loop_body");
        let condition_block = self.add_block("loop_cond");
        let exit_block = self.add_block("loop_exit");

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::Branch {
                target: body_block.clone(),
            },
        );

        // The body runs at least once and is the loop header; `continue`
        // transfers to the condition block.
        if let Some(block) = self.blocks.get_mut(&body_block) {
            block.is_loop_header = true;
        }

        self.loop_stack.push(LoopFrame {
            continue_target: condition_block.clone(),
            label: label.map(str::to_string),
        });
        self.break_stack.push(BreakFrame {
            target: exit_block.clone(),
            label: label.map(str::to_string),
        });

        self.current = body_block.clone();
        self.walk_statements(body);
        if !self.current_terminated() {
            let open = self.current.clone();
            self.terminate(
                &open,
                Terminator::Branch {
                    target: condition_block.clone(),
                },
            );
        }

        self.loop_stack.pop();
        self.break_stack.pop();

        self.current = condition_block.clone();
        self.push_condition("while", condition, location);
        self.terminate(
            &condition_block,
            Terminator::ConditionalBranch {
                condition: render_expr(condition),
                true_target: body_block,
                false_target: exit_block.clone(),
            },
        );

        self.current = exit_block;
    }

    fn walk_switch(
        &mut self,
        subject: &ExprNode,
        cases: &[SwitchCase],
        default_body: Option<&[BodyStmt]>,
        location: &Location,
    ) {
        self.push_condition("switch", subject, location);

        let exit_block = self.add_block("switch_exit");
        let case_blocks: Vec<String> = cases.iter().map(|_| self.add_block("case")).collect();
        let default_block = default_body.map(|_| self.add_block("default"));

        let terminator_cases = cases
            .iter()
            .zip(&case_blocks)
            .map(|(case, block)| (case.pattern.clone(), block.clone()))
            .collect();

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::Switch {
                subject: render_expr(subject),
                cases: terminator_cases,
                // An exhaustive switch without a default clause flows to
                // the shared exit when nothing matches.
                default_target: Some(
                    default_block.clone().unwrap_or_else(|| exit_block.clone()),
                ),
            },
        );

        self.break_stack.push(BreakFrame {
            target: exit_block.clone(),
            label: None,
        });
        let saved_fallthrough = self.fallthrough_target.take();

        for (index, case) in cases.iter().enumerate() {
            self.current = case_blocks[index].clone();
            self.fallthrough_target = case_blocks
                .get(index + 1)
                .cloned()
                .or_else(|| default_block.clone())
                .or_else(|| Some(exit_block.clone()));

            for binding in &case.bindings {
                self.push_binding(binding, render_expr(subject), location);
            }
            self.walk_statements(&case.body);
            if !self.current_terminated() {
                let open = self.current.clone();
                self.terminate(
                    &open,
                    Terminator::Branch {
                        target: exit_block.clone(),
                    },
                );
            }
        }

        if let (Some(default_block), Some(default_statements)) = (default_block, default_body) {
            self.current = default_block;
            self.fallthrough_target = Some(exit_block.clone());
            self.walk_statements(default_statements);
            if !self.current_terminated() {
                let open = self.current.clone();
                self.terminate(
                    &open,
                    Terminator::Branch {
                        target: exit_block.clone(),
                    },
                );
            }
        }

        self.fallthrough_target = saved_fallthrough;
        self.break_stack.pop();
        self.current = exit_block;
    }

    fn walk_return(&mut self, value: Option<&ExprNode>, location: &Location) {
        self.ensure_open();
        let rendered = value.map(render_expr);
        if let Some(expr) = value {
            let mut statement = CfgStatement::new(
                format!("return {}", rendered.clone().unwrap_or_default()),
                location.clone(),
            );
            statement.uses = expr_reads(expr);
            self.push_statement(statement);
        }
        let from = self.current.clone();
        self.terminate(&from, Terminator::Return { value: rendered });
        self.link(&from, EXIT_BLOCK);
    }

    fn walk_throw(&mut self, value: &ExprNode, location: &Location) {
        self.ensure_open();
        let mut statement =
            CfgStatement::new(format!("throw {}", render_expr(value)), location.clone());
        statement.uses = expr_reads(value);
        self.push_statement(statement);

        let from = self.current.clone();
        self.terminate(
            &from,
            Terminator::Throw {
                value: render_expr(value),
            },
        );
        self.link(&from, EXIT_BLOCK);
    }

    fn walk_break(&mut self, label: Option<&str>) {
        self.ensure_open();
        let target = match label {
            Some(label) => self
                .break_stack
                .iter()
                .rev()
                .find(|frame| frame.label.as_deref() == Some(label))
                .map(|frame| frame.target.clone()),
            None => self.break_stack.last().map(|frame| frame.target.clone()),
        };
        let from = self.current.clone();
        self.terminate(&from, Terminator::Break { target });
    }

    fn walk_continue(&mut self, label: Option<&str>) {
        self.ensure_open();
        let target = match label {
            Some(label) => self
                .loop_stack
                .iter()
                .rev()
                .find(|frame| frame.label.as_deref() == Some(label))
                .map(|frame| frame.continue_target.clone()),
            None => self
                .loop_stack
                .last()
                .map(|frame| frame.continue_target.clone()),
        };
        let from = self.current.clone();
        self.terminate(&from, Terminator::Continue { target });
    }

    fn walk_fallthrough(&mut self) {
        self.ensure_open();
        let target = self
            .fallthrough_target
            .clone()
            .unwrap_or_else(|| EXIT_BLOCK.to_string());
        let from = self.current.clone();
        self.terminate(&from, Terminator::Fallthrough { target });
    }

    fn walk_do_catch(
        &mut self,
        body: &[BodyStmt],
        catches: &[CatchClause],
        location: &Location,
    ) {
        self.ensure_open();
        self.walk_statements(body);
        let body_end = self.current.clone();

        let after_block = self.add_block("after_do");

        // Exceptional flow: pending edges from the body's current block to
        // each catch block, applied at finalization.
        let catch_blocks: Vec<String> = catches.iter().map(|_| self.add_block("catch")).collect();
        for catch_block in &catch_blocks {
            self.pending_edges.push((body_end.clone(), catch_block.clone()));
        }

        if self.blocks[&body_end].terminator.is_none() {
            self.terminate(
                &body_end,
                Terminator::Branch {
                    target: after_block.clone(),
                },
            );
        }

        for (catch, catch_block) in catches.iter().zip(&catch_blocks) {
            self.current = catch_block.clone();
            if let Some(binding) = &catch.binding {
                self.push_binding(binding, "<error>".to_string(), location);
            }
            self.walk_statements(&catch.body);
            if !self.current_terminated() {
                let open = self.current.clone();
                self.terminate(
                    &open,
                    Terminator::Branch {
                        target: after_block.clone(),
                    },
                );
            }
        }

        self.current = after_block;
    }

    /// `defer` is over-approximated by appending the deferred body's leaf
    /// statements to the current block.
    fn walk_defer(&mut self, body: &[BodyStmt]) {
        let mut leaves = Vec::new();
        collect_leaf_statements(body, &mut leaves);
        for statement in leaves {
            match statement {
                BodyStmt::Expression { expr, location } => self.walk_expression(expr, location),
                BodyStmt::Declare {
                    name,
                    type_annotation,
                    initializer,
                    location,
                } => self.walk_declare(
                    name,
                    type_annotation.as_deref(),
                    initializer.as_ref(),
                    location,
                ),
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Loop stack helpers and finalization
    // ------------------------------------------------------------------

    fn enter_loop(&mut self, header: String, exit: String, label: Option<&str>) {
        self.loop_stack.push(LoopFrame {
            continue_target: header,
            label: label.map(str::to_string),
        });
        self.break_stack.push(BreakFrame {
            target: exit,
            label: label.map(str::to_string),
        });
    }

    fn leave_loop(&mut self) {
        self.loop_stack.pop();
        self.break_stack.pop();
    }

    fn finalize(mut self) -> ControlFlowGraph {
        // Open blocks get the implicit return and an edge to exit.
        let ids: Vec<String> = self.order.clone();
        for id in ids {
            if id != EXIT_BLOCK && self.blocks[&id].terminator.is_none() {
                self.terminate(&id, Terminator::Return { value: None });
                self.link(&id, EXIT_BLOCK);
            }
        }

        // Apply pending exceptional edges.
        let pending = std::mem::take(&mut self.pending_edges);
        for (from, to) in pending {
            self.link(&from, &to);
        }

        ControlFlowGraph::from_parts(self.function, self.blocks, self.order)
    }
}

/// Collect straight-line leaf statements, descending into nested bodies.
fn collect_leaf_statements<'a>(statements: &'a [BodyStmt], out: &mut Vec<&'a BodyStmt>) {
    for statement in statements {
        match statement {
            BodyStmt::Expression { .. } | BodyStmt::Declare { .. } => out.push(statement),
            BodyStmt::If {
                then_body,
                else_body,
                ..
            } => {
                collect_leaf_statements(then_body, out);
                if let Some(else_body) = else_body {
                    collect_leaf_statements(else_body, out);
                }
            }
            BodyStmt::While { body, .. }
            | BodyStmt::For { body, .. }
            | BodyStmt::RepeatWhile { body, .. }
            | BodyStmt::Defer { body, .. } => collect_leaf_statements(body, out),
            BodyStmt::Guard { else_body, .. } => collect_leaf_statements(else_body, out),
            BodyStmt::Switch {
                cases,
                default_body,
                ..
            } => {
                for case in cases {
                    collect_leaf_statements(&case.body, out);
                }
                if let Some(default_body) = default_body {
                    collect_leaf_statements(default_body, out);
                }
            }
            BodyStmt::DoCatch { body, catches, .. } => {
                collect_leaf_statements(body, out);
                for catch in catches {
                    collect_leaf_statements(&catch.body, out);
                }
            }
            _ => {}
        }
    }
}
