//! USE/DEF extraction from expression trees
//!
//! Reads are identifier references; writes are assignment targets,
//! pattern bindings, iteration variables, and optional bindings. A
//! compound assignment reads and writes its target. Closure bodies are
//! not descended: their variables belong to the closure, not the
//! enclosing function.

use crate::shared::ports::syntax::{AssignOp, ExprNode};

/// Ordered, deduplicated use/def lists extracted from one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprEffects {
    pub uses: Vec<String>,
    pub defs: Vec<String>,
}

impl ExprEffects {
    fn use_var(&mut self, name: &str) {
        if !self.uses.iter().any(|u| u == name) {
            self.uses.push(name.to_string());
        }
    }

    fn def_var(&mut self, name: &str) {
        if !self.defs.iter().any(|d| d == name) {
            self.defs.push(name.to_string());
        }
    }
}

/// Extract reads and writes from an expression.
pub fn expr_effects(expr: &ExprNode) -> ExprEffects {
    let mut effects = ExprEffects::default();
    walk(expr, &mut effects);
    effects
}

/// Extract only the reads of an expression (condition positions).
pub fn expr_reads(expr: &ExprNode) -> Vec<String> {
    expr_effects(expr).uses
}

fn walk(expr: &ExprNode, effects: &mut ExprEffects) {
    match expr {
        ExprNode::Identifier { name } => effects.use_var(name),
        ExprNode::Literal { .. } => {}
        ExprNode::Assign { op, target, value } => {
            // Right-hand side is evaluated first.
            walk(value, effects);
            match target.as_ref() {
                ExprNode::Identifier { name } => {
                    if op.reads_target() {
                        effects.use_var(name);
                    }
                    effects.def_var(name);
                }
                // Writing through a member or other l-value reads its base;
                // no local variable is defined.
                other => walk(other, effects),
            }
        }
        ExprNode::Binary { lhs, rhs, .. } => {
            walk(lhs, effects);
            walk(rhs, effects);
        }
        ExprNode::Call { callee, arguments } => {
            walk(callee, effects);
            for argument in arguments {
                walk(argument, effects);
            }
        }
        ExprNode::Member { base, .. } => walk(base, effects),
        ExprNode::Closure { .. } => {
            // Not descended.
        }
    }
}

/// Render an expression back to compact text for findings and terminators.
pub fn render_expr(expr: &ExprNode) -> String {
    match expr {
        ExprNode::Identifier { name } => name.clone(),
        ExprNode::Literal { text } => text.clone(),
        ExprNode::Assign { op, target, value } => {
            format!(
                "{} {} {}",
                render_expr(target),
                op.spelling(),
                render_expr(value)
            )
        }
        ExprNode::Binary { op, lhs, rhs } => {
            format!("{} {} {}", render_expr(lhs), op, render_expr(rhs))
        }
        ExprNode::Call { callee, arguments } => {
            let rendered: Vec<String> = arguments.iter().map(render_expr).collect();
            format!("{}({})", render_expr(callee), rendered.join(", "))
        }
        ExprNode::Member { base, member } => format!("{}.{}", render_expr(base), member),
        ExprNode::Closure { .. } => "{ closure }".to_string(),
    }
}
