//! Structured function-body syntax consumed by the CFG builder
//!
//! The parser front-end walks its own syntax tree and hands function,
//! initializer, and closure bodies over in this shape. It is deliberately
//! small: enough structure for control flow and for the USE/DEF extractor
//! to find identifier reads, assignment targets, iteration variables, and
//! optional bindings. Closure bodies are carried but not descended; their
//! variables belong to the closure, not the enclosing function.

use serde::{Deserialize, Serialize};

use crate::shared::models::Location;

/// Assignment flavor on an [`ExprNode::Assign`] node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// Plain `=`: pure write to the target
    Assign,
    /// Compound assignment (`+=`, `-=`, …): reads and writes the target
    Compound(String),
}

impl AssignOp {
    pub fn spelling(&self) -> &str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Compound(op) => op,
        }
    }

    pub fn reads_target(&self) -> bool {
        matches!(self, AssignOp::Compound(_))
    }
}

/// Expression node, shaped for use/def extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprNode {
    Identifier {
        name: String,
    },
    Literal {
        text: String,
    },
    Assign {
        op: AssignOp,
        target: Box<ExprNode>,
        value: Box<ExprNode>,
    },
    Binary {
        op: String,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
    },
    Call {
        callee: Box<ExprNode>,
        arguments: Vec<ExprNode>,
    },
    Member {
        base: Box<ExprNode>,
        member: String,
    },
    /// Closure literal; the body is not attributed to the outer function
    Closure {
        body: Vec<BodyStmt>,
    },
}

impl ExprNode {
    pub fn ident(name: impl Into<String>) -> ExprNode {
        ExprNode::Identifier { name: name.into() }
    }

    pub fn literal(text: impl Into<String>) -> ExprNode {
        ExprNode::Literal { text: text.into() }
    }

    pub fn assign(target: impl Into<String>, value: ExprNode) -> ExprNode {
        ExprNode::Assign {
            op: AssignOp::Assign,
            target: Box::new(ExprNode::ident(target)),
            value: Box::new(value),
        }
    }

    pub fn compound_assign(
        target: impl Into<String>,
        op: impl Into<String>,
        value: ExprNode,
    ) -> ExprNode {
        ExprNode::Assign {
            op: AssignOp::Compound(op.into()),
            target: Box::new(ExprNode::ident(target)),
            value: Box::new(value),
        }
    }

    pub fn binary(op: impl Into<String>, lhs: ExprNode, rhs: ExprNode) -> ExprNode {
        ExprNode::Binary {
            op: op.into(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(callee: ExprNode, arguments: Vec<ExprNode>) -> ExprNode {
        ExprNode::Call {
            callee: Box::new(callee),
            arguments,
        }
    }
}

/// One `case` arm of a switch statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub pattern: String,
    /// Names bound by the case pattern (`case .some(let x)`)
    pub bindings: Vec<String>,
    pub body: Vec<BodyStmt>,
}

/// One `catch` clause of a do-catch statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    /// Name bound for the caught error, when the clause binds one
    pub binding: Option<String>,
    pub body: Vec<BodyStmt>,
}

/// Structured statement inside a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyStmt {
    Expression {
        expr: ExprNode,
        location: Location,
    },
    /// `var`/`let` pattern binding; `initializer: None` declares storage
    /// without a value
    Declare {
        name: String,
        type_annotation: Option<String>,
        initializer: Option<ExprNode>,
        location: Location,
    },
    If {
        condition: ExprNode,
        /// Names bound by optional-binding conditions (`if let x = …`)
        bindings: Vec<String>,
        then_body: Vec<BodyStmt>,
        else_body: Option<Vec<BodyStmt>>,
        location: Location,
    },
    Guard {
        condition: ExprNode,
        /// Names bound by the guard condition, visible after the guard
        bindings: Vec<String>,
        else_body: Vec<BodyStmt>,
        location: Location,
    },
    While {
        label: Option<String>,
        condition: ExprNode,
        body: Vec<BodyStmt>,
        location: Location,
    },
    For {
        label: Option<String>,
        variable: String,
        sequence: ExprNode,
        body: Vec<BodyStmt>,
        location: Location,
    },
    RepeatWhile {
        label: Option<String>,
        body: Vec<BodyStmt>,
        condition: ExprNode,
        location: Location,
    },
    Switch {
        subject: ExprNode,
        cases: Vec<SwitchCase>,
        default_body: Option<Vec<BodyStmt>>,
        location: Location,
    },
    Return {
        value: Option<ExprNode>,
        location: Location,
    },
    Throw {
        value: ExprNode,
        location: Location,
    },
    Break {
        label: Option<String>,
        location: Location,
    },
    Continue {
        label: Option<String>,
        location: Location,
    },
    /// Transfers control to the next case body inside a switch
    Fallthrough {
        location: Location,
    },
    DoCatch {
        body: Vec<BodyStmt>,
        catches: Vec<CatchClause>,
        location: Location,
    },
    Defer {
        body: Vec<BodyStmt>,
        location: Location,
    },
}

impl BodyStmt {
    pub fn location(&self) -> &Location {
        match self {
            BodyStmt::Expression { location, .. }
            | BodyStmt::Declare { location, .. }
            | BodyStmt::If { location, .. }
            | BodyStmt::Guard { location, .. }
            | BodyStmt::While { location, .. }
            | BodyStmt::For { location, .. }
            | BodyStmt::RepeatWhile { location, .. }
            | BodyStmt::Switch { location, .. }
            | BodyStmt::Return { location, .. }
            | BodyStmt::Throw { location, .. }
            | BodyStmt::Break { location, .. }
            | BodyStmt::Continue { location, .. }
            | BodyStmt::Fallthrough { location }
            | BodyStmt::DoCatch { location, .. }
            | BodyStmt::Defer { location, .. } => location,
        }
    }
}

/// A function, initializer, or closure body handed over by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub name: String,
    pub location: Location,
    /// Parameter names, treated as initialized definitions at entry
    pub parameters: Vec<String>,
    pub statements: Vec<BodyStmt>,
}

impl FunctionBody {
    pub fn new(name: impl Into<String>, location: Location, statements: Vec<BodyStmt>) -> Self {
        Self {
            name: name.into(),
            location,
            parameters: Vec::new(),
            statements,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }
}
