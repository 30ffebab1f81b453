//! Ports to external collaborators.

pub mod parser;
pub mod syntax;

pub use parser::{ParsedFile, SourceParser};
pub use syntax::{AssignOp, BodyStmt, CatchClause, ExprNode, FunctionBody, SwitchCase};
