//! Parsing port: the syntax-tree collaborator consumed by the engines
//!
//! The language front-end lives outside this crate. It owns parsing,
//! token extraction, declaration/reference collection, and source-location
//! conversion; the engines consume the result through this trait.

use std::path::Path;

use async_trait::async_trait;

use crate::shared::models::{CoreResult, Declaration, Reference, TokenSequence};
use crate::shared::ports::syntax::FunctionBody;

/// Everything the engines need from one parsed source file.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub file: String,
    pub tokens: TokenSequence,
    pub declarations: Vec<Declaration>,
    pub references: Vec<Reference>,
    pub functions: Vec<FunctionBody>,
}

impl ParsedFile {
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            tokens: TokenSequence {
                file: file.clone(),
                tokens: Vec::new(),
            },
            file,
            declarations: Vec::new(),
            references: Vec::new(),
            functions: Vec::new(),
        }
    }
}

/// Async parsing service supplied by the caller.
///
/// Implementations run on the I/O-bound task group; failures are recorded
/// per file and never abort the analysis of other files.
#[async_trait]
pub trait SourceParser: Send + Sync {
    /// Parse one file into tokens, declarations, references, and bodies.
    async fn parse(&self, path: &Path) -> CoreResult<ParsedFile>;
}
