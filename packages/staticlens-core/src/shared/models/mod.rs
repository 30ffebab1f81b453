//! Shared models used across features.

pub mod declaration;
pub mod error;
pub mod findings;
pub mod span;
pub mod token;

pub use declaration::{
    AccessLevel, Declaration, DeclarationKind, DependencyKind, Reference, ReferenceContext,
};
pub use error::{CoreError, CoreResult, DecodeError};
pub use findings::{
    AnalysisReport, CloneGroup, CloneInstance, CloneType, Confidence, DeadStore, UninitializedUse,
    UnusedCode, UnusedReason,
};
pub use span::{Location, SourceRange};
pub use token::{FrozenTokenStorage, Token, TokenKind, TokenSequence, TokenStorage};
