//! Declarations, references, and dependency edges
//!
//! A declaration is a tagged variant over [`DeclarationKind`]; there is no
//! inheritance, and root detection branches on kind, modifiers, and
//! attribute names at the value level.

use serde::{Deserialize, Serialize};

use super::span::{Location, SourceRange};

/// Declaration classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Class,
    Struct,
    Enum,
    EnumCase,
    Actor,
    Protocol,
    Extension,
    Function,
    Method,
    Initializer,
    Subscript,
    Variable,
    Constant,
    Parameter,
    TypeAlias,
    Import,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Enum => "enum",
            DeclarationKind::EnumCase => "enum_case",
            DeclarationKind::Actor => "actor",
            DeclarationKind::Protocol => "protocol",
            DeclarationKind::Extension => "extension",
            DeclarationKind::Function => "function",
            DeclarationKind::Method => "method",
            DeclarationKind::Initializer => "initializer",
            DeclarationKind::Subscript => "subscript",
            DeclarationKind::Variable => "variable",
            DeclarationKind::Constant => "constant",
            DeclarationKind::Parameter => "parameter",
            DeclarationKind::TypeAlias => "typealias",
            DeclarationKind::Import => "import",
        }
    }

    /// Type-like kinds that own members through their scope.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Struct
                | DeclarationKind::Enum
                | DeclarationKind::Actor
        )
    }

    /// Kinds that are callable function bodies.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Function | DeclarationKind::Method | DeclarationKind::Initializer
        )
    }
}

/// Access control level, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    Private,
    FilePrivate,
    Internal,
    Public,
    Open,
}

impl AccessLevel {
    pub fn is_externally_visible(&self) -> bool {
        matches!(self, AccessLevel::Public | AccessLevel::Open)
    }
}

/// A named declaration collected by the parser front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub access_level: AccessLevel,
    pub modifiers: Vec<String>,
    pub attributes: Vec<String>,
    pub location: Location,
    pub range: SourceRange,
    pub scope_id: String,
    pub signature: Option<String>,
    pub generic_parameters: Vec<String>,
    pub conformances: Vec<String>,
    pub type_annotation: Option<String>,
    pub documentation: Option<String>,
}

impl Declaration {
    /// Minimal declaration with location-derived range; the builder methods
    /// fill in the rest.
    pub fn new(name: impl Into<String>, kind: DeclarationKind, location: Location) -> Self {
        let range = SourceRange::new(location.clone(), location.clone());
        Self {
            name: name.into(),
            kind,
            access_level: AccessLevel::Internal,
            modifiers: Vec::new(),
            attributes: Vec::new(),
            location,
            range,
            scope_id: String::new(),
            signature: None,
            generic_parameters: Vec::new(),
            conformances: Vec::new(),
            type_annotation: None,
            documentation: None,
        }
    }

    pub fn with_access(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_conformances(mut self, conformances: Vec<String>) -> Self {
        self.conformances = conformances;
        self
    }

    pub fn with_type_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.type_annotation = Some(annotation.into());
        self
    }

    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = scope_id.into();
        self
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    pub fn is_static_member(&self) -> bool {
        self.has_modifier("static") || self.has_modifier("class")
    }
}

/// Syntactic context of a reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceContext {
    Call,
    Read,
    Write,
    TypeAnnotation,
    Inheritance,
    GenericConstraint,
    KeyPath,
    MemberAccessBase,
    MemberAccessMember,
    Attribute,
    Import,
    Pattern,
    Unknown,
}

/// A use of an identifier collected by the parser front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub identifier: String,
    pub location: Location,
    pub scope_id: String,
    pub context: ReferenceContext,
    pub is_qualified: bool,
    pub qualifier: Option<String>,
}

impl Reference {
    pub fn new(
        identifier: impl Into<String>,
        location: Location,
        context: ReferenceContext,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            location,
            scope_id: String::new(),
            context,
            is_qualified: false,
            qualifier: None,
        }
    }

    pub fn qualified(mut self, qualifier: impl Into<String>) -> Self {
        self.is_qualified = true;
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// Edge classification in the declaration dependency graph.
///
/// Reachability ignores the kind; it exists for finding classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Call,
    TypeReference,
    Inheritance,
    PropertyAccess,
    ClosureCapture,
    GenericConstraint,
    KeyPath,
    ExtensionTarget,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Call => "call",
            DependencyKind::TypeReference => "type_reference",
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::PropertyAccess => "property_access",
            DependencyKind::ClosureCapture => "closure_capture",
            DependencyKind::GenericConstraint => "generic_constraint",
            DependencyKind::KeyPath => "key_path",
            DependencyKind::ExtensionTarget => "extension_target",
        }
    }

    /// Classify a reference context into the edge kind it produces.
    pub fn from_reference_context(context: ReferenceContext) -> DependencyKind {
        match context {
            ReferenceContext::Call => DependencyKind::Call,
            ReferenceContext::Read
            | ReferenceContext::Write
            | ReferenceContext::MemberAccessBase
            | ReferenceContext::MemberAccessMember
            | ReferenceContext::Pattern => DependencyKind::PropertyAccess,
            ReferenceContext::TypeAnnotation
            | ReferenceContext::Attribute
            | ReferenceContext::Import
            | ReferenceContext::Unknown => DependencyKind::TypeReference,
            ReferenceContext::Inheritance => DependencyKind::Inheritance,
            ReferenceContext::GenericConstraint => DependencyKind::GenericConstraint,
            ReferenceContext::KeyPath => DependencyKind::KeyPath,
        }
    }
}
