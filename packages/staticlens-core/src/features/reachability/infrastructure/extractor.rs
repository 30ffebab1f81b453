//! Dependency extraction: declarations + references → graph edges
//!
//! Deliberately a *may* over-approximation: every same-named declaration
//! is a candidate edge target, protocol methods point at their possible
//! witnesses, and types point at their members so type-reachability pulls
//! the members along. Per-declaration edge computation is embarrassingly
//! parallel; insertion into the graph is batched at the end.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{ReachabilityConfig, RootPolicy};
use crate::features::reachability::domain::{DenseGraph, DependencyEdge, GraphBuilder};
use crate::shared::models::{
    Declaration, DeclarationKind, DependencyKind, Reference,
};

/// Attributes that always pin a declaration as an entry root.
const ROOT_ATTRIBUTES: &[&str] = &[
    "main",
    "UIApplicationMain",
    "NSApplicationMain",
    "IBAction",
    "IBOutlet",
    "IBInspectable",
    "IBDesignable",
    "dynamicMemberLookup",
    "dynamicCallable",
];

/// Built-in type names excluded from type-annotation edges.
const BUILTIN_TYPES: &[&str] = &[
    "Int", "Int8", "Int16", "Int32", "Int64", "UInt", "UInt8", "UInt16", "UInt32", "UInt64",
    "Double", "Float", "Bool", "String", "Character", "Array", "Dictionary", "Set", "Optional",
    "Result", "Void", "Any", "AnyObject", "Error", "Self",
];

/// Extraction result: the frozen graph plus the node → declaration map.
#[derive(Debug)]
pub struct ExtractedGraph {
    pub graph: DenseGraph,
    /// Dense node id → index into the input declaration slice
    pub node_to_declaration: Vec<usize>,
    pub root_count: usize,
}

/// Whole-program dependency extractor.
#[derive(Debug, Clone)]
pub struct DependencyExtractor {
    config: ReachabilityConfig,
}

/// Shared lookup tables for the parallel edge pass.
struct ExtractionContext<'a> {
    declarations: &'a [Declaration],
    references: &'a [Reference],
    /// Name → declaration indices
    by_name: FxHashMap<&'a str, Vec<usize>>,
    /// File → declaration indices
    by_file: FxHashMap<&'a str, Vec<usize>>,
    /// File → reference indices
    references_by_file: FxHashMap<&'a str, Vec<usize>>,
    /// Declaration index → dense node id
    node_of: Vec<u32>,
}

impl<'a> ExtractionContext<'a> {
    /// Member declarations nested inside `owner`'s source range.
    fn members_of(&self, owner_index: usize) -> Vec<usize> {
        let owner = &self.declarations[owner_index];
        let Some(same_file) = self.by_file.get(owner.location.file.as_str()) else {
            return Vec::new();
        };
        same_file
            .iter()
            .copied()
            .filter(|&candidate| {
                candidate != owner_index
                    && owner
                        .range
                        .contains_line(&self.declarations[candidate].location)
            })
            .collect()
    }
}

impl DependencyExtractor {
    pub fn new(config: ReachabilityConfig) -> Self {
        Self { config }
    }

    /// Build the dense dependency graph for a set of declarations.
    pub fn extract(
        &self,
        declarations: &[Declaration],
        references: &[Reference],
    ) -> ExtractedGraph {
        let mut builder = GraphBuilder::new();
        let mut node_to_declaration = Vec::new();
        let mut node_of = Vec::with_capacity(declarations.len());

        for (index, declaration) in declarations.iter().enumerate() {
            let node = builder.intern(
                &declaration.location.file,
                declaration.location.line,
                &declaration.name,
            );
            if node as usize == node_to_declaration.len() {
                node_to_declaration.push(index);
            }
            node_of.push(node);
        }

        let mut by_name: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        let mut by_file: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for (index, declaration) in declarations.iter().enumerate() {
            by_name
                .entry(declaration.name.as_str())
                .or_default()
                .push(index);
            by_file
                .entry(declaration.location.file.as_str())
                .or_default()
                .push(index);
        }
        let mut references_by_file: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for (index, reference) in references.iter().enumerate() {
            references_by_file
                .entry(reference.location.file.as_str())
                .or_default()
                .push(index);
        }

        let context = ExtractionContext {
            declarations,
            references,
            by_name,
            by_file,
            references_by_file,
            node_of,
        };

        // Root detection.
        let mut root_count = 0usize;
        for (index, declaration) in declarations.iter().enumerate() {
            if self.is_root(declaration) {
                builder.add_root(context.node_of[index]);
                root_count += 1;
            }
        }

        // Per-declaration edge lists computed in parallel, merged once.
        let batches: Vec<Vec<DependencyEdge>> = (0..declarations.len())
            .into_par_iter()
            .map(|index| self.edges_for_declaration(index, &context))
            .collect();
        for batch in batches {
            builder.insert_edges(batch);
        }

        debug!(
            nodes = builder.node_count(),
            edges = builder.edge_count(),
            roots = root_count,
            "dependency graph extracted"
        );

        ExtractedGraph {
            graph: builder.freeze(),
            node_to_declaration,
            root_count,
        }
    }

    /// Entry-root policy (§ root detection).
    pub fn is_root(&self, declaration: &Declaration) -> bool {
        let policy: &RootPolicy = &self.config.roots;

        for attribute in &declaration.attributes {
            if ROOT_ATTRIBUTES.contains(&attribute.as_str()) {
                return true;
            }
            if policy.treat_objc_as_root && attribute == "objc" {
                return true;
            }
            if policy.treat_ui_framework_property_wrappers_as_root
                && policy.property_wrapper_attributes.contains(attribute)
            {
                return true;
            }
        }

        if declaration.name == "main"
            && (declaration.kind == DeclarationKind::Function || declaration.is_static_member())
        {
            return true;
        }

        if policy.treat_public_as_root && declaration.access_level.is_externally_visible() {
            return true;
        }

        if policy.treat_tests_as_root
            && declaration.kind == DeclarationKind::Method
            && declaration.name.starts_with("test")
        {
            return true;
        }

        for conformance in &declaration.conformances {
            if policy.treat_ui_framework_views_as_root
                && policy.ui_view_conformances.contains(conformance)
            {
                return true;
            }
            if policy.treat_preview_providers_as_root
                && policy.preview_conformances.contains(conformance)
            {
                return true;
            }
        }

        false
    }

    fn edges_for_declaration(
        &self,
        index: usize,
        context: &ExtractionContext<'_>,
    ) -> Vec<DependencyEdge> {
        let declaration = &context.declarations[index];
        let from = context.node_of[index];
        let mut edges = Vec::new();

        // References located inside this declaration's line range.
        if let Some(file_references) = context
            .references_by_file
            .get(declaration.location.file.as_str())
        {
            for &reference_index in file_references {
                let reference = &context.references[reference_index];
                if !declaration.range.contains_line(&reference.location) {
                    continue;
                }
                let kind = DependencyKind::from_reference_context(reference.context);
                self.push_name_edges(context, from, &reference.identifier, kind, &mut edges);
                if let Some(qualifier) = &reference.qualifier {
                    self.push_name_edges(
                        context,
                        from,
                        qualifier,
                        DependencyKind::TypeReference,
                        &mut edges,
                    );
                }
            }
        }

        // Capitalized names in the type annotation.
        if let Some(annotation) = &declaration.type_annotation {
            for name in capitalized_names(annotation) {
                if BUILTIN_TYPES.contains(&name.as_str()) {
                    continue;
                }
                self.push_name_edges(context, from, &name, DependencyKind::TypeReference, &mut edges);
            }
        }

        // Explicit conformance edges keep protocols reachable from their
        // conforming types.
        for conformance in &declaration.conformances {
            self.push_name_edges(
                context,
                from,
                conformance,
                DependencyKind::Inheritance,
                &mut edges,
            );
        }

        match declaration.kind {
            DeclarationKind::Protocol => {
                self.protocol_witness_edges(index, context, &mut edges);
            }
            kind if kind.is_type_like() => {
                // Type reachability reaches the type's members.
                for member in context.members_of(index) {
                    if context.declarations[member].kind.is_function_like() {
                        edges.push(DependencyEdge {
                            from,
                            to: context.node_of[member],
                            kind: DependencyKind::Call,
                        });
                    }
                }
            }
            DeclarationKind::Extension => {
                // The extension tracks its extended type, and the type
                // reaches the members the extension adds.
                self.push_name_edges(
                    context,
                    from,
                    &declaration.name,
                    DependencyKind::ExtensionTarget,
                    &mut edges,
                );
                if let Some(targets) = context.by_name.get(declaration.name.as_str()) {
                    for &target in targets {
                        if target != index && context.declarations[target].kind.is_type_like() {
                            edges.push(DependencyEdge {
                                from: context.node_of[target],
                                to: from,
                                kind: DependencyKind::ExtensionTarget,
                            });
                        }
                    }
                }
                for member in context.members_of(index) {
                    edges.push(DependencyEdge {
                        from,
                        to: context.node_of[member],
                        kind: DependencyKind::Call,
                    });
                }
            }
            _ => {}
        }

        edges
    }

    /// Protocol methods point at every same-name, same-kind declaration
    /// outside the protocol: the candidate witnesses.
    fn protocol_witness_edges(
        &self,
        protocol_index: usize,
        context: &ExtractionContext<'_>,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let protocol = &context.declarations[protocol_index];
        for member in context.members_of(protocol_index) {
            let requirement = &context.declarations[member];
            if requirement.kind != DeclarationKind::Method {
                continue;
            }
            let Some(candidates) = context.by_name.get(requirement.name.as_str()) else {
                continue;
            };
            for &candidate in candidates {
                if candidate == member {
                    continue;
                }
                let witness = &context.declarations[candidate];
                if witness.kind != requirement.kind {
                    continue;
                }
                if protocol.range.contains_line(&witness.location) {
                    continue;
                }
                edges.push(DependencyEdge {
                    from: context.node_of[member],
                    to: context.node_of[candidate],
                    kind: DependencyKind::TypeReference,
                });
            }
        }
    }

    fn push_name_edges(
        &self,
        context: &ExtractionContext<'_>,
        from: u32,
        name: &str,
        kind: DependencyKind,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let Some(candidates) = context.by_name.get(name) else {
            return;
        };
        for &candidate in candidates {
            let to = context.node_of[candidate];
            if to != from {
                edges.push(DependencyEdge { from, to, kind });
            }
        }
    }
}

/// Capitalized identifiers inside a type annotation string.
fn capitalized_names(annotation: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    for ch in annotation.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.push(ch);
        } else {
            flush_name(&mut current, &mut names);
        }
    }
    flush_name(&mut current, &mut names);
    names
}

fn flush_name(current: &mut String, names: &mut Vec<String>) {
    if current.chars().next().is_some_and(char::is_uppercase) && !names.contains(current) {
        names.push(current.clone());
    }
    current.clear();
}
