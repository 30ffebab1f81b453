//! Unused-code use case
//!
//! Extracts the dependency graph, runs the direction-optimizing BFS from
//! the entry roots, and classifies every unreached declaration as unused.
//! Confidence follows visibility: private declarations that nothing
//! references are high confidence, public API is low (the caller may be
//! outside the analyzed set).

use rustc_hash::FxHashSet;
use tracing::info;

use crate::config::ReachabilityConfig;
use crate::features::reachability::infrastructure::{
    DependencyExtractor, DirectionOptimizingBfs, TraversalStats,
};
use crate::shared::models::{
    AccessLevel, Confidence, Declaration, DeclarationKind, Reference, UnusedCode, UnusedReason,
};

/// Output of one unused-code run.
#[derive(Debug, Clone, Default)]
pub struct UnusedCodeOutput {
    pub findings: Vec<UnusedCode>,
    pub stats: TraversalStats,
    pub total_declarations: usize,
    pub reachable_declarations: usize,
}

/// The unused-code reachability engine.
#[derive(Debug, Clone)]
pub struct UnusedCodeDetector {
    config: ReachabilityConfig,
}

impl UnusedCodeDetector {
    pub fn new(config: ReachabilityConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ReachabilityConfig::default())
    }

    /// Detect declarations unreachable from the entry roots.
    pub fn detect(
        &self,
        declarations: &[Declaration],
        references: &[Reference],
    ) -> UnusedCodeOutput {
        let extractor = DependencyExtractor::new(self.config.clone());
        let extracted = extractor.extract(declarations, references);

        let bfs = DirectionOptimizingBfs::new(&self.config);
        let (visited, stats) = bfs.compute_reachable(&extracted.graph);
        let reachable_declarations = visited.pop_count();

        let referenced_names: FxHashSet<&str> = references
            .iter()
            .map(|reference| reference.identifier.as_str())
            .collect();

        let mut findings = Vec::new();
        for (node, &declaration_index) in extracted.node_to_declaration.iter().enumerate() {
            if visited.test(node) {
                continue;
            }
            let declaration = &declarations[declaration_index];
            if !Self::is_reportable(declaration.kind) {
                continue;
            }

            let reason = if referenced_names.contains(declaration.name.as_str()) {
                UnusedReason::Unreachable
            } else {
                UnusedReason::NeverReferenced
            };
            findings.push(UnusedCode {
                confidence: Self::confidence_for(declaration, reason),
                suggestion: format!(
                    "Remove unused {} '{}'",
                    declaration.kind.as_str(),
                    declaration.name
                ),
                declaration: declaration.clone(),
                reason,
            });
        }

        findings.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.declaration.location.cmp(&b.declaration.location))
        });

        info!(
            total = declarations.len(),
            reachable = reachable_declarations,
            unused = findings.len(),
            "unused-code analysis finished"
        );

        UnusedCodeOutput {
            findings,
            stats,
            total_declarations: declarations.len(),
            reachable_declarations,
        }
    }

    /// Parameters and imports are handled by other diagnostics.
    fn is_reportable(kind: DeclarationKind) -> bool {
        !matches!(kind, DeclarationKind::Parameter | DeclarationKind::Import)
    }

    fn confidence_for(declaration: &Declaration, reason: UnusedReason) -> Confidence {
        if declaration.access_level.is_externally_visible() {
            return Confidence::Low;
        }
        match (declaration.access_level, reason) {
            (AccessLevel::Private | AccessLevel::FilePrivate, UnusedReason::NeverReferenced) => {
                Confidence::High
            }
            (_, UnusedReason::NeverReferenced) => Confidence::Medium,
            _ => Confidence::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Location, ReferenceContext, SourceRange};

    fn decl(name: &str, file: &str, start_line: u32, end_line: u32) -> Declaration {
        Declaration::new(
            name,
            DeclarationKind::Function,
            Location::new(file, start_line, 0),
        )
        .with_range(SourceRange::lines(file, start_line, end_line))
    }

    fn config() -> ReachabilityConfig {
        let mut config = ReachabilityConfig::default();
        config.roots.treat_public_as_root = false;
        config
    }

    #[test]
    fn test_two_component_reachability() {
        // A(root) -> B, C -> D: BFS reaches {A, B}; unused = {C, D}.
        let declarations = vec![
            decl("main", "app.swift", 1, 10),
            decl("launch", "app.swift", 20, 30),
            decl("orphanCaller", "dead.swift", 1, 10),
            decl("orphanHelper", "dead.swift", 20, 30),
        ];
        let references = vec![
            Reference::new(
                "launch",
                Location::new("app.swift", 5, 4),
                ReferenceContext::Call,
            ),
            Reference::new(
                "orphanHelper",
                Location::new("dead.swift", 5, 4),
                ReferenceContext::Call,
            ),
        ];

        let output = UnusedCodeDetector::new(config()).detect(&declarations, &references);

        assert_eq!(output.total_declarations, 4);
        assert_eq!(output.reachable_declarations, 2);

        let unused_names: Vec<&str> = output
            .findings
            .iter()
            .map(|f| f.declaration.name.as_str())
            .collect();
        assert_eq!(unused_names.len(), 2);
        assert!(unused_names.contains(&"orphanCaller"));
        assert!(unused_names.contains(&"orphanHelper"));
    }

    #[test]
    fn test_reason_classification() {
        let declarations = vec![
            decl("main", "app.swift", 1, 10),
            // Referenced somewhere but unreachable from roots.
            decl("referencedButDead", "dead.swift", 1, 10),
            decl("deadCaller", "dead.swift", 20, 30),
            // Never referenced at all.
            decl("ghost", "dead.swift", 40, 50),
        ];
        let references = vec![Reference::new(
            "referencedButDead",
            Location::new("dead.swift", 25, 4),
            ReferenceContext::Call,
        )];

        let output = UnusedCodeDetector::new(config()).detect(&declarations, &references);

        let by_name = |name: &str| {
            output
                .findings
                .iter()
                .find(|f| f.declaration.name == name)
                .map(|f| f.reason)
        };
        assert_eq!(by_name("referencedButDead"), Some(UnusedReason::Unreachable));
        assert_eq!(by_name("ghost"), Some(UnusedReason::NeverReferenced));
    }

    #[test]
    fn test_confidence_follows_visibility() {
        let declarations = vec![
            decl("main", "app.swift", 1, 10),
            decl("privateGhost", "a.swift", 1, 5).with_access(AccessLevel::Private),
            decl("internalGhost", "a.swift", 10, 15),
            decl("publicGhost", "a.swift", 20, 25).with_access(AccessLevel::Public),
        ];

        let output = UnusedCodeDetector::new(config()).detect(&declarations, &[]);

        let confidence = |name: &str| {
            output
                .findings
                .iter()
                .find(|f| f.declaration.name == name)
                .map(|f| f.confidence)
        };
        assert_eq!(confidence("privateGhost"), Some(Confidence::High));
        assert_eq!(confidence("internalGhost"), Some(Confidence::Medium));
        assert_eq!(confidence("publicGhost"), Some(Confidence::Low));
    }

    #[test]
    fn test_idempotent() {
        let declarations = vec![
            decl("main", "app.swift", 1, 10),
            decl("ghost", "dead.swift", 1, 10),
        ];
        let detector = UnusedCodeDetector::new(config());
        let first = detector.detect(&declarations, &[]);
        let second = detector.detect(&declarations, &[]);
        assert_eq!(first.findings, second.findings);
    }

    #[test]
    fn test_empty_input() {
        let output = UnusedCodeDetector::with_defaults().detect(&[], &[]);
        assert!(output.findings.is_empty());
        assert_eq!(output.total_declarations, 0);
    }
}
