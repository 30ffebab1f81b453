//! Analysis engine facade
//!
//! Fans file parsing out over the async parsing port (an I/O-bound task
//! group), records per-file failures instead of aborting, then runs the
//! clone-detection and unused-code engines over the merged result. The
//! report is always produced, possibly empty.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::features::clone_detection::CloneDetector;
use crate::features::data_flow::FlowAnalyzer;
use crate::features::reachability::UnusedCodeDetector;
use crate::shared::models::{AnalysisReport, TokenSequence};
use crate::shared::ports::{ParsedFile, SourceParser};

/// The one-stop entry point over both engines.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    parser: Arc<dyn SourceParser>,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig, parser: Arc<dyn SourceParser>) -> Self {
        Self { config, parser }
    }

    /// Parse every path concurrently and analyze the successful results.
    ///
    /// Per-file parse failures land in the report's `errors` map keyed by
    /// path; they never abort the analysis of other files.
    pub async fn analyze(&self, paths: &[PathBuf]) -> AnalysisReport {
        let files: Arc<DashMap<String, ParsedFile>> = Arc::new(DashMap::new());
        let errors: Arc<DashMap<String, String>> = Arc::new(DashMap::new());

        let mut tasks = JoinSet::new();
        for path in paths {
            let parser = Arc::clone(&self.parser);
            let files = Arc::clone(&files);
            let errors = Arc::clone(&errors);
            let path = path.clone();
            tasks.spawn(async move {
                let key = path.display().to_string();
                match parser.parse(&path).await {
                    Ok(parsed) => {
                        files.insert(key, parsed);
                    }
                    Err(err) => {
                        warn!(path = key.as_str(), error = %err, "file failed to parse");
                        errors.insert(key, err.to_string());
                    }
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "parse task failed to join");
            }
        }

        // Deterministic processing order regardless of completion order.
        let mut parsed: Vec<ParsedFile> = files
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        parsed.sort_by(|a, b| a.file.cmp(&b.file));

        let mut report = self.analyze_parsed(parsed);
        for entry in errors.iter() {
            report
                .errors
                .insert(entry.key().clone(), entry.value().clone());
        }
        report
    }

    /// Synchronous core shared by `analyze` and direct (pre-parsed) use.
    pub fn analyze_parsed(&self, files: Vec<ParsedFile>) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        let sequences: Vec<TokenSequence> = files
            .iter()
            .map(|file| file.tokens.clone())
            .filter(|sequence| !sequence.is_empty())
            .collect();
        let clone_output = CloneDetector::new(self.config.clone_detection.clone()).detect(&sequences);
        report.clone_groups = clone_output.groups;

        let analyzer = FlowAnalyzer::new(self.config.data_flow.clone());
        for file in &files {
            for findings in analyzer.analyze_all(&file.functions) {
                report.dead_stores.extend(findings.dead_stores);
                report.uninitialized_uses.extend(findings.uninitialized_uses);
                report.unused.extend(findings.unused_variables);
            }
        }

        let declarations: Vec<_> = files
            .iter()
            .flat_map(|file| file.declarations.iter().cloned())
            .collect();
        let references: Vec<_> = files
            .iter()
            .flat_map(|file| file.references.iter().cloned())
            .collect();
        let unused_output =
            UnusedCodeDetector::new(self.config.reachability.clone()).detect(&declarations, &references);
        report.unused.extend(unused_output.findings);

        info!(
            files = files.len(),
            clone_groups = report.clone_groups.len(),
            unused = report.unused.len(),
            dead_stores = report.dead_stores.len(),
            "analysis complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{
        CoreError, CoreResult, Location, Token, TokenKind,
    };
    use crate::shared::ports::syntax::{BodyStmt, ExprNode, FunctionBody};
    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use std::path::Path;

    /// Canned parser standing in for the external front-end.
    struct StubParser {
        files: FxHashMap<String, ParsedFile>,
    }

    #[async_trait]
    impl SourceParser for StubParser {
        async fn parse(&self, path: &Path) -> CoreResult<ParsedFile> {
            let key = path.display().to_string();
            self.files
                .get(&key)
                .cloned()
                .ok_or_else(|| CoreError::Parse(format!("no syntax tree for {key}")))
        }
    }

    fn file_with_dead_store(name: &str) -> ParsedFile {
        let mut parsed = ParsedFile::new(name);
        parsed.functions.push(FunctionBody::new(
            "compute",
            Location::new(name, 1, 0),
            vec![
                BodyStmt::Declare {
                    name: "x".to_string(),
                    type_annotation: None,
                    initializer: Some(ExprNode::literal("1")),
                    location: Location::new(name, 2, 4),
                },
                BodyStmt::Expression {
                    expr: ExprNode::assign("x", ExprNode::literal("2")),
                    location: Location::new(name, 3, 4),
                },
                BodyStmt::Return {
                    value: Some(ExprNode::ident("x")),
                    location: Location::new(name, 4, 4),
                },
            ],
        ));
        parsed.tokens.tokens = (0..8)
            .map(|i| Token::new(format!("t{i}"), TokenKind::Identifier, 1, i as u16))
            .collect();
        parsed
    }

    fn engine(files: FxHashMap<String, ParsedFile>) -> AnalysisEngine {
        AnalysisEngine::new(AnalysisConfig::default(), Arc::new(StubParser { files }))
    }

    #[tokio::test]
    async fn test_per_file_errors_do_not_abort() {
        let mut files = FxHashMap::default();
        files.insert("ok.swift".to_string(), file_with_dead_store("ok.swift"));
        let engine = engine(files);

        let report = engine
            .analyze(&[PathBuf::from("ok.swift"), PathBuf::from("missing.swift")])
            .await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors.contains_key("missing.swift"));
        // The parseable file was still analyzed.
        assert_eq!(report.dead_stores.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_report() {
        let engine = engine(FxHashMap::default());
        let report = engine.analyze(&[]).await;
        assert!(report.is_clean());
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_report_is_deterministic_across_runs() {
        let mut files = FxHashMap::default();
        for name in ["b.swift", "a.swift", "c.swift"] {
            files.insert(name.to_string(), file_with_dead_store(name));
        }
        let engine = engine(files);
        let paths: Vec<PathBuf> = ["b.swift", "a.swift", "c.swift"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let first = engine.analyze(&paths).await;
        let second = engine.analyze(&paths).await;
        assert_eq!(first, second);
    }
}
