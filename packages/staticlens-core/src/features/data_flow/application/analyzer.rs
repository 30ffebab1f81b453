//! Per-function data-flow use case
//!
//! Builds the CFG for each supplied body and runs both analyses. Different
//! functions are independent, so the batch entry point fans out with rayon.

use rayon::prelude::*;

use crate::config::DataFlowConfig;
use crate::features::data_flow::infrastructure::{LiveVariableAnalysis, ReachingDefinitions};
use crate::features::flow_graph::infrastructure::CfgBuilder;
use crate::shared::models::{
    Confidence, DeadStore, Declaration, DeclarationKind, UninitializedUse, UnusedCode, UnusedReason,
};
use crate::shared::ports::syntax::FunctionBody;

/// Findings for one analyzed function body.
#[derive(Debug, Clone, Default)]
pub struct FunctionFlowFindings {
    pub function: String,
    pub dead_stores: Vec<DeadStore>,
    pub uninitialized_uses: Vec<UninitializedUse>,
    pub unused_variables: Vec<UnusedCode>,
}

impl FunctionFlowFindings {
    pub fn is_clean(&self) -> bool {
        self.dead_stores.is_empty()
            && self.uninitialized_uses.is_empty()
            && self.unused_variables.is_empty()
    }
}

/// Data-flow engine over function bodies.
#[derive(Debug, Clone)]
pub struct FlowAnalyzer {
    config: DataFlowConfig,
}

impl FlowAnalyzer {
    pub fn new(config: DataFlowConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DataFlowConfig::default())
    }

    /// Analyze one function body.
    pub fn analyze_function(&self, body: &FunctionBody) -> FunctionFlowFindings {
        let cfg = CfgBuilder::build(body);

        let liveness = LiveVariableAnalysis::new(self.config.clone());
        let live = liveness.analyze(&cfg);
        let dead_stores = liveness.dead_stores(&cfg, &live);

        let reaching = ReachingDefinitions::new(self.config.clone());
        let reach = reaching.analyze(&cfg);
        let uninitialized_uses = reaching.uninitialized_uses(&cfg, &reach);

        let unused_variables = liveness
            .unused_variables(&cfg)
            .into_iter()
            .map(|(name, location)| {
                let suggestion = format!("Remove unused variable '{name}'");
                UnusedCode {
                    declaration: Declaration::new(name, DeclarationKind::Variable, location),
                    reason: UnusedReason::NeverReferenced,
                    confidence: Confidence::High,
                    suggestion,
                }
            })
            .collect();

        FunctionFlowFindings {
            function: body.name.clone(),
            dead_stores,
            uninitialized_uses,
            unused_variables,
        }
    }

    /// Analyze a batch of independent function bodies in parallel.
    pub fn analyze_all(&self, functions: &[FunctionBody]) -> Vec<FunctionFlowFindings> {
        functions
            .par_iter()
            .map(|body| self.analyze_function(body))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Location;
    use crate::shared::ports::syntax::{BodyStmt, ExprNode};

    fn loc(line: u32) -> Location {
        Location::new("test.swift", line, 0)
    }

    fn dead_store_body(name: &str) -> FunctionBody {
        FunctionBody::new(
            name,
            loc(1),
            vec![
                BodyStmt::Declare {
                    name: "x".to_string(),
                    type_annotation: None,
                    initializer: Some(ExprNode::literal("1")),
                    location: loc(1),
                },
                BodyStmt::Expression {
                    expr: ExprNode::assign("x", ExprNode::literal("2")),
                    location: loc(2),
                },
                BodyStmt::Return {
                    value: Some(ExprNode::ident("x")),
                    location: loc(3),
                },
            ],
        )
    }

    #[test]
    fn test_analyze_function_reports_dead_store() {
        let findings = FlowAnalyzer::with_defaults().analyze_function(&dead_store_body("f"));
        assert_eq!(findings.function, "f");
        assert_eq!(findings.dead_stores.len(), 1);
        assert!(findings.uninitialized_uses.is_empty());
    }

    #[test]
    fn test_analyze_all_parallel_matches_serial() {
        let bodies: Vec<FunctionBody> = (0..32)
            .map(|i| dead_store_body(&format!("f{i}")))
            .collect();

        let analyzer = FlowAnalyzer::with_defaults();
        let parallel = analyzer.analyze_all(&bodies);
        assert_eq!(parallel.len(), 32);
        for (body, findings) in bodies.iter().zip(&parallel) {
            let serial = analyzer.analyze_function(body);
            assert_eq!(findings.function, serial.function);
            assert_eq!(findings.dead_stores, serial.dead_stores);
        }
    }

    #[test]
    fn test_unused_variable_becomes_finding() {
        let body = FunctionBody::new(
            "g",
            loc(1),
            vec![BodyStmt::Declare {
                name: "ghost".to_string(),
                type_annotation: None,
                initializer: Some(ExprNode::literal("0")),
                location: loc(2),
            }],
        );

        let findings = FlowAnalyzer::with_defaults().analyze_function(&body);
        assert_eq!(findings.unused_variables.len(), 1);
        let finding = &findings.unused_variables[0];
        assert_eq!(finding.declaration.name, "ghost");
        assert_eq!(finding.reason, UnusedReason::NeverReferenced);
        assert_eq!(finding.confidence, Confidence::High);
    }
}
