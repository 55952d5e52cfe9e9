use crate::analyzer::ScriptAnalyzer;
use crate::reporter::build_report;
use crate::validator::{KnowledgeGraphValidator, ValidatorSettings};
use graphcheck_core::{GraphCheckError, GraphStore, HallucinationReport, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// End-to-end pipeline over one graph store: parse the script, extract and
/// resolve its calls, validate them against an ingested repository, fold
/// the findings into a report.
pub struct HallucinationDetector {
    store: Arc<dyn GraphStore>,
    settings: ValidatorSettings,
}

impl HallucinationDetector {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_settings(store, ValidatorSettings::default())
    }

    pub fn with_settings(store: Arc<dyn GraphStore>, settings: ValidatorSettings) -> Self {
        Self { store, settings }
    }

    pub async fn analyze(&self, script: &str, repository: &str) -> Result<HallucinationReport> {
        if self.store.namespace_meta(repository).await?.is_none() {
            return Err(GraphCheckError::RepositoryNotFound(repository.to_string()));
        }

        let analysis = ScriptAnalyzer::analyze(script)?;
        debug!(
            "Extracted {} call sites from the script",
            analysis.calls.len()
        );

        let validator =
            KnowledgeGraphValidator::with_settings(self.store.clone(), self.settings.clone());
        let findings = validator
            .validate(repository, &analysis.module, &analysis.calls)
            .await;
        let report = build_report(repository, &analysis.calls, findings);
        info!(
            "Checked {} calls against '{}': {} valid, {} unknown, {} mismatched, {} unverifiable",
            report.total_calls,
            repository,
            report.valid,
            report.unknown_symbol,
            report.signature_mismatch,
            report.unverifiable
        );
        Ok(report)
    }
}
