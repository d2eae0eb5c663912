//! Validation engine.
//!
//! One run: load the roadmap, scan the repository once, classify facts,
//! aggregate every module, then run the per-module validators in roadmap
//! order and the baseline check. Any failure, panics included, turns the
//! run into an ERROR result; a partially built result is never returned.

pub mod aggregate;
pub mod constraint;
pub mod dependency;
pub mod result;
pub mod rules;
pub mod violation;

use crate::analysis::AnalysisSnapshot;
use crate::core::config::ValidatorConfig;
use crate::core::error::ValidatorError;
use crate::core::logging::TRACE_ENV;
use crate::roadmap::loader::RoadmapProvider;
use aggregate::{aggregate, ClassificationTable, ModuleStatus};
use result::ValidationResult;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use violation::Violation;

pub use aggregate::ImplementationStatus;
pub use result::ValidationStatus;
pub use violation::{Severity, ViolationType};

fn trace_phase(name: &str) {
    if std::env::var(TRACE_ENV).ok().as_deref() == Some("1") {
        eprintln!("validate: phase {}", name);
    }
    tracing::debug!(phase = name, "validate phase");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal panic".to_string()
    }
}

/// Holds only configuration; every call to [`ValidationEngine::validate`] builds fresh state.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidatorConfig,
}

impl ValidationEngine {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, repo_path: &Path, roadmap: &dyn RoadmapProvider) -> ValidationResult {
        let repository = repo_path.display().to_string();
        let mut version: Option<String> = None;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run(repo_path, &repository, roadmap, &mut version)
        }));
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "validation run failed");
                ValidationResult::error(&repository, version.as_deref(), &err.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(error = %message, "validation run panicked");
                ValidationResult::error(&repository, version.as_deref(), &message)
            }
        };
        tracing::info!(
            status = %result.status(),
            violations = result.violations.len(),
            modules = result.module_statuses.len(),
            "validation finished"
        );
        result
    }

    fn run(
        &self,
        repo_path: &Path,
        repository: &str,
        provider: &dyn RoadmapProvider,
        version: &mut Option<String>,
    ) -> Result<ValidationResult, ValidatorError> {
        trace_phase("load_roadmap");
        let roadmap = provider.load()?;
        *version = Some(roadmap.version.clone());

        trace_phase("scan_source");
        let snapshot = AnalysisSnapshot::build(repo_path, &self.config)?;
        if !snapshot.skipped_files.is_empty() {
            tracing::warn!(
                skipped = snapshot.skipped_files.len(),
                "some source files could not be parsed and were ignored"
            );
        }

        trace_phase("classify");
        let table = ClassificationTable::build(&snapshot, &roadmap, &self.config);

        trace_phase("aggregate");
        let statuses: Vec<ModuleStatus> = roadmap
            .modules
            .iter()
            .map(|module| aggregate(module, &table, &snapshot))
            .collect();

        let mut violations: Vec<Violation> = Vec::new();
        for (module, status) in roadmap.modules.iter().zip(&statuses) {
            tracing::debug!(module = %module.id, status = %status.implementation_status, "checking module");
            trace_phase("run_rules");
            violations.extend(rules::execute_rules(module, status, &snapshot));
            trace_phase("run_dependencies");
            violations.extend(dependency::validate_dependencies(module, &statuses, &roadmap));
            trace_phase("run_premature_check");
            violations.extend(dependency::validate_premature(module, status, &statuses));
            trace_phase("run_constraints");
            violations.extend(constraint::validate_constraints(
                module,
                status,
                &statuses,
                &roadmap,
                &self.config,
            ));
        }

        trace_phase("run_baseline_check");
        violations.extend(constraint::check_baseline(&roadmap, &statuses, &self.config));

        trace_phase("derive_status");
        Ok(ValidationResult::new(repository, &roadmap.version, statuses, violations))
    }
}
