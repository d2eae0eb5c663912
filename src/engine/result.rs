//! Outcome of one validation run.

use crate::core::time;
use crate::engine::aggregate::ModuleStatus;
use crate::engine::violation::{Severity, Violation, ViolationType};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Passed,
    Warnings,
    CriticalViolations,
    Error,
}

impl ValidationStatus {
    /// 0 passed, 1 critical, 2 warnings, 3 error. `strict` makes warnings fail like criticals.
    pub fn exit_code(self, strict: bool) -> i32 {
        match self {
            Self::Passed => 0,
            Self::CriticalViolations => 1,
            Self::Warnings if strict => 1,
            Self::Warnings => 2,
            Self::Error => 3,
        }
    }

    pub fn derive(violations: &[Violation]) -> Self {
        if violations.iter().any(|v| v.blocking) {
            Self::CriticalViolations
        } else if !violations.is_empty() {
            Self::Warnings
        } else {
            Self::Passed
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASSED",
            Self::Warnings => "WARNINGS",
            Self::CriticalViolations => "CRITICAL_VIOLATIONS",
            Self::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub validation_id: String,
    pub timestamp: String,
    pub repository_path: String,
    pub canonical_version: String,
    status: ValidationStatus,
    pub violations: Vec<Violation>,
    pub module_statuses: Vec<ModuleStatus>,
}

impl ValidationResult {
    /// Status is derived from the violations' blocking flags.
    pub fn new(
        repository_path: &str,
        canonical_version: &str,
        module_statuses: Vec<ModuleStatus>,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            validation_id: time::new_validation_id(),
            timestamp: time::now_iso8601(),
            repository_path: repository_path.to_string(),
            canonical_version: canonical_version.to_string(),
            status: ValidationStatus::derive(&violations),
            violations,
            module_statuses,
        }
    }

    /// A run that failed before producing a verdict: one synthetic violation, no statuses.
    pub fn error(repository_path: &str, canonical_version: Option<&str>, message: &str) -> Self {
        let violation = Violation::builder("system")
            .severity(Severity::Critical)
            .kind(ViolationType::BusinessLogic)
            .message(format!("Validation failed: {}", message))
            .suggestion("Check the roadmap file, the configuration and the repository path, then run again")
            .build();
        Self {
            validation_id: time::new_validation_id(),
            timestamp: time::now_iso8601(),
            repository_path: repository_path.to_string(),
            canonical_version: canonical_version.unwrap_or("unknown").to_string(),
            status: ValidationStatus::Error,
            violations: vec![violation],
            module_statuses: Vec::new(),
        }
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn exit_code(&self, strict: bool) -> i32 {
        self.status.exit_code(strict)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.violations.iter().filter(|v| v.severity == severity).count()
    }

    pub fn module_status(&self, module_id: &str) -> Option<&ModuleStatus> {
        self.module_statuses.iter().find(|s| s.module_id == module_id)
    }

    pub fn violations_for<'a>(&'a self, module_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.module_id == module_id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
