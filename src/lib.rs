//! canon-validator: canonical-roadmap validation for hexagonal Java backends.
//!
//! A roadmap declares the business modules of a system, the order they must
//! be built in, the domain constructs each one requires, and which modules
//! must freeze together. The validator scans the repository once, infers
//! how far each module has progressed, and reports every place where the
//! code and the roadmap disagree.
//!
//! # Examples
//!
//! ```bash
//! # Validate the current repository
//! canon-validator validate --roadmap roadmap.json
//!
//! # Machine-readable report, warnings fail the build
//! canon-validator validate --roadmap roadmap.json --format json --strict
//!
//! # Inspect what the detectors see
//! canon-validator scan --repo-path ../backend
//!
//! # Check state assignments against declared transitions
//! canon-validator transitions --rules state-machines.toml
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: errors, configuration, logging and output helpers
//! - [`roadmap`]: roadmap model and loading
//! - [`analysis`]: source scanning and fact detectors
//! - [`engine`]: module aggregation, validators and the validation run

pub mod analysis;
mod cli;
pub mod core;
pub mod engine;
pub mod roadmap;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::analysis::AnalysisSnapshot;
use crate::analysis::state_machine::EnumRegistry;
use crate::analysis::transitions::{self, TransitionFinding, TransitionRules};
use crate::cli::{Cli, Command, OutputFormat, RepoArgs, ScanCli, TransitionsCli, ValidateCli};
use crate::core::config::ValidatorConfig;
use crate::core::{logging, output};
use crate::engine::result::ValidationResult;
use crate::engine::{Severity, ValidationEngine, ValidationStatus};
use crate::roadmap::loader::FileRoadmap;

pub use crate::core::error::ValidatorError;

/// Parse arguments, run the command and return the process exit code.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Command::Validate(args) => run_validate(args),
        Command::Scan(args) => run_scan(args),
        Command::Transitions(args) => run_transitions(args),
    }
}

fn emit(repo: &RepoArgs, body: &str) -> anyhow::Result<()> {
    match &repo.output_file {
        Some(path) => fs::write(path, body)
            .with_context(|| format!("writing report to {}", path.display())),
        None => {
            print!("{}", body);
            Ok(())
        }
    }
}

fn prepare(repo: &RepoArgs) {
    logging::init(repo.verbose);
    if repo.output_file.is_some() {
        colored::control::set_override(false);
    }
}

fn run_validate(args: ValidateCli) -> anyhow::Result<i32> {
    prepare(&args.repo);
    let repo_path = args.repo.repo_path.as_path();
    let result = match ValidatorConfig::resolve(args.repo.config.as_deref(), repo_path) {
        Ok(config) => ValidationEngine::new(config).validate(repo_path, &FileRoadmap::new(&args.roadmap)),
        Err(err) => ValidationResult::error(&repo_path.display().to_string(), None, &err.to_string()),
    };

    let body = match args.repo.format {
        OutputFormat::Json => format!("{}\n", result.to_json()?),
        OutputFormat::Text => render_validation(&result),
    };
    emit(&args.repo, &body)?;
    Ok(result.exit_code(args.strict))
}

fn run_scan(args: ScanCli) -> anyhow::Result<i32> {
    prepare(&args.repo);
    let repo_path = args.repo.repo_path.as_path();
    let config = ValidatorConfig::resolve(args.repo.config.as_deref(), repo_path)?;
    let snapshot = AnalysisSnapshot::build(repo_path, &config)?;
    let body = match args.repo.format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => render_scan(&snapshot),
    };
    emit(&args.repo, &body)?;
    Ok(0)
}

fn run_transitions(args: TransitionsCli) -> anyhow::Result<i32> {
    prepare(&args.repo);
    let repo_path = args.repo.repo_path.as_path();
    let config = ValidatorConfig::resolve(args.repo.config.as_deref(), repo_path)?;
    let rules = TransitionRules::from_file(&args.rules)?;
    let snapshot = AnalysisSnapshot::build(repo_path, &config)?;
    let findings = transitions::check_transitions(&snapshot.state_assignments, &rules);

    let body = match args.repo.format {
        OutputFormat::Json => format!(
            "{}\n",
            serde_json::to_string_pretty(&serde_json::json!({
                "repository_path": repo_path.display().to_string(),
                "assignments": snapshot.state_assignments.len(),
                "findings": findings,
            }))?
        ),
        OutputFormat::Text => render_transitions(repo_path, snapshot.state_assignments.len(), &findings),
    };
    emit(&args.repo, &body)?;
    Ok(if transitions::has_critical(&findings) { 1 } else { 0 })
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => "CRITICAL".bright_red().bold().to_string(),
        Severity::Warning => "WARNING".bright_yellow().to_string(),
        Severity::Info => "INFO".bright_cyan().to_string(),
    }
}

fn status_label(status: ValidationStatus) -> String {
    let text = status.to_string();
    match status {
        ValidationStatus::Passed => format!("{} {}", "✓".bright_green(), text.bright_green()),
        ValidationStatus::Warnings => format!("{} {}", "⚠".bright_yellow(), text.bright_yellow()),
        ValidationStatus::CriticalViolations | ValidationStatus::Error => {
            format!("{} {}", "✗".bright_red(), text.bright_red().bold())
        }
    }
}

/// Human-readable validation report.
pub fn render_validation(result: &ValidationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "validate: repository={} roadmap_version={} id={}",
        result.repository_path, result.canonical_version, result.validation_id
    );
    for status in &result.module_statuses {
        let _ = write!(
            out,
            "validate: module {} {} entities={} services={} endpoints={}",
            status.module_id.bold(),
            status.implementation_status,
            status.detected_entities.len(),
            status.detected_services.len(),
            status.detected_endpoints.len()
        );
        if !status.missing_dependencies.is_empty() {
            let _ = write!(
                out,
                " missing_dependencies={}",
                status.missing_dependencies.join(",")
            );
        }
        out.push('\n');
    }
    for v in &result.violations {
        let _ = writeln!(
            out,
            "validate: [{}] {} {}: {}",
            severity_label(v.severity),
            v.module_id,
            v.violation_type,
            v.message
        );
        if !v.suggestion.is_empty() {
            let _ = writeln!(out, "  {} {}", "▸".bright_cyan(), v.suggestion);
        }
    }

    let blocking: Vec<String> = result
        .violations
        .iter()
        .filter(|v| v.blocking)
        .map(|v| format!("{}: {}", v.module_id, v.message))
        .collect();
    let _ = writeln!(
        out,
        "validate: summary critical={} warning={} info={} blocking={}",
        result.count(Severity::Critical),
        result.count(Severity::Warning),
        result.count(Severity::Info),
        blocking.len()
    );
    if !blocking.is_empty() {
        let _ = writeln!(
            out,
            "validate: blocking {}: {}",
            blocking.len(),
            output::preview_messages(&blocking, 2, 110)
        );
    }
    let _ = writeln!(out, "validate: status {}", status_label(result.status()));
    out
}

fn section(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{} ({})", title.bold(), items.len());
    for item in items {
        let _ = writeln!(out, "  {}", item);
    }
}

/// Human-readable detector output.
pub fn render_scan(snapshot: &AnalysisSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "scan: parsed={} skipped={}",
        snapshot.parsed_files,
        snapshot.skipped_files.len()
    );
    let entities: Vec<String> = snapshot
        .entities
        .iter()
        .map(|e| match snapshot.relationships.get(e) {
            Some(related) if !related.is_empty() => format!(
                "{} -> {}",
                e,
                related.iter().cloned().collect::<Vec<_>>().join(", ")
            ),
            _ => e.clone(),
        })
        .collect();
    section(&mut out, "entities", &entities);
    let services: Vec<String> = snapshot
        .services
        .iter()
        .map(|(name, methods)| format!("{} [{}]", name, output::join_or_none(methods)))
        .collect();
    section(&mut out, "services", &services);
    let endpoints: Vec<String> = snapshot
        .endpoints
        .iter()
        .flat_map(|(controller, list)| list.iter().map(move |e| format!("{} {}", controller, e)))
        .collect();
    section(&mut out, "endpoints", &endpoints);
    let registry = |r: &EnumRegistry| -> Vec<String> {
        r.iter()
            .filter(|(key, _)| !key.contains('.'))
            .map(|(key, values)| format!("{} [{}]", key, values.join(", ")))
            .collect()
    };
    section(&mut out, "state machines", &registry(&snapshot.state_machines));
    section(&mut out, "enums", &registry(&snapshot.enums));
    section(&mut out, "ports", &snapshot.ports);
    section(&mut out, "adapters", &snapshot.adapters);
    for skipped in &snapshot.skipped_files {
        let _ = writeln!(out, "{} unparsable: {}", "⚠".bright_yellow(), skipped.display());
    }
    out
}

fn render_transitions(repo_path: &Path, assignments: usize, findings: &[TransitionFinding]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "transitions: repository={} assignments={} findings={}",
        repo_path.display(),
        assignments,
        findings.len()
    );
    for f in findings {
        let _ = writeln!(
            out,
            "transitions: [{}] {}:{} {}.{}: {}",
            severity_label(f.severity),
            f.file.display(),
            f.line,
            f.class_name,
            f.method,
            f.message
        );
    }
    let critical = findings.iter().filter(|f| f.severity == Severity::Critical).count();
    let _ = writeln!(
        out,
        "transitions: summary critical={} warning={}",
        critical,
        findings.len() - critical
    );
    out
}
