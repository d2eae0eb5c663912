//! CLI struct definitions for the canon-validator command-line interface.
//!
//! All clap-derived types live here. Dispatch and rendering live in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "canon-validator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Checks a Java backend against its canonical roadmap: module order, required domain constructs and temporal couplings.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Validate a repository against a roadmap.
    Validate(ValidateCli),
    /// Print what the detectors find in a repository.
    Scan(ScanCli),
    /// Check state assignments against a transition rules file.
    Transitions(TransitionsCli),
    /// Print the version.
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Options shared by every command that reads a repository.
#[derive(clap::Args, Debug)]
pub(crate) struct RepoArgs {
    /// Root of the repository to analyze.
    #[clap(long, default_value = ".")]
    pub repo_path: PathBuf,
    /// Validator configuration (TOML). Defaults to `<repo>/.canon-validator.toml` when present.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Write the report to this file instead of stdout.
    #[clap(long)]
    pub output_file: Option<PathBuf>,
    /// Log run progress to stderr.
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ValidateCli {
    #[clap(flatten)]
    pub repo: RepoArgs,
    /// Roadmap JSON file.
    #[clap(long)]
    pub roadmap: PathBuf,
    /// Treat warnings as failures for the exit code.
    #[clap(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ScanCli {
    #[clap(flatten)]
    pub repo: RepoArgs,
}

#[derive(clap::Args, Debug)]
pub(crate) struct TransitionsCli {
    #[clap(flatten)]
    pub repo: RepoArgs,
    /// State machine rules (TOML).
    #[clap(long)]
    pub rules: PathBuf,
}
