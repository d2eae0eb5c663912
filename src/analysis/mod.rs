//! Static analysis of the target repository.
//!
//! [`source`] walks the configured roots once and parses every Java file.
//! The detectors turn parsed units into facts, and [`snapshot`] freezes all
//! facts for one validation run.

pub mod api;
pub mod entity;
pub mod integration;
pub mod service;
pub mod snapshot;
pub mod source;
pub mod state_assignment;
pub mod state_machine;
pub mod transitions;

pub use snapshot::AnalysisSnapshot;
pub use source::{SourceRoot, SourceTree, SourceUnit};
