//! Roadmap loading.
//!
//! The roadmap document is JSON, either bare or wrapped as `{"roadmap": {...}}`.

use crate::core::error::ValidatorError;
use crate::roadmap::Roadmap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of the canonical roadmap for one validation run.
pub trait RoadmapProvider {
    fn load(&self) -> Result<Roadmap, ValidatorError>;
}

/// Reads a roadmap JSON file on every `load` call.
#[derive(Debug, Clone)]
pub struct FileRoadmap {
    path: PathBuf,
}

impl FileRoadmap {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoadmapProvider for FileRoadmap {
    fn load(&self) -> Result<Roadmap, ValidatorError> {
        load_roadmap_file(&self.path)
    }
}

/// An in-memory roadmap is its own provider.
impl RoadmapProvider for Roadmap {
    fn load(&self) -> Result<Roadmap, ValidatorError> {
        check(self.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoadmapDocument {
    Wrapped { roadmap: Roadmap },
    Bare(Roadmap),
}

pub fn load_roadmap_file(path: &Path) -> Result<Roadmap, ValidatorError> {
    if !path.is_file() {
        return Err(ValidatorError::RoadmapLoadError(format!(
            "roadmap file not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    parse_roadmap(&content)
}

pub fn parse_roadmap(content: &str) -> Result<Roadmap, ValidatorError> {
    let doc: RoadmapDocument = serde_json::from_str(content)
        .map_err(|e| ValidatorError::RoadmapLoadError(format!("invalid roadmap JSON: {}", e)))?;
    let roadmap = match doc {
        RoadmapDocument::Wrapped { roadmap } => roadmap,
        RoadmapDocument::Bare(roadmap) => roadmap,
    };
    check(roadmap)
}

fn check(roadmap: Roadmap) -> Result<Roadmap, ValidatorError> {
    let errors = roadmap.structural_errors();
    if errors.is_empty() {
        tracing::debug!(
            version = %roadmap.version,
            modules = roadmap.modules.len(),
            "roadmap loaded"
        );
        Ok(roadmap)
    } else {
        Err(ValidatorError::RoadmapLoadError(errors.join("; ")))
    }
}
