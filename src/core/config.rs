//! Validator configuration.
//!
//! Loaded from TOML (`--config <file>` or `<repo>/.canon-validator.toml`).
//! Every section is optional; omitted keys fall back to the defaults below,
//! which describe the conventional hexagonal layout of the analyzed backend.

use crate::core::error::ValidatorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPO_CONFIG_FILE: &str = ".canon-validator.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub layout: LayoutConfig,
    pub scoping: ScopingConfig,
    pub coupling: CouplingConfig,
    pub baseline: BaselineConfig,
}

/// Source roots, relative to the analyzed repository.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub domain_root: PathBuf,
    pub infrastructure_root: PathBuf,
    pub api_root: PathBuf,
    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            domain_root: PathBuf::from("src/main/java/com/budgetpro/domain"),
            infrastructure_root: PathBuf::from("src/main/java/com/budgetpro/infrastructure"),
            api_root: PathBuf::from("src/main/java/com/budgetpro/infrastructure/rest"),
            skip_dirs: vec![
                ".git".to_string(),
                "target".to_string(),
                "build".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

/// Module id -> keyword stems used to scope global facts to a module.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopingConfig {
    pub entity_keywords: BTreeMap<String, Vec<String>>,
    pub service_keywords: BTreeMap<String, Vec<String>>,
}

fn stems(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(module, words)| {
            (
                module.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for ScopingConfig {
    fn default() -> Self {
        Self {
            entity_keywords: stems(&[
                (
                    "tiempo",
                    &[
                        "tiempo",
                        "cronograma",
                        "programaobra",
                        "actividadprogramada",
                        "cronogramasnapshot",
                    ],
                ),
                ("presupuesto", &["presupuesto", "partida"]),
                ("compras", &["compra"]),
                ("inventarios", &["inventario"]),
                ("rrhh", &["rrhh", "personal", "tareo"]),
                ("estimacion", &["estimacion"]),
                ("evm", &["evm", "control", "earned"]),
                ("cambios", &["cambio", "reajuste"]),
                ("alertas", &["alerta", "analisis"]),
                ("billetera", &["billetera", "movimientocaja"]),
                ("catalogo", &["catalogo", "apu", "recurso"]),
                ("proyecto", &["proyecto", "billetera"]),
            ]),
            service_keywords: stems(&[
                (
                    "tiempo",
                    &[
                        "tiempo",
                        "cronograma",
                        "programaobra",
                        "actividadprogramada",
                        "snapshotgenerator",
                        "calculocronograma",
                    ],
                ),
                (
                    "presupuesto",
                    &["presupuesto", "partida", "integrityhash", "calculopresupuesto"],
                ),
                ("compras", &["compra", "procesarcompra"]),
                ("inventarios", &["inventario", "gestioninventario"]),
                ("rrhh", &["rrhh", "personal", "tareo"]),
                ("estimacion", &["estimacion", "generadorestimacion"]),
                ("evm", &["evm", "control", "earned"]),
                ("cambios", &["cambio", "reajuste"]),
                ("alertas", &["alerta", "analisis", "analizador"]),
                ("billetera", &["billetera", "movimientocaja"]),
                (
                    "catalogo",
                    &["catalogo", "apu", "recurso", "snapshot", "calculoaupdinamico"],
                ),
                ("proyecto", &["proyecto"]),
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CouplingConfig {
    /// Lower-case fragments that mark a service as implementing a freeze.
    pub freeze_keywords: Vec<String>,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            freeze_keywords: vec!["freeze".to_string(), "congelar".to_string()],
        }
    }
}

/// The two foundational modules that must be declared as freezing together.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub enabled: bool,
    pub primary: String,
    pub coupled: String,
    pub rule: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            primary: "presupuesto".to_string(),
            coupled: "tiempo".to_string(),
            rule: "Baseline principle: Budget + Schedule must freeze together".to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ValidatorError> {
        let config: ValidatorConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ValidatorError> {
        if !path.exists() {
            return Err(ValidatorError::ConfigError(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Explicit file wins; otherwise the repository-local file; otherwise defaults.
    pub fn resolve(explicit: Option<&Path>, repo_root: &Path) -> Result<Self, ValidatorError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = repo_root.join(REPO_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }
        Ok(Self::default())
    }

    fn check(&self) -> Result<(), ValidatorError> {
        if self.baseline.enabled
            && (self.baseline.primary.trim().is_empty() || self.baseline.coupled.trim().is_empty())
        {
            return Err(ValidatorError::ConfigError(
                "baseline.primary and baseline.coupled must be set when the baseline check is enabled"
                    .to_string(),
            ));
        }
        if self.coupling.freeze_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ValidatorError::ConfigError(
                "coupling.freeze_keywords must contain at least one keyword".to_string(),
            ));
        }
        Ok(())
    }

    /// Keyword stems for a module's entities; unlisted modules match on their own id.
    pub fn entity_stems(&self, module_id: &str) -> Vec<String> {
        lookup_stems(&self.scoping.entity_keywords, module_id)
    }

    pub fn service_stems(&self, module_id: &str) -> Vec<String> {
        lookup_stems(&self.scoping.service_keywords, module_id)
    }
}

fn lookup_stems(table: &BTreeMap<String, Vec<String>>, module_id: &str) -> Vec<String> {
    let key = module_id.to_lowercase();
    match table.get(&key) {
        Some(words) if !words.is_empty() => words.iter().map(|w| w.to_lowercase()).collect(),
        _ => vec![key],
    }
}
