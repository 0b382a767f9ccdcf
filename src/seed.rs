//! Persona seed documents and the registry that holds the currently imported ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::persona::Persona;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load JSON: {0}")]
    Parse(String),
}

/// Read a seed document, tolerating a leading BOM.
pub fn load_seed(path: &Path) -> Result<Value, SeedError> {
    if !path.exists() {
        return Err(SeedError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| SeedError::Parse(e.to_string()))?;
    serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| SeedError::Parse(e.to_string()))
}

/// A seed plus where and when it was imported.
#[derive(Debug, Clone, Serialize)]
pub struct ImportedSeed {
    pub seed: Value,
    pub import_path: PathBuf,
    pub imported_at_utc: String,
}

impl ImportedSeed {
    pub fn new(seed: Value, import_path: impl Into<PathBuf>) -> Self {
        Self {
            seed,
            import_path: import_path.into(),
            imported_at_utc: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The fields of a loaded seed worth showing at a glance.
    pub fn summary(&self) -> SeedSummary {
        let field = |key: &str| self.seed.get(key).cloned().unwrap_or(Value::Null);
        let core_concept_count = self
            .seed
            .get("core_concepts")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        SeedSummary {
            status: "loaded",
            import_path: self.import_path.display().to_string(),
            imported_at_utc: self.imported_at_utc.clone(),
            core_concept_count,
            identity: field("identity"),
            user_hint: field("user_hint"),
            role: field("role"),
            created_utc: field("created_utc"),
            version: field("version"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub status: &'static str,
    pub import_path: String,
    pub imported_at_utc: String,
    pub core_concept_count: usize,
    pub identity: Value,
    pub user_hint: Value,
    pub role: Value,
    pub created_utc: Value,
    pub version: Value,
}

/// Currently imported seed per persona. Owned by whoever serves requests.
#[derive(Debug, Default)]
pub struct SeedRegistry {
    seeds: RwLock<HashMap<Persona, ImportedSeed>>,
}

impl SeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, persona: Persona) -> Option<ImportedSeed> {
        self.seeds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&persona)
            .cloned()
    }

    /// Install `seed` for `persona`, returning the one it replaced.
    pub fn replace(&self, persona: Persona, seed: ImportedSeed) -> Option<ImportedSeed> {
        self.seeds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(persona, seed)
    }
}
