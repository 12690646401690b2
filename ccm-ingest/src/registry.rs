//! Creator registry snapshots
//!
//! The registry of known creators is owned by the persistence layer. This
//! crate only reads a snapshot of `{id, name}` pairs at reconciliation time
//! and never writes back.

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A known creator as seen by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Find an entry by id
pub fn find_by_id<'a>(registry: &'a [RegistryEntry], id: &str) -> Option<&'a RegistryEntry> {
    registry.iter().find(|e| e.id == id)
}

/// Source of registry snapshots
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Source identifier for logs (e.g. "json-file", "static")
    fn source_id(&self) -> &'static str;

    /// Fetch the full current list of known creators
    async fn load_snapshot(&self) -> IngestResult<Vec<RegistryEntry>>;
}

/// Registry exported as a JSON array of `{"id": …, "name": …}`
#[derive(Debug, Clone)]
pub struct JsonRegistryFile {
    path: PathBuf,
}

impl JsonRegistryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RegistrySource for JsonRegistryFile {
    fn source_id(&self) -> &'static str {
        "json-file"
    }

    async fn load_snapshot(&self) -> IngestResult<Vec<RegistryEntry>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            IngestError::Registry(format!("Read {} failed: {}", self.path.display(), e))
        })?;

        let entries: Vec<RegistryEntry> = serde_json::from_str(&content).map_err(|e| {
            IngestError::Registry(format!("Parse {} failed: {}", self.path.display(), e))
        })?;

        info!(
            registry = %self.path.display(),
            creators = entries.len(),
            "Registry snapshot loaded"
        );
        Ok(entries)
    }
}

/// In-memory snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: Vec<RegistryEntry>,
}

impl StaticRegistry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl RegistrySource for StaticRegistry {
    fn source_id(&self) -> &'static str {
        "static"
    }

    async fn load_snapshot(&self) -> IngestResult<Vec<RegistryEntry>> {
        Ok(self.entries.clone())
    }
}
