//! JSON-file implementation of TemplateRepository.
//!
//! Persists the whole template collection as one pretty-printed JSON
//! document of the shape `{"templates": {"<id>": { ... }, ...}}`. A
//! missing file loads as an empty collection; every save rewrites the
//! document wholesale.

use async_trait::async_trait;
use promptloom_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// On-disk document layout. Keys are template ids; the BTreeMap keeps
/// file output deterministic.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    templates: BTreeMap<String, Template>,
}

/// Template repository backed by a single JSON file
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TemplateRepository for JsonFileRepository {
    async fn load_all(&self) -> Result<Vec<Template>, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "Template store {} does not exist yet, starting empty",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let document: StoreDocument = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::Corrupt(format!("failed to parse {}: {}", self.path.display(), e))
        })?;
        debug!(
            "Loaded {} templates from {}",
            document.templates.len(),
            self.path.display()
        );
        Ok(document.templates.into_values().collect())
    }

    async fn save_all(&self, templates: &[Template]) -> Result<(), StorageError> {
        let document = StoreDocument {
            templates: templates
                .iter()
                .map(|t| (t.id.clone(), t.clone()))
                .collect(),
        };
        let json = serde_json::to_vec_pretty(&document)
            .map_err(|e| StorageError::Corrupt(format!("failed to serialize templates: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::Io(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        fs::write(&self.path, json).await.map_err(|e| {
            StorageError::Io(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        debug!(
            "Saved {} templates to {}",
            templates.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("templates.json"));
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("templates.json");
        let repo = JsonFileRepository::new(&path);

        let template = Template::new("round trip", "en", "{{ text }}")
            .with_tags(vec!["kg".to_string()])
            .as_default();
        repo.save_all(&[template.clone()]).await.unwrap();
        assert!(path.exists());

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, template.id);
        assert_eq!(loaded[0].name, "round trip");
        assert_eq!(loaded[0].tags, template.tags);
        assert!(loaded[0].is_default());
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/templates.json");
        let repo = JsonFileRepository::new(&path);

        repo.save_all(&[Template::new("nested", "en", "{{ text }}")])
            .await
            .unwrap();
        assert_eq!(repo.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, "not json at all").unwrap();

        let repo = JsonFileRepository::new(&path);
        let err = repo.load_all().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn document_uses_templates_object_keyed_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("templates.json");
        let repo = JsonFileRepository::new(&path);

        let template = Template::new("layout", "en", "{{ text }}");
        repo.save_all(&[template.clone()]).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw["templates"][template.id.as_str()]["name"] == "layout");
    }
}
