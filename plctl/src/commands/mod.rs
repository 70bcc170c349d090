//! Command implementations for plctl

pub mod eval;
pub mod render;
pub mod template;

use crate::config::PlctlConfig;
use promptloom_adapter_json_file::JsonFileRepository;
use promptloom_core::errors::CoreError;
use promptloom_core::store::TemplateStore;
use promptloom_core::types::ExtractionSchema;
use std::path::Path;
use std::sync::Arc;

/// Open the configured template store
pub async fn open_store(config: &PlctlConfig) -> Result<TemplateStore, CoreError> {
    let repo = Arc::new(JsonFileRepository::new(&config.store_path));
    let store = TemplateStore::load(repo).await?;
    Ok(store)
}

/// Read a UTF-8 text file given on the command line
pub fn read_text_file(path: &Path) -> Result<String, CoreError> {
    std::fs::read_to_string(path)
        .map_err(|e| CoreError::Configuration(format!("Failed to read {}: {}", path.display(), e)))
}

/// Load a schema file (JSON: {"schema": "...", "triplet": [...]})
pub fn load_schema(path: &Path) -> Result<ExtractionSchema, CoreError> {
    let raw = read_text_file(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        CoreError::Configuration(format!("Invalid schema file {}: {}", path.display(), e))
    })
}
