//! Render command implementation

use crate::commands::{load_schema, open_store, read_text_file};
use crate::config::PlctlConfig;
use promptloom_core::errors::CoreError;
use std::path::PathBuf;
use tracing::info;

/// Resolve a template (by id or language default), bind the schema and
/// text, and print the final instruction string.
pub async fn handle_render_command(
    template_id: Option<String>,
    language: Option<String>,
    schema_path: PathBuf,
    text: Option<String>,
    text_file: Option<PathBuf>,
    config: &PlctlConfig,
) -> Result<(), CoreError> {
    let store = open_store(config).await?;
    let schema = load_schema(&schema_path)?;
    let text = resolve_text(text, text_file)?;
    let language = language.unwrap_or_else(|| config.default_language.clone());

    info!(
        "Rendering template ({}) for language '{}'",
        template_id.as_deref().unwrap_or("language default"),
        language
    );

    let rendered = store
        .render_prompt(&language, &text, &schema, template_id.as_deref())
        .await?;
    println!("{}", rendered);
    Ok(())
}

fn resolve_text(text: Option<String>, text_file: Option<PathBuf>) -> Result<String, CoreError> {
    match (text, text_file) {
        (Some(text), None) => Ok(text),
        (None, Some(path)) => read_text_file(&path),
        _ => Err(CoreError::Configuration(
            "Provide input text via --text or --text-file".to_string(),
        )),
    }
}
