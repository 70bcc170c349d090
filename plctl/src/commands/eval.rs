//! Evaluation command implementation

use crate::commands::{load_schema, open_store, read_text_file};
use crate::config::PlctlConfig;
use crate::output;
use promptloom_connector_openai::OpenAiExtractor;
use promptloom_core::errors::CoreError;
use promptloom_core::eval::{EvaluationEngine, MetricKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Run the evaluation engine over a template and a set of test texts
pub async fn handle_eval_command(
    template_id: Option<String>,
    content_file: Option<PathBuf>,
    name: Option<String>,
    schema_path: PathBuf,
    texts_path: PathBuf,
    metric_names: Vec<String>,
    config: &PlctlConfig,
) -> Result<(), CoreError> {
    let schema = load_schema(&schema_path)?;
    let test_texts = load_test_texts(&texts_path)?;
    let metrics = resolve_metrics(&metric_names);

    let (template_name, template_content) = match (template_id, content_file) {
        (Some(id), None) => {
            let store = open_store(config).await?;
            let template = store.get(&id).await?;
            (template.name, template.content)
        }
        (None, Some(path)) => {
            let label = name.unwrap_or_else(|| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "ad-hoc template".to_string())
            });
            (label, read_text_file(&path)?)
        }
        _ => {
            return Err(CoreError::Configuration(
                "Provide the template via --template-id or --content-file".to_string(),
            ))
        }
    };

    info!(
        "Evaluating '{}' over {} test text(s) with {} metric(s)",
        template_name,
        test_texts.len(),
        metrics.len()
    );

    let extractor = Arc::new(OpenAiExtractor::new(config.extractor_config())?);
    let engine = EvaluationEngine::new(extractor);
    let report = engine
        .evaluate(
            &template_name,
            &template_content,
            &test_texts,
            &schema,
            &metrics,
        )
        .await;

    output::display_report(&report, &config.default_format)
}

/// Requested metrics; all four when none are named. Unknown names are
/// ignored.
fn resolve_metrics(names: &[String]) -> Vec<MetricKind> {
    if names.is_empty() {
        return MetricKind::ALL.to_vec();
    }
    let metrics = MetricKind::parse_many(names);
    if metrics.is_empty() {
        warn!("None of the requested metrics are recognized: {:?}", names);
    }
    metrics
}

/// Load test texts: a `.json` file holds a JSON array of strings, any
/// other file holds one test text per non-empty line.
fn load_test_texts(path: &Path) -> Result<Vec<String>, CoreError> {
    let raw = read_text_file(path)?;
    if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_str(&raw).map_err(|e| {
            CoreError::Configuration(format!(
                "Invalid test text file {}: expected a JSON array of strings: {}",
                path.display(),
                e
            ))
        })
    } else {
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolve_metrics_defaults_to_all() {
        assert_eq!(resolve_metrics(&[]), MetricKind::ALL.to_vec());
        assert_eq!(
            resolve_metrics(&["relevance".to_string(), "bogus".to_string()]),
            vec![MetricKind::Relevance]
        );
    }

    #[test]
    fn loads_line_separated_test_texts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("texts.txt");
        std::fs::write(&path, "first case\n\n  second case  \n").unwrap();

        let texts = load_test_texts(&path).unwrap();
        assert_eq!(texts, vec!["first case", "second case"]);
    }

    #[test]
    fn loads_json_array_test_texts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("texts.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"["multi\nline case", "plain case"]"#).unwrap();

        let texts = load_test_texts(&path).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains('\n'));
    }
}
