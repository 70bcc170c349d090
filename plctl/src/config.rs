//! Configuration management for plctl

use crate::cli::{Cli, OutputFormat};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use promptloom_connector_openai::OpenAiConfig;
use promptloom_core::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the plctl CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlctlConfig {
    /// Path of the JSON template store
    pub store_path: PathBuf,
    /// Language used when a command does not specify one
    pub default_language: String,
    /// Default output format
    pub default_format: OutputFormat,
    /// Base URL of the OpenAI-compatible extraction endpoint
    pub llm_api_base: String,
    /// API key for the extraction endpoint (falls back to LLM_API_KEY)
    pub llm_api_key: Option<String>,
    /// Model name for extraction calls
    pub llm_model: String,
    /// Extraction request timeout in milliseconds
    pub llm_timeout_ms: u64,
}

impl Default for PlctlConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("prompt_templates.json"),
            default_language: "en".to_string(),
            default_format: OutputFormat::Table,
            llm_api_base: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o".to_string(),
            llm_timeout_ms: 30_000,
        }
    }
}

impl PlctlConfig {
    /// Load configuration from file and environment
    pub async fn load(config_path: &Option<PathBuf>) -> Result<Self, CoreError> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(
            PlctlConfig::default(),
        ));

        // Load from default config file if it exists
        let default_config_paths = ["plctl.yaml", "plctl.yml", ".plctl.yaml", ".plctl.yml"];

        for path in &default_config_paths {
            if Path::new(path).exists() {
                figment = figment.merge(Yaml::file(path));
                break;
            }
        }

        // Load from specified config file
        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Yaml::file(path));
            } else {
                return Err(CoreError::Configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }

        // Load from environment variables (prefixed with PLCTL_)
        figment = figment.merge(Env::prefixed("PLCTL_"));

        figment
            .extract()
            .map_err(|e| CoreError::Configuration(format!("Failed to parse configuration: {}", e)))
    }

    /// Apply CLI argument overrides to the configuration
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(ref store) = args.store {
            self.store_path = store.clone();
        }

        if let Some(ref format) = args.format {
            self.default_format = format.clone();
        }

        self
    }

    /// Build the extraction connector configuration.
    ///
    /// The API key comes from the config file when set, otherwise from
    /// the LLM_API_KEY environment variable.
    pub fn extractor_config(&self) -> OpenAiConfig {
        let api_key = self
            .llm_api_key
            .clone()
            .or_else(|| std::env::var("LLM_API_KEY").ok())
            .unwrap_or_default();

        OpenAiConfig::new(api_key)
            .with_api_base(self.llm_api_base.clone())
            .with_model(self.llm_model.clone())
            .with_timeout(self.llm_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn default_config() {
        let config = PlctlConfig::default();
        assert_eq!(config.store_path, PathBuf::from("prompt_templates.json"));
        assert_eq!(config.default_language, "en");
        assert_eq!(config.llm_timeout_ms, 30_000);
    }

    #[tokio::test]
    async fn config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "store_path: /tmp/other_store.json").unwrap();
        writeln!(temp_file, "default_language: zh").unwrap();
        writeln!(temp_file, "llm_model: glm-4").unwrap();

        let config = PlctlConfig::load(&Some(temp_file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/other_store.json"));
        assert_eq!(config.default_language, "zh");
        assert_eq!(config.llm_model, "glm-4");
        // untouched fields keep defaults
        assert_eq!(config.llm_api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn extractor_config_uses_configured_values() {
        let config = PlctlConfig {
            llm_api_key: Some("key-from-config".to_string()),
            llm_model: "my-model".to_string(),
            llm_timeout_ms: 5_000,
            ..Default::default()
        };
        let extractor = config.extractor_config();
        assert_eq!(extractor.api_key, "key-from-config");
        assert_eq!(extractor.model, "my-model");
        assert_eq!(extractor.timeout_ms, 5_000);
    }
}
