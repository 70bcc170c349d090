//! OpenAI-compatible connector for the PromptLoom extraction service.
//!
//! Sends the fully rendered instruction string as a single system
//! message to a chat-completions endpoint and parses the returned JSON
//! into an [`ExtractionResult`]. Works against any OpenAI-compatible
//! API, including self-hosted gateways.

use async_trait::async_trait;
use promptloom_core::prelude::*;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

mod config;
mod models;

pub use config::OpenAiConfig;
use models::*;

/// GraphExtractor implementation over an OpenAI-compatible chat API
pub struct OpenAiExtractor {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiExtractor {
    /// Create a new extractor with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Parse and validate the model's response content
    fn parse_extraction_response(&self, content: &str) -> Result<ExtractionResult, ExtractError> {
        // Clean up potential markdown code block fences
        let cleaned_content = content
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        debug!("Parsing extraction response: {}", cleaned_content);

        serde_json::from_str(cleaned_content).map_err(|e| {
            error!("Failed to parse extraction response: {}", e);
            ExtractError::ResponseParse(format!(
                "Failed to parse JSON: {}. Content: '{}'",
                e, cleaned_content
            ))
        })
    }
}

#[async_trait]
impl GraphExtractor for OpenAiExtractor {
    async fn extract(&self, prompt: &str) -> Result<ExtractionResult, ExtractError> {
        debug!("Starting extraction, prompt length {}", prompt.len());
        let start_time = Instant::now();

        // The rendered prompt carries all instructions, so it goes out
        // as the system message
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout
                } else {
                    ExtractError::Network(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExtractError::Api(format!(
                "Extraction API error {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::ResponseParse(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "Token usage: {} prompt, {} completion, {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let content = chat_response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| ExtractError::ResponseParse("No content in response".to_string()))?;

        let result = self.parse_extraction_response(content)?;

        info!(
            "Extraction completed in {}ms: {} nodes, {} relationships",
            start_time.elapsed().as_millis(),
            result.nodes.len(),
            result.relationships.len()
        );

        Ok(result)
    }
}
