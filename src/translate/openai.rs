use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, SubtitlerError};
use super::Translator;
use super::common::{ChatMessage, ChatRequest, ChatResponse, build_batch_prompt, parse_numbered_response};

/// Fallback variable checked when the configured one is unset
pub const FALLBACK_API_KEY_ENV: &str = "OPENAI_API_KEY";

const SYSTEM_PROMPT: &str = "You are a professional subtitle translator. \
    Keep the meaning, tone and speaker names of every line.";

/// Translator backed by an OpenAI-compatible chat-completion endpoint
pub struct OpenAiTranslator {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl OpenAiTranslator {
    /// Create a translator reading the credential from the environment
    pub fn from_env(config: TranslateConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key_env, |name| std::env::var(name).ok())?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key<S: Into<String>>(config: TranslateConfig, api_key: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SubtitlerError::Translation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_batch_prompt(texts, source_language, target_language),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = self.url();
        debug!("Sending {} lines to {} ({})", texts.len(), url, self.config.model);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubtitlerError::Translation(format!("Translation request timed out: {}", e))
                } else {
                    SubtitlerError::Translation(format!("HTTP request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtitlerError::Translation(format!(
                "Translation API error {}: {}", status, error_text
            )));
        }

        let chat: ChatResponse = response.json().await
            .map_err(|e| SubtitlerError::Translation(format!("Failed to parse response: {}", e)))?;

        let content = chat.choices
            .first()
            .map(|choice| choice.message.content.trim())
            .unwrap_or_default();

        debug!("Raw translation response: {}", content);

        if content.is_empty() {
            return Err(SubtitlerError::Translation("Empty translation received".to_string()));
        }

        let translations = parse_numbered_response(content, texts.len())?;
        info!("Translated batch of {} lines", translations.len());
        Ok(translations)
    }
}

/// Look up the API credential in `name`, then in `OPENAI_API_KEY`
pub fn resolve_api_key<F>(name: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    [name, FALLBACK_API_KEY_ENV]
        .into_iter()
        .filter_map(|var| lookup(var))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            SubtitlerError::Translation(format!(
                "API key not found. Set {} (or {}) in the environment or a .env file",
                name, FALLBACK_API_KEY_ENV
            ))
        })
}
