use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::Config;

/// Text-completion gateway. The reply is free text with no guaranteed
/// structure; callers own extraction and validation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &Config) -> Result<Self> {
        // One timeout per provider call: generation, retry and the
        // improvement tip each get the same bound.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_secs))
            .build()
            .context("Failed to build provider HTTP client")?;

        Ok(Self {
            client,
            base_url: config.gemini_api_url.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            anyhow::bail!("Gemini API returned status: {}", response.status());
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to read Gemini response body")?;

        extract_candidate_text(&body)
            .ok_or_else(|| anyhow::anyhow!("Gemini response contained no candidate text"))
    }
}

/// Joins `candidates[0].content.parts[*].text`. A reply with no text parts
/// counts as a provider failure, not as an empty completion.
fn extract_candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_multiple_text_parts() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "{\"questions\":" }, { "text": "[]}" }]
                }
            }]
        });
        assert_eq!(
            extract_candidate_text(&body).unwrap(),
            "{\"questions\":[]}"
        );
    }

    #[test]
    fn missing_candidates_yields_none() {
        assert!(extract_candidate_text(&json!({ "promptFeedback": {} })).is_none());
    }

    #[test]
    fn empty_parts_yield_none() {
        let body = json!({
            "candidates": [{ "content": { "parts": [] } }]
        });
        assert!(extract_candidate_text(&body).is_none());
    }
}
