use super::{ModelRequest, VisionModel};
use crate::config::ScannerConfig;
use crate::error::ScanError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;

pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiModel {
    /// Create a new Gemini backend from configuration
    pub fn new(config: &ScannerConfig) -> Self {
        GeminiModel {
            client: Client::new(),
            api_key: config.resolve_api_key(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Joins the text parts of the first candidate, skipping thought summaries.
fn extract_text(response_body: &Value) -> Option<String> {
    let parts = response_body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter(|part| !part["thought"].as_bool().unwrap_or(false))
        .filter_map(|part| part["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl VisionModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<Option<String>, ScanError> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [
                        {
                            "inlineData": {
                                "mimeType": request.mime_type,
                                "data": request.image_base64
                            }
                        },
                        { "text": request.prompt }
                    ]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_tokens,
                    "responseMimeType": "application/json",
                    "responseSchema": request.schema
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScanError::Transport(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let response_body: Value = response.json().await?;
        debug!(
            "Gemini response after {}ms: {:?}",
            start.elapsed().as_millis(),
            response_body
        );

        if let Some(error) = response_body.get("error") {
            let error_code = error["code"].as_i64().unwrap_or(0);
            let error_message = error["message"].as_str().unwrap_or("Unknown error");
            return Err(ScanError::Transport(format!(
                "Gemini API error ({}): {}",
                error_code, error_message
            )));
        }

        Ok(extract_text(&response_body))
    }
}
