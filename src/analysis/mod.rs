//! Analysis client: one multimodal request per captured image.

mod gemini;
mod prompt;

pub use gemini::GeminiModel;
pub use prompt::{inject_language, response_schema, PRODUCE_ANALYSIS_PROMPT, RECIPE_COUNT};

use async_trait::async_trait;
use log::{debug, error, info};
use serde_json::Value;
use std::time::Duration;

use crate::capture::{CapturedImage, JPEG_MIME};
use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::model::{Language, ScanResult};

/// Everything the model receives for a single analysis
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub mime_type: String,
    pub image_base64: String,
    pub prompt: String,
    pub schema: Value,
}

/// A multimodal model backend
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &str;

    /// Sends the request and returns the text payload, if any
    async fn generate(&self, request: &ModelRequest) -> Result<Option<String>, ScanError>;
}

pub struct AnalysisClient {
    model: Box<dyn VisionModel>,
    timeout: Option<Duration>,
    strict_validation: bool,
}

impl AnalysisClient {
    pub fn new(model: Box<dyn VisionModel>) -> Self {
        AnalysisClient {
            model,
            timeout: None,
            strict_validation: true,
        }
    }

    /// Gemini-backed client configured from `ScannerConfig`
    pub fn from_config(config: &ScannerConfig) -> Self {
        AnalysisClient {
            model: Box::new(GeminiModel::new(config)),
            timeout: config.timeout(),
            strict_validation: config.strict_validation,
        }
    }

    /// Bound the model round trip; without it the call waits indefinitely
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Builds the request for a base64 payload of the given MIME type.
    pub fn build_request(image_base64: &str, mime_type: &str, language: Language) -> ModelRequest {
        ModelRequest {
            mime_type: mime_type.to_string(),
            image_base64: image_base64.to_string(),
            prompt: inject_language(language),
            schema: response_schema(),
        }
    }

    /// Analyze a base64-encoded JPEG (no data URI header).
    pub async fn analyze(
        &self,
        image_base64: &str,
        language: Language,
    ) -> Result<ScanResult, ScanError> {
        self.run(Self::build_request(image_base64, JPEG_MIME, language))
            .await
    }

    /// Analyze a captured or uploaded image, keeping its own MIME type.
    pub async fn analyze_image(
        &self,
        image: &CapturedImage,
        language: Language,
    ) -> Result<ScanResult, ScanError> {
        self.run(Self::build_request(&image.base64, &image.mime_type, language))
            .await
    }

    async fn run(&self, request: ModelRequest) -> Result<ScanResult, ScanError> {
        info!(
            "Analyzing {} image ({} base64 chars) with {}",
            request.mime_type,
            request.image_base64.len(),
            self.model.name()
        );

        let call = self.model.generate(&request);
        let text = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ScanError::Transport(format!("model did not respond within {:?}", limit))
            })??,
            None => call.await?,
        };

        parse_response(text.as_deref(), self.strict_validation)
    }
}

/// Maps the model's text payload into a `ScanResult`.
pub fn parse_response(text: Option<&str>, strict: bool) -> Result<ScanResult, ScanError> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ScanError::EmptyResponse),
    };

    let result: ScanResult = serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse Gemini response: {}", text);
        ScanError::Format(e.to_string())
    })?;

    if strict {
        validate(&result).map_err(|reason| {
            error!("Gemini response failed validation ({}): {}", reason, text);
            ScanError::Format(reason)
        })?;
    }

    debug!(
        "Parsed scan result for '{}' with {} recipes",
        result.food_name,
        result.recipes.len()
    );
    Ok(result)
}

/// Checks what the schema cannot express: exact recipe count and non-empty names.
pub fn validate(result: &ScanResult) -> Result<(), String> {
    if result.food_name.trim().is_empty() {
        return Err("foodName is empty".to_string());
    }
    if result.recipes.len() != RECIPE_COUNT {
        return Err(format!(
            "expected {} recipes, got {}",
            RECIPE_COUNT,
            result.recipes.len()
        ));
    }
    if let Some(position) = result.recipes.iter().position(|r| r.name.trim().is_empty()) {
        return Err(format!("recipe {} has no name", position + 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn sample_json(recipes: usize) -> String {
        let recipe = json!({
            "name": "Tomato and covo relish",
            "ingredients": ["2 tomatoes", "1 bunch covo"],
            "steps": ["Fry onions", "Add tomatoes"],
            "culturalNote": "Everyday relish served with sadza",
            "healthyPairings": ["Zviyo sadza", "Nyemba"],
            "mealBalanceReason": "Grain plus legume gives complete protein"
        });
        json!({
            "foodName": "Tomato",
            "description": "A red fruit used as a vegetable",
            "nutrients": {
                "calories": "18 kcal",
                "protein": "0.9 g",
                "carbs": "3.9 g",
                "fiber": "1.2 g",
                "vitamins": ["Vitamin C", "Vitamin K"],
                "minerals": ["Potassium"]
            },
            "recipes": vec![recipe; recipes],
            "healthAdvice": "Rich in lycopene.",
            "seasonalInfo": "Available year-round, peaking in summer."
        })
        .to_string()
    }

    struct RecordingModel {
        reply: Option<String>,
        seen: Arc<Mutex<Vec<ModelRequest>>>,
    }

    #[async_trait]
    impl VisionModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<Option<String>, ScanError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct SlowModel;

    #[async_trait]
    impl VisionModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &ModelRequest) -> Result<Option<String>, ScanError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    #[test]
    fn test_parse_well_formed_response() {
        let result = parse_response(Some(&sample_json(3)), true).unwrap();
        assert_eq!(result.food_name, "Tomato");
        assert_eq!(result.recipes.len(), 3);
        assert_eq!(result.nutrients.vitamins.len(), 2);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let padded = format!("\n  {}  \n", sample_json(3));
        assert!(parse_response(Some(&padded), true).is_ok());
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(matches!(
            parse_response(None, true),
            Err(ScanError::EmptyResponse)
        ));
        assert!(matches!(
            parse_response(Some("   "), true),
            Err(ScanError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_truncated_response() {
        let full = sample_json(3);
        let truncated = &full[..full.len() / 2];
        let err = parse_response(Some(truncated), true).unwrap_err();
        assert!(matches!(err, ScanError::Format(_)));
        assert_eq!(err.user_message(), "Invalid response format");
    }

    #[test]
    fn test_recipe_count_checked_only_when_strict() {
        let two = sample_json(2);
        assert!(matches!(
            parse_response(Some(&two), true),
            Err(ScanError::Format(reason)) if reason.contains("expected 3 recipes")
        ));
        assert_eq!(parse_response(Some(&two), false).unwrap().recipes.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_sends_one_jpeg_request() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = RecordingModel {
            reply: Some(sample_json(3)),
            seen: Arc::clone(&seen),
        };
        let client = AnalysisClient::new(Box::new(model));

        let result = client.analyze("aGVsbG8=", Language::Sn).await.unwrap();
        assert_eq!(result.food_name, "Tomato");
        assert_eq!(client.model_name(), "recording");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].mime_type, "image/jpeg");
        assert!(seen[0].prompt.contains("Shona (ChiShona)"));
    }

    #[test]
    fn test_build_request_contents() {
        let request = AnalysisClient::build_request("aGVsbG8=", JPEG_MIME, Language::Nd);
        assert_eq!(request.mime_type, "image/jpeg");
        assert_eq!(request.image_base64, "aGVsbG8=");
        assert!(request.prompt.contains("Ndebele (isiNdebele)"));
        assert_eq!(request.schema, response_schema());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_surfaces_as_transport_error() {
        let client = AnalysisClient::new(Box::new(SlowModel)).with_timeout(Duration::from_secs(30));

        let err = client.analyze("aGVsbG8=", Language::En).await.unwrap_err();
        assert!(matches!(err, ScanError::Transport(_)));
        assert_eq!(err.user_message(), "Analysis failed. Please try again.");
    }
}
