//! UniFFI bindings for the produce scanner
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! It wraps the async Rust API with synchronous functions that manage their own tokio runtime.

use std::fmt;
use std::path::Path;

use crate::capture::{self, CapturedImage};
use crate::{AnalysisClient, Language, Nutrients, Recipe, ScanError, ScanResult, ScannerConfig};

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// FFI-compatible nutrient facts
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiNutrients {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fiber: String,
    pub vitamins: Vec<String>,
    pub minerals: Vec<String>,
}

/// FFI-compatible recipe
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub cultural_note: String,
    pub healthy_pairings: Vec<String>,
    pub meal_balance_reason: String,
}

/// FFI-compatible scan result
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiScanResult {
    pub food_name: String,
    pub description: String,
    pub nutrients: FfiNutrients,
    pub recipes: Vec<FfiRecipe>,
    pub health_advice: String,
    pub seasonal_info: String,
}

impl From<Nutrients> for FfiNutrients {
    fn from(n: Nutrients) -> Self {
        FfiNutrients {
            calories: n.calories,
            protein: n.protein,
            carbs: n.carbs,
            fiber: n.fiber,
            vitamins: n.vitamins,
            minerals: n.minerals,
        }
    }
}

impl From<Recipe> for FfiRecipe {
    fn from(r: Recipe) -> Self {
        FfiRecipe {
            name: r.name,
            ingredients: r.ingredients,
            steps: r.steps,
            cultural_note: r.cultural_note,
            healthy_pairings: r.healthy_pairings,
            meal_balance_reason: r.meal_balance_reason,
        }
    }
}

impl From<ScanResult> for FfiScanResult {
    fn from(result: ScanResult) -> Self {
        FfiScanResult {
            food_name: result.food_name,
            description: result.description,
            nutrients: result.nutrients.into(),
            recipes: result.recipes.into_iter().map(FfiRecipe::from).collect(),
            health_advice: result.health_advice,
            seasonal_info: result.seasonal_info,
        }
    }
}

/// FFI-compatible language enum
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum FfiLanguage {
    English,
    Shona,
    Ndebele,
}

impl From<FfiLanguage> for Language {
    fn from(language: FfiLanguage) -> Self {
        match language {
            FfiLanguage::English => Language::En,
            FfiLanguage::Shona => Language::Sn,
            FfiLanguage::Ndebele => Language::Nd,
        }
    }
}

/// FFI-compatible error type
///
/// Every variant carries the user-facing message only.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiScanError {
    /// Camera or upload could not provide an image
    CaptureError { message: String },
    /// The model call failed, returned nothing, or returned malformed data
    AnalysisError { message: String },
    /// Configuration error
    ConfigError { message: String },
    /// Runtime error (tokio)
    RuntimeError { message: String },
}

impl fmt::Display for FfiScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiScanError::CaptureError { message } => write!(f, "Capture error: {}", message),
            FfiScanError::AnalysisError { message } => write!(f, "Analysis error: {}", message),
            FfiScanError::ConfigError { message } => write!(f, "Config error: {}", message),
            FfiScanError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiScanError {}

impl From<ScanError> for FfiScanError {
    fn from(err: ScanError) -> Self {
        let message = err.user_message();
        match err {
            ScanError::Transport(_) | ScanError::EmptyResponse | ScanError::Format(_) => {
                FfiScanError::AnalysisError { message }
            }
            ScanError::Config(_) => FfiScanError::ConfigError { message },
            _ => FfiScanError::CaptureError { message },
        }
    }
}

/// Configuration overrides for a scan
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiScanConfig {
    /// Optional API key (uses environment variable if not specified)
    pub api_key: Option<String>,
    /// Optional model name
    pub model: Option<String>,
    /// Optional timeout in seconds (waits indefinitely if not specified)
    pub timeout_seconds: Option<u64>,
}

impl FfiScanConfig {
    fn into_scanner_config(self) -> ScannerConfig {
        let defaults = ScannerConfig::default();
        ScannerConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or(defaults.model.clone()),
            timeout_secs: self.timeout_seconds,
            ..defaults
        }
    }
}

/// Create a new tokio runtime for FFI calls
fn create_runtime() -> Result<tokio::runtime::Runtime, FfiScanError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiScanError::RuntimeError {
        message: format!("Failed to create async runtime: {}", e),
    })
}

/// Analyze an image file picked by the user
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn analyze_image_file(
    path: String,
    language: FfiLanguage,
    config: Option<FfiScanConfig>,
) -> Result<FfiScanResult, FfiScanError> {
    let rt = create_runtime()?;
    rt.block_on(async {
        let image = capture::read_upload(Path::new(&path)).await?;
        analyze_async(image, language, config).await
    })
}

/// Analyze a base64 image or `data:` URI captured by the host app
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn analyze_base64(
    data: String,
    language: FfiLanguage,
    config: Option<FfiScanConfig>,
) -> Result<FfiScanResult, FfiScanError> {
    let image = if data.starts_with("data:") {
        CapturedImage::from_data_uri(&data)?
    } else if data.trim().is_empty() {
        return Err(ScanError::Upload("file is empty".to_string()).into());
    } else {
        CapturedImage {
            mime_type: capture::JPEG_MIME.to_string(),
            data_uri: format!("data:{};base64,{}", capture::JPEG_MIME, data),
            base64: data,
        }
    };

    let rt = create_runtime()?;
    rt.block_on(analyze_async(image, language, config))
}

async fn analyze_async(
    image: CapturedImage,
    language: FfiLanguage,
    config: Option<FfiScanConfig>,
) -> Result<FfiScanResult, FfiScanError> {
    let config = config.unwrap_or_default().into_scanner_config();
    let result = AnalysisClient::from_config(&config)
        .analyze_image(&image, language.into())
        .await?;
    Ok(result.into())
}

/// Human-readable labels in picker order
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn language_labels() -> Vec<String> {
    Language::ALL
        .iter()
        .map(|language| language.label().to_string())
        .collect()
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
