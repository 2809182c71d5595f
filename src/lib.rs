//! PowerPlate produce scanner.
//!
//! Photograph a fruit or vegetable (or pick an image file), send it to a
//! multimodal Gemini model, and get back nutrition facts plus three
//! Zimbabwean recipes in English, Shona or Ndebele.
//!
//! ```no_run
//! use powerplate_scanner::{scan_image_file, Language};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let result = scan_image_file("tomato.jpg", Language::Sn).await?;
//! println!("{}: {} recipes", result.food_name, result.recipes.len());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod session;
pub mod uniffi_bindings;

use std::path::Path;

pub use analysis::{AnalysisClient, GeminiModel, ModelRequest, VisionModel};
pub use capture::{
    CameraDevice, CameraStream, CapturedImage, Facing, StillImageCamera, UnavailableCamera,
};
pub use crate::config::ScannerConfig;
pub use error::ScanError;
pub use model::{Language, Nutrients, Recipe, ScanResult};
pub use session::{AnalysisPhase, AnalysisTicket, CaptureState, ScanSession};

/// Analyze an image file with configuration loaded from file and environment.
pub async fn scan_image_file(
    path: impl AsRef<Path>,
    language: Language,
) -> Result<ScanResult, ScanError> {
    let config = ScannerConfig::load()?;
    scan_image_file_with_config(path, language, &config).await
}

/// Analyze an image file with an explicit configuration.
pub async fn scan_image_file_with_config(
    path: impl AsRef<Path>,
    language: Language,
    config: &ScannerConfig,
) -> Result<ScanResult, ScanError> {
    let image = capture::read_upload(path.as_ref()).await?;
    AnalysisClient::from_config(config)
        .analyze_image(&image, language)
        .await
}
