use thiserror::Error;

/// Message shown when the camera cannot be opened
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Unable to access camera. Please check permissions or upload a photo.";

/// Errors that can occur while capturing or analyzing produce images
#[derive(Error, Debug)]
pub enum ScanError {
    /// Camera permission denied or no suitable device
    #[error("Camera access failed: {0}")]
    DeviceAccess(String),

    /// The video source has not reported frame dimensions yet
    #[error("Camera is not ready: video dimensions are unknown")]
    NotReady,

    /// An image is already captured and being (or has been) analyzed
    #[error("An image is already being analyzed; reset before scanning again")]
    Busy,

    /// The uploaded file could not be used as an image
    #[error("Upload rejected: {0}")]
    Upload(String),

    /// Encoding a captured frame failed
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Network or model call failure
    #[error("Model request failed: {0}")]
    Transport(String),

    /// The model answered without any text content
    #[error("No response from analysis")]
    EmptyResponse,

    /// The model text did not match the expected structure
    #[error("Invalid response format: {0}")]
    Format(String),

    /// Reading a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Transport(err.to_string())
    }
}

impl ScanError {
    /// Human-readable message suitable for display.
    ///
    /// Analysis failures collapse to a short generic message so that raw
    /// model output and transport details never reach the end user.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::DeviceAccess(_) => CAMERA_UNAVAILABLE_MESSAGE.to_string(),
            ScanError::Transport(_) => "Analysis failed. Please try again.".to_string(),
            ScanError::EmptyResponse => "No response from analysis".to_string(),
            ScanError::Format(_) => "Invalid response format".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error came out of the analysis round trip
    pub fn is_analysis_error(&self) -> bool {
        matches!(
            self,
            ScanError::Transport(_) | ScanError::EmptyResponse | ScanError::Format(_)
        )
    }
}
