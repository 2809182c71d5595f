//! Scan session: the capture-and-analyze state machine.
//!
//! ```text
//! Idle(camera) --device failure--> Idle(upload only) --acquire--> Idle(camera)
//! Idle(*) --capture/upload--> Captured(Analyzing) --outcome--> Captured(Done | Failed)
//! Captured(*) --reset--> Idle(camera)
//! ```
//!
//! The camera stream is released on every transition into `Captured`, so a
//! live feed and a captured image are never held at the same time.

use log::{info, warn};
use std::path::Path;

use crate::analysis::AnalysisClient;
use crate::capture::{self, CameraDevice, CameraStream, CapturedImage, Facing};
use crate::error::ScanError;
use crate::model::{Language, ScanResult};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPhase {
    Analyzing,
    Done(ScanResult),
    /// User-facing failure message
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    /// No image; `camera_active` is false in upload-only fallback mode
    Idle { camera_active: bool },
    Captured {
        image: CapturedImage,
        phase: AnalysisPhase,
    },
}

/// Permission to run one analysis and report its outcome
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    token: u64,
    pub image: CapturedImage,
    pub language: Language,
}

impl AnalysisTicket {
    pub fn token(&self) -> u64 {
        self.token
    }
}

pub struct ScanSession {
    device: Box<dyn CameraDevice>,
    stream: Option<Box<dyn CameraStream>>,
    state: CaptureState,
    language: Language,
    camera_error: Option<String>,
    next_token: u64,
    in_flight: Option<u64>,
}

impl ScanSession {
    /// Creates an idle session. The camera is not opened until `acquire_camera`.
    pub fn new(device: Box<dyn CameraDevice>, language: Language) -> Self {
        ScanSession {
            device,
            stream: None,
            state: CaptureState::Idle {
                camera_active: true,
            },
            language,
            camera_error: None,
            next_token: 1,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Applies to the next capture; an analysis already in flight keeps its language.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn camera_active(&self) -> bool {
        matches!(
            self.state,
            CaptureState::Idle {
                camera_active: true
            }
        )
    }

    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    pub fn holds_camera(&self) -> bool {
        self.stream.is_some()
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        match &self.state {
            CaptureState::Captured { image, .. } => Some(image),
            CaptureState::Idle { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&ScanResult> {
        match &self.state {
            CaptureState::Captured {
                phase: AnalysisPhase::Done(result),
                ..
            } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Captured {
                phase: AnalysisPhase::Failed(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Opens the environment-facing camera.
    ///
    /// On failure the error is recorded and the session falls back to
    /// upload-only mode; the same error is returned to the caller.
    pub async fn acquire_camera(&mut self) -> Result<(), ScanError> {
        if let CaptureState::Captured { .. } = self.state {
            return Ok(());
        }
        if self.stream.is_some() {
            return Ok(());
        }

        match self.device.open(Facing::Environment).await {
            Ok(stream) => {
                info!("Camera acquired");
                self.stream = Some(stream);
                self.camera_error = None;
                self.state = CaptureState::Idle {
                    camera_active: true,
                };
                Ok(())
            }
            Err(e) => {
                warn!("Camera access error: {}", e);
                self.camera_error = Some(e.user_message());
                self.state = CaptureState::Idle {
                    camera_active: false,
                };
                Err(e)
            }
        }
    }

    /// Stops the live stream if one is held. Safe to call at any time.
    pub fn release_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Camera released");
        }
    }

    fn ensure_idle(&self) -> Result<(), ScanError> {
        match self.state {
            CaptureState::Idle { .. } => Ok(()),
            CaptureState::Captured { .. } => Err(ScanError::Busy),
        }
    }

    fn enter_captured(&mut self, image: CapturedImage) -> AnalysisTicket {
        self.release_camera();

        let token = self.next_token;
        self.next_token += 1;
        self.in_flight = Some(token);
        self.state = CaptureState::Captured {
            image: image.clone(),
            phase: AnalysisPhase::Analyzing,
        };

        AnalysisTicket {
            token,
            image,
            language: self.language,
        }
    }

    /// Snapshots the live feed into a JPEG and enters `Captured`.
    pub fn capture_frame(&mut self) -> Result<AnalysisTicket, ScanError> {
        self.ensure_idle()?;

        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                return Err(match &self.camera_error {
                    Some(message) => ScanError::DeviceAccess(message.clone()),
                    None => ScanError::NotReady,
                })
            }
        };

        let (width, height) = stream.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::NotReady);
        }

        let frame = stream.grab_frame()?;
        let image = capture::snapshot(&frame)?;
        info!("Captured {}x{} frame", width, height);
        Ok(self.enter_captured(image))
    }

    /// Reads an image file chosen by the user and enters `Captured`.
    pub async fn ingest_upload(&mut self, path: &Path) -> Result<AnalysisTicket, ScanError> {
        self.ensure_idle()?;
        let image = capture::read_upload(path).await?;
        info!("Ingested {} upload from {}", image.mime_type, path.display());
        Ok(self.enter_captured(image))
    }

    /// Same as `ingest_upload` for bytes already in memory.
    pub fn ingest_bytes(
        &mut self,
        bytes: &[u8],
        file_name: Option<&Path>,
    ) -> Result<AnalysisTicket, ScanError> {
        self.ensure_idle()?;
        let image = capture::ingest_bytes(bytes, file_name)?;
        Ok(self.enter_captured(image))
    }

    /// Re-sends the held image after a failed analysis.
    pub fn retry_analysis(&mut self) -> Result<AnalysisTicket, ScanError> {
        match &self.state {
            CaptureState::Captured {
                image,
                phase: AnalysisPhase::Failed(_),
            } => {
                let image = image.clone();
                Ok(self.enter_captured(image))
            }
            CaptureState::Captured { .. } => Err(ScanError::Busy),
            CaptureState::Idle { .. } => Err(ScanError::Upload(
                "no image to analyze; capture or upload one first".to_string(),
            )),
        }
    }

    /// Applies an analysis outcome. Outcomes for anything but the current
    /// ticket are dropped and `false` is returned.
    pub fn finish_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        outcome: Result<ScanResult, ScanError>,
    ) -> bool {
        if self.in_flight != Some(ticket.token) {
            warn!("Dropping outcome of stale analysis #{}", ticket.token);
            return false;
        }
        self.in_flight = None;

        if let CaptureState::Captured { phase, .. } = &mut self.state {
            *phase = match outcome {
                Ok(result) => {
                    info!("Analysis #{} identified '{}'", ticket.token, result.food_name);
                    AnalysisPhase::Done(result)
                }
                Err(e) => {
                    warn!("Analysis #{} failed: {}", ticket.token, e);
                    AnalysisPhase::Failed(e.user_message())
                }
            };
        }
        true
    }

    /// Runs the ticket's single model round trip and applies the outcome.
    pub async fn run_analysis(&mut self, client: &AnalysisClient, ticket: AnalysisTicket) -> bool {
        let outcome = client.analyze_image(&ticket.image, ticket.language).await;
        self.finish_analysis(&ticket, outcome)
    }

    /// Capture from the live feed, then analyze.
    ///
    /// Capture problems are returned; analysis failures end up in `error()`.
    pub async fn capture_and_analyze(&mut self, client: &AnalysisClient) -> Result<(), ScanError> {
        let ticket = self.capture_frame()?;
        self.run_analysis(client, ticket).await;
        Ok(())
    }

    /// Upload a file, then analyze.
    pub async fn upload_and_analyze(
        &mut self,
        path: &Path,
        client: &AnalysisClient,
    ) -> Result<(), ScanError> {
        let ticket = self.ingest_upload(path).await?;
        self.run_analysis(client, ticket).await;
        Ok(())
    }

    /// Discards image, result and error, then returns to the live camera
    /// (or to upload-only mode if the camera still cannot be opened).
    pub async fn reset(&mut self) -> Result<(), ScanError> {
        if let Some(token) = self.in_flight.take() {
            info!("Abandoning analysis #{}", token);
        }
        self.release_camera();
        self.state = CaptureState::Idle {
            camera_active: true,
        };
        self.acquire_camera().await
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.release_camera();
    }
}
