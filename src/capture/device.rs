use async_trait::async_trait;
use image::RgbImage;
use log::debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::ScanError;

/// Which way the camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear, world-facing camera
    Environment,
    /// Front, selfie camera
    User,
}

/// A live video stream held exclusively by one session
pub trait CameraStream: Send {
    /// Current frame size; `(0, 0)` until the first frame arrives
    fn dimensions(&self) -> (u32, u32);

    fn grab_frame(&mut self) -> Result<RgbImage, ScanError>;

    /// Stops all tracks. Calling it more than once has no effect.
    fn stop(&mut self);
}

/// A camera that can be opened as a video-only stream
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, ScanError>;
}

#[derive(Debug, Clone)]
enum FrameSource {
    File(PathBuf),
    Frame(RgbImage),
}

/// Virtual camera that replays a single still image as its video feed
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    source: FrameSource,
    open_streams: Arc<AtomicUsize>,
}

impl StillImageCamera {
    /// Frames are decoded from the image file each time the camera opens
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        StillImageCamera {
            source: FrameSource::File(path.into()),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_frame(frame: RgbImage) -> Self {
        StillImageCamera {
            source: FrameSource::Frame(frame),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams opened and not yet stopped
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, ScanError> {
        let frame = match &self.source {
            FrameSource::Frame(frame) => frame.clone(),
            FrameSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    ScanError::DeviceAccess(format!("{}: {}", path.display(), e))
                })?;
                image::load_from_memory(&bytes)
                    .map_err(|e| ScanError::DeviceAccess(format!("{}: {}", path.display(), e)))?
                    .to_rgb8()
            }
        };

        debug!(
            "Opened {:?}-facing still image camera ({}x{})",
            facing,
            frame.width(),
            frame.height()
        );
        self.open_streams.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(StillImageStream {
            frame,
            open_streams: Some(Arc::clone(&self.open_streams)),
        }))
    }
}

struct StillImageStream {
    frame: RgbImage,
    open_streams: Option<Arc<AtomicUsize>>,
}

impl CameraStream for StillImageStream {
    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn grab_frame(&mut self) -> Result<RgbImage, ScanError> {
        if self.open_streams.is_none() {
            return Err(ScanError::NotReady);
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        if let Some(counter) = self.open_streams.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for StillImageStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A camera that always refuses access, e.g. on hosts without one
#[derive(Debug, Clone)]
pub struct UnavailableCamera {
    reason: String,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableCamera {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableCamera {
    fn default() -> Self {
        UnavailableCamera::new("no camera device available")
    }
}

#[async_trait]
impl CameraDevice for UnavailableCamera {
    async fn open(&self, _facing: Facing) -> Result<Box<dyn CameraStream>, ScanError> {
        Err(ScanError::DeviceAccess(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_still_camera_counts_streams() {
        let camera = StillImageCamera::from_frame(RgbImage::new(4, 3));
        let mut stream = camera.open(Facing::Environment).await.unwrap();
        assert_eq!(camera.open_streams(), 1);
        assert_eq!(stream.dimensions(), (4, 3));
        assert_eq!(stream.grab_frame().unwrap().dimensions(), (4, 3));

        stream.stop();
        stream.stop();
        assert_eq!(camera.open_streams(), 0);
        assert!(matches!(stream.grab_frame(), Err(ScanError::NotReady)));
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_it() {
        let camera = StillImageCamera::from_frame(RgbImage::new(2, 2));
        let stream = camera.open(Facing::Environment).await.unwrap();
        drop(stream);
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_device_error() {
        let camera = StillImageCamera::from_file("/nonexistent/frame.jpg");
        let result = camera.open(Facing::Environment).await;
        assert!(matches!(result, Err(ScanError::DeviceAccess(_))));
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_camera() {
        let camera = UnavailableCamera::new("NotAllowedError: Permission denied");
        let err = camera.open(Facing::Environment).await.err().unwrap();
        assert!(err.to_string().contains("Permission denied"));
    }
}
