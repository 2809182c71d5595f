//! Capture controller building blocks: camera devices and image payloads.

mod device;

pub use device::{CameraDevice, CameraStream, Facing, StillImageCamera, UnavailableCamera};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use log::debug;
use std::path::Path;

use crate::error::ScanError;

pub const JPEG_MIME: &str = "image/jpeg";

/// JPEG quality used for camera snapshots
const SNAPSHOT_JPEG_QUALITY: u8 = 92;

/// An image ready for display and analysis
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    /// MIME type of the encoded bytes, e.g. `image/jpeg`
    pub mime_type: String,
    /// Base64 payload without any data URI header
    pub base64: String,
    /// `data:<mime>;base64,<payload>` for display
    pub data_uri: String,
}

impl CapturedImage {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        let base64 = STANDARD.encode(bytes);
        CapturedImage {
            data_uri: format!("data:{};base64,{}", mime_type, base64),
            mime_type: mime_type.to_string(),
            base64,
        }
    }

    /// Accepts a `data:image/...;base64,` URI as produced by file readers.
    pub fn from_data_uri(data_uri: &str) -> Result<Self, ScanError> {
        let (header, payload) = data_uri
            .split_once(',')
            .ok_or_else(|| ScanError::Upload("not a data URI".to_string()))?;
        let mime_type = header
            .strip_prefix("data:")
            .and_then(|rest| rest.strip_suffix(";base64"))
            .filter(|mime| mime.starts_with("image/"))
            .ok_or_else(|| ScanError::Upload(format!("unsupported data URI header '{}'", header)))?;
        if payload.trim().is_empty() {
            return Err(ScanError::Upload("file is empty".to_string()));
        }

        Ok(CapturedImage {
            mime_type: mime_type.to_string(),
            base64: payload.to_string(),
            data_uri: data_uri.to_string(),
        })
    }
}

/// Returns the payload after the first comma of a data URI, or the input unchanged.
pub fn strip_data_uri_header(data: &str) -> &str {
    match data.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data,
    }
}

/// Encodes a still frame as JPEG.
///
/// A frame with a zero dimension means the video source has not started
/// delivering frames yet.
pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, ScanError> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::NotReady);
    }

    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, SNAPSHOT_JPEG_QUALITY)
        .encode(frame.as_raw(), width, height, image::ColorType::Rgb8.into())
        .map_err(|e| ScanError::Encode(e.to_string()))?;

    debug!(
        "Encoded {}x{} frame into {} JPEG bytes",
        width,
        height,
        jpeg_bytes.len()
    );
    Ok(jpeg_bytes)
}

/// Snapshot a frame into a displayable JPEG image
pub fn snapshot(frame: &RgbImage) -> Result<CapturedImage, ScanError> {
    let jpeg = encode_jpeg(frame)?;
    Ok(CapturedImage::from_bytes(JPEG_MIME, &jpeg))
}

/// ISO-BMFF brands written by phone cameras. `image` cannot sniff these.
fn sniff_heif(bytes: &[u8]) -> Option<&'static str> {
    if bytes.get(4..8)? != b"ftyp" {
        return None;
    }
    match bytes.get(8..12)? {
        b"heic" | b"heix" | b"hevc" => Some("image/heic"),
        b"mif1" | b"msf1" | b"heif" => Some("image/heif"),
        _ => None,
    }
}

/// Works out the image MIME type from the bytes, then from the file name.
pub fn detect_mime(bytes: &[u8], file_name: Option<&Path>) -> Result<String, ScanError> {
    if let Ok(format) = image::guess_format(bytes) {
        return Ok(format.to_mime_type().to_string());
    }
    if let Some(mime) = sniff_heif(bytes) {
        return Ok(mime.to_string());
    }

    let extension = file_name
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        // Common on phones, not decodable here but accepted by the model
        Some("heic") => Ok("image/heic".to_string()),
        Some("heif") => Ok("image/heif".to_string()),
        Some(ext) => ImageFormat::from_extension(ext)
            .map(|format| format.to_mime_type().to_string())
            .ok_or_else(|| ScanError::Upload(format!("'.{}' is not an image file", ext))),
        None => Err(ScanError::Upload(
            "file content is not a recognized image".to_string(),
        )),
    }
}

/// Builds a `CapturedImage` from uploaded bytes of any image subtype.
pub fn ingest_bytes(bytes: &[u8], file_name: Option<&Path>) -> Result<CapturedImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::Upload("file is empty".to_string()));
    }
    let mime_type = detect_mime(bytes, file_name)?;
    Ok(CapturedImage::from_bytes(&mime_type, bytes))
}

/// Reads an image file from disk without blocking the runtime.
pub async fn read_upload(path: &Path) -> Result<CapturedImage, ScanError> {
    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    ingest_bytes(&bytes, Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn png_bytes() -> Vec<u8> {
        let frame = RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut out = std::io::Cursor::new(Vec::new());
        frame.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_snapshot_produces_jpeg_data_uri() {
        let frame = RgbImage::from_pixel(8, 6, image::Rgb([220, 40, 40]));
        let image = snapshot(&frame).unwrap();

        assert_eq!(image.mime_type, "image/jpeg");
        assert!(image.data_uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(strip_data_uri_header(&image.data_uri), image.base64);

        let decoded = STANDARD.decode(&image.base64).unwrap();
        assert_eq!(image::guess_format(&decoded).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_zero_sized_frame_is_not_ready() {
        let frame = RgbImage::new(0, 0);
        assert!(matches!(encode_jpeg(&frame), Err(ScanError::NotReady)));
    }

    #[test]
    fn test_detect_mime_from_content_and_extension() {
        assert_eq!(detect_mime(&png_bytes(), None).unwrap(), "image/png");
        assert_eq!(
            detect_mime(b"not really", Some(Path::new("IMG_0001.HEIC"))).unwrap(),
            "image/heic"
        );
        assert_eq!(
            detect_mime(b"not really", Some(Path::new("photo.webp"))).unwrap(),
            "image/webp"
        );
        assert!(matches!(
            detect_mime(b"plain text", Some(Path::new("notes.txt"))),
            Err(ScanError::Upload(_))
        ));
        assert!(detect_mime(b"plain text", None).is_err());
    }

    #[test]
    fn test_detect_heif_brands_without_extension() {
        let mut heic = vec![0, 0, 0, 0x18];
        heic.extend_from_slice(b"ftypheic\0\0\0\0mif1heic");
        assert_eq!(detect_mime(&heic, None).unwrap(), "image/heic");
        assert_eq!(
            detect_mime(&heic, Some(Path::new("/storage/content/1234"))).unwrap(),
            "image/heic"
        );

        let mut heif = vec![0, 0, 0, 0x18];
        heif.extend_from_slice(b"ftypmif1\0\0\0\0mif1");
        let image = ingest_bytes(&heif, None).unwrap();
        assert_eq!(image.mime_type, "image/heif");

        assert!(detect_mime(b"\0\0\0\x18ftypisom", None).is_err());
    }

    #[test]
    fn test_ingest_bytes_keeps_original_subtype() {
        let image = ingest_bytes(&png_bytes(), Some(Path::new("tomato.png"))).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert!(image.data_uri.starts_with("data:image/png;base64,"));
        assert!(matches!(ingest_bytes(&[], None), Err(ScanError::Upload(_))));
    }

    #[test]
    fn test_data_uri_parsing() {
        let image = CapturedImage::from_data_uri("data:image/webp;base64,UklGRg==").unwrap();
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.base64, "UklGRg==");

        assert!(CapturedImage::from_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(CapturedImage::from_data_uri("aGk=").is_err());
        assert!(matches!(
            CapturedImage::from_data_uri("data:image/png;base64,"),
            Err(ScanError::Upload(ref reason)) if reason == "file is empty"
        ));
        assert_eq!(strip_data_uri_header("aGk="), "aGk=");
    }

    #[tokio::test]
    async fn test_read_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let image = read_upload(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/png");

        let missing = read_upload(&dir.path().join("missing.png")).await;
        assert!(matches!(missing, Err(ScanError::Io(_))));
    }
}
