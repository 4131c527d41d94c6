//! Sanitizer trait and shared types.
//!
//! The [`ImageSanitizer`] trait is the seam between the upload pipeline and
//! pixel work. The production implementation is
//! [`RustSanitizer`](super::rust_backend::RustSanitizer); tests use the
//! recording mock in this module.

use super::orientation::Orientation;
use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SanitizeError {
    /// The bytes claim (or sniff) to be a format we rewrite but do not
    /// decode. This is a bad upload, not a server fault.
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
}

/// What the sanitizer did to an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeReport {
    /// Format we do not rewrite; bytes returned untouched.
    PassedThrough,
    /// Decoded, rotated upright, re-encoded without any metadata block.
    Rewritten {
        orientation: Orientation,
        /// The original carried a GPS IFD.
        had_location: bool,
        /// The original carried camera make/model tags.
        had_device_info: bool,
    },
}

/// Sanitizer output: the bytes that are safe to store and serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub bytes: Vec<u8>,
    /// Detected format, if any decoder recognised the content.
    pub format: Option<ImageFormat>,
    pub report: SanitizeReport,
}

impl Sanitized {
    pub fn passed_through(bytes: Vec<u8>, format: Option<ImageFormat>) -> Self {
        Self {
            bytes,
            format,
            report: SanitizeReport::PassedThrough,
        }
    }
}

/// Turns raw uploaded bytes into bytes safe for public redistribution.
pub trait ImageSanitizer: Sync {
    /// `declared` is the client's claim about the content: a MIME type
    /// (`image/jpeg`) or a file extension (`jpg`). Content sniffing takes
    /// part too, so a mislabelled JPEG is still rewritten.
    fn sanitize(&self, bytes: Vec<u8>, declared: Option<&str>) -> Result<Sanitized, SanitizeError>;
}

/// Resolve a declared content type or extension to a format.
pub fn declared_format(declared: &str) -> Option<ImageFormat> {
    let declared = declared.trim();
    if declared.contains('/') {
        // Drop MIME parameters such as "; charset=binary"
        let mime = declared.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match mime.as_str() {
            // Legacy spellings some browsers still send
            "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            other => ImageFormat::from_mime_type(other),
        }
    } else {
        ImageFormat::from_extension(declared.trim_start_matches('.'))
    }
}

/// Whether the upload must go through the JPEG rewrite path: either the
/// bytes are JPEG or the client said they are.
pub fn is_jpeg(bytes: &[u8], declared: Option<&str>) -> bool {
    let sniffed = image::guess_format(bytes).ok() == Some(ImageFormat::Jpeg);
    let claimed = declared.and_then(declared_format) == Some(ImageFormat::Jpeg);
    sniffed || claimed
}
