//! Pure Rust sanitizer built on the `image` crate.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format` + declared MIME type / extension |
//! | Read orientation, GPS, device tags | [`exif::read_exif`](super::exif::read_exif) |
//! | Decode JPEG | `image::load_from_memory_with_format` |
//! | Rotate / flip | [`Orientation::apply`](super::orientation::Orientation::apply) |
//! | Re-encode | `image::codecs::jpeg::JpegEncoder` (writes JFIF only, no APP1/EXIF) |
//!
//! Re-encoding from decoded pixels is what strips metadata: the encoder is
//! given pixels and nothing else, so location, device identifiers, and
//! embedded thumbnails cannot survive.

use super::backend::{ImageSanitizer, SanitizeError, SanitizeReport, Sanitized, is_jpeg};
use super::exif;
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};

/// Production sanitizer. Rewrites JPEGs, passes everything else through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustSanitizer {
    quality: Quality,
}

impl RustSanitizer {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

/// Encode as baseline JPEG with no metadata segments.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, SanitizeError> {
    // JPEG has no alpha channel and no 16-bit mode
    let converted;
    let img = match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img,
        _ => {
            converted = DynamicImage::ImageRgb8(img.to_rgb8());
            &converted
        }
    };

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| SanitizeError::EncodeFailed(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageSanitizer for RustSanitizer {
    fn sanitize(&self, bytes: Vec<u8>, declared: Option<&str>) -> Result<Sanitized, SanitizeError> {
        if !is_jpeg(&bytes, declared) {
            let format = image::guess_format(&bytes).ok();
            return Ok(Sanitized::passed_through(bytes, format));
        }

        let summary = exif::read_exif(&bytes);
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .map_err(|e| SanitizeError::InvalidImage(format!("Failed to decode JPEG: {e}")))?;
        let upright = summary.orientation.apply(decoded);
        let rewritten = encode_jpeg(&upright, self.quality)?;

        tracing::debug!(
            orientation = summary.orientation.exif_value(),
            turned = summary.orientation.swaps_dimensions(),
            width = upright.width(),
            height = upright.height(),
            had_location = summary.has_gps,
            had_device_info = summary.has_device_info,
            before = bytes.len(),
            after = rewritten.len(),
            "jpeg sanitized"
        );

        Ok(Sanitized {
            bytes: rewritten,
            format: Some(ImageFormat::Jpeg),
            report: SanitizeReport::Rewritten {
                orientation: summary.orientation,
                had_location: summary.has_gps,
                had_device_info: summary.has_device_info,
            },
        })
    }
}
