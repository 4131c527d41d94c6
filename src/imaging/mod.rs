//! Upload sanitizing: make a photo safe to publish.
//!
//! | Input | Action |
//! |---|---|
//! | JPEG (sniffed or declared) | decode, apply EXIF orientation, re-encode with no metadata |
//! | JPEG that fails to decode | [`SanitizeError::InvalidImage`] |
//! | Anything else | returned byte-for-byte |
//!
//! The module is split into:
//! - **Backend**: [`ImageSanitizer`] trait, shared types, format detection
//! - **EXIF**: minimal APP1/TIFF reader for orientation and privacy tags
//! - **Orientation**: the eight EXIF orientations and their pixel transforms
//! - **Rust backend**: [`RustSanitizer`], the `image`-crate implementation

pub mod backend;
pub mod exif;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{ImageSanitizer, SanitizeError, SanitizeReport, Sanitized};
pub use orientation::Orientation;
pub use params::Quality;
pub use rust_backend::RustSanitizer;
