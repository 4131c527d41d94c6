//! Shared test utilities for the memories test suite.
//!
//! Provides store fixtures, seeding shortcuts, and synthetic image builders
//! (plain JPEG/PNG plus a hand-built EXIF block with orientation, GPS, and
//! device tags).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = Fixture::new();
//! let album = seed_album(&fx.store, "trip");
//! let jpeg = with_app1(&jpeg_bytes(40, 20), &exif_app1(6, true, true));
//! ```

use chrono::{DateTime, TimeZone, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::storage::{Album, AlbumRepository, NewAlbum, NewPhoto, Photo, PhotoRepository, Store};

// =========================================================================
// Store fixtures
// =========================================================================

/// A file-backed store plus an uploads directory, both inside one temp dir.
pub struct Fixture {
    pub tmp: TempDir,
    pub store: Store,
    pub uploads: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path().join("data/memories.db")).unwrap();
        let uploads = tmp.path().join("data/uploads");
        Self {
            tmp,
            store,
            uploads,
        }
    }
}

/// Every file under `dir`, as sorted `/`-separated relative paths.
pub fn files_under(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}

// =========================================================================
// Seeding: panics on failure so tests read as setup, not plumbing
// =========================================================================

pub fn new_album(slug: &str, title: &str) -> NewAlbum {
    NewAlbum {
        slug: slug.to_string(),
        title: title.to_string(),
        description: String::new(),
    }
}

/// Insert an album titled after its slug.
pub fn seed_album(store: &Store, slug: &str) -> Album {
    store
        .albums()
        .create(&new_album(slug, &slug.to_uppercase()))
        .unwrap_or_else(|e| panic!("seeding album '{slug}' failed: {e}"))
}

pub fn seed_photo(
    store: &Store,
    album_id: i64,
    filename: &str,
    taken_at: Option<DateTime<Utc>>,
) -> Photo {
    store
        .photos()
        .create(&NewPhoto {
            album_id,
            filename: filename.to_string(),
            caption: String::new(),
            taken_at,
        })
        .unwrap_or_else(|e| panic!("seeding photo '{filename}' failed: {e}"))
}

/// Minute-precision UTC timestamp.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap()
}

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

/// Baseline JPEG straight from the encoder: JFIF header, no EXIF.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, 90);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    out
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Body of an EXIF APP1 segment (`Exif\0\0` + big-endian TIFF).
///
/// IFD0 always carries Orientation; `gps` adds a GPS IFD pointer to a one
/// entry GPS IFD (latitude ref "N"), `device` adds a Make tag ("Cam").
pub fn exif_app1(orientation: u16, gps: bool, device: bool) -> Vec<u8> {
    let entry_count = 1 + usize::from(gps) + usize::from(device);
    // header (8) + count (2) + entries + next-IFD offset (4)
    let gps_ifd_offset = (8 + 2 + entry_count * 12 + 4) as u32;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&8u32.to_be_bytes());

    tiff.extend_from_slice(&(entry_count as u16).to_be_bytes());
    if device {
        // Make, ASCII, 4 bytes inline
        tiff.extend_from_slice(&0x010Fu16.to_be_bytes());
        tiff.extend_from_slice(&2u16.to_be_bytes());
        tiff.extend_from_slice(&4u32.to_be_bytes());
        tiff.extend_from_slice(b"Cam\0");
    }
    // Orientation, SHORT, left-justified
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    if gps {
        tiff.extend_from_slice(&0x8825u16.to_be_bytes());
        tiff.extend_from_slice(&4u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&gps_ifd_offset.to_be_bytes());
    }
    tiff.extend_from_slice(&0u32.to_be_bytes());

    if gps {
        tiff.extend_from_slice(&1u16.to_be_bytes());
        // GPSLatitudeRef, ASCII, "N\0" inline
        tiff.extend_from_slice(&0x0001u16.to_be_bytes());
        tiff.extend_from_slice(&2u16.to_be_bytes());
        tiff.extend_from_slice(&2u32.to_be_bytes());
        tiff.extend_from_slice(b"N\0\0\0");
        tiff.extend_from_slice(&0u32.to_be_bytes());
    }

    let mut body = b"Exif\0\0".to_vec();
    body.extend_from_slice(&tiff);
    body
}

/// Insert an APP1 segment with `body` directly after the SOI marker.
pub fn with_app1(jpeg: &[u8], body: &[u8]) -> Vec<u8> {
    assert!(jpeg.starts_with(&[0xFF, 0xD8]), "not a JPEG");
    let len = u16::try_from(body.len() + 2).unwrap();

    let mut out = Vec::with_capacity(jpeg.len() + body.len() + 4);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&jpeg[2..]);
    out
}
