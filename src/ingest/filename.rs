//! Stored photo filenames.
//!
//! Format: `<YYYYMMDDHHMMSS>-<token><.ext>`, for example
//! `20250214180000-9f2c41d07be84a6f8d1e3c5b7a90f214.jpg`.
//!
//! The token is a v4 UUID in simple form: 32 lowercase hex characters
//! carrying 122 bits from the OS random source. Two uploads racing into the
//! same album in the same second collide with negligible probability, so no
//! lookup or lock is needed before writing.

use chrono::{DateTime, Utc};
use image::ImageFormat;
use std::path::Path;
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Build a fresh filename for an upload whose client-side name was
/// `original`.
///
/// Only the extension of `original` survives, lowercased. An extension
/// with anything other than ASCII letters and digits is dropped so the
/// result is always a plain, URL-safe name.
pub fn generate_photo_filename(original: &str, now: DateTime<Utc>) -> String {
    build(extension(original).as_deref(), now)
}

/// Build a fresh filename for bytes that were re-encoded as `format`. The
/// extension names what is actually stored, whatever the client called it.
pub fn generate_encoded_filename(format: ImageFormat, now: DateTime<Utc>) -> String {
    build(format.extensions_str().first().copied(), now)
}

fn build(ext: Option<&str>, now: DateTime<Utc>) -> String {
    let timestamp = now.format(TIMESTAMP_FORMAT);
    let token = Uuid::new_v4().simple();
    match ext {
        Some(ext) => format!("{timestamp}-{token}.{ext}"),
        None => format!("{timestamp}-{token}"),
    }
}

fn extension(original: &str) -> Option<String> {
    // Clients on Windows send backslash-separated paths
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let ext = Path::new(base).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::utc;
    use std::collections::HashSet;

    fn split(name: &str) -> (&str, &str, Option<&str>) {
        let (stamp, rest) = name.split_once('-').unwrap();
        match rest.split_once('.') {
            Some((token, ext)) => (stamp, token, Some(ext)),
            None => (stamp, rest, None),
        }
    }

    #[test]
    fn timestamp_token_and_lowercased_extension() {
        let name = generate_photo_filename("IMG_0042.JPG", utc(2025, 2, 14, 18, 0));
        let (stamp, token, ext) = split(&name);

        assert_eq!(stamp, "20250214180000");
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(ext, Some("jpg"));
    }

    #[test]
    fn only_last_extension_is_kept() {
        let name = generate_photo_filename("archive.tar.GZ", utc(2025, 1, 1, 0, 0));
        assert!(name.ends_with(".gz"));
        assert!(!name.contains("tar"));
    }

    #[test]
    fn no_extension() {
        let name = generate_photo_filename("README", utc(2025, 1, 1, 0, 0));
        assert_eq!(split(&name).2, None);
        assert!(!name.contains('.'));
    }

    #[test]
    fn client_directories_are_ignored() {
        let name = generate_photo_filename(r"C:\Users\me\Pictures\beach.Png", utc(2025, 1, 1, 0, 0));
        assert!(name.ends_with(".png"));
        let name = generate_photo_filename("../../etc/passwd", utc(2025, 1, 1, 0, 0));
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn unsafe_extension_is_dropped() {
        let name = generate_photo_filename("photo.jp g", utc(2025, 1, 1, 0, 0));
        assert!(!name.contains('.'));
        let name = generate_photo_filename("dotfile.", utc(2025, 1, 1, 0, 0));
        assert!(!name.contains('.'));
    }

    #[test]
    fn encoded_name_uses_format_extension() {
        let name = generate_encoded_filename(ImageFormat::Jpeg, utc(2025, 2, 14, 18, 0));
        let (stamp, token, ext) = split(&name);
        assert_eq!(stamp, "20250214180000");
        assert_eq!(token.len(), 32);
        assert_eq!(ext, Some("jpg"));
    }

    #[test]
    fn same_second_names_differ() {
        let now = utc(2025, 2, 14, 18, 0);
        let names: HashSet<String> = (0..1000)
            .map(|_| generate_photo_filename("a.jpg", now))
            .collect();
        assert_eq!(names.len(), 1000);
    }
}
