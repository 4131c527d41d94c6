//! Public URL and path contracts.
//!
//! Other components build links from these, so the shapes are stable:
//!
//! | Target | Path |
//! |---|---|
//! | Stored photo | `/uploads/<album-slug>/<filename>` |
//! | Album page | `/albums/<slug>` |
//! | Album edit page (upload redirect target) | `/albums/<slug>/edit` |
//!
//! Stored photo paths are relative (`<album-slug>/<filename>`) and are
//! normalized before they reach a URL or the filesystem, so a crafted row
//! can never point outside the uploads directory.

use crate::storage::Photo;
use std::path::{Path, PathBuf};

pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Normalize a stored relative path: backslashes become `/`, `.` and empty
/// segments vanish, and `..` cannot climb above the root.
pub fn clean_relative(rel: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in rel.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Public URL for a stored photo path.
pub fn photo_url(rel: &str) -> String {
    format!("{UPLOADS_PREFIX}{}", clean_relative(rel))
}

/// The storage-relative path recorded for a newly written file.
pub fn stored_path(slug: &str, filename: &str) -> String {
    format!("{slug}/{filename}")
}

pub fn album_path(slug: &str) -> String {
    format!("/albums/{slug}")
}

pub fn album_edit_path(slug: &str) -> String {
    format!("/albums/{slug}/edit")
}

/// Location of a stored photo inside `uploads_dir`.
///
/// `None` when the stored path normalizes to nothing.
pub fn disk_path(uploads_dir: &Path, rel: &str) -> Option<PathBuf> {
    let clean = clean_relative(rel);
    if clean.is_empty() {
        return None;
    }
    Some(clean.split('/').fold(uploads_dir.to_path_buf(), |p, s| p.join(s)))
}

/// Basename of a stored path.
pub fn file_name(rel: &str) -> String {
    clean_relative(rel)
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Caption, or the stored file's basename when the caption is blank.
pub fn display_name(photo: &Photo) -> String {
    let caption = photo.caption.trim();
    if caption.is_empty() {
        file_name(&photo.filename)
    } else {
        caption.to_string()
    }
}
