//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The primary display for every entity is its identity (title, slug, or
//! caption), with storage details as indented context lines. Output reads as
//! a catalogue inventory while still letting users trace rows back to files.
//!
//! # Output Format
//!
//! ## Album list
//!
//! ```text
//! 001 Summer Roadtrip [summer-roadtrip]
//!     Created: Feb 14, 2025 18:00 UTC
//!     Description: West coast, two weeks
//! ```
//!
//! ## Album detail
//!
//! ```text
//! Summer Roadtrip [summer-roadtrip]
//!     URL: /albums/summer-roadtrip
//!     Cover: #3
//! Photos (2)
//! 001 #3 Golden Gate at dusk
//!     URL: /uploads/summer-roadtrip/20250214180000-9f2c….jpg
//!     Taken: Feb 14, 2025 18:00 UTC
//! 002 #4 20250215090000-1a2b….jpg
//!     URL: /uploads/summer-roadtrip/20250215090000-1a2b….jpg
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and the binary prints the lines. Format functions are pure:
//! no I/O, no side effects.

use crate::check::CheckReport;
use crate::imaging::SanitizeReport;
use crate::ingest::Uploaded;
use crate::routes;
use crate::storage::{Album, Photo};
use chrono::{DateTime, Utc};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// `Jan 2, 2006 15:04 UTC`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M UTC").to_string()
}

fn album_title_line(album: &Album) -> String {
    format!("{} [{}]", album.title, album.slug)
}

// ============================================================================
// Albums
// ============================================================================

pub fn format_album_list(albums: &[Album]) -> Vec<String> {
    if albums.is_empty() {
        return vec!["No albums yet".to_string()];
    }
    let mut lines = Vec::new();
    for (i, album) in albums.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), album_title_line(album)));
        lines.push(format!(
            "{}Created: {}",
            indent(1),
            format_timestamp(album.created_at)
        ));
        if !album.description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(&album.description, 60)
            ));
        }
    }
    lines
}

pub fn format_album_detail(album: &Album, photos: &[Photo]) -> Vec<String> {
    let mut lines = vec![album_title_line(album)];
    lines.push(format!("{}URL: {}", indent(1), routes::album_path(&album.slug)));
    if !album.description.is_empty() {
        lines.push(format!("{}Description: {}", indent(1), album.description));
    }
    if let Some(cover) = album.cover_photo_id {
        lines.push(format!("{}Cover: #{cover}", indent(1)));
    }
    lines.push(format!("{}Created: {}", indent(1), format_timestamp(album.created_at)));
    if album.updated_at != album.created_at {
        lines.push(format!("{}Updated: {}", indent(1), format_timestamp(album.updated_at)));
    }

    lines.push(format!("Photos ({})", photos.len()));
    for (i, photo) in photos.iter().enumerate() {
        lines.push(format!(
            "{} #{} {}",
            format_index(i + 1),
            photo.id,
            routes::display_name(photo)
        ));
        lines.push(format!("{}URL: {}", indent(1), routes::photo_url(&photo.filename)));
        if let Some(taken_at) = photo.taken_at {
            lines.push(format!("{}Taken: {}", indent(1), format_timestamp(taken_at)));
        }
    }
    lines
}

/// One-line confirmation after a create/update/cover change.
pub fn format_album_saved(action: &str, album: &Album) -> Vec<String> {
    vec![
        format!("{action} {}", album_title_line(album)),
        format!("{}URL: {}", indent(1), routes::album_path(&album.slug)),
    ]
}

pub fn format_album_deleted(album: &Album) -> Vec<String> {
    vec![format!("Deleted {} and its photos", album_title_line(album))]
}

// ============================================================================
// Photos
// ============================================================================

pub fn format_upload(uploaded: &Uploaded) -> Vec<String> {
    let photo = &uploaded.photo;
    let mut lines = vec![
        format!("Uploaded #{} {}", photo.id, routes::display_name(photo)),
        format!("{}URL: {}", indent(1), uploaded.url),
    ];
    if let Some(taken_at) = photo.taken_at {
        lines.push(format!("{}Taken: {}", indent(1), format_timestamp(taken_at)));
    }
    match uploaded.sanitized {
        SanitizeReport::PassedThrough => {
            lines.push(format!("{}Sanitized: stored as uploaded", indent(1)));
        }
        SanitizeReport::Rewritten {
            orientation,
            had_location,
            had_device_info,
        } => {
            let mut removed = Vec::new();
            if had_location {
                removed.push("location");
            }
            if had_device_info {
                removed.push("device info");
            }
            let removed = if removed.is_empty() {
                "metadata".to_string()
            } else {
                removed.join(", ")
            };
            lines.push(format!(
                "{}Sanitized: orientation {} applied, {} removed",
                indent(1),
                orientation.exif_value(),
                removed
            ));
        }
    }
    lines.push(format!("{}Next: {}", indent(1), uploaded.next));
    lines
}

pub fn format_photo_deleted(photo: &Photo) -> Vec<String> {
    vec![format!(
        "Deleted #{} {}",
        photo.id,
        routes::display_name(photo)
    )]
}

// ============================================================================
// Consistency check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {} albums, {} photos, {} files",
        report.albums, report.photos, report.files
    )];
    if report.is_clean() {
        lines.push("Store and uploads directory agree".to_string());
        return lines;
    }
    if !report.missing.is_empty() {
        lines.push(format!("Missing files ({})", report.missing.len()));
        for missing in &report.missing {
            lines.push(format!(
                "{}#{} {} (album {})",
                indent(1),
                missing.photo_id,
                missing.filename,
                missing.album_slug
            ));
        }
    }
    if !report.orphans.is_empty() {
        lines.push(format!("Orphan files ({})", report.orphans.len()));
        for orphan in &report.orphans {
            lines.push(format!("{}{orphan}", indent(1)));
        }
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
