//! Consistency audit between the uploads directory and the store.
//!
//! Uploads keep disk and database in step through rollback, but a crash,
//! a manual copy, or a failed best-effort removal can still leave them
//! apart. The audit reports both directions:
//!
//! - **Orphan**: a file under the uploads directory with no photo row
//! - **Missing**: a photo row whose file is not on disk
//!
//! It only reads. Deciding what to delete is left to the operator.

use crate::routes;
use crate::storage::{AlbumRepository, PhotoRepository, StorageError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to walk uploads directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A photo row whose file is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFile {
    pub photo_id: i64,
    pub album_slug: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub albums: usize,
    pub photos: usize,
    pub files: usize,
    /// Relative paths, `/`-separated, sorted.
    pub orphans: Vec<String>,
    pub missing: Vec<MissingFile>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.missing.is_empty()
    }
}

/// Audit every album's photos against the files under `uploads_dir`.
pub fn audit(
    albums: &dyn AlbumRepository,
    photos: &dyn PhotoRepository,
    uploads_dir: &Path,
) -> Result<CheckReport, CheckError> {
    let on_disk = files_under(uploads_dir)?;
    let mut report = CheckReport {
        files: on_disk.len(),
        ..CheckReport::default()
    };

    let mut referenced = BTreeSet::new();
    for album in albums.list()? {
        report.albums += 1;
        for photo in photos.list_by_album(album.id)? {
            report.photos += 1;
            let rel = routes::clean_relative(&photo.filename);
            if !on_disk.contains(&rel) {
                report.missing.push(MissingFile {
                    photo_id: photo.id,
                    album_slug: album.slug.clone(),
                    filename: photo.filename.clone(),
                });
            }
            referenced.insert(rel);
        }
    }

    report.orphans = on_disk.difference(&referenced).cloned().collect();

    tracing::info!(
        albums = report.albums,
        photos = report.photos,
        files = report.files,
        orphans = report.orphans.len(),
        missing = report.missing.len(),
        "consistency check finished"
    );
    Ok(report)
}

fn files_under(dir: &Path) -> Result<BTreeSet<String>, CheckError> {
    let mut files = BTreeSet::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let rel: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.insert(rel.join("/"));
    }
    Ok(files)
}
