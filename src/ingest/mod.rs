//! Ingestion: turning user input into catalogue state.
//!
//! [`Pipeline`] is the orchestrator the front end talks to. It owns no state
//! of its own; the repositories, the sanitizer, and the uploads directory are
//! handed in at construction.
//!
//! ## Upload
//!
//! ```text
//! resolve album ──► require file ──► sanitize ──► name file ──► ensure dir
//!                                                                   │
//!        persisted ◄── insert row ◄── parse caption/taken_at ◄── write
//!                           │                 │
//!                           └──── on error ───┴──► file removed, error returned
//! ```
//!
//! Sanitizing happens before the write, so the only bytes that ever touch
//! the uploads directory are the cleaned ones. Once the file exists it is
//! held by a [`PendingFile`] guard until the row commits; any failure in
//! between drops the guard and removes the file. Cleanup problems are
//! logged and never replace the error that triggered them.

mod cleanup;
pub mod filename;

pub use cleanup::{PendingFile, remove_best_effort};

use crate::error::ErrorKind;
use crate::imaging::{ImageSanitizer, SanitizeError, SanitizeReport};
use crate::routes;
use crate::slug::{self, SlugError};
use crate::storage::{
    Album, AlbumRepository, AlbumUpdate, NewAlbum, NewPhoto, Photo, PhotoRepository, StorageError,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Accepted capture-time form, as sent by a `datetime-local` input.
pub const TAKEN_AT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("album '{0}' not found")]
    AlbumNotFound(String),
    #[error("photo {0} not found")]
    PhotoNotFound(i64),
    #[error("no file was uploaded")]
    MissingFile,
    #[error("invalid capture time '{0}', expected YYYY-MM-DDTHH:MM")]
    InvalidCaptureTime(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    InvalidSlug(#[from] SlugError),
    #[error("title is required")]
    MissingTitle,
    #[error("an album with slug '{0}' already exists")]
    DuplicateSlug(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image encoding failed: {0}")]
    Encode(String),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::AlbumNotFound(_) | IngestError::PhotoNotFound(_) => ErrorKind::NotFound,
            IngestError::DuplicateSlug(_) => ErrorKind::Conflict,
            IngestError::MissingFile
            | IngestError::InvalidCaptureTime(_)
            | IngestError::InvalidImage(_)
            | IngestError::InvalidSlug(_)
            | IngestError::MissingTitle => ErrorKind::InvalidInput,
            IngestError::Storage(e) => e.kind(),
            IngestError::Io { .. } | IngestError::Encode(_) => ErrorKind::Internal,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<SanitizeError> for IngestError {
    fn from(err: SanitizeError) -> Self {
        match err {
            SanitizeError::InvalidImage(msg) => IngestError::InvalidImage(msg),
            SanitizeError::EncodeFailed(msg) => IngestError::Encode(msg),
        }
    }
}

/// Input for creating an album. Blank `slug` means derive it from `title`.
#[derive(Debug, Clone, Default)]
pub struct AlbumDraft {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Input for editing an album. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct AlbumEdit {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// The uploaded file as the client sent it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-side filename; only its extension is used.
    pub original_name: String,
    /// Declared MIME type, when the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// One upload submission.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub album_slug: String,
    pub file: Option<UploadFile>,
    pub caption: Option<String>,
    /// `YYYY-MM-DDTHH:MM`, read as UTC.
    pub taken_at: Option<String>,
}

/// A committed upload.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub album: Album,
    pub photo: Photo,
    /// Public URL of the stored file.
    pub url: String,
    /// Where the submitter goes next: the album's edit page.
    pub next: String,
    pub sanitized: SanitizeReport,
}

/// Orchestrates album and photo changes that span more than one store call
/// or touch the uploads directory.
pub struct Pipeline<'a> {
    albums: &'a dyn AlbumRepository,
    photos: &'a dyn PhotoRepository,
    sanitizer: &'a dyn ImageSanitizer,
    uploads_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        albums: &'a dyn AlbumRepository,
        photos: &'a dyn PhotoRepository,
        sanitizer: &'a dyn ImageSanitizer,
        uploads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            albums,
            photos,
            sanitizer,
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Look up an album by slug, reporting absence as
    /// [`IngestError::AlbumNotFound`].
    pub fn find_album(&self, slug: &str) -> Result<Album, IngestError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(IngestError::AlbumNotFound(String::new()));
        }
        self.albums.get_by_slug(slug).map_err(|e| match e {
            StorageError::NotFound(_) => IngestError::AlbumNotFound(slug.to_string()),
            other => IngestError::Storage(other),
        })
    }

    /// An album and its photos in display order.
    pub fn album_with_photos(&self, slug: &str) -> Result<(Album, Vec<Photo>), IngestError> {
        let album = self.find_album(slug)?;
        let photos = self.photos.list_by_album(album.id)?;
        Ok((album, photos))
    }

    pub fn create_album(&self, draft: &AlbumDraft) -> Result<Album, IngestError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(IngestError::MissingTitle);
        }
        let explicit = draft.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let slug = slug::resolve_slug(title, explicit)?;

        let input = NewAlbum {
            slug: slug.clone(),
            title: title.to_string(),
            description: trimmed(draft.description.as_deref()),
        };
        self.albums.create(&input).map_err(|e| match e {
            StorageError::Conflict(_) => IngestError::DuplicateSlug(slug),
            other => IngestError::Storage(other),
        })
    }

    pub fn update_album(&self, slug: &str, edit: &AlbumEdit) -> Result<Album, IngestError> {
        let album = self.find_album(slug)?;
        let title = match edit.title.as_deref().map(str::trim) {
            Some("") => return Err(IngestError::MissingTitle),
            other => other.map(str::to_string),
        };
        let update = AlbumUpdate {
            title,
            description: edit.description.as_deref().map(|d| d.trim().to_string()),
        };
        Ok(self.albums.update(album.id, &update)?)
    }

    /// Delete the album (photos cascade), then its upload directory.
    pub fn delete_album(&self, slug: &str) -> Result<Album, IngestError> {
        let album = self.find_album(slug)?;
        self.albums.delete(album.id)?;

        if let Some(dir) = routes::disk_path(&self.uploads_dir, &album.slug) {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    slug = %album.slug,
                    dir = %dir.display(),
                    error = %e,
                    "failed to remove album upload directory"
                ),
            }
        }
        Ok(album)
    }

    pub fn set_cover(&self, slug: &str, photo_id: i64) -> Result<Album, IngestError> {
        let album = self.find_album(slug)?;
        self.albums
            .set_cover_photo(album.id, photo_id)
            .map_err(|e| match e {
                StorageError::NotFound("photo") => IngestError::PhotoNotFound(photo_id),
                other => IngestError::Storage(other),
            })?;
        Ok(self.albums.get_by_id(album.id)?)
    }

    pub fn clear_cover(&self, slug: &str) -> Result<Album, IngestError> {
        let album = self.find_album(slug)?;
        self.albums.clear_cover_photo(album.id)?;
        Ok(self.albums.get_by_id(album.id)?)
    }

    /// Delete the photo row, then its file.
    pub fn delete_photo(&self, id: i64) -> Result<Photo, IngestError> {
        let not_found = |e: StorageError| match e {
            StorageError::NotFound(_) => IngestError::PhotoNotFound(id),
            other => IngestError::Storage(other),
        };
        let photo = self.photos.get_by_id(id).map_err(not_found)?;
        self.photos.delete(id).map_err(not_found)?;

        if let Some(path) = routes::disk_path(&self.uploads_dir, &photo.filename) {
            remove_best_effort(&path);
        }
        Ok(photo)
    }

    /// Ingest one uploaded photo. See the module docs for the step order.
    pub fn upload(&self, request: UploadRequest) -> Result<Uploaded, IngestError> {
        let album = self.find_album(&request.album_slug)?;

        let file = match request.file {
            Some(file) if !file.bytes.is_empty() => file,
            _ => return Err(IngestError::MissingFile),
        };

        let declared = file
            .content_type
            .as_deref()
            .map(str::to_string)
            .or_else(|| extension_of(&file.original_name));
        let sanitized = self.sanitizer.sanitize(file.bytes, declared.as_deref())?;

        let now = Utc::now();
        let filename = match (sanitized.report, sanitized.format) {
            (SanitizeReport::Rewritten { .. }, Some(format)) => {
                filename::generate_encoded_filename(format, now)
            }
            _ => filename::generate_photo_filename(&file.original_name, now),
        };
        let album_dir = self.uploads_dir.join(&album.slug);
        std::fs::create_dir_all(&album_dir).map_err(|e| IngestError::io(&album_dir, e))?;

        let disk_path = album_dir.join(&filename);
        let pending = PendingFile::write(&disk_path, &sanitized.bytes)
            .map_err(|e| IngestError::io(&disk_path, e))?;

        let stored = routes::stored_path(&album.slug, &filename);
        let photo = match self.record(
            &album,
            &stored,
            request.caption.as_deref(),
            request.taken_at.as_deref(),
        ) {
            Ok(photo) => photo,
            Err(e) => {
                tracing::warn!(
                    album_id = album.id,
                    filename = %stored,
                    error = %e,
                    "upload failed after write, removing file"
                );
                return Err(e);
            }
        };
        pending.keep();

        tracing::info!(
            album_id = album.id,
            slug = %album.slug,
            photo_id = photo.id,
            filename = %stored,
            "photo uploaded"
        );

        Ok(Uploaded {
            url: routes::photo_url(&photo.filename),
            next: routes::album_edit_path(&album.slug),
            album,
            photo,
            sanitized: sanitized.report,
        })
    }

    /// Parse the form fields and insert the row.
    fn record(
        &self,
        album: &Album,
        stored: &str,
        caption: Option<&str>,
        taken_at: Option<&str>,
    ) -> Result<Photo, IngestError> {
        let taken_at = parse_taken_at(taken_at)?;
        let input = NewPhoto {
            album_id: album.id,
            filename: stored.to_string(),
            caption: trimmed(caption),
            taken_at,
        };
        Ok(self.photos.create(&input)?)
    }
}

/// Parse an optional `YYYY-MM-DDTHH:MM` capture time as UTC. Blank means
/// absent.
pub fn parse_taken_at(value: Option<&str>) -> Result<Option<DateTime<Utc>>, IngestError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(value, TAKEN_AT_FORMAT)
        .map(|naive| Some(Utc.from_utc_datetime(&naive)))
        .map_err(|_| IngestError::InvalidCaptureTime(value.to_string()))
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
}
