//! Album and photo persistence.
//!
//! The [`AlbumRepository`] and [`PhotoRepository`] traits are the only way
//! the rest of the crate reads or mutates catalogue rows. The production
//! implementation is SQLite ([`Store`]); tests swap in doubles at the same
//! seam.
//!
//! ## Model
//!
//! Albums and photos live in separate tables keyed by integer ID. A photo
//! points at its owning album (`album_id`, cascade on delete); an album may
//! point back at one of its photos as its cover (`cover_photo_id`). The back
//! pointer is a plain nullable ID, not a nested value. Ownership is checked
//! when the cover is set and the pointer is cleared when the cover photo is
//! deleted, so it can never reference a photo from another album.
//!
//! ## Errors
//!
//! [`StorageError`] keeps the three outcomes callers care about apart:
//! missing entity ([`StorageError::NotFound`]), uniqueness violation
//! ([`StorageError::Conflict`]), and everything else (engine or I/O failure).
//! Use [`StorageError::kind`] to branch without matching every variant.

mod albums;
mod photos;
pub mod sqlite;

pub use albums::SqliteAlbums;
pub use photos::SqlitePhotos;
pub use sqlite::Store;

use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use rusqlite::ffi;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store path must not be empty")]
    EmptyPath,
    #[error("store lock poisoned by a panicked writer")]
    Poisoned,
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::Conflict(_) => ErrorKind::Conflict,
            StorageError::Sqlite(_)
            | StorageError::Io(_)
            | StorageError::EmptyPath
            | StorageError::Poisoned => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

/// Constraint violations are classified here so every `?` on a rusqlite
/// call reports duplicates as `Conflict` and a missing parent album as
/// `NotFound`.
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    let detail = message
                        .clone()
                        .unwrap_or_else(|| "unique constraint violated".to_string());
                    return StorageError::Conflict(detail);
                }
                // photos.album_id is the only foreign key in the schema
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return StorageError::NotFound("album"),
                _ => {}
            }
        }
        StorageError::Sqlite(err)
    }
}

/// A named, slugged collection of photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Empty when the album has no description.
    pub description: String,
    pub cover_photo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert an album. The slug must already be validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAlbum {
    pub slug: String,
    pub title: String,
    pub description: String,
}

/// Mutable album fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AlbumUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// A single stored image, owned by exactly one album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: i64,
    pub album_id: i64,
    /// Storage-relative path, `<album-slug>/<generated-name>`.
    pub filename: String,
    /// Empty when the photo has no caption.
    pub caption: String,
    pub taken_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub album_id: i64,
    pub filename: String,
    pub caption: String,
    pub taken_at: Option<DateTime<Utc>>,
}

/// Album persistence operations.
///
/// Every mutating call is atomic: concurrent callers never observe a
/// half-applied change.
pub trait AlbumRepository: Sync {
    /// Insert an album. A taken slug is [`StorageError::Conflict`].
    fn create(&self, input: &NewAlbum) -> Result<Album, StorageError>;

    fn get_by_id(&self, id: i64) -> Result<Album, StorageError>;

    fn get_by_slug(&self, slug: &str) -> Result<Album, StorageError>;

    /// Newest first; albums created in the same instant are ordered by
    /// descending ID.
    fn list(&self) -> Result<Vec<Album>, StorageError>;

    /// Apply the set fields. An update with nothing set, or with values equal
    /// to the stored ones, returns the current row without touching
    /// `updated_at`. A resubmitted edit form that changes nothing therefore
    /// leaves the album's modification time alone, even though fields were
    /// supplied.
    fn update(&self, id: i64, input: &AlbumUpdate) -> Result<Album, StorageError>;

    /// Remove the album and, by cascade, all of its photos.
    fn delete(&self, id: i64) -> Result<(), StorageError>;

    /// Point the album's cover at `photo_id`. A photo owned by a different
    /// album is reported as [`StorageError::NotFound`].
    fn set_cover_photo(&self, album_id: i64, photo_id: i64) -> Result<(), StorageError>;

    /// Null the cover pointer. Succeeds when it is already null.
    fn clear_cover_photo(&self, album_id: i64) -> Result<(), StorageError>;
}

/// Photo persistence operations.
pub trait PhotoRepository: Sync {
    /// Insert a photo. A duplicate `(album_id, filename)` is
    /// [`StorageError::Conflict`]; an unknown album is
    /// [`StorageError::NotFound`].
    fn create(&self, input: &NewPhoto) -> Result<Photo, StorageError>;

    fn get_by_id(&self, id: i64) -> Result<Photo, StorageError>;

    /// Dated photos first, ascending by capture time, then undated ones;
    /// ties fall back to insertion time and then ID.
    fn list_by_album(&self, album_id: i64) -> Result<Vec<Photo>, StorageError>;

    /// Remove the row. The backing file is left for the caller.
    fn delete(&self, id: i64) -> Result<(), StorageError>;
}
