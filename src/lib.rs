//! # Memories
//!
//! A small personal photo catalogue. Photos are organized into albums with
//! URL-safe slugs; album and photo metadata live in SQLite, uploaded files
//! live on disk under one directory per album.
//!
//! # Architecture
//!
//! ```text
//!              ┌────────────┐
//!   CLI ──────►│  ingest    │──► slug        (album creation)
//!              │  Pipeline  │──► imaging     (sanitize JPEG uploads)
//!              └─────┬──────┘──► uploads dir (write, roll back on failure)
//!                    ▼
//!              ┌────────────┐
//!              │  storage   │  AlbumRepository / PhotoRepository over SQLite
//!              └────────────┘
//! ```
//!
//! The store is opened once and handed to everything that needs it; there is
//! no global connection. Repositories and the sanitizer are traits, so the
//! pipeline can be exercised against failing or recording doubles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`slug`] | Derive slugs from titles, validate explicit ones |
//! | [`storage`] | Album/photo types, repository traits, SQLite implementation |
//! | [`imaging`] | Upload sanitizer: EXIF orientation, metadata stripping |
//! | [`ingest`] | Upload pipeline with file rollback, album orchestration |
//! | [`routes`] | Stable URL contracts (`/uploads/<slug>/<file>`, `/albums/<slug>/edit`) |
//! | [`check`] | Audit uploads directory against the database |
//! | [`config`] | Layered `config.toml` + environment configuration |
//! | [`logging`] | Tracing subscriber setup |
//! | [`output`] | CLI output formatting |
//! | [`error`] | Coarse error classification shared by all layers |
//!
//! # Design Decisions
//!
//! ## Sanitize Before Write
//!
//! JPEG uploads are decoded, rotated upright according to their EXIF
//! orientation, and re-encoded from pixels before anything touches disk.
//! The encoder never sees the original metadata, so location, camera
//! identifiers, and embedded thumbnails cannot survive, and the raw upload is
//! never reachable at a public URL, not even briefly.
//!
//! ## Compensating Rollback
//!
//! The filesystem and the database cannot share a transaction. An upload
//! writes its file, then inserts the row; the file is held by a drop guard
//! until the insert commits, so every early return removes it. Cleanup
//! failures are logged and never mask the error that caused them.
//!
//! ## Single Writer
//!
//! One SQLite connection behind a mutex, each mutation in an immediate
//! transaction. Uniqueness violations surface as `Conflict`, never as a
//! generic engine error.

pub mod check;
pub mod config;
pub mod error;
pub mod imaging;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod routes;
pub mod slug;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
