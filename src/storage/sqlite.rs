//! SQLite store: opening, connection settings, and schema.
//!
//! A [`Store`] owns a single connection behind a mutex. That is the whole
//! concurrency story: one writer at a time, each mutation inside its own
//! transaction, and no lock held across anything but the SQLite call itself.
//! The store is constructed explicitly and passed to whatever needs it; there
//! is no global handle.

use super::{SqliteAlbums, SqlitePhotos, StorageError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Idempotent schema. Safe to run on every open.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS albums (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    slug            TEXT NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    cover_photo_id  INTEGER,
    created_at      DATETIME NOT NULL,
    updated_at      DATETIME NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id        INTEGER NOT NULL,
    filename        TEXT NOT NULL,
    caption         TEXT NOT NULL DEFAULT '',
    taken_at        DATETIME,
    created_at      DATETIME NOT NULL,
    updated_at      DATETIME NOT NULL,
    FOREIGN KEY(album_id) REFERENCES albums(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_albums_slug ON albums(slug);
CREATE INDEX IF NOT EXISTS idx_photos_album_id ON photos(album_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_photos_album_filename ON photos(album_id, filename);
"#;

/// SQLite-backed catalogue. Safe to share between threads.
pub struct Store {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open (or create) the database at `path`, creating parent directories
    /// as needed and ensuring the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StorageError::EmptyPath);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self::init(conn, path.to_path_buf())?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(store)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, path: PathBuf) -> Result<Self, StorageError> {
        configure(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn albums(&self) -> SqliteAlbums<'_> {
        SqliteAlbums::new(self)
    }

    pub fn photos(&self) -> SqlitePhotos<'_> {
        SqlitePhotos::new(self)
    }

    /// Location of the database file (`:memory:` for in-memory stores).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that the engine still answers queries.
    pub fn ping(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut conn)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

fn configure(conn: &Connection) -> Result<(), StorageError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // journal_mode answers with the resulting mode ("memory" for in-memory
    // databases), so it has to be read back rather than executed.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(())
}
