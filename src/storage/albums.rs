//! Album repository over SQLite.

use super::{Album, AlbumRepository, AlbumUpdate, NewAlbum, StorageError, Store};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const ALBUM_COLUMNS: &str =
    "id, slug, title, description, cover_photo_id, created_at, updated_at";

pub struct SqliteAlbums<'a> {
    store: &'a Store,
}

impl<'a> SqliteAlbums<'a> {
    pub(super) fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cover_photo_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn fetch_by_id(conn: &Connection, id: i64) -> Result<Album, StorageError> {
    conn.query_row(
        &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE id = ?1"),
        [id],
        album_from_row,
    )
    .optional()?
    .ok_or(StorageError::NotFound("album"))
}

impl AlbumRepository for SqliteAlbums<'_> {
    fn create(&self, input: &NewAlbum) -> Result<Album, StorageError> {
        let now = Utc::now();
        let album = self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO albums (slug, title, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![input.slug, input.title, input.description, now],
            )?;
            let album = fetch_by_id(&tx, tx.last_insert_rowid())?;
            tx.commit()?;
            Ok(album)
        })?;

        tracing::info!(album_id = album.id, slug = %album.slug, "album created");
        Ok(album)
    }

    fn get_by_id(&self, id: i64) -> Result<Album, StorageError> {
        self.store.with_conn(|conn| fetch_by_id(conn, id))
    }

    fn get_by_slug(&self, slug: &str) -> Result<Album, StorageError> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM albums WHERE slug = ?1"),
                [slug],
                album_from_row,
            )
            .optional()?
            .ok_or(StorageError::NotFound("album"))
        })
    }

    fn list(&self) -> Result<Vec<Album>, StorageError> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ALBUM_COLUMNS} FROM albums ORDER BY created_at DESC, id DESC"
            ))?;
            let albums = stmt
                .query_map([], album_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(albums)
        })
    }

    fn update(&self, id: i64, input: &AlbumUpdate) -> Result<Album, StorageError> {
        if input.is_empty() {
            return self.get_by_id(id);
        }

        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = fetch_by_id(&tx, id)?;

            let title = input.title.clone().unwrap_or_else(|| current.title.clone());
            let description = input
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone());
            if title == current.title && description == current.description {
                return Ok(current);
            }

            tx.execute(
                "UPDATE albums SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![title, description, Utc::now(), id],
            )?;
            let updated = fetch_by_id(&tx, id)?;
            tx.commit()?;

            tracing::info!(album_id = id, slug = %updated.slug, "album updated");
            Ok(updated)
        })
    }

    fn delete(&self, id: i64) -> Result<(), StorageError> {
        let removed = self
            .store
            .with_conn(|conn| Ok(conn.execute("DELETE FROM albums WHERE id = ?1", [id])?))?;
        if removed == 0 {
            return Err(StorageError::NotFound("album"));
        }
        tracing::info!(album_id = id, "album deleted");
        Ok(())
    }

    fn set_cover_photo(&self, album_id: i64, photo_id: i64) -> Result<(), StorageError> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let owned = tx
                .query_row(
                    "SELECT 1 FROM photos WHERE id = ?1 AND album_id = ?2",
                    [photo_id, album_id],
                    |_| Ok(()),
                )
                .optional()?;
            if owned.is_none() {
                return Err(StorageError::NotFound("photo"));
            }

            let changed = tx.execute(
                "UPDATE albums SET cover_photo_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![photo_id, Utc::now(), album_id],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound("album"));
            }
            tx.commit()?;
            Ok(())
        })?;

        tracing::info!(album_id, photo_id, "cover photo set");
        Ok(())
    }

    fn clear_cover_photo(&self, album_id: i64) -> Result<(), StorageError> {
        let changed = self.store.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE albums SET cover_photo_id = NULL, updated_at = ?1 WHERE id = ?2",
                params![Utc::now(), album_id],
            )?)
        })?;
        if changed == 0 {
            return Err(StorageError::NotFound("album"));
        }
        tracing::info!(album_id, "cover photo cleared");
        Ok(())
    }
}
