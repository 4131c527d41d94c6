//! Photo repository over SQLite.

use super::{NewPhoto, Photo, PhotoRepository, StorageError, Store};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const PHOTO_COLUMNS: &str = "id, album_id, filename, caption, taken_at, created_at, updated_at";

pub struct SqlitePhotos<'a> {
    store: &'a Store,
}

impl<'a> SqlitePhotos<'a> {
    pub(super) fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        album_id: row.get(1)?,
        filename: row.get(2)?,
        caption: row.get(3)?,
        taken_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn fetch_by_id(conn: &Connection, id: i64) -> Result<Photo, StorageError> {
    conn.query_row(
        &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
        [id],
        photo_from_row,
    )
    .optional()?
    .ok_or(StorageError::NotFound("photo"))
}

impl PhotoRepository for SqlitePhotos<'_> {
    fn create(&self, input: &NewPhoto) -> Result<Photo, StorageError> {
        let now = Utc::now();
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO photos (album_id, filename, caption, taken_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![input.album_id, input.filename, input.caption, input.taken_at, now],
            )?;
            let photo = fetch_by_id(&tx, tx.last_insert_rowid())?;
            tx.commit()?;
            Ok(photo)
        })
    }

    fn get_by_id(&self, id: i64) -> Result<Photo, StorageError> {
        self.store.with_conn(|conn| fetch_by_id(conn, id))
    }

    fn list_by_album(&self, album_id: i64) -> Result<Vec<Photo>, StorageError> {
        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PHOTO_COLUMNS} FROM photos
                 WHERE album_id = ?1
                 ORDER BY taken_at IS NULL, taken_at, created_at, id"
            ))?;
            let photos = stmt
                .query_map([album_id], photo_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(photos)
        })
    }

    fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if tx.execute("DELETE FROM photos WHERE id = ?1", [id])? == 0 {
                return Err(StorageError::NotFound("photo"));
            }
            // An album must never keep pointing at a photo that is gone.
            tx.execute(
                "UPDATE albums SET cover_photo_id = NULL, updated_at = ?1 WHERE cover_photo_id = ?2",
                params![Utc::now(), id],
            )?;
            tx.commit()?;
            Ok(())
        })?;

        tracing::info!(photo_id = id, "photo deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{seed_album, seed_photo, utc};

    #[test]
    fn create_and_fetch() {
        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");

        let photo = store
            .photos()
            .create(&NewPhoto {
                album_id: album.id,
                filename: "trip/a.jpg".into(),
                caption: "Dusk".into(),
                taken_at: Some(utc(2025, 2, 14, 18, 0)),
            })
            .unwrap();

        assert_eq!(photo.album_id, album.id);
        assert_eq!(photo.caption, "Dusk");
        assert_eq!(photo.taken_at, Some(utc(2025, 2, 14, 18, 0)));
        assert_eq!(store.photos().get_by_id(photo.id).unwrap(), photo);
    }

    #[test]
    fn duplicate_filename_in_album_is_conflict() {
        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");
        seed_photo(&store, album.id, "trip/a.jpg", None);

        let err = store
            .photos()
            .create(&NewPhoto {
                album_id: album.id,
                filename: "trip/a.jpg".into(),
                caption: String::new(),
                taken_at: None,
            })
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[test]
    fn same_filename_in_different_albums_is_allowed() {
        let store = Store::open_in_memory().unwrap();
        let a = seed_album(&store, "a");
        let b = seed_album(&store, "b");

        seed_photo(&store, a.id, "shared.jpg", None);
        seed_photo(&store, b.id, "shared.jpg", None);
    }

    #[test]
    fn create_for_missing_album_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .photos()
            .create(&NewPhoto {
                album_id: 404,
                filename: "x.jpg".into(),
                caption: String::new(),
                taken_at: None,
            })
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_orders_dated_ascending_then_undated() {
        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");
        let t1 = utc(2024, 5, 1, 9, 0);
        let t2 = utc(2024, 6, 1, 9, 0);

        let later = seed_photo(&store, album.id, "trip/t2.jpg", Some(t2));
        let undated = seed_photo(&store, album.id, "trip/none.jpg", None);
        let earlier = seed_photo(&store, album.id, "trip/t1.jpg", Some(t1));

        let ids: Vec<i64> = store
            .photos()
            .list_by_album(album.id)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![earlier.id, later.id, undated.id]);
    }

    #[test]
    fn undated_photos_keep_insertion_order() {
        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");
        let first = seed_photo(&store, album.id, "trip/1.jpg", None);
        let second = seed_photo(&store, album.id, "trip/2.jpg", None);
        let third = seed_photo(&store, album.id, "trip/3.jpg", None);

        let ids: Vec<i64> = store
            .photos()
            .list_by_album(album.id)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn list_only_returns_own_album() {
        let store = Store::open_in_memory().unwrap();
        let a = seed_album(&store, "a");
        let b = seed_album(&store, "b");
        seed_photo(&store, a.id, "a/1.jpg", None);
        seed_photo(&store, b.id, "b/1.jpg", None);

        let photos = store.photos().list_by_album(a.id).unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].filename, "a/1.jpg");
    }

    #[test]
    fn delete_then_missing() {
        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");
        let photo = seed_photo(&store, album.id, "trip/1.jpg", None);

        store.photos().delete(photo.id).unwrap();

        assert!(store.photos().get_by_id(photo.id).unwrap_err().is_not_found());
        assert!(store.photos().delete(photo.id).unwrap_err().is_not_found());
    }

    #[test]
    fn deleting_other_photo_keeps_cover() {
        use crate::storage::AlbumRepository;

        let store = Store::open_in_memory().unwrap();
        let album = seed_album(&store, "trip");
        let cover = seed_photo(&store, album.id, "trip/cover.jpg", None);
        let other = seed_photo(&store, album.id, "trip/other.jpg", None);
        store.albums().set_cover_photo(album.id, cover.id).unwrap();

        store.photos().delete(other.id).unwrap();

        assert_eq!(
            store.albums().get_by_id(album.id).unwrap().cover_photo_id,
            Some(cover.id)
        );
    }
}
