//! End-to-end tests over the public API: store on disk, real sanitizer,
//! real uploads directory.
//!
//! Run with: cargo test --test upload_pipeline

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use memories::error::ErrorKind;
use memories::imaging::exif::read_exif;
use memories::imaging::{ImageSanitizer, RustSanitizer, SanitizeReport};
use memories::ingest::{AlbumDraft, IngestError, Pipeline, UploadFile, UploadRequest};
use memories::storage::{
    AlbumRepository, NewPhoto, Photo, PhotoRepository, SqlitePhotos, StorageError, Store,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// JPEG of `width`×`height` with an EXIF block carrying `orientation` and a
/// GPS IFD pointer.
fn camera_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut plain = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40])))
        .write_with_encoder(JpegEncoder::new_with_quality(&mut plain, 90))
        .unwrap();

    // Big-endian TIFF, IFD0 at 8 with Orientation and GPS pointer
    let mut tiff = b"MM\0\x2a\0\0\0\x08\0\x02".to_vec();
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0, 0, 0, 1]);
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&[0x88, 0x25, 0x00, 0x04, 0, 0, 0, 1, 0, 0, 0, 0]);
    tiff.extend_from_slice(&[0, 0, 0, 0]);

    let mut body = b"Exif\0\0".to_vec();
    body.extend_from_slice(&tiff);
    let len = (body.len() + 2) as u16;

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&len.to_be_bytes());
    jpeg.extend_from_slice(&body);
    jpeg.extend_from_slice(&plain[2..]);
    jpeg
}

fn upload(slug: &str, name: &str, bytes: Vec<u8>) -> UploadRequest {
    UploadRequest {
        album_slug: slug.to_string(),
        file: Some(UploadFile {
            original_name: name.to_string(),
            content_type: None,
            bytes,
        }),
        caption: None,
        taken_at: None,
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

#[test]
fn upload_list_and_cascade_delete() {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(tmp.path().join("db/memories.db")).unwrap();
    let uploads = tmp.path().join("uploads");
    let (albums, photos) = (store.albums(), store.photos());
    let sanitizer = RustSanitizer::default();
    let pipeline = Pipeline::new(&albums, &photos, &sanitizer, &uploads);

    let album = pipeline
        .create_album(&AlbumDraft {
            title: "Summer Roadtrip".into(),
            ..AlbumDraft::default()
        })
        .unwrap();
    assert_eq!(album.slug, "summer-roadtrip");

    let mut late = upload("summer-roadtrip", "late.JPG", camera_jpeg(60, 30, 6));
    late.taken_at = Some("2025-02-14T18:00".into());
    late.caption = Some("Dusk".into());
    let late = pipeline.upload(late).unwrap();

    let mut early = upload("summer-roadtrip", "early.jpg", camera_jpeg(60, 30, 1));
    early.taken_at = Some("2025-02-13T07:30".into());
    let early = pipeline.upload(early).unwrap();

    let undated = pipeline
        .upload(upload("summer-roadtrip", "scan.jpeg", camera_jpeg(10, 10, 1)))
        .unwrap();

    assert_eq!(late.next, "/albums/summer-roadtrip/edit");
    assert_eq!(
        late.photo.taken_at.unwrap().to_rfc3339(),
        "2025-02-14T18:00:00+00:00"
    );
    assert!(matches!(late.sanitized, SanitizeReport::Rewritten { had_location: true, .. }));

    // Stored bytes are upright and carry no EXIF
    let stored = fs::read(uploads.join(&late.photo.filename)).unwrap();
    assert!(!read_exif(&stored).has_gps);
    let img = image::load_from_memory(&stored).unwrap();
    assert_eq!((img.width(), img.height()), (30, 60));

    let (_, listed) = pipeline.album_with_photos("summer-roadtrip").unwrap();
    let ids: Vec<i64> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![early.photo.id, late.photo.id, undated.photo.id]);
    assert_eq!(files_in(&uploads).len(), 3);

    pipeline.set_cover("summer-roadtrip", late.photo.id).unwrap();
    pipeline.delete_album("summer-roadtrip").unwrap();

    assert!(photos.list_by_album(album.id).unwrap().is_empty());
    for id in [early.photo.id, late.photo.id, undated.photo.id] {
        assert!(photos.get_by_id(id).unwrap_err().is_not_found());
    }
    assert!(files_in(&uploads).is_empty());
    assert!(albums.list().unwrap().is_empty());
}

/// Delegates to SQLite but fails every insert.
struct RejectingPhotos<'a>(SqlitePhotos<'a>);

impl PhotoRepository for RejectingPhotos<'_> {
    fn create(&self, input: &NewPhoto) -> Result<Photo, StorageError> {
        Err(StorageError::Conflict(format!("{} rejected", input.filename)))
    }
    fn get_by_id(&self, id: i64) -> Result<Photo, StorageError> {
        self.0.get_by_id(id)
    }
    fn list_by_album(&self, album_id: i64) -> Result<Vec<Photo>, StorageError> {
        self.0.list_by_album(album_id)
    }
    fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.0.delete(id)
    }
}

#[test]
fn failed_insert_leaves_no_file() {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(tmp.path().join("memories.db")).unwrap();
    let uploads = tmp.path().join("uploads");
    let albums = store.albums();
    let photos = RejectingPhotos(store.photos());
    let sanitizer = RustSanitizer::default();
    let pipeline = Pipeline::new(&albums, &photos, &sanitizer, &uploads);
    pipeline
        .create_album(&AlbumDraft {
            title: "Trip".into(),
            ..AlbumDraft::default()
        })
        .unwrap();

    let err = pipeline
        .upload(upload("trip", "a.jpg", camera_jpeg(8, 8, 1)))
        .unwrap_err();

    assert!(matches!(err, IngestError::Storage(StorageError::Conflict(_))));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(files_in(&uploads).is_empty());
    // The album directory itself may remain; it holds nothing.
    assert!(uploads.join("trip").is_dir());
}

#[test]
fn concurrent_uploads_to_one_album_all_land() {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(tmp.path().join("memories.db")).unwrap();
    let uploads = tmp.path().join("uploads");
    let (albums, photos) = (store.albums(), store.photos());
    let sanitizer = RustSanitizer::default();
    let pipeline = Pipeline::new(&albums, &photos, &sanitizer, &uploads);
    let album = pipeline
        .create_album(&AlbumDraft {
            title: "Party".into(),
            ..AlbumDraft::default()
        })
        .unwrap();

    let jpeg = camera_jpeg(16, 16, 3);
    std::thread::scope(|s| {
        for _ in 0..8 {
            let pipeline = &pipeline;
            let bytes = jpeg.clone();
            s.spawn(move || pipeline.upload(upload("party", "p.jpg", bytes)).unwrap());
        }
    });

    assert_eq!(photos.list_by_album(album.id).unwrap().len(), 8);
    assert_eq!(files_in(&uploads.join("party")).len(), 8);
}

#[test]
fn sanitizer_is_usable_on_its_own() {
    let out = RustSanitizer::default()
        .sanitize(camera_jpeg(20, 10, 8), Some("image/jpeg"))
        .unwrap();
    let img = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (10, 20));

    let err = RustSanitizer::default()
        .sanitize(b"\xFF\xD8\xFF broken".to_vec(), None)
        .unwrap_err();
    assert!(err.to_string().contains("Invalid image"));
}
