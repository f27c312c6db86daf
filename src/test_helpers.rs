//! Shared test utilities.
//!
//! Synthetic images and throwaway stores for tests that touch the
//! filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, storage) = setup_storage();
//! let id = store_test_original(&tmp, &storage, "photo.jpg", 400, 300);
//! assert!(storage.contains(&id, "photo.jpg").unwrap());
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::Path;
use tempfile::TempDir;

use crate::storage::{LocalBackend, ObjectId, StorageBackend, generate_id};

pub const TEST_URL: &str = "http://media.test";

// =========================================================================
// Images
// =========================================================================

/// Write a gradient JPEG of the given size.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Storage
// =========================================================================

/// Empty local store under a fresh temp directory.
pub fn setup_storage() -> (TempDir, LocalBackend) {
    let tmp = TempDir::new().unwrap();
    let storage = LocalBackend::new(tmp.path().join("store"), TEST_URL);
    (tmp, storage)
}

/// Generate a JPEG, upload it as an original and return its id.
pub fn store_test_original(
    tmp: &TempDir,
    storage: &LocalBackend,
    name: &str,
    width: u32,
    height: u32,
) -> ObjectId {
    let upload = tmp.path().join(name);
    create_test_jpeg(&upload, width, height);
    let id = generate_id(&upload).unwrap();
    storage.put_original(&upload, &id, false).unwrap()
}
