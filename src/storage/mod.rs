//! Asset storage.
//!
//! Stores whole files under an [`ObjectId`]. Each object holds one original
//! plus any number of generated variants, and is addressable by URL:
//!
//! ```text
//! <base-url>/3c72aedc/ba25/11e6/569a/406c8f413974/photo.jpg/300x200-fill.jpg
//!            └───────────────── id groups ──────┘ └ name ─┘ └─ variant ───┘
//! ```
//!
//! [`StorageBackend::parse_url`] and [`StorageBackend::url_for`] convert
//! between that URL and `(id, variant filename)`. Writes never overwrite an
//! existing file unless `force` is set.
//!
//! [`LocalBackend`] keeps objects in a directory tree. A remote object store
//! would implement the same trait.

mod id;
mod local;

pub use id::{ObjectId, generate_id, is_plain_filename};
pub use local::LocalBackend;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File [{filename}] exists under [{id}]. Use force option to overwrite.")]
    FileExists { id: String, filename: String },
    #[error("Unable to find local file [{0}]")]
    LocalFileNotFound(String),
    #[error("Invalid object id: {0}")]
    InvalidId(String),
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
    #[error("Object not found: {0}")]
    ObjectNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Operations every store provides.
///
/// `Sync` so variants can be written back from rayon workers.
pub trait StorageBackend: Sync {
    /// Base URL objects are served under, without a trailing slash.
    fn base_url(&self) -> &str;

    /// Store `src` as the original of `id`, under `id.filename()`.
    fn put_original(&self, src: &Path, id: &ObjectId, force: bool) -> Result<ObjectId>;

    /// Store `src` next to the original of `id` as `filename`.
    ///
    /// `filename` must differ from `id.filename()`; the original is never
    /// replaced through this call.
    fn put_variant(&self, src: &Path, id: &ObjectId, filename: &str, force: bool)
    -> Result<ObjectId>;

    /// Copy the original of `id` to `<dest_dir>/<id>/<filename>` and return
    /// that path.
    fn retrieve_original(&self, id: &ObjectId, dest_dir: &Path) -> Result<PathBuf>;

    /// Whether `filename` is stored under `id`.
    fn contains(&self, id: &ObjectId, filename: &str) -> Result<bool>;

    /// Remove the original and every variant. `false` if nothing was stored.
    fn delete(&self, id: &ObjectId) -> Result<bool>;

    /// Remove every variant of `id`, keeping the original. Returns the number
    /// of files removed.
    fn clear_variants(&self, id: &ObjectId) -> Result<usize>;

    /// Split a variant URL into the object id and the variant filename.
    ///
    /// The base URL is stripped if present, then the path is lowercased and
    /// every segment but the last is joined with `-` to form the id.
    fn parse_url(&self, url: &str) -> Result<(ObjectId, String)> {
        let invalid = || StorageError::InvalidUrl(url.to_string());
        let path = url.strip_prefix(self.base_url()).unwrap_or(url);
        let path = path.trim_matches('/').to_lowercase();

        let (dirs, filename) = path.rsplit_once('/').ok_or_else(invalid)?;
        if !is_plain_filename(filename) {
            return Err(invalid());
        }
        let id = dirs.split('/').collect::<Vec<_>>().join("-");
        let id = id.parse().map_err(|_| invalid())?;
        Ok((id, filename.to_string()))
    }

    /// Inverse of [`parse_url`](Self::parse_url).
    fn url_for(&self, id: &ObjectId, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url(),
            id.groups().join("/"),
            id.filename(),
            filename
        )
    }
}
