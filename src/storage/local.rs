//! Local directory store.
//!
//! Objects live at `<root>/<g1>/<g2>/<g3>/<g4>/<g5>/<filename>/`, with the
//! original stored inside under its own name:
//!
//! ```text
//! store/
//! └── 3c72aedc/ba25/11e6/569a/406c8f413974/
//!     └── photo.jpg/
//!         ├── photo.jpg             # original
//!         ├── 300x200-fill.jpg      # variant
//!         └── 64x64-fit-upscale.png # variant
//! ```

use super::{ObjectId, Result, StorageBackend, StorageError, is_plain_filename};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct LocalBackend {
    root: PathBuf,
    url: String,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>, url: &str) -> Self {
        Self {
            root: root.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<g1>/../<g5>`: everything stored for `id`, plus siblings that
    /// share the same hash prefix.
    fn shard_dir(&self, id: &ObjectId) -> PathBuf {
        id.groups()
            .iter()
            .fold(self.root.clone(), |path, group| path.join(group))
    }

    /// Directory holding the original and variants of `id`.
    pub fn object_dir(&self, id: &ObjectId) -> PathBuf {
        self.shard_dir(id).join(id.filename())
    }

    pub fn path_of(&self, id: &ObjectId, filename: &str) -> PathBuf {
        self.object_dir(id).join(filename.to_lowercase())
    }

    /// Copy `src` into the object directory of `id` as `filename`.
    fn store_file(
        &self,
        src: &Path,
        id: &ObjectId,
        filename: &str,
        force: bool,
    ) -> Result<ObjectId> {
        if !src.is_file() {
            return Err(StorageError::LocalFileNotFound(src.display().to_string()));
        }
        if !is_plain_filename(filename) {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        let dst = self.path_of(id, filename);
        if !force && dst.exists() {
            return Err(StorageError::FileExists {
                id: id.to_string(),
                filename: filename.to_string(),
            });
        }

        fs::create_dir_all(self.object_dir(id))?;
        fs::copy(src, &dst)?;
        info!("stored {} -> {}", src.display(), dst.display());
        Ok(id.clone())
    }

    /// Remove empty directories between `dir` and the store root.
    fn prune_empty_parents(&self, dir: &Path) {
        let mut current = dir.parent();
        while let Some(path) = current {
            if path == self.root || !path.starts_with(&self.root) {
                break;
            }
            // Fails when the directory still has entries
            if fs::remove_dir(path).is_err() {
                break;
            }
            current = path.parent();
        }
    }
}

impl StorageBackend for LocalBackend {
    fn base_url(&self) -> &str {
        &self.url
    }

    fn put_original(&self, src: &Path, id: &ObjectId, force: bool) -> Result<ObjectId> {
        self.store_file(src, id, id.filename(), force)
    }

    fn put_variant(
        &self,
        src: &Path,
        id: &ObjectId,
        filename: &str,
        force: bool,
    ) -> Result<ObjectId> {
        if filename.to_lowercase() == id.filename() {
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }
        self.store_file(src, id, filename, force)
    }

    fn retrieve_original(&self, id: &ObjectId, dest_dir: &Path) -> Result<PathBuf> {
        let src = self.path_of(id, id.filename());
        if !src.is_file() {
            return Err(StorageError::ObjectNotFound(id.to_string()));
        }

        let dst_dir = dest_dir.join(id.to_string());
        fs::create_dir_all(&dst_dir)?;
        let dst = dst_dir.join(id.filename());
        fs::copy(&src, &dst)?;
        debug!("retrieved {} -> {}", id, dst.display());
        Ok(dst)
    }

    fn contains(&self, id: &ObjectId, filename: &str) -> Result<bool> {
        Ok(self.path_of(id, filename).is_file())
    }

    fn delete(&self, id: &ObjectId) -> Result<bool> {
        let dir = self.shard_dir(id);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        self.prune_empty_parents(&dir);
        info!("deleted {}", id);
        Ok(true)
    }

    fn clear_variants(&self, id: &ObjectId) -> Result<usize> {
        let dir = self.object_dir(id);
        if !dir.is_dir() {
            return Err(StorageError::ObjectNotFound(id.to_string()));
        }

        let mut removed = 0;
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && entry.file_name() != id.filename() {
                fs::remove_file(entry.path())?;
                debug!("removed variant {}", entry.path().display());
                removed += 1;
            }
        }
        info!("cleared {} variant(s) of {}", removed, id);
        Ok(removed)
    }
}
