//! Variant generation against a store.
//!
//! Ties the imaging and storage layers together:
//!
//! ```text
//! ingest     local file  →  store (original, content-addressed id)
//! variants   store original  →  N variants  →  store
//! resolve    variant URL  →  (generate if missing)  →  variant URL
//! ```
//!
//! Work happens in a scratch directory under `work_dir/<id>/`: the original
//! is retrieved into `source/` once and identified once, and every variant is
//! encoded into `encoded/` before being handed to the store. Keeping the two
//! apart means a variant can never be written over the copy it is read from. The scratch directory is removed
//! afterwards, whether or not every variant succeeded.
//!
//! ## Parallel Processing
//!
//! Variants of one original are produced in parallel using
//! [rayon](https://docs.rs/rayon).

use crate::imaging::{
    BackendError, Dimensions, ImageBackend, Quality, ResizeConfig, ResizePlan, create_variant,
    get_dimensions,
};
use crate::naming::{NameError, VariantName, parse_variant_filename};
use crate::storage::{ObjectId, StorageBackend, StorageError, generate_id};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SOURCE_DIR: &str = "source";
const ENCODED_DIR: &str = "encoded";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Invalid variant name: {0}")]
    Name(#[from] NameError),
}

/// Settings shared by every variant in a run.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub quality: Quality,
    /// Overwrite variants that already exist.
    pub force: bool,
    /// Scratch space for retrieved originals and encoded variants.
    pub work_dir: PathBuf,
}

impl ProcessConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            quality: Quality::default(),
            force: false,
            work_dir: work_dir.into(),
        }
    }
}

/// A variant written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedVariant {
    pub filename: String,
    pub url: String,
    pub source: Dimensions,
    pub plan: ResizePlan,
    pub width: u32,
    pub height: u32,
}

/// Outcome of resolving a variant URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVariant {
    pub id: String,
    pub filename: String,
    pub url: String,
    /// `false` when the variant was already stored.
    pub generated: bool,
}

/// Upload a local file as an original under its content-addressed id.
pub fn ingest_original(
    storage: &impl StorageBackend,
    src: &Path,
    force: bool,
) -> Result<ObjectId, ProcessError> {
    let id = generate_id(src)?;
    let id = storage.put_original(src, &id, force)?;
    info!("ingested {} as {}", src.display(), id);
    Ok(id)
}

/// Produce `requests` from the stored original of `id` and store them.
///
/// Results come back in request order. The first failure aborts the run,
/// but variants already stored by other workers stay stored.
pub fn create_variants(
    backend: &impl ImageBackend,
    storage: &impl StorageBackend,
    id: &ObjectId,
    requests: &[VariantName],
    config: &ProcessConfig,
) -> Result<Vec<ProcessedVariant>, ProcessError> {
    let scratch = config.work_dir.join(id.to_string());
    let result = create_in_scratch(backend, storage, id, requests, config, &scratch);

    if scratch.exists() {
        if let Err(e) = std::fs::remove_dir_all(&scratch) {
            warn!("could not remove {}: {}", scratch.display(), e);
        }
    }
    result
}

fn create_in_scratch(
    backend: &impl ImageBackend,
    storage: &impl StorageBackend,
    id: &ObjectId,
    requests: &[VariantName],
    config: &ProcessConfig,
    scratch: &Path,
) -> Result<Vec<ProcessedVariant>, ProcessError> {
    let original = storage.retrieve_original(id, &scratch.join(SOURCE_DIR))?;
    let source = get_dimensions(backend, &original)?;
    debug!("{} is {}", id, source);

    let encoded = scratch.join(ENCODED_DIR);
    std::fs::create_dir_all(&encoded)?;

    requests
        .par_iter()
        .map(|request| -> Result<ProcessedVariant, ProcessError> {
            let filename = request.to_string();
            let output = encoded.join(&filename);
            let resize = ResizeConfig {
                options: request.options,
                quality: config.quality,
            };

            let variant = create_variant(backend, &original, &output, source, request.size, &resize)?;
            storage.put_variant(&output, id, &filename, config.force)?;
            info!("{} -> {} ({}x{})", id, filename, variant.width, variant.height);

            Ok(ProcessedVariant {
                url: storage.url_for(id, &filename),
                filename,
                source,
                plan: variant.plan,
                width: variant.width,
                height: variant.height,
            })
        })
        .collect()
}

/// Resolve a variant URL, generating the variant if it is not stored yet.
///
/// Everything needed to generate it is read from the URL: the id names the
/// original, the last segment is a variant filename.
pub fn resolve_url(
    backend: &impl ImageBackend,
    storage: &impl StorageBackend,
    url: &str,
    config: &ProcessConfig,
) -> Result<ResolvedVariant, ProcessError> {
    let (id, filename) = storage.parse_url(url)?;
    let request = parse_variant_filename(&filename)?;
    // Canonical form, so "300X200-Fill.JPG" and "300x200-fill.jpg" share a file
    let filename = request.to_string();
    // That path holds the original itself
    if filename == id.filename() {
        return Err(StorageError::InvalidFilename(filename).into());
    }

    let generated = config.force || !storage.contains(&id, &filename)?;
    if generated {
        create_variants(backend, storage, &id, &[request], config)?;
    } else {
        debug!("{} already stored under {}", filename, id);
    }

    Ok(ResolvedVariant {
        url: storage.url_for(&id, &filename),
        id: id.to_string(),
        filename,
        generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Algorithm, Offset, ResizeOptions, RustBackend, Strategy};
    use crate::test_helpers::{TEST_URL, setup_storage, store_test_original};

    fn request(name: &str) -> VariantName {
        name.parse().unwrap()
    }

    // =========================================================================
    // With MockBackend (no pixels)
    // =========================================================================

    /// The mock writes nothing, so stub the encoded file before it is stored.
    struct WritingMock(MockBackend);

    impl ImageBackend for WritingMock {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.0.identify(path)
        }

        fn execute(
            &self,
            params: &crate::imaging::ExecuteParams,
        ) -> Result<Dimensions, BackendError> {
            std::fs::write(&params.output, b"variant")?;
            self.0.execute(params)
        }
    }

    #[test]
    fn create_variants_plans_each_request_from_one_identify() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 8, 8);
        let backend = WritingMock(MockBackend::with_dimensions(vec![Dimensions::new(2000, 3000)]));
        let config = ProcessConfig::new(tmp.path().join("work"));

        let variants = create_variants(
            &backend,
            &storage,
            &id,
            &[request("1000x2000-fill.jpg"), request("1000x2000-fit.png")],
            &config,
        )
        .unwrap();

        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].filename, "1000x2000-fill.jpg");
        assert_eq!(
            variants[0].plan.strategy,
            Strategy::CropThenScale {
                target: Dimensions::new(1000, 2000)
            }
        );
        assert_eq!(variants[0].plan.offset, Offset::new(250, 0));
        // Fit anchors on the longer source side
        assert_eq!((variants[1].width, variants[1].height), (1333, 2000));

        let identifies = backend
            .0
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Identify(_)))
            .count();
        assert_eq!(identifies, 1);

        assert!(storage.contains(&id, "1000x2000-fit.png").unwrap());
        assert!(!tmp.path().join("work").join(id.to_string()).exists());
    }

    #[test]
    fn create_variants_passes_quality_through() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 8, 8);
        let backend = WritingMock(MockBackend::with_dimensions(vec![Dimensions::new(100, 100)]));
        let config = ProcessConfig {
            quality: Quality::new(55),
            ..ProcessConfig::new(tmp.path().join("work"))
        };

        create_variants(&backend, &storage, &id, &[request("50x50-fill.jpg")], &config).unwrap();

        assert!(backend.0.get_operations().iter().any(|op| matches!(
            op,
            RecordedOp::Execute { quality: 55, .. }
        )));
    }

    #[test]
    fn create_variants_refuses_to_overwrite() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 8, 8);
        let config = ProcessConfig::new(tmp.path().join("work"));
        let dims = vec![Dimensions::new(100, 100), Dimensions::new(100, 100)];
        let backend = WritingMock(MockBackend::with_dimensions(dims));

        let requests = [request("50x50-fill.jpg")];
        create_variants(&backend, &storage, &id, &requests, &config).unwrap();
        let again = create_variants(&backend, &storage, &id, &requests, &config);
        assert!(matches!(
            again,
            Err(ProcessError::Storage(StorageError::FileExists { .. }))
        ));
        assert!(!tmp.path().join("work").join(id.to_string()).exists());
    }

    #[test]
    fn create_variants_for_missing_object() {
        let (tmp, storage) = setup_storage();
        let id: ObjectId = "3c72aedc-ba25-11e6-569a-406c8f413974-photo.jpg"
            .parse()
            .unwrap();
        let result = create_variants(
            &MockBackend::new(),
            &storage,
            &id,
            &[request("10x10-fit.jpg")],
            &ProcessConfig::new(tmp.path()),
        );
        assert!(matches!(
            result,
            Err(ProcessError::Storage(StorageError::ObjectNotFound(_)))
        ));
    }

    // =========================================================================
    // With RustBackend (real pixels)
    // =========================================================================

    #[test]
    fn ingest_then_create_real_variants() {
        let (tmp, storage) = setup_storage();
        let upload = tmp.path().join("Holiday.JPG");
        crate::test_helpers::create_test_jpeg(&upload, 400, 300);

        let id = ingest_original(&storage, &upload, false).unwrap();
        assert_eq!(id.filename(), "holiday.jpg");

        let requests = [
            VariantName::new(
                Dimensions::new(100, 100),
                ResizeOptions::fill(Algorithm::ScaleThenCrop),
                "png",
            ),
            VariantName::new(Dimensions::new(200, 200), ResizeOptions::fit(), "jpg"),
        ];
        let variants = create_variants(
            &RustBackend::new(),
            &storage,
            &id,
            &requests,
            &ProcessConfig::new(tmp.path().join("work")),
        )
        .unwrap();

        assert_eq!(variants[0].filename, "100x100-fill-scale_then_crop.png");
        let fill = storage.path_of(&id, &variants[0].filename);
        assert_eq!(image::image_dimensions(fill).unwrap(), (100, 100));

        let fit = storage.path_of(&id, &variants[1].filename);
        assert_eq!(image::image_dimensions(fit).unwrap(), (200, 150));
        assert!(variants[1].url.starts_with(TEST_URL));
    }

    #[test]
    fn ingest_same_bytes_twice_is_file_exists() {
        let (tmp, storage) = setup_storage();
        let upload = tmp.path().join("a.jpg");
        crate::test_helpers::create_test_jpeg(&upload, 10, 10);

        ingest_original(&storage, &upload, false).unwrap();
        assert!(matches!(
            ingest_original(&storage, &upload, false),
            Err(ProcessError::Storage(StorageError::FileExists { .. }))
        ));
        assert!(ingest_original(&storage, &upload, true).is_ok());
    }

    #[test]
    fn resolve_url_generates_once() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 300, 200);
        let backend = RustBackend::new();
        let config = ProcessConfig::new(tmp.path().join("work"));

        let url = storage.url_for(&id, "64X64-Fill.JPG");
        let first = resolve_url(&backend, &storage, &url, &config).unwrap();
        assert!(first.generated);
        assert_eq!(first.filename, "64x64-fill.jpg");
        assert_eq!(first.url, storage.url_for(&id, "64x64-fill.jpg"));
        assert_eq!(
            image::image_dimensions(storage.path_of(&id, "64x64-fill.jpg")).unwrap(),
            (64, 64)
        );

        let second = resolve_url(&backend, &storage, &url, &config).unwrap();
        assert!(!second.generated);
    }

    #[test]
    fn original_named_like_a_variant_is_never_served_or_replaced() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "4x4-fit.jpg", 8, 8);
        let backend = RustBackend::new();
        let config = ProcessConfig {
            force: true,
            ..ProcessConfig::new(tmp.path().join("work"))
        };
        let original = storage.path_of(&id, id.filename());

        let url = storage.url_for(&id, "4x4-fit.jpg");
        let resolved = resolve_url(&backend, &storage, &url, &config);
        assert!(matches!(
            resolved,
            Err(ProcessError::Storage(StorageError::InvalidFilename(_)))
        ));

        let requests = [request("4x4-fit.jpg")];
        let forced = create_variants(&backend, &storage, &id, &requests, &config);
        assert!(matches!(
            forced,
            Err(ProcessError::Storage(StorageError::InvalidFilename(_)))
        ));
        assert_eq!(image::image_dimensions(&original).unwrap(), (8, 8));

        // Other variants of it still read the untouched original
        let variants =
            create_variants(&backend, &storage, &id, &[request("2x2-fit.png")], &config).unwrap();
        assert_eq!((variants[0].width, variants[0].height), (2, 2));
        assert_eq!(image::image_dimensions(&original).unwrap(), (8, 8));
    }

    #[test]
    fn resolve_url_treats_explicit_default_algorithm_as_the_same_variant() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 300, 200);
        let backend = RustBackend::new();
        let config = ProcessConfig::new(tmp.path().join("work"));

        let url = storage.url_for(&id, "30x20-fill.jpg");
        let first = resolve_url(&backend, &storage, &url, &config).unwrap();
        assert!(first.generated);

        let url = storage.url_for(&id, "30x20-fill-crop_sample_then_scale.jpg");
        let second = resolve_url(&backend, &storage, &url, &config).unwrap();
        assert!(!second.generated);
        assert_eq!(second.filename, "30x20-fill.jpg");
    }

    #[test]
    fn resolve_url_rejects_bad_variant_name() {
        let (tmp, storage) = setup_storage();
        let id = store_test_original(&tmp, &storage, "photo.jpg", 30, 20);
        let url = storage.url_for(&id, "thumbnail.jpg");

        let result = resolve_url(
            &RustBackend::new(),
            &storage,
            &url,
            &ProcessConfig::new(tmp.path().join("work")),
        );
        assert!(matches!(result, Err(ProcessError::Name(_))));
    }
}
