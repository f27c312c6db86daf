//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only, format sniffed) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Scale | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | `JpegEncoder` (quality), `PngEncoder`, `TiffEncoder`, lossless `WebPEncoder` |
//!
//! The output format is chosen from the output file extension. Planning is
//! not done here; [`apply_plan`] replays [`ResizePlan::steps`] verbatim.

use super::backend::{BackendError, ImageBackend};
use super::params::{Dimensions, ExecuteParams, ResizePlan, Step};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use log::debug;
use std::io::BufWriter;
use std::path::Path;

/// Extensions [`RustBackend`] can write.
const OUTPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// Returns the set of file extensions the backend can encode.
pub fn supported_output_extensions() -> &'static [&'static str] {
    OUTPUT_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn dimensions_of(img: &DynamicImage) -> Dimensions {
    Dimensions::new(img.width(), img.height())
}

/// Load and decode an image from disk.
///
/// The format is sniffed from the file contents, so stored originals keep
/// decoding even when their name carries no usable extension.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Apply a plan to decoded pixels.
pub fn apply_plan(img: DynamicImage, plan: &ResizePlan) -> DynamicImage {
    let steps = plan.steps(dimensions_of(&img));
    steps.into_iter().fold(img, |img, step| {
        debug!("{:?} on {}", step, dimensions_of(&img));
        match step {
            Step::Scale { to } => img.resize_exact(to.width, to.height, FilterType::Lanczos3),
            Step::Crop { offset, size } => img.crop_imm(offset.x, offset.y, size.width, size.height),
        }
    })
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !OUTPUT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            ext
        )));
    }

    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = BufWriter::new(file);
    let encoded = match ext.as_str() {
        "jpg" | "jpeg" => {
            // JPEG has no alpha channel
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        "png" => img.write_with_encoder(image::codecs::png::PngEncoder::new(writer)),
        "tif" | "tiff" => img.write_with_encoder(image::codecs::tiff::TiffEncoder::new(writer)),
        _ => {
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(writer);
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)
        }
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("Encode {} failed: {}", path.display(), e))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn execute(&self, params: &ExecuteParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let result = apply_plan(img, &params.plan);
        save_image(&result, &params.output, params.quality.value())?;
        Ok(dimensions_of(&result))
    }
}
