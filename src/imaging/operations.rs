//! High-level image operations.
//!
//! These functions combine the planner with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{Dimensions, ExecuteParams, Quality, ResizeOptions, ResizePlan};
use log::debug;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// Resize policy plus encoding settings for one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResizeConfig {
    pub options: ResizeOptions,
    pub quality: Quality,
}

/// A written variant and the plan that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariant {
    pub target: Dimensions,
    pub plan: ResizePlan,
    pub width: u32,
    pub height: u32,
}

/// Plan a resize operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_variant(
    source: &Path,
    output: &Path,
    source_dims: Dimensions,
    target: Dimensions,
    config: &ResizeConfig,
) -> Result<ExecuteParams> {
    let plan = config.options.plan(source_dims, target)?;
    debug!(
        "plan {} -> {} ({} {:?} upscale={}): {:?}",
        source_dims,
        target,
        config.options.mode,
        config.options.algorithm,
        config.options.upscale,
        plan
    );

    Ok(ExecuteParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        plan,
        quality: config.quality,
    })
}

/// Resize `source` towards `target` and write the result to `output`.
///
/// `source_dims` must be the real size of `source`; callers producing many
/// variants from one original identify it once and pass it in.
pub fn create_variant(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    source_dims: Dimensions,
    target: Dimensions,
    config: &ResizeConfig,
) -> Result<GeneratedVariant> {
    let params = plan_variant(source, output, source_dims, target, config)?;
    let written = backend.execute(&params)?;

    Ok(GeneratedVariant {
        target,
        plan: params.plan,
        width: written.width,
        height: written.height,
    })
}

/// Identify `source`, then resize it. One-shot version of [`create_variant`].
pub fn resize_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    target: Dimensions,
    config: &ResizeConfig,
) -> Result<GeneratedVariant> {
    let source_dims = get_dimensions(backend, source)?;
    create_variant(backend, source, output, source_dims, target, config)
}
