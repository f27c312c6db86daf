//! Parameter types for resize planning and execution.
//!
//! These structs describe *what* to do, not *how* to do it. The planner in
//! [`calculations`](super::calculations) turns a [`ResizeOptions`] plus two
//! sizes into a [`ResizePlan`]; the [`backend`](super::backend) turns a plan
//! into pixels. Nothing in this file performs I/O.
//!
//! ## Types
//!
//! - [`Dimensions`] / [`Offset`]: integer geometry, one value per [`Axis`].
//! - [`Mode`] / [`Algorithm`]: the fit/fill policy and the fill strategy.
//! - [`ResizeOptions`]: mode, algorithm and upscale permission together.
//! - [`ResizePlan`]: output size, crop offset and the order to apply them in.
//! - [`Step`]: a single crop or scale, derived from a plan for a given source.
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ExecuteParams`]: Everything one backend call needs.

use super::calculations::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the two image axes. `Width` is axis 0 and wins every tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::Width => Axis::Height,
            Axis::Height => Axis::Width,
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from a value along `axis` and a value across it.
    pub fn from_axis(axis: Axis, along: u32, across: u32) -> Self {
        match axis {
            Axis::Width => Self::new(along, across),
            Axis::Height => Self::new(across, along),
        }
    }

    pub fn get(self, axis: Axis) -> u32 {
        match axis {
            Axis::Width => self.width,
            Axis::Height => self.height,
        }
    }

    pub fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `"<width>x<height>"`, e.g. `"300x200"`. The separator is
/// case-insensitive and surrounding whitespace is ignored.
impl FromStr for Dimensions {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlanError::InvalidSize(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        let dims = Self::new(width, height);
        if !dims.is_positive() {
            return Err(invalid());
        }
        Ok(dims)
    }
}

/// Top-left corner of a crop region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub x: u32,
    pub y: u32,
}

impl Offset {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// An offset that is non-zero only along `axis`.
    pub fn from_axis(axis: Axis, value: u32) -> Self {
        match axis {
            Axis::Width => Self::new(value, 0),
            Axis::Height => Self::new(0, value),
        }
    }

    pub fn get(self, axis: Axis) -> u32 {
        match axis {
            Axis::Width => self.x,
            Axis::Height => self.y,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Containment policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Stay entirely inside the target box; never crop.
    Fit,
    /// Cover the whole target box; crop whatever overflows.
    #[default]
    Fill,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Fit => "fit",
            Mode::Fill => "fill",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(Mode::Fit),
            "fill" => Ok(Mode::Fill),
            _ => Err(PlanError::InvalidMode(s.to_string())),
        }
    }
}

/// How a fill resize is carried out. Both produce the same framing.
///
/// `CropSampleThenScale` only resamples the region that survives the crop,
/// so it touches fewer pixels on large originals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Scale the whole source, then trim the overflow.
    ScaleThenCrop,
    /// Cut a proportional sample from the source, then scale it to the target.
    #[default]
    CropSampleThenScale,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::ScaleThenCrop => "scale_then_crop",
            Algorithm::CropSampleThenScale => "crop_sample_then_scale",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "scale_then_crop" => Ok(Algorithm::ScaleThenCrop),
            "crop_sample_then_scale" => Ok(Algorithm::CropSampleThenScale),
            _ => Err(PlanError::InvalidAlgorithm(s.to_string())),
        }
    }
}

/// Everything about a resize except the two sizes.
///
/// `algorithm` is only consulted in [`Mode::Fill`]; `None` means
/// [`Algorithm::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResizeOptions {
    pub mode: Mode,
    pub algorithm: Option<Algorithm>,
    pub upscale: bool,
}

impl ResizeOptions {
    pub fn fit() -> Self {
        Self {
            mode: Mode::Fit,
            ..Self::default()
        }
    }

    pub fn fill(algorithm: Algorithm) -> Self {
        Self {
            mode: Mode::Fill,
            algorithm: Some(algorithm),
            upscale: false,
        }
    }

    pub fn with_upscale(self, upscale: bool) -> Self {
        Self { upscale, ..self }
    }

    /// Plan a resize of `source` towards `target` with these options.
    pub fn plan(&self, source: Dimensions, target: Dimensions) -> Result<ResizePlan, PlanError> {
        super::calculations::plan_resize(source, target, self.mode, self.algorithm, self.upscale)
    }
}

/// The order in which a plan's crop and scale are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Source is returned untouched.
    Passthrough,
    /// Scale the source to `size`.
    Scale,
    /// Crop `size` at `offset` from the source, no scaling.
    Crop,
    /// Scale the source to `size`, then crop `target` at `offset`.
    ScaleThenCrop { target: Dimensions },
    /// Crop `size` at `offset` from the source, then scale it to `target`.
    CropThenScale { target: Dimensions },
}

/// Output of the planner.
///
/// `size` is the size of the intermediate or final image the strategy names
/// (the scaled image for [`Strategy::ScaleThenCrop`], the sample for
/// [`Strategy::CropThenScale`]); `offset` is where the crop starts in the
/// image it is cropped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResizePlan {
    pub size: Dimensions,
    pub offset: Offset,
    pub strategy: Strategy,
}

/// A single pixel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Scale { to: Dimensions },
    Crop { offset: Offset, size: Dimensions },
}

impl ResizePlan {
    pub fn passthrough(source: Dimensions) -> Self {
        Self {
            size: source,
            offset: Offset::ZERO,
            strategy: Strategy::Passthrough,
        }
    }

    /// Dimensions of the image the executor hands back.
    pub fn output_size(&self) -> Dimensions {
        match self.strategy {
            Strategy::Passthrough | Strategy::Scale | Strategy::Crop => self.size,
            Strategy::ScaleThenCrop { target } | Strategy::CropThenScale { target } => target,
        }
    }

    /// True when executing the plan against `source` changes nothing.
    pub fn is_identity(&self, source: Dimensions) -> bool {
        self.steps(source).is_empty()
    }

    /// Pixel operations needed to execute this plan against an image of
    /// size `source`. Operations that would not change the image are left out.
    pub fn steps(&self, source: Dimensions) -> Vec<Step> {
        let mut steps = Vec::new();
        match self.strategy {
            Strategy::Passthrough => {}
            Strategy::Scale => push_scale(&mut steps, source, self.size),
            Strategy::Crop => push_crop(&mut steps, source, self.offset, self.size),
            Strategy::ScaleThenCrop { target } => {
                push_scale(&mut steps, source, self.size);
                push_crop(&mut steps, self.size, self.offset, target);
            }
            Strategy::CropThenScale { target } => {
                push_crop(&mut steps, source, self.offset, self.size);
                push_scale(&mut steps, self.size, target);
            }
        }
        steps
    }
}

fn push_scale(steps: &mut Vec<Step>, from: Dimensions, to: Dimensions) {
    if from != to {
        steps.push(Step::Scale { to });
    }
}

fn push_crop(steps: &mut Vec<Step>, frame: Dimensions, offset: Offset, size: Dimensions) {
    if size != frame || offset != Offset::ZERO {
        steps.push(Step::Crop { offset, size });
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for one backend execution: decode `source`, apply `plan`,
/// encode to `output` (format from the extension).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub plan: ResizePlan,
    pub quality: Quality,
}
