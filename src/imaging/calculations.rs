//! Pure geometry planning for fit and fill resizes.
//!
//! All functions here are pure and testable without any I/O or images.
//! Given a source size, a target size and [`ResizeOptions`](super::ResizeOptions)
//! the planner returns a [`ResizePlan`]: the size to scale or sample to, and
//! where the crop starts.
//!
//! ## Dispatch
//!
//! Every request falls into one [`SizeClass`]. Together with the mode and the
//! upscale flag that picks a [`Formula`]:
//!
//! | Mode | SizeClass | upscale | Formula |
//! |---|---|---|---|
//! | Fit | both ≤ | no | identity |
//! | Fit | both ≤ | yes | contain, heuristic anchor |
//! | Fit | one ≤ | any | contain, overflowing axis |
//! | Fit | both > | any | contain, longer source side |
//! | Fill | both ≤ | no | identity |
//! | Fill | one ≤ | no | clip the overflowing axis |
//! | Fill | both > | any | cover, heuristic anchor |
//! | Fill | both ≤ | yes | cover, opposite of heuristic |
//! | Fill | one ≤ | yes | cover, fitting axis |
//!
//! ## Rounding
//!
//! Sizes on the free axis are floored; crop offsets round half to even.
//! Arithmetic is exact (integer cross-multiplication), never floating point.

use super::params::{Algorithm, Axis, Dimensions, Mode, Offset, ResizePlan, Strategy};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Invalid resize mode: {0} (expected fit or fill)")]
    InvalidMode(String),
    #[error("Invalid fill algorithm: {0} (expected scale_then_crop or crop_sample_then_scale)")]
    InvalidAlgorithm(String),
    #[error("Invalid size: {0} (expected <width>x<height>)")]
    InvalidSize(String),
}

/// How the source compares to the target, axis by axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Source ≤ target on both axes.
    BothAxesSmallerOrEqual,
    /// Source ≤ target on exactly one axis.
    OneAxisSmallerOrEqual,
    /// Source > target on both axes.
    BothAxesLarger,
}

pub fn classify(source: Dimensions, target: Dimensions) -> SizeClass {
    match (
        source.width <= target.width,
        source.height <= target.height,
    ) {
        (true, true) => SizeClass::BothAxesSmallerOrEqual,
        (false, false) => SizeClass::BothAxesLarger,
        _ => SizeClass::OneAxisSmallerOrEqual,
    }
}

/// `100 * target / source` for one axis, kept as a fraction.
#[derive(Debug, Clone, Copy)]
struct AxisPercent {
    target: u64,
    source: u64,
}

impl AxisPercent {
    fn new(dims_source: Dimensions, dims_target: Dimensions, axis: Axis) -> Self {
        Self {
            target: u64::from(dims_target.get(axis)),
            source: u64::from(dims_source.get(axis)),
        }
    }

    /// At or above 100% the percentage counts as negative.
    fn is_negated(self) -> bool {
        self.target >= self.source
    }

    fn cmp_adjusted(self, other: Self) -> Ordering {
        let raw = (self.target * other.source).cmp(&(other.target * self.source));
        match (self.is_negated(), other.is_negated()) {
            (false, false) => raw,
            (true, true) => raw.reverse(),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
        }
    }
}

/// Pick the axis whose scale factor drives a uniform resize.
///
/// For each axis `p = 100 * target / source`, negated when `p >= 100`. The
/// axis with the larger value wins; ties go to [`Axis::Width`].
///
/// When both axes shrink this is the axis that shrinks least; when both grow
/// it is the axis that grows least.
pub fn choose_anchor_axis(source: Dimensions, target: Dimensions) -> Axis {
    let width = AxisPercent::new(source, target, Axis::Width);
    let height = AxisPercent::new(source, target, Axis::Height);
    if width.cmp_adjusted(height) == Ordering::Less {
        Axis::Height
    } else {
        Axis::Width
    }
}

/// `floor(value * numerator / denominator)`, never below one pixel.
fn scale_floor(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// `round((larger - smaller) / 2)` with ties going to the even neighbour.
fn centered_offset(larger: u32, smaller: u32) -> u32 {
    let diff = larger.saturating_sub(smaller);
    let half = diff / 2;
    if diff % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

/// Which axis a formula anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorRule {
    Heuristic,
    OppositeOfHeuristic,
    /// The axis where the source is larger than the target.
    Overflowing,
    /// The axis where the source fits inside the target.
    Fitting,
    /// The longer source side.
    LongerSide,
}

impl AnchorRule {
    fn resolve(self, source: Dimensions, target: Dimensions) -> Axis {
        match self {
            AnchorRule::Heuristic => choose_anchor_axis(source, target),
            AnchorRule::OppositeOfHeuristic => choose_anchor_axis(source, target).other(),
            AnchorRule::Overflowing if source.width > target.width => Axis::Width,
            AnchorRule::Overflowing => Axis::Height,
            AnchorRule::Fitting if source.width <= target.width => Axis::Width,
            AnchorRule::Fitting => Axis::Height,
            AnchorRule::LongerSide if source.width >= source.height => Axis::Width,
            AnchorRule::LongerSide => Axis::Height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Formula {
    Identity,
    /// Scale uniformly so the anchor axis equals the target. No crop.
    Contain(AnchorRule),
    /// Keep the source scale; trim each overflowing axis to the target.
    ClipOverflow,
    /// Scale uniformly so the anchor axis equals the target; crop the free axis.
    Cover(AnchorRule),
}

fn formula(mode: Mode, class: SizeClass, upscale: bool) -> Formula {
    use SizeClass::*;
    match (mode, class, upscale) {
        (Mode::Fit, BothAxesSmallerOrEqual, false) => Formula::Identity,
        (Mode::Fit, BothAxesSmallerOrEqual, true) => Formula::Contain(AnchorRule::Heuristic),
        (Mode::Fit, OneAxisSmallerOrEqual, _) => Formula::Contain(AnchorRule::Overflowing),
        (Mode::Fit, BothAxesLarger, _) => Formula::Contain(AnchorRule::LongerSide),
        (Mode::Fill, BothAxesSmallerOrEqual, false) => Formula::Identity,
        (Mode::Fill, OneAxisSmallerOrEqual, false) => Formula::ClipOverflow,
        (Mode::Fill, BothAxesLarger, _) => Formula::Cover(AnchorRule::Heuristic),
        (Mode::Fill, BothAxesSmallerOrEqual, true) => {
            Formula::Cover(AnchorRule::OppositeOfHeuristic)
        }
        (Mode::Fill, OneAxisSmallerOrEqual, true) => Formula::Cover(AnchorRule::Fitting),
    }
}

/// Plan a resize of `source` towards `target`.
///
/// `algorithm` only matters in [`Mode::Fill`]; `None` selects
/// [`Algorithm::CropSampleThenScale`]. Fails only when either size has a
/// zero side.
///
/// # Examples
/// ```
/// use cropfit::imaging::{Dimensions, Mode, Offset, plan_resize};
///
/// let plan = plan_resize(
///     Dimensions::new(2000, 3000),
///     Dimensions::new(1000, 2000),
///     Mode::Fill,
///     None,
///     false,
/// )
/// .unwrap();
/// assert_eq!(plan.size, Dimensions::new(1500, 3000));
/// assert_eq!(plan.offset, Offset::new(250, 0));
/// ```
pub fn plan_resize(
    source: Dimensions,
    target: Dimensions,
    mode: Mode,
    algorithm: Option<Algorithm>,
    upscale: bool,
) -> Result<ResizePlan, PlanError> {
    if !source.is_positive() {
        return Err(PlanError::InvalidDimensions(format!(
            "source {source} must be positive on both axes"
        )));
    }
    if !target.is_positive() {
        return Err(PlanError::InvalidDimensions(format!(
            "target {target} must be positive on both axes"
        )));
    }

    let plan = match formula(mode, classify(source, target), upscale) {
        Formula::Identity => ResizePlan::passthrough(source),
        Formula::Contain(rule) => contain(source, target, rule.resolve(source, target)),
        Formula::ClipOverflow => clip_overflow(source, target),
        Formula::Cover(rule) => {
            let anchor = rule.resolve(source, target);
            match algorithm.unwrap_or_default() {
                Algorithm::ScaleThenCrop => scale_then_crop(source, target, anchor),
                Algorithm::CropSampleThenScale => crop_sample(source, target, anchor),
            }
        }
    };
    Ok(plan)
}

fn contain(source: Dimensions, target: Dimensions, anchor: Axis) -> ResizePlan {
    let free = anchor.other();
    let along = target.get(anchor);
    let across = scale_floor(source.get(free), along, source.get(anchor));
    ResizePlan {
        size: Dimensions::from_axis(anchor, along, across),
        offset: Offset::ZERO,
        strategy: Strategy::Scale,
    }
}

fn clip_overflow(source: Dimensions, target: Dimensions) -> ResizePlan {
    let clip = |s: u32, t: u32| if s <= t { (s, 0) } else { (t, centered_offset(s, t)) };
    let (width, x) = clip(source.width, target.width);
    let (height, y) = clip(source.height, target.height);
    ResizePlan {
        size: Dimensions::new(width, height),
        offset: Offset::new(x, y),
        strategy: Strategy::Crop,
    }
}

fn scale_then_crop(source: Dimensions, target: Dimensions, anchor: Axis) -> ResizePlan {
    let free = anchor.other();
    let along = target.get(anchor);
    let scaled_free = scale_floor(source.get(free), along, source.get(anchor));
    ResizePlan {
        size: Dimensions::from_axis(anchor, along, scaled_free),
        offset: Offset::from_axis(free, centered_offset(scaled_free, target.get(free))),
        strategy: Strategy::ScaleThenCrop { target },
    }
}

fn crop_sample(source: Dimensions, target: Dimensions, anchor: Axis) -> ResizePlan {
    let free = anchor.other();
    let along = source.get(anchor);
    let sample_free =
        scale_floor(target.get(free), along, target.get(anchor)).min(source.get(free));
    ResizePlan {
        size: Dimensions::from_axis(anchor, along, sample_free),
        offset: Offset::from_axis(free, centered_offset(source.get(free), sample_free)),
        strategy: Strategy::CropThenScale { target },
    }
}
