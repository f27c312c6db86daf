//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Plan
//!
//! ```text
//! 2000x3000 → 1000x2000 (fill, crop_sample_then_scale)
//!     Strategy: crop then scale
//!     Size: 1500x3000
//!     Offset: (250, 0)
//!     Output: 1000x2000
//!     Steps:
//!         crop 1500x3000 at (250, 0)
//!         scale to 1000x2000
//! ```
//!
//! ## Variants
//!
//! ```text
//! 001 300x200-fill.jpg (300x200)
//!     Source: 2000x3000
//!     Url: http://localhost/3c72aedc/.../photo.jpg/300x200-fill.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::imaging::{Dimensions, Mode, ResizeOptions, ResizePlan, Step, Strategy};
use crate::process::{ProcessedVariant, ResolvedVariant};
use crate::storage::ObjectId;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `fill, scale_then_crop, upscale` / `fit`
fn options_label(options: &ResizeOptions) -> String {
    let mut parts = vec![options.mode.to_string()];
    if options.mode == Mode::Fill {
        parts.push(options.algorithm.unwrap_or_default().to_string());
    }
    if options.upscale {
        parts.push("upscale".to_string());
    }
    parts.join(", ")
}

fn strategy_label(strategy: &Strategy) -> &'static str {
    match strategy {
        Strategy::Passthrough => "passthrough",
        Strategy::Scale => "scale",
        Strategy::Crop => "crop",
        Strategy::ScaleThenCrop { .. } => "scale then crop",
        Strategy::CropThenScale { .. } => "crop then scale",
    }
}

fn step_line(step: &Step) -> String {
    match step {
        Step::Scale { to } => format!("scale to {}", to),
        Step::Crop { offset, size } => format!("crop {} at {}", size, offset),
    }
}

// ============================================================================
// plan
// ============================================================================

/// Format a computed plan and the pixel steps it expands to.
pub fn format_plan(
    source: Dimensions,
    target: Dimensions,
    options: &ResizeOptions,
    plan: &ResizePlan,
) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {} ({})", source, target, options_label(options)),
        format!("{}Strategy: {}", indent(1), strategy_label(&plan.strategy)),
        format!("{}Size: {}", indent(1), plan.size),
        format!("{}Offset: {}", indent(1), plan.offset),
        format!("{}Output: {}", indent(1), plan.output_size()),
    ];

    let steps = plan.steps(source);
    if steps.is_empty() {
        lines.push(format!("{}Steps: none", indent(1)));
    } else {
        lines.push(format!("{}Steps:", indent(1)));
        lines.extend(steps.iter().map(|s| format!("{}{}", indent(2), step_line(s))));
    }
    lines
}

pub fn print_plan(
    source: Dimensions,
    target: Dimensions,
    options: &ResizeOptions,
    plan: &ResizePlan,
) {
    for line in format_plan(source, target, options, plan) {
        println!("{}", line);
    }
}

// ============================================================================
// put / variants / fetch
// ============================================================================

/// Format the result of storing an original.
pub fn format_stored(id: &ObjectId, url: &str) -> Vec<String> {
    vec![id.to_string(), format!("{}Url: {}", indent(1), url)]
}

pub fn print_stored(id: &ObjectId, url: &str) {
    for line in format_stored(id, url) {
        println!("{}", line);
    }
}

/// Format generated variants in request order.
pub fn format_variants(variants: &[ProcessedVariant]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, v) in variants.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}x{})",
            format_index(i + 1),
            v.filename,
            v.width,
            v.height
        ));
        lines.push(format!("{}Source: {}", indent(1), v.source));
        lines.push(format!("{}Url: {}", indent(1), v.url));
    }
    let noun = if variants.len() == 1 { "variant" } else { "variants" };
    lines.push(format!("Generated {} {}", variants.len(), noun));
    lines
}

pub fn print_variants(variants: &[ProcessedVariant]) {
    for line in format_variants(variants) {
        println!("{}", line);
    }
}

/// Format the outcome of resolving a variant URL.
pub fn format_resolved(resolved: &ResolvedVariant) -> Vec<String> {
    let status = if resolved.generated {
        "generated"
    } else {
        "stored"
    };
    vec![
        format!("{} ({})", resolved.filename, status),
        format!("{}Id: {}", indent(1), resolved.id),
        format!("{}Url: {}", indent(1), resolved.url),
    ]
}

pub fn print_resolved(resolved: &ResolvedVariant) {
    for line in format_resolved(resolved) {
        println!("{}", line);
    }
}
