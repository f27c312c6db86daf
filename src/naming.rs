//! Variant filenames.
//!
//! A variant's filename records how it was produced, so a request for a
//! variant URL carries everything needed to generate it on demand:
//!
//! ```text
//! 300x200-fill-scale_then_crop-upscale.jpg
//! │       │    │               │       └ output format
//! │       │    │               └ optional: upscale allowed
//! │       │    └ optional: fill algorithm (omitted for the default)
//! │       └ mode
//! └ target size
//! ```
//!
//! - `300x200-fit.png` → fit into 300×200, never upscale, PNG
//! - `64x64-fill.webp` → cover 64×64 with the default algorithm
//! - `800x600-fill-upscale.jpg` → cover 800×600, enlarging if needed
//!
//! The algorithm token is only written for fill; it is accepted but ignored
//! for fit. Names are case-insensitive and always produced in lowercase.

use crate::imaging::{Algorithm, Dimensions, Mode, PlanError, ResizeOptions};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const UPSCALE_TOKEN: &str = "upscale";

#[derive(Error, Debug, PartialEq)]
pub enum NameError {
    #[error("Variant name has no extension: {0}")]
    MissingExtension(String),
    #[error("Variant name has no mode: {0}")]
    MissingMode(String),
    #[error("Unknown token '{token}' in variant name {name}")]
    UnknownToken { name: String, token: String },
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Parsed form of a variant filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantName {
    pub size: Dimensions,
    pub options: ResizeOptions,
    /// Lowercase, without the leading dot.
    pub extension: String,
}

impl VariantName {
    pub fn new(size: Dimensions, options: ResizeOptions, extension: &str) -> Self {
        Self {
            size,
            options,
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }
}

impl fmt::Display for VariantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.size, self.options.mode)?;
        let algorithm = self.options.algorithm.filter(|a| *a != Algorithm::default());
        if let (Mode::Fill, Some(algorithm)) = (self.options.mode, algorithm) {
            write!(f, "-{algorithm}")?;
        }
        if self.options.upscale {
            write!(f, "-{UPSCALE_TOKEN}")?;
        }
        write!(f, ".{}", self.extension)
    }
}

impl FromStr for VariantName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant_filename(s)
    }
}

/// Build the filename for a variant of `size` produced with `options`.
pub fn variant_filename(size: Dimensions, options: ResizeOptions, extension: &str) -> String {
    VariantName::new(size, options, extension).to_string()
}

/// Parse a variant filename back into size, options and extension.
pub fn parse_variant_filename(name: &str) -> Result<VariantName, NameError> {
    let lowered = name.trim().to_lowercase();
    let (stem, extension) = lowered
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .ok_or_else(|| NameError::MissingExtension(name.to_string()))?;

    let mut tokens = stem.split('-');
    let size: Dimensions = tokens.next().unwrap_or_default().parse()?;
    let mode: Mode = tokens
        .next()
        .ok_or_else(|| NameError::MissingMode(name.to_string()))?
        .parse()?;

    let mut options = ResizeOptions {
        mode,
        ..ResizeOptions::default()
    };
    for token in tokens {
        if token == UPSCALE_TOKEN {
            options.upscale = true;
            continue;
        }
        let algorithm: Algorithm = token.parse().map_err(|_| NameError::UnknownToken {
            name: name.to_string(),
            token: token.to_string(),
        })?;
        // The default algorithm is implied, so it never gets a name of its own
        if mode == Mode::Fill && algorithm != Algorithm::default() {
            options.algorithm = Some(algorithm);
        }
    }

    Ok(VariantName::new(size, options, extension))
}
