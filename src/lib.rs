//! # cropfit
//!
//! Resize planning for images under two containment policies, plus a small
//! content-addressed store that keeps originals next to their variants.
//!
//! - **Fit** (contain): the result stays inside the target box; nothing is
//!   cropped.
//! - **Fill** (cover): the result covers the whole target box; whatever
//!   overflows is cropped away, centred.
//!
//! Either can be allowed to **upscale**. Fill can be carried out two ways
//! with the same framing: scale the whole image and then crop, or cut a
//! proportional sample from the original and scale only that.
//!
//! # Architecture: Plan, Then Execute
//!
//! ```text
//! 1. Plan      (source, target, mode, algorithm, upscale)  →  ResizePlan
//! 2. Execute   ResizePlan + pixels                          →  encoded file
//! 3. Store     encoded file                                 →  store, by id
//! ```
//!
//! Planning is pure integer arithmetic: no pixels, no I/O, no floating point.
//! The plan carries the output size, the crop offset and the order the crop
//! and scale happen in, so execution is a mechanical replay and the planner
//! can be tested exhaustively without decoding a single image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The fit/fill planner, the `image`-crate executor, identify → plan → execute |
//! | [`naming`] | `WxH-mode[-algorithm][-upscale].ext` variant filenames |
//! | [`storage`] | [`storage::StorageBackend`] trait, object ids, the local directory store |
//! | [`process`] | Ingest originals, generate variants in parallel, resolve variant URLs |
//! | [`config`] | `cropfit.toml` loading, validation and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exact Integer Geometry
//!
//! Free-axis sizes are floor-divided exact rationals and crop offsets round
//! half to even. The same inputs give the same plan on every platform, and
//! `offset + extent` can never run past the region being cropped.
//!
//! ## Variant Names Describe Themselves
//!
//! A variant's filename is its request. A URL for a variant that was never
//! generated still says which original, which size and which policy, so the
//! store can be filled lazily on first request.
//!
//! ## Content-Addressed Originals
//!
//! Ids are derived from a SHA-256 of the file, so uploading the same image
//! twice is detected rather than stored twice.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
