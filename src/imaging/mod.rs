//! Image geometry and processing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Plan** | [`plan_resize`]: pure integer geometry, no pixels |
//! | **Identify** | `ImageReader::into_dimensions`, format sniffed from contents |
//! | **Crop / scale** | `crop_imm` + Lanczos3 `resize_exact` |
//! | **Encode** | JPEG, PNG, TIFF, WebP by output extension |
//!
//! The module is split into:
//! - **Calculations**: The fit/fill planner (unit testable)
//! - **Parameters**: Data structures describing sizes, policies and plans
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining the planner + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{PlanError, SizeClass, choose_anchor_axis, classify, plan_resize};
pub use operations::{
    GeneratedVariant, ResizeConfig, create_variant, get_dimensions, plan_variant, resize_image,
};
pub use params::{
    Algorithm, Axis, Dimensions, ExecuteParams, Mode, Offset, Quality, ResizeOptions, ResizePlan,
    Step, Strategy,
};
pub use rust_backend::RustBackend;
