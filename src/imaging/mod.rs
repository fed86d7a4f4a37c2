//! The scaling engine.
//!
//! | Operation | Where |
//! |---|---|
//! | **Sample factor** | [`compute_sample_factor`] |
//! | **Source / dest rects** | [`compute_source_rect`], [`compute_dest_rect`] |
//! | **Decode at scale** | [`ImageBackend::decode_at_scale`] |
//! | **Scale a file** | [`scale`], [`scale_or_original`] |
//! | **Scale a buffer** | [`scale_image`] |
//! | **Re-compress** | [`compress`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and rectangle math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    Dimensions, ParseScaleModeError, Rect, SampleFactor, ScaleMode, compute_dest_rect,
    compute_sample_factor, compute_source_rect,
};
pub use operations::{
    CompressError, CompressOutcome, ScaleError, ScaleOutcome, ScaledImage, compress, plan_rects,
    scale, scale_image, scale_or_original, validate_target,
};
pub use params::{CompressSchedule, Quality, ScaleRequest};
pub use rust_backend::RustBackend;
