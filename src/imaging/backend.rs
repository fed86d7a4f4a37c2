//! Image processing backend trait and shared error type.
//!
//! The [`ImageBackend`] trait is the seam between scaling logic and pixel
//! work. Every backend supports four operations: identify, decode at a sample
//! factor, resample a region, and encode to JPEG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock so the orchestration in
//! [`operations`](super::operations) can be checked without real pixels.

use super::calculations::{Dimensions, Rect, SampleFactor};
use super::params::Quality;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Read the natural dimensions from the file header without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the image with both axes divided by `factor`.
    fn decode_at_scale(
        &self,
        path: &Path,
        factor: SampleFactor,
    ) -> Result<DynamicImage, BackendError>;

    /// Resample `src` of `image` into a new buffer the size of `dst`.
    ///
    /// `dst` is anchored at the origin, so the returned buffer is exactly
    /// `dst.width() x dst.height()`.
    fn resample(&self, image: &DynamicImage, src: Rect, dst: Rect) -> DynamicImage;

    /// Encode to JPEG in memory.
    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}
