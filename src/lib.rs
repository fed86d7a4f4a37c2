//! # scaledown
//!
//! Scales photos into a destination box, either fitting the whole image
//! inside it or center-cropping to fill it exactly, and writes the result as
//! a new JPEG.
//!
//! ```text
//! caller ─▶ scale(path, width, height, mode, output_dir) ─▶ path'
//! ```
//!
//! Scaling never enlarges. A source that already fits is returned as-is and
//! nothing is written. Oversized sources are decoded at an integer sample
//! factor, so the working buffer stays close to the output size.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The engine: geometry, backend trait, `image`-crate backend, scale/compress operations |
//! | [`config`] | `scaledown.toml` loading, merging and validation |
//! | [`naming`] | `Scaled_<timestamp>.jpg` output names |
//! | [`output`] | CLI result formatting |
//!
//! # Example
//!
//! ```no_run
//! use scaledown::imaging::{RustBackend, ScaleMode, ScaleRequest, scale_or_original};
//!
//! let request = ScaleRequest::new("IMG_0042.jpg", 1080, 1080, ScaleMode::Crop, "scaled");
//! let outcome = scale_or_original(&RustBackend::new(), &request)?;
//! println!("{}", outcome.path().display());
//! # Ok::<(), scaledown::imaging::ScaleError>(())
//! ```
//!
//! # Failure Policy
//!
//! [`imaging::scale`] returns every failure as an [`imaging::ScaleError`].
//! Best-effort callers such as a UI preview use
//! [`imaging::scale_or_original`] instead. It logs decode and write failures
//! and falls back to the original path. Caller mistakes (a zero-sized box, a
//! zero-area source) are always returned as errors.
//!
//! # Logging
//!
//! The library logs through the [`log`] facade and never installs a logger.
//! The `scaledown` binary uses `env_logger`.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
