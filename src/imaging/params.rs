//! Parameter types for image operations.
//!
//! These structs describe *what* to do. [`operations`](super::operations)
//! consumes them and drives an [`ImageBackend`](super::ImageBackend), which
//! does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 75). Clamped on construction.
//! - [`CompressSchedule`]: bounded, strictly decreasing quality sequence for re-compression.
//! - [`ScaleRequest`]: everything one `scale` call needs: source, box, mode, output dir, naming.

use super::calculations::ScaleMode;
use crate::naming::FileNaming;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Quality schedule for shrinking an existing file by re-encoding.
///
/// Starts at `start`, steps down by `step` and never goes below `min`. At
/// most `max_attempts` qualities are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSchedule {
    pub start: Quality,
    pub min: Quality,
    pub step: u8,
    pub max_attempts: u32,
}

impl Default for CompressSchedule {
    fn default() -> Self {
        Self {
            start: Quality::new(95),
            min: Quality::new(40),
            step: 10,
            max_attempts: 6,
        }
    }
}

impl CompressSchedule {
    /// The qualities to try, in order. Strictly decreasing, so the loop that
    /// consumes it always terminates.
    pub fn qualities(&self) -> Vec<Quality> {
        let floor = self.min.value().min(self.start.value());
        let step = self.step.max(1);
        let mut out = Vec::new();
        let mut q = self.start.value();

        while out.len() < self.max_attempts as usize {
            out.push(Quality::new(q as u32));
            if q <= floor {
                break;
            }
            q = q.saturating_sub(step).max(floor);
        }
        out
    }
}

/// Parameters for one scaling call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRequest {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mode: ScaleMode,
    pub output_dir: PathBuf,
    pub quality: Quality,
    pub naming: FileNaming,
}

impl ScaleRequest {
    /// Request with default quality and `Scaled_<timestamp>.jpg` naming.
    pub fn new(
        source: impl Into<PathBuf>,
        width: u32,
        height: u32,
        mode: ScaleMode,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            mode,
            output_dir: output_dir.into(),
            quality: Quality::default(),
            naming: FileNaming::default(),
        }
    }
}
