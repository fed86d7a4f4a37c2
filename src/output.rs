//! CLI output formatting.
//!
//! One header line per input, followed by indented context lines:
//!
//! ```text
//! IMG_0042.jpg
//!     4000x3000 → 1080x1080 (crop, sample 1/2)
//!     Output: out/Scaled_2026-10-14-09-30-05.jpg
//! small.png
//!     800x600 fits, unchanged
//! broken.jpg
//!     kept original: failed to decode broken.jpg: ...
//! ```
//!
//! Formatting returns lines instead of printing so it can be tested.

use crate::imaging::{CompressOutcome, ScaleOutcome};
use std::path::Path;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lines describing one scale outcome.
pub fn format_scale_outcome(input: &Path, outcome: &ScaleOutcome) -> Vec<String> {
    let mut lines = vec![display_name(input)];
    match outcome {
        ScaleOutcome::Unchanged { natural, .. } => {
            lines.push(format!("    {natural} fits, unchanged"));
        }
        ScaleOutcome::Scaled(scaled) => {
            lines.push(format!(
                "    {} → {} ({}, sample {})",
                scaled.natural,
                scaled.dest_rect.dimensions(),
                scaled.mode,
                scaled.sample_factor
            ));
            lines.push(format!("    Output: {}", scaled.path.display()));
        }
        ScaleOutcome::KeptOriginal { reason, .. } => {
            lines.push(format!("    kept original: {reason}"));
        }
    }
    lines
}

/// Lines describing one re-compression.
pub fn format_compress_outcome(path: &Path, outcome: &CompressOutcome) -> Vec<String> {
    let mut lines = vec![display_name(path)];
    match outcome.quality {
        Some(quality) => lines.push(format!(
            "    {} → {} bytes at quality {} ({} attempt{})",
            outcome.original_bytes,
            outcome.final_bytes,
            quality.value(),
            outcome.attempts,
            if outcome.attempts == 1 { "" } else { "s" }
        )),
        None => lines.push(format!(
            "    unchanged: no quality reached {} bytes in {} attempts",
            outcome.limit, outcome.attempts
        )),
    }
    lines
}
