//! Output file naming for scaled images.
//!
//! Scaled images are written as `<prefix><timestamp>.jpg`, by default
//! `Scaled_2026-10-14-09-30-05.jpg`. The timestamp has one-second resolution,
//! so two scales finishing in the same second would produce the same name.
//! [`output_path_for`] appends `-1`, `-2`, … when the name is already taken
//! on disk. That check is not atomic: concurrent writers into one directory
//! must still pick distinct prefixes or serialize themselves.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write as _};
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "Scaled_";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Extension of every scaled output; the encoder is always JPEG.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// How generated files are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub prefix: String,
    /// `strftime`-style format understood by `chrono`.
    pub timestamp_format: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

/// True when `chrono` can render every specifier in `format`.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Build the file name for an image scaled at `at`.
///
/// An unrenderable format falls back to [`DEFAULT_TIMESTAMP_FORMAT`] rather
/// than panicking inside `chrono`'s `Display` impl.
pub fn scaled_file_name<Tz>(naming: &FileNaming, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut stamp = String::new();
    if !is_valid_timestamp_format(&naming.timestamp_format)
        || write!(stamp, "{}", at.format(&naming.timestamp_format)).is_err()
    {
        stamp = at.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
    }
    // Path separators would escape the output directory
    let stamp = stamp.replace(['/', '\\'], "-");
    format!("{}{}.{}", naming.prefix, stamp, OUTPUT_EXTENSION)
}

/// Join `file_name` onto `dir`, suffixing the stem until the path is unused.
pub fn output_path_for(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
