//! Pure geometry for the scaling engine.
//!
//! Everything here is integer math on dimensions and rectangles: no I/O, no
//! pixels. Aspect-ratio comparisons are done by cross-multiplying in `u64`,
//! and every "extent × aspect, truncated" step is computed as a single integer
//! division of the exact product. This gives the mathematically exact
//! truncation of the real-valued formula, with no float rounding to introduce
//! off-by-one drift.
//!
//! Zero extents never reach a division: every dimension read by these
//! functions is clamped to at least 1, and every produced extent is clamped to
//! at least 1 pixel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `(width, height)` pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides are at most the corresponding side of `bounds`.
    pub fn fits_within(self, bounds: Dimensions) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn w(self) -> u64 {
        self.width.max(1) as u64
    }

    fn h(self) -> u64 {
        self.height.max(1) as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How the source is mapped into the destination box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Keep the whole source visible; the output may be smaller than the box
    /// along one axis.
    #[default]
    Fit,
    /// Fill the box completely, discarding source outside the centered window
    /// that matches the box's aspect ratio.
    Crop,
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit => f.write_str("fit"),
            Self::Crop => f.write_str("crop"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown scale mode '{0}' (expected 'fit' or 'crop')")]
pub struct ParseScaleModeError(String);

impl FromStr for ScaleMode {
    type Err = ParseScaleModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fit" => Ok(Self::Fit),
            "crop" => Ok(Self::Crop),
            _ => Err(ParseScaleModeError(s.to_string())),
        }
    }
}

/// Integer box `(left, top, right, bottom)`, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The full area of an image with the given dimensions.
    pub fn full(dims: Dimensions) -> Self {
        Self::new(0, 0, dims.width, dims.height)
    }

    pub fn width(self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    pub fn is_empty(self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// True when the rect has area and lies entirely inside `dims`.
    pub fn is_within(self, dims: Dimensions) -> bool {
        !self.is_empty() && self.right <= dims.width && self.bottom <= dims.height
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Integer divisor applied to both axes while decoding. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleFactor(u32);

impl SampleFactor {
    pub const ONE: SampleFactor = SampleFactor(1);

    /// Clamps to 1: decoding never upsamples.
    pub fn new(factor: u32) -> Self {
        Self(factor.max(1))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Dimensions of an image decoded at this factor (each side at least 1).
    pub fn apply(self, dims: Dimensions) -> Dimensions {
        Dimensions::new((dims.width / self.0).max(1), (dims.height / self.0).max(1))
    }
}

impl fmt::Display for SampleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.0)
    }
}

/// `src_aspect > dst_aspect`, compared exactly.
fn is_relatively_wider(src: Dimensions, dst: Dimensions) -> bool {
    src.w() * dst.h() > dst.w() * src.h()
}

/// Choose the decode-time sample factor.
///
/// Fit divides by the tighter constraint (the axis that will touch the box),
/// Crop by the looser one (the axis that maps straight to the output, so the
/// axis being cropped keeps more resolution):
///
/// | mode | source relatively wider | otherwise |
/// |------|-------------------------|-----------|
/// | Fit  | `src_w / dst_w`         | `src_h / dst_h` |
/// | Crop | `src_h / dst_h`         | `src_w / dst_w` |
///
/// # Examples
/// ```
/// # use scaledown::imaging::{Dimensions, ScaleMode, compute_sample_factor};
/// let f = compute_sample_factor(
///     Dimensions::new(4000, 3000),
///     Dimensions::new(1080, 1080),
///     ScaleMode::Crop,
/// );
/// assert_eq!(f.get(), 2);
/// ```
pub fn compute_sample_factor(src: Dimensions, dst: Dimensions, mode: ScaleMode) -> SampleFactor {
    let by_width = src.w() / dst.w();
    let by_height = src.h() / dst.h();
    let wider = is_relatively_wider(src, dst);

    let factor = match (mode, wider) {
        (ScaleMode::Fit, true) | (ScaleMode::Crop, false) => by_width,
        (ScaleMode::Fit, false) | (ScaleMode::Crop, true) => by_height,
    };
    SampleFactor::new(u32::try_from(factor).unwrap_or(u32::MAX))
}

/// Region of the source to sample from.
///
/// Fit always samples the whole source. Crop takes the centered window whose
/// aspect ratio matches the destination: symmetric left/right margins when the
/// source is relatively wider, symmetric top/bottom margins otherwise. The
/// window extent is truncated first, then the margin is halved with integer
/// division.
pub fn compute_source_rect(src: Dimensions, dst: Dimensions, mode: ScaleMode) -> Rect {
    let (src_w, src_h) = (src.w(), src.h());
    match mode {
        ScaleMode::Fit => Rect::full(Dimensions::new(src_w as u32, src_h as u32)),
        ScaleMode::Crop => {
            if is_relatively_wider(src, dst) {
                // width = trunc(src_h * dst_aspect)
                let width = (src_h * dst.w() / dst.h()).clamp(1, src_w);
                let left = (src_w - width) / 2;
                Rect::new(left as u32, 0, (left + width) as u32, src_h as u32)
            } else {
                // height = trunc(src_w / dst_aspect)
                let height = (src_w * dst.h() / dst.w()).clamp(1, src_h);
                let top = (src_h - height) / 2;
                Rect::new(0, top as u32, src_w as u32, (top + height) as u32)
            }
        }
    }
}

/// Region of the output buffer to fill, always anchored at the origin.
///
/// Fit shrinks one axis of the box to the source aspect ratio; Crop fills the
/// whole box because the source rect was already cut to the box's aspect.
///
/// # Examples
/// ```
/// # use scaledown::imaging::{Dimensions, Rect, ScaleMode, compute_dest_rect};
/// let r = compute_dest_rect(
///     Dimensions::new(3000, 1000),
///     Dimensions::new(500, 500),
///     ScaleMode::Fit,
/// );
/// assert_eq!(r, Rect::new(0, 0, 500, 166));
/// ```
pub fn compute_dest_rect(src: Dimensions, dst: Dimensions, mode: ScaleMode) -> Rect {
    let (dst_w, dst_h) = (dst.w(), dst.h());
    match mode {
        ScaleMode::Crop => Rect::new(0, 0, dst_w as u32, dst_h as u32),
        ScaleMode::Fit => {
            if is_relatively_wider(src, dst) {
                // height = trunc(dst_w / src_aspect)
                let height = (dst_w * src.h() / src.w()).clamp(1, dst_h);
                Rect::new(0, 0, dst_w as u32, height as u32)
            } else {
                // width = trunc(dst_h * src_aspect)
                let width = (dst_h * src.w() / src.h()).clamp(1, dst_w);
                Rect::new(0, 0, width as u32, dst_h as u32)
            }
        }
    }
}
