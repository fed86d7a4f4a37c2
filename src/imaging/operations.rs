//! High-level image operations.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with a backend. The scale pipeline
//! is:
//!
//! ```text
//! identify ─▶ fits? ──yes──▶ Unchanged (original path, nothing written)
//!               │no
//!               ▼
//! sample factor ─▶ decode at scale ─▶ source/dest rects ─▶ resample ─▶ JPEG ─▶ write
//! ```
//!
//! Each stage hands its buffer to the next by value, so the decode buffer is
//! dropped as soon as the resampled one exists, and the resampled one as
//! soon as it is encoded.
//!
//! ## Failure policy
//!
//! [`scale`] reports every failure as a [`ScaleError`]. [`scale_or_original`]
//! is the boundary for best-effort callers such as a UI preview. It
//! deliberately swallows environmental failures (decode, encode, write): it
//! logs them at `warn` and hands back the original path. Contract violations
//! ([`ScaleError::InvalidDimensions`], [`ScaleError::DegenerateGeometry`]) are
//! never swallowed.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    Dimensions, Rect, SampleFactor, ScaleMode, compute_dest_rect, compute_sample_factor,
    compute_source_rect,
};
use super::params::{CompressSchedule, Quality, ScaleRequest};
use crate::naming;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("invalid target dimensions {width}x{height}: both sides must be positive")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode { path: PathBuf, source: BackendError },
    #[error("failed to write scaled image to {}: {source}", .path.display())]
    Encode { path: PathBuf, source: BackendError },
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl ScaleError {
    /// Caller misuse, as opposed to an environmental failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. } | Self::DegenerateGeometry(_)
        )
    }
}

/// Geometry and output location of a completed scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledImage {
    pub path: PathBuf,
    pub mode: ScaleMode,
    pub natural: Dimensions,
    pub sample_factor: SampleFactor,
    /// Region of the *decoded* (sampled) image that was resampled.
    pub source_rect: Rect,
    pub dest_rect: Rect,
}

/// What a scale call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleOutcome {
    /// The source already fits the box; nothing was decoded or written.
    Unchanged { path: PathBuf, natural: Dimensions },
    /// A new file was written.
    Scaled(ScaledImage),
    /// Only produced by [`scale_or_original`]: scaling failed for an
    /// environmental reason and the original path is returned instead.
    KeptOriginal { path: PathBuf, reason: String },
}

impl ScaleOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unchanged { path, .. } | Self::KeptOriginal { path, .. } => path,
            Self::Scaled(scaled) => &scaled.path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Unchanged { path, .. } | Self::KeptOriginal { path, .. } => path,
            Self::Scaled(scaled) => scaled.path,
        }
    }
}

/// Validate a requested box. Zero on either side fails before any I/O.
pub fn validate_target(width: u32, height: u32) -> Result<Dimensions, ScaleError> {
    if width == 0 || height == 0 {
        return Err(ScaleError::InvalidDimensions { width, height });
    }
    Ok(Dimensions::new(width, height))
}

/// Source and destination rects for a decoded image of `decoded` size.
///
/// The source rect honours `mode`. Placement fits the selected region into
/// the box: for Fit that is the aspect-preserving rect; for Crop the region
/// already has the box's aspect ratio, so it fills the whole box.
pub fn plan_rects(
    decoded: Dimensions,
    target: Dimensions,
    mode: ScaleMode,
) -> Result<(Rect, Rect), ScaleError> {
    if decoded.is_empty() {
        return Err(ScaleError::DegenerateGeometry(format!(
            "decoded image has zero area ({decoded})"
        )));
    }
    let src = compute_source_rect(decoded, target, mode);
    let dst = compute_dest_rect(src.dimensions(), target, mode);

    if !src.is_within(decoded) || dst.is_empty() || !dst.dimensions().fits_within(target) {
        return Err(ScaleError::DegenerateGeometry(format!(
            "source rect {src} / dest rect {dst} invalid for {decoded} into {target}"
        )));
    }
    Ok((src, dst))
}

/// Scale an image file into `request.width x request.height`.
///
/// Returns [`ScaleOutcome::Unchanged`] without decoding when the natural size
/// already fits, since scaling never enlarges. Otherwise the image is decoded
/// at the sample factor for `request.mode` and resampled. The result is
/// written as JPEG to a new timestamped file in `request.output_dir`, which
/// is created if missing.
pub fn scale(backend: &impl ImageBackend, request: &ScaleRequest) -> Result<ScaleOutcome, ScaleError> {
    let target = validate_target(request.width, request.height)?;
    let source = &request.source;

    let natural = backend
        .identify(source)
        .map_err(|e| ScaleError::Decode {
            path: source.clone(),
            source: e,
        })?;
    if natural.is_empty() {
        return Err(ScaleError::DegenerateGeometry(format!(
            "{} reports zero area ({natural})",
            source.display()
        )));
    }

    if natural.fits_within(target) {
        log::debug!(
            "{}: {natural} already fits {target}, leaving unchanged",
            source.display()
        );
        return Ok(ScaleOutcome::Unchanged {
            path: source.clone(),
            natural,
        });
    }

    let factor = compute_sample_factor(natural, target, request.mode);
    let decoded = backend
        .decode_at_scale(source, factor)
        .map_err(|e| ScaleError::Decode {
            path: source.clone(),
            source: e,
        })?;
    let decoded_dims = Dimensions::new(decoded.width(), decoded.height());

    let (src_rect, dst_rect) = plan_rects(decoded_dims, target, request.mode)?;
    log::debug!(
        "{}: {natural} sampled {factor} to {decoded_dims}, {} src {src_rect} -> dst {dst_rect}",
        source.display(),
        request.mode
    );

    let rendered = backend.resample(&decoded, src_rect, dst_rect);
    drop(decoded);

    let output_dir = &request.output_dir;
    fs::create_dir_all(output_dir).map_err(|e| ScaleError::Encode {
        path: output_dir.clone(),
        source: e.into(),
    })?;
    let file_name = naming::scaled_file_name(&request.naming, &chrono::Local::now());
    let output = naming::output_path_for(output_dir, &file_name);

    let bytes = backend
        .encode_jpeg(&rendered, request.quality)
        .map_err(|e| ScaleError::Encode {
            path: output.clone(),
            source: e,
        })?;
    drop(rendered);
    fs::write(&output, &bytes).map_err(|e| ScaleError::Encode {
        path: output.clone(),
        source: e.into(),
    })?;

    log::info!(
        "{} ({natural}) -> {} ({}x{}, {} bytes)",
        source.display(),
        output.display(),
        dst_rect.width(),
        dst_rect.height(),
        bytes.len()
    );

    Ok(ScaleOutcome::Scaled(ScaledImage {
        path: output,
        mode: request.mode,
        natural,
        sample_factor: factor,
        source_rect: src_rect,
        dest_rect: dst_rect,
    }))
}

/// Best-effort boundary around [`scale`].
///
/// Decode and encode/write failures are deliberately swallowed here: they are
/// logged at `warn` and the outcome is [`ScaleOutcome::KeptOriginal`] pointing
/// at the unscaled source. Contract violations are still returned as `Err`.
pub fn scale_or_original(
    backend: &impl ImageBackend,
    request: &ScaleRequest,
) -> Result<ScaleOutcome, ScaleError> {
    match scale(backend, request) {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_contract_violation() => Err(e),
        Err(e) => {
            log::warn!(
                "scaling {} failed, keeping original: {e}",
                request.source.display()
            );
            Ok(ScaleOutcome::KeptOriginal {
                path: request.source.clone(),
                reason: e.to_string(),
            })
        }
    }
}

/// Scale an already-decoded image in memory.
///
/// Same geometry as [`scale`] minus decode-time sampling and file output. An
/// image that already fits is returned as a copy.
pub fn scale_image(
    backend: &impl ImageBackend,
    image: &DynamicImage,
    width: u32,
    height: u32,
    mode: ScaleMode,
) -> Result<DynamicImage, ScaleError> {
    let target = validate_target(width, height)?;
    let natural = Dimensions::new(image.width(), image.height());
    if natural.is_empty() {
        return Err(ScaleError::DegenerateGeometry(format!(
            "image has zero area ({natural})"
        )));
    }
    if natural.fits_within(target) {
        return Ok(image.clone());
    }
    let (src_rect, dst_rect) = plan_rects(natural, target, mode)?;
    Ok(backend.resample(image, src_rect, dst_rect))
}

// =============================================================================
// Re-compression
// =============================================================================

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

/// Result of a bounded re-compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressOutcome {
    pub original_bytes: u64,
    /// Size on disk afterwards; equals `original_bytes` when nothing was written.
    pub final_bytes: u64,
    pub limit: u64,
    /// Quality that was written, if any attempt fit.
    pub quality: Option<Quality>,
    pub attempts: u32,
}

impl CompressOutcome {
    pub fn within_limit(&self) -> bool {
        self.quality.is_some()
    }
}

/// Re-encode `path` in place as JPEG until it is at most `limit` bytes.
///
/// `limit` defaults to the file's current size. Qualities come from
/// `schedule`, highest first; the first encoding within the limit is written
/// over the file. If no attempt fits, the file is left untouched.
pub fn compress(
    backend: &impl ImageBackend,
    path: &Path,
    limit: Option<u64>,
    schedule: &CompressSchedule,
) -> Result<CompressOutcome, CompressError> {
    let original_bytes = fs::metadata(path)?.len();
    let limit = limit.unwrap_or(original_bytes);
    let image = backend.decode_at_scale(path, SampleFactor::ONE)?;

    let mut attempts = 0;
    for quality in schedule.qualities() {
        attempts += 1;
        let bytes = backend.encode_jpeg(&image, quality)?;
        log::debug!(
            "{}: quality {} -> {} bytes (limit {limit})",
            path.display(),
            quality.value(),
            bytes.len()
        );
        if bytes.len() as u64 <= limit {
            fs::write(path, &bytes)?;
            log::info!(
                "{}: compressed {original_bytes} -> {} bytes at quality {}",
                path.display(),
                bytes.len(),
                quality.value()
            );
            return Ok(CompressOutcome {
                original_bytes,
                final_bytes: bytes.len() as u64,
                limit,
                quality: Some(quality),
                attempts,
            });
        }
    }

    log::warn!(
        "{}: no quality in schedule reached {limit} bytes after {attempts} attempts",
        path.display()
    );
    Ok(CompressOutcome {
        original_bytes,
        final_bytes: original_bytes,
        limit,
        quality: None,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn request(dir: &Path, w: u32, h: u32, mode: ScaleMode) -> ScaleRequest {
        ScaleRequest::new("/photos/source.jpg", w, h, mode, dir.join("out"))
    }

    fn files_in(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    // =========================================================================
    // scale tests
    // =========================================================================

    #[test]
    fn zero_width_fails_before_any_io() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(4000, 3000);

        let result = scale(&backend, &request(tmp.path(), 0, 100, ScaleMode::Fit));
        assert!(matches!(
            result,
            Err(ScaleError::InvalidDimensions {
                width: 0,
                height: 100
            })
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn fitting_source_is_returned_unchanged() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(800, 600);

        let outcome = scale(&backend, &request(tmp.path(), 1920, 1080, ScaleMode::Fit)).unwrap();
        assert_eq!(outcome.path(), Path::new("/photos/source.jpg"));
        assert!(matches!(outcome, ScaleOutcome::Unchanged { .. }));
        // Only the header was read
        assert_eq!(backend.get_operations().len(), 1);
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn one_pixel_source_crop_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(1, 1);

        let outcome = scale(&backend, &request(tmp.path(), 100, 100, ScaleMode::Crop)).unwrap();
        assert!(matches!(outcome, ScaleOutcome::Unchanged { .. }));
    }

    #[test]
    fn crop_landscape_into_square() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(4000, 3000);

        let outcome = scale(&backend, &request(tmp.path(), 1080, 1080, ScaleMode::Crop)).unwrap();
        let ScaleOutcome::Scaled(scaled) = outcome else {
            panic!("expected a scaled outcome");
        };

        assert_eq!(scaled.sample_factor.get(), 2);
        // Decoded at 2000x1500: centered 1500-wide window
        assert_eq!(scaled.source_rect, Rect::new(250, 0, 1750, 1500));
        assert_eq!(scaled.dest_rect, Rect::new(0, 0, 1080, 1080));
        assert!(scaled.path.starts_with(tmp.path().join("out")));
        assert!(scaled.path.exists());

        let ops = backend.get_operations();
        assert!(ops.contains(&RecordedOp::Decode {
            path: "/photos/source.jpg".into(),
            factor: 2
        }));
        assert!(ops.contains(&RecordedOp::Encode {
            width: 1080,
            height: 1080,
            quality: 75
        }));
    }

    #[test]
    fn fit_wide_source_into_square() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(3000, 1000);

        let outcome = scale(&backend, &request(tmp.path(), 500, 500, ScaleMode::Fit)).unwrap();
        let ScaleOutcome::Scaled(scaled) = outcome else {
            panic!("expected a scaled outcome");
        };
        assert_eq!(scaled.sample_factor.get(), 6);
        assert_eq!(scaled.source_rect, Rect::new(0, 0, 500, 166));
        assert_eq!(scaled.dest_rect, Rect::new(0, 0, 500, 166));
    }

    #[test]
    fn output_is_named_with_prefix_and_jpg_extension() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(2000, 2000);

        let path = scale(&backend, &request(tmp.path(), 100, 100, ScaleMode::Fit))
            .unwrap()
            .into_path();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Scaled_"), "{name}");
        assert!(name.ends_with(".jpg"), "{name}");
    }

    #[test]
    fn missing_source_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let err = scale(&backend, &request(tmp.path(), 100, 100, ScaleMode::Fit)).unwrap_err();
        assert!(matches!(err, ScaleError::Decode { .. }));
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn zero_area_source_is_degenerate() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(0, 500);

        let err = scale(&backend, &request(tmp.path(), 100, 100, ScaleMode::Crop)).unwrap_err();
        assert!(matches!(err, ScaleError::DegenerateGeometry(_)));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn encode_failure_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend {
            fail_encode: true,
            ..MockBackend::with_dimensions(2000, 1000)
        };

        let err = scale(&backend, &request(tmp.path(), 100, 100, ScaleMode::Fit)).unwrap_err();
        assert!(matches!(err, ScaleError::Encode { .. }));
        assert_eq!(files_in(&tmp.path().join("out")), 0);
    }

    // =========================================================================
    // scale_or_original tests
    // =========================================================================

    #[test]
    fn decode_failure_falls_back_to_original() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend {
            fail_decode: true,
            ..MockBackend::with_dimensions(4000, 3000)
        };

        let outcome =
            scale_or_original(&backend, &request(tmp.path(), 100, 100, ScaleMode::Crop)).unwrap();
        assert_eq!(outcome.path(), Path::new("/photos/source.jpg"));
        assert!(
            matches!(&outcome, ScaleOutcome::KeptOriginal { reason, .. } if reason.contains("decode"))
        );
    }

    #[test]
    fn invalid_dimensions_are_not_swallowed() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(4000, 3000);

        let result = scale_or_original(&backend, &request(tmp.path(), 100, 0, ScaleMode::Fit));
        assert!(matches!(result, Err(ScaleError::InvalidDimensions { .. })));
    }

    #[test]
    fn fallback_passes_success_through() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(4000, 3000);

        let outcome =
            scale_or_original(&backend, &request(tmp.path(), 400, 300, ScaleMode::Fit)).unwrap();
        assert!(matches!(outcome, ScaleOutcome::Scaled(_)));
    }

    // =========================================================================
    // plan_rects / scale_image tests
    // =========================================================================

    #[test]
    fn plan_crop_fills_target_exactly() {
        // 1333x1000 cropped to 16:9 is slightly off-aspect after truncation,
        // but placement still covers the full box
        let (src, dst) = plan_rects(
            Dimensions::new(1333, 1000),
            Dimensions::new(1600, 900),
            ScaleMode::Crop,
        )
        .unwrap();
        assert_eq!(src, Rect::new(0, 125, 1333, 874));
        assert_eq!(dst, Rect::new(0, 0, 1600, 900));
    }

    #[test]
    fn plan_rejects_empty_decode() {
        let result = plan_rects(Dimensions::new(0, 0), Dimensions::new(10, 10), ScaleMode::Fit);
        assert!(matches!(result, Err(ScaleError::DegenerateGeometry(_))));
    }

    #[test]
    fn scale_image_crop_output_matches_target() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(640, 480);

        let out = scale_image(&backend, &img, 100, 200, ScaleMode::Crop).unwrap();
        assert_eq!((out.width(), out.height()), (100, 200));
    }

    #[test]
    fn scale_image_fitting_is_copy() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(64, 48);

        let out = scale_image(&backend, &img, 100, 100, ScaleMode::Fit).unwrap();
        assert_eq!((out.width(), out.height()), (64, 48));
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // compress tests
    // =========================================================================

    fn source_file(dir: &Path, bytes: usize) -> PathBuf {
        let path = dir.join("photo.jpg");
        fs::write(&path, vec![7u8; bytes]).unwrap();
        path
    }

    #[test]
    fn compress_stops_at_first_quality_within_original_size() {
        let tmp = TempDir::new().unwrap();
        let path = source_file(tmp.path(), 800);
        let backend = MockBackend::with_dimensions(10, 10);

        // Mock output is 10 * quality bytes: 950, 850, 750 -> fits at 75
        let outcome = compress(&backend, &path, None, &CompressSchedule::default()).unwrap();
        assert_eq!(outcome.quality, Some(Quality::new(75)));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.final_bytes, 750);
        assert_eq!(fs::metadata(&path).unwrap().len(), 750);
    }

    #[test]
    fn compress_respects_explicit_limit() {
        let tmp = TempDir::new().unwrap();
        let path = source_file(tmp.path(), 800);
        let backend = MockBackend::with_dimensions(10, 10);

        let outcome = compress(&backend, &path, Some(500), &CompressSchedule::default()).unwrap();
        assert_eq!(outcome.quality, Some(Quality::new(45)));
        assert_eq!(outcome.attempts, 6);
    }

    #[test]
    fn compress_unreachable_limit_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = source_file(tmp.path(), 800);
        let backend = MockBackend::with_dimensions(10, 10);

        let outcome = compress(&backend, &path, Some(100), &CompressSchedule::default()).unwrap();
        assert!(!outcome.within_limit());
        assert_eq!(outcome.attempts, 6);
        assert_eq!(outcome.final_bytes, 800);
        assert_eq!(fs::read(&path).unwrap(), vec![7u8; 800]);
    }

    #[test]
    fn compress_missing_file_is_io_error() {
        let backend = MockBackend::with_dimensions(10, 10);
        let result = compress(
            &backend,
            Path::new("/nonexistent/photo.jpg"),
            None,
            &CompressSchedule::default(),
        );
        assert!(matches!(result, Err(CompressError::Io(_))));
    }

    // =========================================================================
    // no-upscale property
    // =========================================================================

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fitting_source_is_never_touched(
            (w, h) in (1u32..5_000, 1u32..5_000),
            (extra_w, extra_h) in (0u32..5_000, 0u32..5_000),
            crop in any::<bool>(),
        ) {
            let mode = if crop { ScaleMode::Crop } else { ScaleMode::Fit };
            let backend = MockBackend::with_dimensions(w, h);
            let out = Path::new("/nonexistent/scaledown-out");
            let req = ScaleRequest::new("/photos/source.jpg", w + extra_w, h + extra_h, mode, out);

            let first = scale(&backend, &req).unwrap();
            prop_assert!(matches!(first, ScaleOutcome::Unchanged { .. }), "got {:?}", first);
            prop_assert_eq!(
                backend.get_operations(),
                vec![RecordedOp::Identify("/photos/source.jpg".into())]
            );

            // Scaling the result again is still a no-op
            let again = ScaleRequest::new(first.path(), w + extra_w, h + extra_h, mode, out);
            let second = scale(&backend, &again).unwrap();
            prop_assert_eq!(second.path(), Path::new("/photos/source.jpg"));
            prop_assert!(!out.exists());
        }
    }
}
