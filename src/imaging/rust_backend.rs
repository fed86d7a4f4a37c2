//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Decode at scale (JPEG) | `jpeg_decoder::Decoder::scale` (IDCT at 1/2, 1/4, 1/8) |
//! | Decode (PNG, BMP, fallback) | `ImageReader::decode`, format sniffed from content |
//! | Remaining subsampling | `DynamicImage::thumbnail_exact` (box average) |
//! | Resample | `crop_imm` + `resize_exact` with `Triangle` (bilinear) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! JPEG sources are decoded through `jpeg-decoder` with IDCT scaling: the
//! decoder picks the largest reduction that still covers the sampled size,
//! so a full-resolution buffer is never allocated. The remainder of the
//! factor is box-averaged with `thumbnail_exact`.
//!
//! The `image` decoders have no reduced-resolution decode, so PNG and BMP
//! (and the JPEG variants `jpeg-decoder` cannot scale, such as lossless) are
//! decoded once at full size and immediately box-averaged down. The full
//! buffer is dropped before returning.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{Dimensions, Rect, SampleFactor};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageError, ImageFormat, ImageReader, RgbImage};
use jpeg_decoder::PixelFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True when the path's extension names a format we can decode.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: ImageError) -> BackendError {
    match err {
        ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode(format!("{}: {}", path.display(), other)),
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// A JPEG decoded with IDCT scaling, before the final box average.
struct ReducedJpeg {
    image: DynamicImage,
    natural: Dimensions,
}

/// Decode a JPEG at the coarsest IDCT scale that still covers
/// `factor.apply(natural)`.
///
/// Returns `Ok(None)` when `jpeg-decoder` does not support the file (for
/// example lossless or arithmetic-coded JPEG); callers fall back to a full
/// decode.
fn decode_jpeg_reduced(path: &Path, factor: SampleFactor) -> Result<Option<ReducedJpeg>, BackendError> {
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(File::open(path)?));
    if jpeg_step(path, decoder.read_info())?.is_none() {
        return Ok(None);
    }
    let info = decoder
        .info()
        .ok_or_else(|| BackendError::Decode(format!("{}: missing JPEG header", path.display())))?;
    let natural = Dimensions::new(u32::from(info.width), u32::from(info.height));
    let sampled = factor.apply(natural);

    let requested = (to_u16(sampled.width), to_u16(sampled.height));
    let Some((width, height)) = jpeg_step(path, decoder.scale(requested.0, requested.1))? else {
        return Ok(None);
    };
    let Some(pixels) = jpeg_step(path, decoder.decode())? else {
        return Ok(None);
    };
    let format = decoder
        .info()
        .map(|i| i.pixel_format)
        .ok_or_else(|| BackendError::Decode(format!("{}: missing JPEG header", path.display())))?;

    let image = jpeg_pixels_to_image(format, u32::from(width), u32::from(height), pixels)
        .ok_or_else(|| {
            BackendError::Decode(format!(
                "{}: unexpected {format:?} buffer for {width}x{height}",
                path.display()
            ))
        })?;
    Ok(Some(ReducedJpeg { image, natural }))
}

/// `Unsupported` becomes `Ok(None)` so the caller can fall back.
fn jpeg_step<T>(
    path: &Path,
    result: Result<T, jpeg_decoder::Error>,
) -> Result<Option<T>, BackendError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(jpeg_decoder::Error::Unsupported(feature)) => {
            log::debug!("{}: no scaled decode ({feature:?})", path.display());
            Ok(None)
        }
        Err(jpeg_decoder::Error::Io(e)) => Err(BackendError::Io(e)),
        Err(e) => Err(BackendError::Decode(format!("{}: {}", path.display(), e))),
    }
}

fn to_u16(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

fn jpeg_pixels_to_image(
    format: PixelFormat,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Option<DynamicImage> {
    match format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        PixelFormat::RGB24 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        PixelFormat::CMYK32 => {
            // Adobe CMYK is stored inverted
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|p| {
                    let k = 255 - u16::from(p[3]);
                    [p[0], p[1], p[2]].map(|v| ((255 - u16::from(v)) * k / 255) as u8)
                })
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    }
}

fn decode_full(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| decode_error(path, e))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode_at_scale(
        &self,
        path: &Path,
        factor: SampleFactor,
    ) -> Result<DynamicImage, BackendError> {
        if factor == SampleFactor::ONE {
            return decode_full(path);
        }

        let is_jpeg = open_reader(path)?.format() == Some(ImageFormat::Jpeg);
        if is_jpeg {
            if let Some(reduced) = decode_jpeg_reduced(path, factor)? {
                let sampled = factor.apply(reduced.natural);
                let image = reduced.image;
                if image.width() == sampled.width && image.height() == sampled.height {
                    return Ok(image);
                }
                return Ok(image.thumbnail_exact(sampled.width, sampled.height));
            }
        }

        let full = decode_full(path)?;
        let sampled = factor.apply(Dimensions::new(full.width(), full.height()));
        Ok(full.thumbnail_exact(sampled.width, sampled.height))
    }

    fn resample(&self, image: &DynamicImage, src: Rect, dst: Rect) -> DynamicImage {
        let region = image.crop_imm(src.left, src.top, src.width(), src.height());
        if region.width() == dst.width() && region.height() == dst.height() {
            return region;
        }
        region.resize_exact(dst.width(), dst.height(), FilterType::Triangle)
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        // JPEG has no alpha channel; flatten whatever we decoded to RGB8.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
        Ok(buf)
    }
}
