//! Derivative generation: the resized original and the entropy-cropped
//! thumbnail.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader};

/// Upper bound on entropy windows probed per axis.
const CROP_STEPS: u32 = 32;

/// Largest raster any derivative step may allocate, in pixels.
pub const MAX_OUTPUT_PIXELS: u64 = 40_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode as {format} failed: {message}")]
    Encode { format: String, message: String },
    #[error("output of {width}x{height} exceeds the pixel budget")]
    TooLarge { width: u32, height: u32 },
    #[error("image worker failed: {0}")]
    Worker(String),
}

pub trait DerivativeGenerator: Send + Sync {
    /// Intrinsic pixel size, read from the header where possible.
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), DeriveError>;

    /// Resize to exactly `width` pixels wide, keeping the aspect ratio and
    /// the source container format. Smaller images are enlarged.
    fn resize_original(&self, bytes: &[u8], width: u32) -> Result<Vec<u8>, DeriveError>;

    /// Cover-scale and crop to the requested frame, always encoded as JPEG.
    fn thumbnail(&self, bytes: &[u8], spec: ThumbnailSpec) -> Result<Vec<u8>, DeriveError>;
}

/// [`DerivativeGenerator`] on top of the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterDerivatives;

impl DerivativeGenerator for RasterDerivatives {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), DeriveError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| DeriveError::Decode(err.to_string()))?
            .into_dimensions()
            .map_err(|err| DeriveError::Decode(err.to_string()))
    }

    fn resize_original(&self, bytes: &[u8], width: u32) -> Result<Vec<u8>, DeriveError> {
        let format = image::guess_format(bytes).map_err(|_| DeriveError::UnknownFormat)?;
        let img = decode(bytes, format)?;
        let height = scaled_height(img.width(), img.height(), width);
        check_budget(width, height)?;
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        encode(&resized, format)
    }

    fn thumbnail(&self, bytes: &[u8], spec: ThumbnailSpec) -> Result<Vec<u8>, DeriveError> {
        let format = image::guess_format(bytes).map_err(|_| DeriveError::UnknownFormat)?;
        let img = decode(bytes, format)?;
        let cropped = entropy_crop(&img, spec.width, spec.height)?;

        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, spec.quality.clamp(1, 100));
        DynamicImage::ImageRgb8(cropped.to_rgb8())
            .write_with_encoder(encoder)
            .map_err(|err| DeriveError::Encode {
                format: "jpeg".to_string(),
                message: err.to_string(),
            })?;
        Ok(buf)
    }
}

fn decode(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, DeriveError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|err| DeriveError::Decode(err.to_string()))
}

fn check_budget(width: u32, height: u32) -> Result<(), DeriveError> {
    if u64::from(width) * u64::from(height) > MAX_OUTPUT_PIXELS {
        return Err(DeriveError::TooLarge { width, height });
    }
    Ok(())
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DeriveError> {
    // The JPEG encoder rejects alpha channels.
    let img = match format {
        ImageFormat::Jpeg if img.color().has_alpha() => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img.clone(),
    };
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format)
        .map_err(|err| DeriveError::Encode {
            format: format!("{format:?}").to_ascii_lowercase(),
            message: err.to_string(),
        })?;
    Ok(cursor.into_inner())
}

/// Height for `target_width` keeping the `width:height` ratio, at least 1px.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = (height as f64 * target_width as f64 / width as f64).round();
    (scaled as u32).max(1)
}

/// Scales `img` so it covers `width`×`height`, then cuts the window with the
/// highest luminance entropy.
fn entropy_crop(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, DeriveError> {
    let (src_w, src_h) = img.dimensions();
    let scale = f64::max(
        width as f64 / src_w.max(1) as f64,
        height as f64 / src_h.max(1) as f64,
    );
    let cover_w = ((src_w as f64 * scale).round() as u32).max(width);
    let cover_h = ((src_h as f64 * scale).round() as u32).max(height);
    check_budget(cover_w, cover_h)?;
    let covered = img.resize_exact(cover_w, cover_h, FilterType::Lanczos3);

    let (x, y) = busiest_window(&covered.to_luma8(), width, height);
    Ok(covered.crop_imm(x, y, width, height))
}

/// Top-left corner of the `width`×`height` window with maximal entropy.
/// Ties keep the earliest window.
pub(crate) fn busiest_window(luma: &GrayImage, width: u32, height: u32) -> (u32, u32) {
    let xs = offsets(luma.width().saturating_sub(width));
    let ys = offsets(luma.height().saturating_sub(height));

    let mut best = (0, 0);
    let mut best_entropy = f64::MIN;
    for &y in &ys {
        for &x in &xs {
            let entropy = window_entropy(luma, x, y, width, height);
            if entropy > best_entropy {
                best_entropy = entropy;
                best = (x, y);
            }
        }
    }
    best
}

fn offsets(slack: u32) -> Vec<u32> {
    if slack == 0 {
        return vec![0];
    }
    let step = (slack / CROP_STEPS).max(1);
    let mut out: Vec<u32> = (0..=slack).step_by(step as usize).collect();
    if out.last() != Some(&slack) {
        out.push(slack);
    }
    out
}

fn window_entropy(luma: &GrayImage, x: u32, y: u32, width: u32, height: u32) -> f64 {
    let mut histogram = [0u64; 256];
    let max_x = (x + width).min(luma.width());
    let max_y = (y + height).min(luma.height());
    for py in y..max_y {
        for px in x..max_x {
            histogram[luma.get_pixel(px, py).0[0] as usize] += 1;
        }
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }
    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}
