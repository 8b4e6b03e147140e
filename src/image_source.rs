use crate::error::ImageLoadError;
use crate::sampler::PixelData;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Decode an image file and downscale it so its longer side is at most `max_side`
pub fn load_pixels(path: &Path, max_side: u32) -> Result<PixelData, ImageLoadError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    tracing::info!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "decoded source image"
    );
    pixels_from_image(img, max_side)
}

/// Target size for sampling. Never upscales; each side stays at least 1.
pub fn sample_size(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height).max(1);
    let scale = (max_side as f64 / longest as f64).min(1.0);
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

pub fn pixels_from_image(img: DynamicImage, max_side: u32) -> Result<PixelData, ImageLoadError> {
    let (w, h) = sample_size(img.width(), img.height(), max_side);
    let img = if (w, h) != (img.width(), img.height()) {
        tracing::debug!(from_w = img.width(), from_h = img.height(), w, h, "downscaling before sampling");
        img.resize_exact(w, h, FilterType::Triangle)
    } else {
        img
    };

    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    PixelData::new(width, height, rgba.into_raw())
}
