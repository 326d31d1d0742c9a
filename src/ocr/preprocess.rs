use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use crate::extraction::config::{FieldKind, PreprocessConfig, Roi};

/// Crops a field region out of a full frame.
///
/// The caller guarantees the region lies inside the frame; regions are
/// validated once per frame by the driver.
pub fn crop_region(img: &RgbImage, roi: &Roi) -> RgbImage {
    imageops::crop_imm(img, roi.x, roi.y, roi.width, roi.height).to_image()
}

/// Applies the transform matching the field kind.
pub fn preprocess(crop: &RgbImage, kind: FieldKind, config: &PreprocessConfig) -> GrayImage {
    match kind {
        FieldKind::PlayerName => preprocess_for_names(crop, config),
        FieldKind::PlayerCharacter => preprocess_for_characters(crop, config),
    }
}

/// Name fields: grayscale then bicubic upscale, no binarization.
pub fn preprocess_for_names(crop: &RgbImage, config: &PreprocessConfig) -> GrayImage {
    let gray = imageops::grayscale(crop);
    upscale(&gray, config.upscale)
}

/// Character icon fields: grayscale → blur → adaptive threshold (inverted) → upscale.
///
/// The glyph ends up white on black regardless of how bright the local
/// background is.
pub fn preprocess_for_characters(crop: &RgbImage, config: &PreprocessConfig) -> GrayImage {
    let gray = imageops::grayscale(crop);
    let blurred = gaussian_blur_f32(&gray, config.blur_sigma);
    let binary = adaptive_threshold_inverted(
        &blurred,
        config.threshold_window,
        config.threshold_offset,
    );
    upscale(&binary, config.upscale)
}

/// Gaussian-weighted adaptive threshold with inverted polarity.
///
/// A pixel becomes background (0) when it is brighter than its local
/// weighted mean minus `offset`, and foreground (255) otherwise.
pub fn adaptive_threshold_inverted(img: &GrayImage, window: u32, offset: i32) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, window_sigma(window));
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = pixel[0] as i32;
        let mean = local_mean.get_pixel(x, y)[0] as i32;
        let out = if value > mean - offset { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([out]));
    }

    output
}

/// Sigma of the Gaussian whose kernel spans a `window` × `window` neighbourhood.
fn window_sigma(window: u32) -> f32 {
    0.3 * ((window as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn upscale(img: &GrayImage, factor: u32) -> GrayImage {
    if factor <= 1 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    imageops::resize(img, w.saturating_mul(factor), h.saturating_mul(factor), FilterType::CatmullRom)
}
