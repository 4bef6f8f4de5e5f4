//! Whole-frame pixel transforms applied before any overlay is drawn.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};

/// Left-right mirror, so the preview behaves like a mirror.
pub fn mirror(image: &RgbImage) -> RgbImage {
    imageops::flip_horizontal(image)
}

/// Single-channel luminance of `image`.
pub fn luminance(image: &RgbImage) -> GrayImage {
    imageops::grayscale(image)
}

/// Desaturates while keeping three channels, so later colored drawing
/// still shows in color.
pub fn desaturate(image: &RgbImage) -> RgbImage {
    DynamicImage::ImageLuma8(luminance(image)).to_rgb8()
}

/// Digital zoom: crops the centred `floor(dim / zoom)` window and scales it
/// back to the original size with linear filtering.
///
/// Returns `None` for `zoom <= 1.0`, meaning the frame is left untouched.
pub fn zoom(image: &RgbImage, zoom: f64) -> Option<RgbImage> {
    if zoom.is_nan() || zoom <= 1.0 {
        return None;
    }
    let (w, h) = image.dimensions();
    let crop_w = ((w as f64 / zoom) as u32).max(1);
    let crop_h = ((h as f64 / zoom) as u32).max(1);
    let x = (w - crop_w) / 2;
    let y = (h - crop_h) / 2;

    let cropped = imageops::crop_imm(image, x, y, crop_w, crop_h).to_image();
    Some(imageops::resize(&cropped, w, h, FilterType::Triangle))
}
