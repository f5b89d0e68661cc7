//! Painting a decoded cover into its tile on the canvas.
//!
//! Split in two so the expensive resize can run off the async workers while
//! the cheap copy into the shared canvas happens under the cycle lock.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};

use super::layout::Rect;

/// Resizes an image to cover `width` x `height` while keeping its aspect
/// ratio, then center-crops the overflow. No letterboxing.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn fit_cover(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let (img_width, img_height) = img.dimensions();
    if img_width == 0 || img_height == 0 {
        return RgbImage::new(width, height);
    }

    let scale_x = f64::from(width) / f64::from(img_width);
    let scale_y = f64::from(height) / f64::from(img_height);
    let scale = scale_x.max(scale_y);

    // Round up so truncation never leaves the scaled image a pixel short.
    let scaled_width = ((f64::from(img_width) * scale).ceil() as u32).max(width);
    let scaled_height = ((f64::from(img_height) * scale).ceil() as u32).max(height);

    let resized = img.resize_exact(scaled_width, scaled_height, FilterType::CatmullRom);

    let crop_x = (scaled_width - width) / 2;
    let crop_y = (scaled_height - height) / 2;

    resized.crop_imm(crop_x, crop_y, width, height).to_rgb8()
}

/// Copies a prepared tile image into `canvas` at `rect`, replacing whatever
/// was there. Zero-sized rects are left untouched.
pub fn place_tile(canvas: &mut RgbImage, tile: &RgbImage, rect: Rect) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }

    imageops::replace(canvas, tile, i64::from(rect.x), i64::from(rect.y));
}
