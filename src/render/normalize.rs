//! Fitting scene output to the physical panel.

use crate::foundation::color::Color;
use crate::foundation::core::Canvas;
use crate::scene::device::{Rotation, ScalingMode};
use image::RgbaImage;
use image::imageops::{self, FilterType};

const FILTER: FilterType = FilterType::Triangle;

/// Fit `image` into `target` using `mode`.
///
/// An image that already has the target size is returned unchanged whatever the mode. Areas the
/// image does not cover (`contain`, `center`) are filled with `background`.
pub fn scale_image(
    image: &RgbaImage,
    target: Canvas,
    mode: ScalingMode,
    background: Color,
) -> RgbaImage {
    let source = Canvas::of(image);
    if source == target {
        return image.clone();
    }
    let mut canvas = RgbaImage::from_pixel(target.width, target.height, background.to_pixel());
    if source.width == 0 || source.height == 0 || target.width == 0 || target.height == 0 {
        return canvas;
    }

    let sx = f64::from(target.width) / f64::from(source.width);
    let sy = f64::from(target.height) / f64::from(source.height);

    match mode {
        ScalingMode::Stretch => imageops::resize(image, target.width, target.height, FILTER),
        ScalingMode::Cover => {
            let s = sx.max(sy);
            let w = scaled(source.width, s).max(target.width);
            let h = scaled(source.height, s).max(target.height);
            let resized = imageops::resize(image, w, h, FILTER);
            let x = (w - target.width) / 2;
            let y = (h - target.height) / 2;
            imageops::crop_imm(&resized, x, y, target.width, target.height).to_image()
        }
        ScalingMode::Contain => {
            let s = sx.min(sy);
            let w = scaled(source.width, s).min(target.width);
            let h = scaled(source.height, s).min(target.height);
            let resized = imageops::resize(image, w, h, FILTER);
            imageops::overlay(&mut canvas, &resized, centered(target.width, w), centered(target.height, h));
            canvas
        }
        ScalingMode::Center => {
            imageops::overlay(
                &mut canvas,
                image,
                centered(target.width, source.width),
                centered(target.height, source.height),
            );
            canvas
        }
    }
}

fn scaled(len: u32, factor: f64) -> u32 {
    ((f64::from(len) * factor).round() as u32).max(1)
}

fn centered(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)) / 2
}

/// Rotate clockwise by the configured amount.
pub fn rotate(image: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::Deg0 => image,
        Rotation::Deg90 => imageops::rotate90(&image),
        Rotation::Deg180 => imageops::rotate180(&image),
        Rotation::Deg270 => imageops::rotate270(&image),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/normalize.rs"]
mod tests;
