use crate::foundation::core::{Canvas, Rect};
use image::RgbaImage;

/// Bounding box of the pixels that differ between `previous` and `next`.
///
/// `None` means the frames are identical. Frames of different sizes differ everywhere, so the
/// whole of `next` is returned.
pub fn diff_bbox(previous: &RgbaImage, next: &RgbaImage) -> Option<Rect> {
    if previous.dimensions() != next.dimensions() {
        return Some(Rect::full(Canvas::of(next)));
    }

    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0u32, 0u32);
    let mut changed = false;
    for (x, y, px) in next.enumerate_pixels() {
        if previous.get_pixel(x, y) != px {
            changed = true;
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }

    changed.then(|| Rect::new(min.0, min.1, max.0 - min.0 + 1, max.1 - min.1 + 1))
}

#[cfg(test)]
#[path = "../../tests/unit/render/diff.rs"]
mod tests;
