use super::*;
use image::Rgba;

#[test]
fn identical_frames_have_no_diff() {
    let a = RgbaImage::from_pixel(5, 5, Rgba([1, 2, 3, 255]));
    assert_eq!(diff_bbox(&a, &a.clone()), None);
}

#[test]
fn bbox_spans_all_changed_pixels() {
    let a = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
    let mut b = a.clone();
    b.put_pixel(2, 7, Rgba([255, 255, 255, 255]));
    b.put_pixel(6, 3, Rgba([0, 0, 0, 0]));
    assert_eq!(diff_bbox(&a, &b), Some(Rect::new(2, 3, 5, 5)));
}

#[test]
fn size_change_is_a_full_diff() {
    let a = RgbaImage::new(4, 4);
    let b = RgbaImage::new(4, 6);
    assert_eq!(diff_bbox(&a, &b), Some(Rect::new(0, 0, 4, 6)));
}
