use super::*;
use image::Rgba;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BG: Color = Color::BLACK;

fn solid(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, RED)
}

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 11) as u8, 42, 255]))
}

#[test]
fn same_size_is_identity_in_every_mode() {
    let img = gradient(16, 9);
    for mode in [
        ScalingMode::Cover,
        ScalingMode::Contain,
        ScalingMode::Stretch,
        ScalingMode::Center,
    ] {
        assert_eq!(scale_image(&img, Canvas::new(16, 9), mode, BG), img, "{mode:?}");
    }
}

#[test]
fn stretch_round_trip_restores_dimensions() {
    let img = gradient(30, 20);
    let there = scale_image(&img, Canvas::new(7, 45), ScalingMode::Stretch, BG);
    assert_eq!(there.dimensions(), (7, 45));
    let back = scale_image(&there, Canvas::new(30, 20), ScalingMode::Stretch, BG);
    assert_eq!(back.dimensions(), (30, 20));
}

#[test]
fn cover_fills_the_target_without_background() {
    let out = scale_image(&solid(10, 5), Canvas::new(20, 20), ScalingMode::Cover, BG);
    assert_eq!(out.dimensions(), (20, 20));
    assert!(out.pixels().all(|p| *p == RED));
}

#[test]
fn contain_letterboxes_with_background() {
    let out = scale_image(&solid(10, 5), Canvas::new(20, 20), ScalingMode::Contain, BG);
    assert_eq!(out.dimensions(), (20, 20));
    // 20x10 band centered vertically.
    assert_eq!(*out.get_pixel(10, 10), RED);
    assert_eq!(*out.get_pixel(10, 0), BG.to_pixel());
    assert_eq!(*out.get_pixel(10, 19), BG.to_pixel());
}

#[test]
fn center_pastes_at_native_size() {
    let out = scale_image(&solid(4, 4), Canvas::new(8, 8), ScalingMode::Center, BG);
    assert_eq!(*out.get_pixel(2, 2), RED);
    assert_eq!(*out.get_pixel(5, 5), RED);
    assert_eq!(*out.get_pixel(1, 1), BG.to_pixel());
    assert_eq!(*out.get_pixel(6, 6), BG.to_pixel());
}

#[test]
fn center_crops_overflow() {
    let img = gradient(12, 12);
    let out = scale_image(&img, Canvas::new(4, 4), ScalingMode::Center, BG);
    assert_eq!(out.dimensions(), (4, 4));
    assert_eq!(out.get_pixel(0, 0), img.get_pixel(4, 4));
}

#[test]
fn rotation_is_clockwise() {
    let mut img = RgbaImage::from_pixel(3, 2, BG.to_pixel());
    img.put_pixel(0, 0, RED);

    let r90 = rotate(img.clone(), Rotation::Deg90);
    assert_eq!(r90.dimensions(), (2, 3));
    assert_eq!(*r90.get_pixel(1, 0), RED);

    let r180 = rotate(img.clone(), Rotation::Deg180);
    assert_eq!(*r180.get_pixel(2, 1), RED);

    let r270 = rotate(img.clone(), Rotation::Deg270);
    assert_eq!(r270.dimensions(), (2, 3));
    assert_eq!(*r270.get_pixel(0, 2), RED);

    assert_eq!(rotate(img.clone(), Rotation::Deg0), img);
}
