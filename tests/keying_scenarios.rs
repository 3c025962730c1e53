//! End-to-end keying scenarios on small hand-built images
//!
//! Each case runs the full transform (flood fill followed by replacement)
//! through the public entry points and checks every pixel of the result.

use bgkey::{
    key_background, BackgroundKeyer, ImageIOService, KeyingConfig, OutputFormat, KEY_COLOR,
};
use image::{Rgba, RgbaImage};
use tempfile::TempDir;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 5x5 image with a white one-pixel ring around a black 3x3 block
fn ring_image() -> RgbaImage {
    RgbaImage::from_fn(5, 5, |x, y| {
        if (1..=3).contains(&x) && (1..=3).contains(&y) {
            BLACK
        } else {
            WHITE
        }
    })
}

#[test]
fn test_transparent_image_is_fully_keyed() {
    let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));

    let stats = key_background(&mut image);

    assert_eq!(stats.background_pixels, 9);
    assert_eq!(stats.replaced_pixels, 9);
    assert!(image.pixels().all(|p| *p == Rgba([255, 0, 255, 255])));
}

#[test]
fn test_white_ring_around_black_block() {
    let mut image = ring_image();

    let stats = key_background(&mut image);

    assert_eq!(stats.background_pixels, 16);
    for (x, y, pixel) in image.enumerate_pixels() {
        let inside = (1..=3).contains(&x) && (1..=3).contains(&y);
        if inside {
            assert_eq!(*pixel, BLACK, "interior pixel ({x}, {y}) changed");
        } else {
            assert_eq!(*pixel, KEY_COLOR, "ring pixel ({x}, {y}) not keyed");
        }
    }
}

#[test]
fn test_enclosed_white_pixel_survives() {
    let mut image = RgbaImage::from_pixel(5, 5, BLACK);
    image.put_pixel(2, 2, WHITE);
    let before = image.clone();

    let stats = key_background(&mut image);

    assert_eq!(stats.background_pixels, 0);
    assert_eq!(*image.get_pixel(2, 2), WHITE);
    assert_eq!(image, before);
}

#[test]
fn test_keyed_output_is_stable() {
    let mut image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 0]));
    let _ = key_background(&mut image);
    let once = image.clone();

    let stats = key_background(&mut image);

    assert_eq!(stats.background_pixels, 0);
    assert_eq!(image.as_raw(), once.as_raw());
}

#[test]
fn test_logo_with_white_counter_keeps_counter() {
    // A black "O" on white: the white hole inside the letter is not reachable
    let mut image = RgbaImage::from_pixel(9, 9, WHITE);
    for i in 2..=6 {
        image.put_pixel(i, 2, BLACK);
        image.put_pixel(i, 6, BLACK);
        image.put_pixel(2, i, BLACK);
        image.put_pixel(6, i, BLACK);
    }

    let stats = key_background(&mut image);

    assert_eq!(*image.get_pixel(0, 0), KEY_COLOR);
    assert_eq!(*image.get_pixel(4, 4), WHITE);
    // 81 total, 25 inside the outer edge of the letter
    assert_eq!(stats.background_pixels, 81 - 25);
}

#[test]
fn test_file_round_trip_preserves_key_color() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = temp_dir.path().join("logo_1.png");
    ring_image().save(&input).expect("Failed to write input image");

    let mut keyer = BackgroundKeyer::new(KeyingConfig::default()).unwrap();
    for (format, name) in [
        (OutputFormat::Png, "out.png"),
        (OutputFormat::Tiff, "out.tiff"),
    ] {
        let output = temp_dir.path().join(name);
        let result = keyer.process_file_to(&input, &output, format).unwrap();
        assert_eq!(result.stats.replaced_pixels, 16);

        let reloaded = ImageIOService::load_rgba(&output).unwrap();
        assert_eq!(reloaded, result.image, "{format} output is not lossless");
        assert_eq!(*reloaded.get_pixel(0, 0), KEY_COLOR);
    }
}

#[test]
fn test_in_place_rekey_leaves_file_unchanged() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("logo_2.png");
    ring_image().save(&path).unwrap();

    let mut keyer = BackgroundKeyer::new(KeyingConfig::default()).unwrap();
    keyer.process_file_to(&path, &path, OutputFormat::Png).unwrap();
    let first = ImageIOService::load_rgba(&path).unwrap();

    let second = keyer.process_file_to(&path, &path, OutputFormat::Png).unwrap();
    assert!(second.is_unchanged());
    assert_eq!(ImageIOService::load_rgba(&path).unwrap(), first);
}
