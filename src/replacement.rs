//! Replacement pass: writes the key color over detected background

use crate::types::CoordinateSet;
use image::{Rgba, RgbaImage};

/// Overwrite every coordinate in `background` with `key_color`.
///
/// Hard binary replacement; no other pixel is touched. Coordinates outside the
/// image are skipped. Returns the number of pixels written.
pub fn apply_key_color(image: &mut RgbaImage, background: &CoordinateSet, key_color: Rgba<u8>) -> usize {
    let mut written = 0;
    for (x, y) in background.iter() {
        if let Some(pixel) = image.get_pixel_mut_checked(x, y) {
            *pixel = key_color;
            written += 1;
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEY_COLOR;

    #[test]
    fn test_only_listed_coordinates_change() {
        let original = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let mut image = original.clone();
        let mut background = CoordinateSet::new(3, 3);
        background.insert((0, 0));
        background.insert((2, 1));

        let written = apply_key_color(&mut image, &background, KEY_COLOR);
        assert_eq!(written, 2);

        for (x, y, pixel) in image.enumerate_pixels() {
            if background.contains((x, y)) {
                assert_eq!(*pixel, KEY_COLOR);
            } else {
                assert_eq!(pixel, original.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_empty_set_is_noop() {
        let original = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        let mut image = original.clone();
        let written = apply_key_color(&mut image, &CoordinateSet::new(2, 2), KEY_COLOR);
        assert_eq!(written, 0);
        assert_eq!(image, original);
    }

    #[test]
    fn test_set_larger_than_image_is_clipped() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        let mut background = CoordinateSet::new(4, 4);
        background.insert((1, 1));
        background.insert((3, 3));
        assert_eq!(apply_key_color(&mut image, &background, KEY_COLOR), 1);
        assert_eq!(*image.get_pixel(1, 1), KEY_COLOR);
    }
}
