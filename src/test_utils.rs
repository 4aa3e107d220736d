//! Test utilities for imageops-cutout
//!
//! Synthetic fixtures shared by the unit tests. Only compiled for tests.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Creates a white image with a centered, axis-aligned red square.
///
/// The square starts at `((width - side) / 2, (height - side) / 2)`, so a
/// 100x100 image with `side = 20` has the square at `40..60` on both axes.
///
/// # Returns
/// An opaque RGBA image
pub fn create_square_fixture(width: u32, height: u32, side: u32) -> RgbaImage {
    let x0 = width.saturating_sub(side) / 2;
    let y0 = height.saturating_sub(side) / 2;
    RgbaImage::from_fn(width, height, |x, y| {
        if (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y) {
            RED
        } else {
            WHITE
        }
    })
}

/// Creates an opaque image of uniformly random colors.
///
/// # Arguments
/// * `seed` - RNG seed; equal seeds give equal images
pub fn create_noise_image(width: u32, height: u32, seed: u64) -> RgbaImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbaImage::from_fn(width, height, |_, _| {
        Rgba([rng.gen(), rng.gen(), rng.gen(), 255])
    })
}

/// Creates a black and white checkerboard.
///
/// Cells with an even `x / cell + y / cell` are white.
pub fn create_checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            WHITE
        } else {
            BLACK
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_square_fixture_places_square_at_center() {
        let image = create_square_fixture(100, 100, 20);
        assert_eq!(image.get_pixel(39, 50), &WHITE);
        assert_eq!(image.get_pixel(40, 40), &RED);
        assert_eq!(image.get_pixel(59, 59), &RED);
        assert_eq!(image.get_pixel(60, 50), &WHITE);
    }

    #[test]
    fn create_noise_image_is_reproducible() {
        assert_eq!(create_noise_image(8, 8, 3), create_noise_image(8, 8, 3));
        assert_ne!(create_noise_image(8, 8, 3), create_noise_image(8, 8, 4));
    }

    #[test]
    fn create_checkerboard_alternates() {
        let image = create_checkerboard(4, 4, 2);
        assert_eq!(image.get_pixel(0, 0), &WHITE);
        assert_eq!(image.get_pixel(2, 0), &BLACK);
        assert_eq!(image.get_pixel(2, 2), &WHITE);
    }
}
