//! Internal utility functions for imageops-cutout.
//!
//! This module contains common functionality used across the matting stages.

use image::{ImageBuffer, Luma};
use imageproc::definitions::{Clamp, Image};

use crate::error::{AlphaMaskError, Error};

/// Clamps a floating-point value into `[0, 1]`, mapping NaN to zero.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Rounds and clamps a floating-point alpha value into the `u8` range.
///
/// `imageproc`'s `Clamp` truncates, so the value is rounded first.
#[inline]
pub fn clamp_alpha(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    <u8 as Clamp<f32>>::clamp(value.round())
}

/// Cubic Hermite smoothstep on `[0, 1]`.
#[inline]
pub fn smoothstep(value: f32) -> f32 {
    let t = clamp_unit(value);
    t * t * 2.0f32.mul_add(-t, 3.0)
}

/// Logistic contrast curve centered on 0.5.
#[inline]
pub fn sigmoid(value: f32, steepness: f32) -> f32 {
    1.0 / (1.0 + (-steepness * (value - 0.5)).exp())
}

/// Builds a `width × height` plane from a per-pixel function.
///
/// With the `rayon` feature the rows are filled in parallel. The closure
/// only ever reads shared inputs, so both builds produce identical planes.
pub fn build_plane<F>(width: u32, height: u32, f: F) -> Image<Luma<f32>>
where
    F: Fn(u32, u32) -> f32 + Sync + Send,
{
    let mut plane = ImageBuffer::new(width, height);
    if width == 0 {
        return plane;
    }
    let row_len = width as usize;

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        plane
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| fill_row(row, y as u32, &f));
    }

    #[cfg(not(feature = "rayon"))]
    {
        plane
            .chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| fill_row(row, y as u32, &f));
    }

    plane
}

#[inline]
fn fill_row<F>(row: &mut [f32], y: u32, f: &F)
where
    F: Fn(u32, u32) -> f32,
{
    row.iter_mut()
        .enumerate()
        .for_each(|(x, value)| *value = f(x as u32, y));
}

/// Rejects images with a zero dimension.
///
/// # Errors
///
/// * `Error::EmptyImage` - When `width` or `height` is zero
pub fn validate_non_empty_image(width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        Err(Error::EmptyImage { width, height })
    } else {
        Ok(())
    }
}

/// Checks that a mask has the dimensions of the image it is applied to.
///
/// # Errors
///
/// * `AlphaMaskError::DimensionMismatch` - When the two sizes differ
pub fn validate_matching_dimensions(
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), AlphaMaskError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AlphaMaskError::DimensionMismatch { expected, actual })
    }
}
