use image::{ImageBuffer, Luma};
use imageproc::definitions::Image;

use crate::utils::{build_plane, clamp_unit};

/// Dense per-pixel belief that a pixel belongs to the subject
///
/// Values are always finite and within `[0, 1]`: every constructor clamps
/// and maps NaN to zero, so downstream stages never need to re-check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceMask {
    plane: Image<Luma<f32>>,
}

impl ConfidenceMask {
    /// Builds a mask by evaluating `f` at every pixel.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> f32 + Sync + Send,
    {
        Self {
            plane: build_plane(width, height, |x, y| clamp_unit(f(x, y))),
        }
    }

    /// Builds a mask from a row-major value vector.
    ///
    /// Returns `None` if `values.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, mut values: Vec<f32>) -> Option<Self> {
        if values.len() != width as usize * height as usize {
            return None;
        }
        values.iter_mut().for_each(|v| *v = clamp_unit(*v));
        ImageBuffer::from_raw(width, height, values).map(|plane| Self { plane })
    }

    /// A mask with the same value everywhere.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            plane: ImageBuffer::from_pixel(width, height, Luma([clamp_unit(value)])),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.plane.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.plane.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.plane.dimensions()
    }

    /// Value at a row-major index.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.plane.as_raw()[index]
    }

    /// Value at `(x, y)` with coordinates clamped into the mask.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let cx = x.clamp(0, i64::from(self.width()) - 1) as u32;
        let cy = y.clamp(0, i64::from(self.height()) - 1) as u32;
        self.plane.get_pixel(cx, cy)[0]
    }

    pub fn as_slice(&self) -> &[f32] {
        self.plane.as_raw()
    }

    pub fn as_image(&self) -> &Image<Luma<f32>> {
        &self.plane
    }

    pub fn into_image(self) -> Image<Luma<f32>> {
        self.plane
    }

    /// Mean value over the whole mask.
    pub fn mean(&self) -> f32 {
        let values = self.as_slice();
        values.iter().sum::<f32>() / values.len().max(1) as f32
    }

    /// Square max filter (grayscale dilation) of the given radius.
    pub fn dilate(&self, radius: u32) -> Self {
        self.window_extreme(radius, f32::max, 0.0)
    }

    /// Square min filter (grayscale erosion) of the given radius.
    pub fn erode(&self, radius: u32) -> Self {
        self.window_extreme(radius, f32::min, 1.0)
    }

    fn window_extreme(&self, radius: u32, pick: fn(f32, f32) -> f32, identity: f32) -> Self {
        let r = i64::from(radius);
        let (width, height) = self.dimensions();
        Self::from_fn(width, height, |x, y| {
            let (x, y) = (i64::from(x), i64::from(y));
            let mut acc = identity;
            for dy in -r..=r {
                for dx in -r..=r {
                    acc = pick(acc, self.get_clamped(x + dx, y + dy));
                }
            }
            acc
        })
    }
}
