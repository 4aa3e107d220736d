use image::{Rgb, Rgba, RgbaImage};

use crate::error::Error;
use crate::imageops_cutout::color_metrics::luma;
use crate::utils::validate_non_empty_image;

/// Per-invocation view of the image being matted
///
/// Owns the RGBA pixel buffer and caches the geometry every stage needs,
/// so no stage re-derives width, height or stride on its own. RGB channels
/// are read-only for the whole pipeline; the alpha plane is only replaced
/// once, by the compositor, after all confidence masks exist.
#[derive(Debug, Clone)]
pub struct ImageContext {
    width: u32,
    height: u32,
    stride: usize,
    pixels: RgbaImage,
    luma: Vec<f32>,
}

impl ImageContext {
    /// Wraps an RGBA image.
    ///
    /// # Errors
    ///
    /// * `Error::EmptyImage` - When either dimension is zero
    pub fn new(pixels: RgbaImage) -> Result<Self, Error> {
        let (width, height) = pixels.dimensions();
        validate_non_empty_image(width, height)?;

        let luma = pixels
            .pixels()
            .map(|&Rgba([r, g, b, _])| luma(Rgb([r, g, b])))
            .collect();

        Ok(Self {
            width,
            height,
            stride: width as usize * 4,
            pixels,
            luma,
        })
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row of the underlying RGBA buffer.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of pixels.
    #[inline]
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Always false; empty images are rejected by [`ImageContext::new`].
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major pixel index of `(x, y)`.
    #[inline]
    pub const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Inverse of [`ImageContext::index`].
    #[inline]
    pub const fn coords(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    /// Color of the pixel at a row-major index.
    #[inline]
    pub fn color_at(&self, index: usize) -> Rgb<u8> {
        let offset = index * 4;
        let raw = self.pixels.as_raw();
        Rgb([raw[offset], raw[offset + 1], raw[offset + 2]])
    }

    /// Color of the pixel at `(x, y)`.
    #[inline]
    pub fn color(&self, x: u32, y: u32) -> Rgb<u8> {
        self.color_at(self.index(x, y))
    }

    /// Color at `(x, y)` with coordinates clamped into the image.
    #[inline]
    pub fn color_clamped(&self, x: i64, y: i64) -> Rgb<u8> {
        let (cx, cy) = self.clamp_coords(x, y);
        self.color(cx, cy)
    }

    /// Rec. 601 luma at `(x, y)` with coordinates clamped into the image.
    #[inline]
    pub fn luma_clamped(&self, x: i64, y: i64) -> f32 {
        let (cx, cy) = self.clamp_coords(x, y);
        self.luma[self.index(cx, cy)]
    }

    /// Replicates edge pixels for out-of-range coordinates.
    #[inline]
    pub fn clamp_coords(&self, x: i64, y: i64) -> (u32, u32) {
        (
            x.clamp(0, i64::from(self.width) - 1) as u32,
            y.clamp(0, i64::from(self.height) - 1) as u32,
        )
    }

    /// Iterates over the 4-connected neighbors of a pixel index.
    pub fn neighbors4(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let (x, y) = self.coords(index);
        let width = self.width;
        let height = self.height;
        [
            (x > 0).then(|| index - 1),
            (x + 1 < width).then(|| index + 1),
            (y > 0).then(|| index - width as usize),
            (y + 1 < height).then(|| index + width as usize),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether the pixel lies on the outermost row or column.
    #[inline]
    pub const fn is_border(&self, index: usize) -> bool {
        let (x, y) = self.coords(index);
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Row-major indices of every border pixel, each listed once.
    pub fn border_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.is_border(i)).collect()
    }

    pub const fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}
