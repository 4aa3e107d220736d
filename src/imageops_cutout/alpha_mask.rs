use image::{GenericImageView, Luma, Rgb, Rgba};
use imageproc::map::map_colors2;
use itertools::Itertools;

use crate::error::AlphaMaskError;
use crate::imageops_cutout::alpha_compositor::AlphaChannel;
use crate::utils::validate_matching_dimensions;
use crate::Image;

/// Attaches a computed alpha channel to an RGB image
///
/// The color channels are copied unchanged; the result is a new RGBA image.
pub trait ApplyAlphaMask {
    /// Combines the image with `mask` into an RGBA cutout.
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and mask dimensions differ
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{ImageBuffer, Luma, Rgb};
    /// use imageops_cutout::{ApplyAlphaMask, Image};
    ///
    /// let image: Image<Rgb<u8>> = ImageBuffer::from_pixel(4, 4, Rgb([10, 20, 30]));
    /// let mask: Image<Luma<u8>> = ImageBuffer::from_pixel(4, 4, Luma([128]));
    ///
    /// let cutout = image.apply_alpha_mask(&mask).unwrap();
    /// assert_eq!(cutout.get_pixel(0, 0).0, [10, 20, 30, 128]);
    /// ```
    fn apply_alpha_mask(self, mask: &AlphaChannel) -> Result<Image<Rgba<u8>>, AlphaMaskError>;
}

/// Replaces the alpha channel of an RGBA image
///
/// Only the alpha byte of each pixel is written; RGB stays bit-identical,
/// which is what a background removal result promises.
pub trait ModifyAlpha {
    /// Returns the image with its alpha channel replaced by `mask`.
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and mask dimensions differ
    fn replace_alpha(self, mask: &AlphaChannel) -> Result<Self, AlphaMaskError>
    where
        Self: Sized;

    /// Replaces the alpha channel with `mask` in place.
    ///
    /// # Errors
    ///
    /// * `AlphaMaskError::DimensionMismatch` - When image and mask dimensions differ
    fn replace_alpha_mut(&mut self, mask: &AlphaChannel) -> Result<&mut Self, AlphaMaskError>;
}

impl ApplyAlphaMask for Image<Rgb<u8>> {
    fn apply_alpha_mask(self, mask: &AlphaChannel) -> Result<Image<Rgba<u8>>, AlphaMaskError> {
        validate_dimensions(&self, mask)?;

        Ok(map_colors2(&self, mask, |Rgb([red, green, blue]), Luma([alpha])| {
            Rgba([red, green, blue, alpha])
        }))
    }
}

impl ModifyAlpha for Image<Rgba<u8>> {
    fn replace_alpha(mut self, mask: &AlphaChannel) -> Result<Self, AlphaMaskError> {
        self.replace_alpha_mut(mask)?;
        Ok(self)
    }

    fn replace_alpha_mut(&mut self, mask: &AlphaChannel) -> Result<&mut Self, AlphaMaskError> {
        validate_dimensions(self, mask)?;

        self.pixels_mut()
            .zip_eq(mask.pixels())
            .for_each(|(pixel, &Luma([alpha]))| pixel[3] = alpha);

        Ok(self)
    }
}

#[inline]
fn validate_dimensions<I>(image: &I, mask: &AlphaChannel) -> Result<(), AlphaMaskError>
where
    I: GenericImageView,
{
    validate_matching_dimensions(image.dimensions(), mask.dimensions())
}
