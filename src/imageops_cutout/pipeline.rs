//! The heuristic matting pipeline and the background removal entry points
//!
//! ```text
//! RGBA ─▶ RegionSampler ─▶ ColorClusterer ─▶ BackgroundModel ─┐
//!   │                                                          ▼
//!   ├──▶ SubjectDetector ──────────────────────────────▶ MaskFusion ─▶ AlphaCompositor ─▶ alpha
//!   └──▶ edges / texture ──────────────────────────────────────┘
//! ```

use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;
use crate::imageops_cutout::alpha_compositor::{composite, AlphaChannel};
use crate::imageops_cutout::alpha_mask::{ApplyAlphaMask, ModifyAlpha};
use crate::imageops_cutout::color_clusterer::{BackgroundModel, ColorClusterer};
use crate::imageops_cutout::confidence_mask::ConfidenceMask;
use crate::imageops_cutout::config::MattingConfig;
use crate::imageops_cutout::context::ImageContext;
use crate::imageops_cutout::edge_texture::{lbp_texture, multi_scale_edges};
use crate::imageops_cutout::image_source::{encode_png, ImageSource};
use crate::imageops_cutout::mask_fusion::{
    color_distance_mask, fuse, refine_connectivity, SignalMasks,
};
use crate::imageops_cutout::region_sampler::RegionSampler;
use crate::imageops_cutout::strategy::{Segmenter, StrategyChain};
use crate::imageops_cutout::subject_detector::detect_subject;
use crate::Image;

/// Everything the pipeline computed for one image
#[derive(Debug, Clone, PartialEq)]
pub struct MattingOutcome {
    pub alpha: AlphaChannel,
    /// Foreground confidence the alpha was derived from
    pub fused: ConfidenceMask,
    pub background: BackgroundModel,
}

/// Model-free segmenter built from color statistics and local structure
#[derive(Debug, Clone, Default)]
pub struct HeuristicSegmenter {
    config: MattingConfig,
}

impl HeuristicSegmenter {
    /// # Errors
    ///
    /// * `Error::InvalidConfig` - When `config` fails validation
    pub fn new(config: MattingConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub(crate) const fn from_validated(config: MattingConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &MattingConfig {
        &self.config
    }

    /// Runs the full pipeline and keeps the intermediate results.
    ///
    /// # Errors
    ///
    /// * `Error::EmptyImage` - When the image has a zero dimension
    pub fn analyze(&self, image: &RgbaImage) -> Result<MattingOutcome, Error> {
        let ctx = ImageContext::new(image.clone())?;
        let mut rng = self.rng();
        Ok(self.analyze_with_rng(&ctx, &mut rng))
    }

    /// Runs the pipeline with a caller-supplied random source.
    pub fn analyze_with_rng<R>(&self, ctx: &ImageContext, rng: &mut R) -> MattingOutcome
    where
        R: Rng + ?Sized,
    {
        let (width, height) = ctx.dimensions();
        log::debug!("matting {}x{} image", width, height);

        let pool = RegionSampler::new(&self.config).sample_pool(ctx, rng);
        let background = ColorClusterer::from_config(&self.config).background_model(&pool, rng);
        log::debug!(
            "background model: {} clusters, dominant {:?}",
            background.len(),
            background.dominant().centroid
        );

        let signals = SignalMasks {
            subject: detect_subject(ctx),
            edges: multi_scale_edges(ctx),
            color_distance: color_distance_mask(ctx, &background),
            texture: lbp_texture(ctx),
        };

        let mut fused = fuse(
            &signals,
            &self.config.fusion_weights,
            self.config.sigmoid_steepness,
        );
        if self.config.refine_connectivity {
            fused = refine_connectivity(ctx, &fused, &signals.color_distance);
        }
        log::debug!("fused confidence mean {:.3}", fused.mean());

        MattingOutcome {
            alpha: composite(&fused),
            fused,
            background,
        }
    }

    /// Computes only the alpha channel.
    ///
    /// # Errors
    ///
    /// * `Error::EmptyImage` - When the image has a zero dimension
    pub fn segment_alpha(&self, image: &RgbaImage) -> Result<AlphaChannel, Error> {
        Ok(self.analyze(image)?.alpha)
    }

    fn rng(&self) -> StdRng {
        self.config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }
}

impl Segmenter for HeuristicSegmenter {
    fn segment(&self, image: &RgbaImage) -> Result<AlphaChannel, Error> {
        self.segment_alpha(image)
    }
}

/// Background removal on in-memory images
pub trait RemoveBackground {
    /// Returns an RGBA copy whose alpha isolates the foreground.
    ///
    /// Color channels are carried over unchanged.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidConfig` - When `config` fails validation
    /// * `Error::EmptyImage` - When the image has a zero dimension
    ///
    /// # Examples
    ///
    /// ```
    /// use image::{Rgb, RgbImage};
    /// use imageops_cutout::{MattingConfig, RemoveBackground};
    ///
    /// let image = RgbImage::from_pixel(16, 16, Rgb([240, 240, 240]));
    /// let cutout = image.remove_background(&MattingConfig::default().with_seed(1)).unwrap();
    /// assert_eq!(cutout.dimensions(), (16, 16));
    /// ```
    fn remove_background(self, config: &MattingConfig) -> Result<Image<Rgba<u8>>, Error>;
}

/// In-place background removal for images that already carry alpha
pub trait RemoveBackgroundMut {
    /// Overwrites the alpha channel with the computed foreground alpha.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidConfig` - When `config` fails validation
    /// * `Error::EmptyImage` - When the image has a zero dimension
    fn remove_background_mut(&mut self, config: &MattingConfig) -> Result<&mut Self, Error>;
}

impl RemoveBackground for Image<Rgba<u8>> {
    fn remove_background(mut self, config: &MattingConfig) -> Result<Self, Error> {
        self.remove_background_mut(config)?;
        Ok(self)
    }
}

impl RemoveBackgroundMut for Image<Rgba<u8>> {
    fn remove_background_mut(&mut self, config: &MattingConfig) -> Result<&mut Self, Error> {
        let alpha = HeuristicSegmenter::new(config.clone())?.segment_alpha(self)?;
        self.replace_alpha_mut(&alpha)?;
        Ok(self)
    }
}

impl RemoveBackground for Image<Rgb<u8>> {
    fn remove_background(self, config: &MattingConfig) -> Result<Image<Rgba<u8>>, Error> {
        let segmenter = HeuristicSegmenter::new(config.clone())?;
        let rgba = DynamicImage::ImageRgb8(self).into_rgba8();
        let alpha = segmenter.segment_alpha(&rgba)?;
        let rgb = DynamicImage::ImageRgba8(rgba).into_rgb8();
        Ok(rgb.apply_alpha_mask(&alpha)?)
    }
}

/// Removes the background with the default strategy chain.
///
/// Returns PNG bytes with the input's dimensions and colors and a new alpha
/// channel.
///
/// # Errors
///
/// * `Error::UnsupportedUri`, `Error::Io`, `Error::Decode` - When the input cannot be loaded
/// * `Error::EmptyImage` - When the image has a zero dimension
/// * `Error::Encode` - When PNG encoding fails
pub fn remove_background(source: ImageSource) -> Result<Vec<u8>, Error> {
    remove_background_with(&StrategyChain::default(), source)
}

/// Removes the background using the first available strategy of `chain`.
///
/// # Errors
///
/// Same as [`remove_background`], plus `Error::AlphaMask` when a segmenter
/// returns an alpha channel of the wrong size.
pub fn remove_background_with(
    chain: &StrategyChain,
    source: ImageSource,
) -> Result<Vec<u8>, Error> {
    let mut image = source.into_rgba()?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }

    let alpha = chain.segment(&image)?;
    image.replace_alpha_mut(&alpha)?;
    encode_png(&image)
}
