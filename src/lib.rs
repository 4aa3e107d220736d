//! Model-free foreground extraction and alpha matting.
//!
//! The crate estimates which pixels of an image belong to a foreground
//! subject using color statistics of the likely background, per-pixel color
//! classifiers, multi-scale edges and local texture, and turns the fused
//! confidence into a refined alpha channel. No trained model is involved.
//!
//! ```no_run
//! use imageops_cutout::{remove_background, ImageSource};
//!
//! # fn main() -> Result<(), imageops_cutout::Error> {
//! let png = remove_background(ImageSource::Uri("portrait.png".into()))?;
//! std::fs::write("portrait-cutout.png", png)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod imageops_cutout;
mod utils;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Pixel};

pub use error::{AlphaMaskError, ConfigError, Error, Unavailable};
pub use imageops_cutout::alpha_compositor::{composite, AlphaChannel};
pub use imageops_cutout::alpha_mask::{ApplyAlphaMask, ModifyAlpha};
pub use imageops_cutout::color_clusterer::{BackgroundModel, ColorCluster, ColorClusterer};
pub use imageops_cutout::color_metrics::{
    brightness, channel_spread, distance, luma, perceptual_distance, to_hsv, to_lab, to_ycbcr,
    Hsv, Lab, YCbCr, MAX_PERCEPTUAL_DISTANCE,
};
pub use imageops_cutout::confidence_mask::ConfidenceMask;
pub use imageops_cutout::config::{FusionWeights, MattingConfig};
pub use imageops_cutout::context::ImageContext;
pub use imageops_cutout::edge_texture::{lbp_texture, multi_scale_edges};
pub use imageops_cutout::flood_fill::{flood_fill, segment_regions, FilledRegion};
pub use imageops_cutout::image_source::{encode_png, ImageSource};
pub use imageops_cutout::mask_fusion::{
    color_distance_mask, fuse, refine_connectivity, SignalMasks,
};
pub use imageops_cutout::pipeline::{
    remove_background, remove_background_with, HeuristicSegmenter, MattingOutcome,
    RemoveBackground, RemoveBackgroundMut,
};
pub use imageops_cutout::region_sampler::{
    CandidateRegion, Rect, Region, RegionSample, RegionSampler, RegionTier,
};
pub use imageops_cutout::strategy::{
    HeuristicStrategy, SegmentationStrategy, Segmenter, StrategyChain,
};
pub use imageops_cutout::subject_detector::{
    detect_subject, fabric_score, hair_score, is_skin, shape_mask, skin_score,
};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
