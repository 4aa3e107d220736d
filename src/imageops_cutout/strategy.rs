use std::fmt;

use image::RgbaImage;

use crate::error::{Error, Unavailable};
use crate::imageops_cutout::alpha_compositor::AlphaChannel;
use crate::imageops_cutout::config::MattingConfig;
use crate::imageops_cutout::pipeline::HeuristicSegmenter;

/// Anything that can turn an RGBA image into an alpha channel
///
/// Implementations must return an alpha channel with the image's
/// dimensions. Model-backed segmenters live outside this crate and plug in
/// through [`SegmentationStrategy`].
pub trait Segmenter {
    /// Computes the foreground alpha of `image`.
    ///
    /// # Errors
    ///
    /// Implementation specific; the heuristic segmenter only fails on empty
    /// images.
    fn segment(&self, image: &RgbaImage) -> Result<AlphaChannel, Error>;
}

/// A way of obtaining a [`Segmenter`] that may not be available
///
/// A strategy for a model that is not installed, failed to load, or is not
/// supported on this platform reports [`Unavailable`] and the chain moves on.
pub trait SegmentationStrategy {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Tries to produce a ready segmenter.
    ///
    /// # Errors
    ///
    /// * `Unavailable` - When this strategy cannot be used right now
    fn try_segmenter(&self) -> Result<Box<dyn Segmenter>, Unavailable>;
}

/// The model-free pipeline; always available
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategy {
    config: MattingConfig,
}

impl HeuristicStrategy {
    /// # Errors
    ///
    /// * `Error::InvalidConfig` - When `config` fails validation
    pub fn new(config: MattingConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn segmenter(&self) -> HeuristicSegmenter {
        HeuristicSegmenter::from_validated(self.config.clone())
    }
}

impl SegmentationStrategy for HeuristicStrategy {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn try_segmenter(&self) -> Result<Box<dyn Segmenter>, Unavailable> {
        Ok(Box::new(self.segmenter()))
    }
}

/// Ordered list of strategies ending in the heuristic pipeline
///
/// Strategies are tried in insertion order; the first one that yields a
/// segmenter wins. The heuristic strategy is always last, so resolution
/// never fails.
pub struct StrategyChain {
    strategies: Vec<Box<dyn SegmentationStrategy>>,
    fallback: HeuristicStrategy,
}

impl StrategyChain {
    /// A chain holding only the heuristic strategy.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidConfig` - When `config` fails validation
    pub fn new(config: MattingConfig) -> Result<Self, Error> {
        Ok(Self {
            strategies: Vec::new(),
            fallback: HeuristicStrategy::new(config)?,
        })
    }

    /// Adds a strategy to try before every strategy added later and before
    /// the heuristic fallback.
    #[must_use]
    pub fn with_strategy<S>(mut self, strategy: S) -> Self
    where
        S: SegmentationStrategy + 'static,
    {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of all strategies in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Returns the first available segmenter.
    pub fn resolve(&self) -> Box<dyn Segmenter> {
        for strategy in &self.strategies {
            match strategy.try_segmenter() {
                Ok(segmenter) => {
                    log::debug!("using segmentation strategy `{}`", strategy.name());
                    return segmenter;
                }
                Err(unavailable) => log::warn!("{unavailable}"),
            }
        }
        log::debug!("using segmentation strategy `{}`", self.fallback.name());
        Box::new(self.fallback.segmenter())
    }

    /// Segments `image` with the first available strategy.
    ///
    /// # Errors
    ///
    /// Whatever the chosen segmenter reports.
    pub fn segment(&self, image: &RgbaImage) -> Result<AlphaChannel, Error> {
        self.resolve().segment(image)
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: HeuristicStrategy::default(),
        }
    }
}

impl fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
