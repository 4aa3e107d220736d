use thiserror::Error;

/// Top-level error type for background removal
///
/// The heuristic pipeline itself cannot fail; every variant here comes from
/// the boundaries around it (decoding, encoding, configuration, input shape).
#[derive(Debug, Error)]
pub enum Error {
    /// The input image has a zero dimension
    ///
    /// There is nothing to segment in an empty image, so the pipeline
    /// refuses it up front instead of producing an empty PNG.
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// The input could not be decoded into a bitmap
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The processed bitmap could not be encoded as PNG
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Reading an input from the filesystem failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The URI scheme is not one this crate can load
    ///
    /// Only plain filesystem paths and `file://` URIs are read in-process;
    /// remote fetching belongs to the caller.
    #[error("Unsupported image URI: {0}")]
    UnsupportedUri(String),

    /// The matting configuration failed validation
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// An alpha mask could not be applied to the image
    #[error(transparent)]
    AlphaMask(#[from] AlphaMaskError),
}

/// Error type for alpha mask operations
///
/// This error type covers failures that can occur when applying
/// alpha masks to images or performing alpha-related operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphaMaskError {
    /// Image and mask dimensions do not match
    ///
    /// This error occurs when attempting to apply an alpha mask
    /// to an image where the dimensions don't align properly.
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },
}

/// Error type for matting configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// At least one background cluster is required
    #[error("Cluster count must be at least 1, got {0}")]
    InvalidClusterCount(usize),

    /// Clustering needs at least one Lloyd iteration
    #[error("Iteration count must be at least 1, got {0}")]
    InvalidIterationCount(usize),

    /// A numeric parameter is negative, NaN or infinite
    #[error("Parameter `{name}` must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// All fusion weights are zero, so the weighted average is undefined
    #[error("Fusion weights must not all be zero")]
    ZeroFusionWeights,
}

/// A segmentation strategy could not be brought up
///
/// Returned by [`crate::SegmentationStrategy::try_segmenter`]. The strategy
/// chain logs it and moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Strategy `{strategy}` is unavailable: {reason}")]
pub struct Unavailable {
    /// Name of the strategy that failed
    pub strategy: String,
    /// Human-readable cause
    pub reason: String,
}

impl Unavailable {
    pub fn new(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }
}
