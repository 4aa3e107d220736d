use crate::error::ConfigError;

/// Relative weights of the signals averaged by mask fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub subject: f32,
    pub edge: f32,
    pub color_distance: f32,
    pub texture: f32,
}

impl FusionWeights {
    #[inline]
    pub fn total(&self) -> f32 {
        self.subject + self.edge + self.color_distance + self.texture
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_non_negative("fusion.subject", self.subject)?;
        validate_non_negative("fusion.edge", self.edge)?;
        validate_non_negative("fusion.color_distance", self.color_distance)?;
        validate_non_negative("fusion.texture", self.texture)?;
        if self.total() <= 0.0 {
            return Err(ConfigError::ZeroFusionWeights);
        }
        Ok(())
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            subject: 0.4,
            edge: 0.3,
            color_distance: 0.2,
            texture: 0.1,
        }
    }
}

/// Tunables of the heuristic matting pipeline
///
/// `Default` reproduces the fixed constants of the pipeline; there is no
/// configuration file. The only knob most callers need is [`seed`], which
/// makes the K-means++ seeding (and therefore the whole output) repeatable.
///
/// [`seed`]: MattingConfig::seed
///
/// # Examples
///
/// ```
/// use imageops_cutout::MattingConfig;
///
/// let config = MattingConfig::default().with_seed(7).with_max_clusters(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MattingConfig {
    /// Upper bound on background palette size
    pub max_clusters: usize,
    /// Lloyd iterations before clustering gives up on convergence
    pub max_iterations: usize,
    /// Largest centroid movement (RGB units) still counted as converged
    pub convergence_threshold: f64,
    pub fusion_weights: FusionWeights,
    /// Slope of the contrast sigmoid applied after fusion
    pub sigmoid_steepness: f32,
    /// Run the border-connectivity refinement after fusion
    pub refine_connectivity: bool,
    /// Fixed RNG seed; `None` draws fresh entropy on every call
    pub seed: Option<u64>,
}

impl Default for MattingConfig {
    fn default() -> Self {
        Self {
            max_clusters: 8,
            max_iterations: 15,
            convergence_threshold: 5.0,
            fusion_weights: FusionWeights::default(),
            sigmoid_steepness: 8.0,
            refine_connectivity: true,
            seed: None,
        }
    }
}

impl MattingConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_max_clusters(mut self, max_clusters: usize) -> Self {
        self.max_clusters = max_clusters;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_fusion_weights(mut self, weights: FusionWeights) -> Self {
        self.fusion_weights = weights;
        self
    }

    #[must_use]
    pub fn with_sigmoid_steepness(mut self, steepness: f32) -> Self {
        self.sigmoid_steepness = steepness;
        self
    }

    #[must_use]
    pub fn with_connectivity_refinement(mut self, enabled: bool) -> Self {
        self.refine_connectivity = enabled;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    ///
    /// * `ConfigError::InvalidClusterCount` - When `max_clusters` is zero
    /// * `ConfigError::InvalidIterationCount` - When `max_iterations` is zero
    /// * `ConfigError::InvalidParameter` - When a float is negative or not finite
    /// * `ConfigError::ZeroFusionWeights` - When all fusion weights are zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_clusters == 0 {
            return Err(ConfigError::InvalidClusterCount(self.max_clusters));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterationCount(self.max_iterations));
        }
        validate_non_negative("convergence_threshold", self.convergence_threshold as f32)?;
        validate_non_negative("sigmoid_steepness", self.sigmoid_steepness)?;
        self.fusion_weights.validate()
    }
}

fn validate_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}
