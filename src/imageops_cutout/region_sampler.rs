//! Background color sampling from likely-background regions
//!
//! Four tiers of candidate regions are generated, each carrying a prior
//! weight that reflects how likely it is to be pure background:
//!
//! | Tier          | Shape                                   | Weight |
//! |---------------|-----------------------------------------|--------|
//! | Edge strips   | 8% of the dimension, at most 20 px      | 8.0    |
//! | Corners       | 12% of the dimension, at most 30 px     | 6.0    |
//! | Periphery     | middle of each side, 15% deep           | 4.0    |
//! | Border floods | connected regions grown from the border | 2.0    |
//!
//! Each region is sampled at an adaptive stride, clustered into at most two
//! sub-clusters and scored by how tightly its samples sit around them. The
//! sub-cluster centroids are then repeated `ceil(weight × confidence)` times
//! into the pool that feeds the final background clustering, so uniform,
//! high-priority regions dominate without any hard cutoff.

use image::Rgb;
use rand::Rng;

use crate::imageops_cutout::color_clusterer::{nearest_centroid, ColorCluster, ColorClusterer};
use crate::imageops_cutout::config::MattingConfig;
use crate::imageops_cutout::context::ImageContext;
use crate::imageops_cutout::flood_fill::flood_fill;

const EDGE_STRIP_RATIO: f64 = 0.08;
const EDGE_STRIP_MAX: u32 = 20;
const CORNER_RATIO: f64 = 0.12;
const CORNER_MAX: u32 = 30;
const PERIPHERY_MARGIN_RATIO: f64 = 0.25;
const PERIPHERY_BAND_RATIO: f64 = 0.15;

const FLOOD_THRESHOLD: f64 = 25.0;
const FLOOD_AREA_RATIO: f64 = 0.3;
const FLOOD_MAX_REGIONS: usize = 5;
const FLOOD_MIN_AREA: usize = 16;
const FLOOD_SEED_STEPS: usize = 32;

const SUB_CLUSTERS: usize = 2;
const CONFIDENCE_SCALE: f64 = 100.0;
const SAMPLES_PER_SIDE: f64 = 20.0;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two inclusive corner coordinates.
    pub const fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }

    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

/// A candidate background area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Rect(Rect),
    Pixels { indices: Vec<usize>, bounds: Rect },
}

impl Region {
    pub fn area(&self) -> usize {
        match self {
            Self::Rect(rect) => rect.area(),
            Self::Pixels { indices, .. } => indices.len(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(rect) => *rect,
            Self::Pixels { bounds, .. } => *bounds,
        }
    }

    /// Adaptive sampling stride, `max(1, sqrt(area) / 20)`.
    pub fn stride(&self) -> usize {
        ((self.area() as f64).sqrt() / SAMPLES_PER_SIDE).max(1.0) as usize
    }

    /// Colors picked from the region at its adaptive stride.
    ///
    /// Rectangles are strided on both axes, pixel sets along their index list.
    pub fn samples(&self, ctx: &ImageContext) -> Vec<Rgb<u8>> {
        let stride = self.stride();
        match self {
            Self::Rect(rect) => (rect.y..rect.y + rect.height)
                .step_by(stride)
                .flat_map(|y| {
                    (rect.x..rect.x + rect.width)
                        .step_by(stride)
                        .map(move |x| (x, y))
                })
                .map(|(x, y)| ctx.color(x, y))
                .collect(),
            Self::Pixels { indices, .. } => indices
                .iter()
                .step_by(stride)
                .map(|&i| ctx.color_at(i))
                .collect(),
        }
    }
}

/// Prior class of a candidate region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionTier {
    EdgeStrip,
    Corner,
    Periphery,
    FloodFill,
}

impl RegionTier {
    /// Prior confidence that regions of this tier are background.
    pub const fn weight(self) -> f64 {
        match self {
            Self::EdgeStrip => 8.0,
            Self::Corner => 6.0,
            Self::Periphery => 4.0,
            Self::FloodFill => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRegion {
    pub tier: RegionTier,
    pub region: Region,
}

/// Local clustering result for one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSample {
    pub tier: RegionTier,
    pub clusters: Vec<ColorCluster>,
    /// `1 - mean distance to the nearest sub-cluster / 100`, in `[0, 1]`
    pub confidence: f64,
    /// How often each sub-cluster is repeated into the pool
    pub repetitions: usize,
}

/// Builds the background color pool for an image
#[derive(Debug, Clone, Copy)]
pub struct RegionSampler {
    clusterer: ColorClusterer,
}

impl RegionSampler {
    pub fn new(config: &MattingConfig) -> Self {
        Self {
            clusterer: ColorClusterer::from_config(config).with_max_clusters(SUB_CLUSTERS),
        }
    }

    /// Every candidate region, in tier order.
    pub fn candidate_regions(&self, ctx: &ImageContext) -> Vec<CandidateRegion> {
        let (width, height) = ctx.dimensions();
        let rects = [
            (RegionTier::EdgeStrip, edge_strips(width, height)),
            (RegionTier::Corner, corner_squares(width, height)),
            (RegionTier::Periphery, periphery_bands(width, height)),
        ];

        let mut candidates: Vec<CandidateRegion> = rects
            .into_iter()
            .flat_map(|(tier, rects)| {
                rects
                    .into_iter()
                    .filter(|rect| !rect.is_empty())
                    .map(move |rect| CandidateRegion {
                        tier,
                        region: Region::Rect(rect),
                    })
            })
            .collect();

        candidates.extend(
            border_flood_regions(ctx)
                .into_iter()
                .map(|region| CandidateRegion {
                    tier: RegionTier::FloodFill,
                    region,
                }),
        );
        candidates
    }

    /// Samples and locally clusters one region; `None` when it has no pixels.
    pub fn sample_region<R>(
        &self,
        ctx: &ImageContext,
        candidate: &CandidateRegion,
        rng: &mut R,
    ) -> Option<RegionSample>
    where
        R: Rng + ?Sized,
    {
        let samples = candidate.region.samples(ctx);
        if samples.is_empty() {
            return None;
        }

        let clusters = self.clusterer.cluster(&samples, rng);
        let mean_distance = samples
            .iter()
            .map(|&color| nearest_centroid(clusters.iter().map(|c| c.centroid), color).1)
            .sum::<f64>()
            / samples.len() as f64;
        let confidence = (1.0 - mean_distance / CONFIDENCE_SCALE).clamp(0.0, 1.0);
        let repetitions = (candidate.tier.weight() * confidence).ceil() as usize;

        Some(RegionSample {
            tier: candidate.tier,
            clusters,
            confidence,
            repetitions,
        })
    }

    /// The weighted pool of background colors for the final clustering.
    pub fn sample_pool<R>(&self, ctx: &ImageContext, rng: &mut R) -> Vec<Rgb<u8>>
    where
        R: Rng + ?Sized,
    {
        let candidates = self.candidate_regions(ctx);
        let mut pool = Vec::new();

        for candidate in &candidates {
            let Some(sample) = self.sample_region(ctx, candidate, rng) else {
                continue;
            };
            log::trace!(
                "{:?} region {:?}: {} clusters, confidence {:.3}, x{}",
                sample.tier,
                candidate.region.bounds(),
                sample.clusters.len(),
                sample.confidence,
                sample.repetitions
            );
            for cluster in &sample.clusters {
                pool.extend(std::iter::repeat(cluster.centroid).take(sample.repetitions));
            }
        }

        log::debug!(
            "sampled {} background colors from {} candidate regions",
            pool.len(),
            candidates.len()
        );
        pool
    }
}

#[inline]
fn scaled(dimension: u32, ratio: f64) -> u32 {
    (f64::from(dimension) * ratio).round() as u32
}

/// Top, bottom, left and right strips.
pub fn edge_strips(width: u32, height: u32) -> [Rect; 4] {
    let thick_y = scaled(height, EDGE_STRIP_RATIO).clamp(1, EDGE_STRIP_MAX).min(height);
    let thick_x = scaled(width, EDGE_STRIP_RATIO).clamp(1, EDGE_STRIP_MAX).min(width);
    [
        Rect::new(0, 0, width, thick_y),
        Rect::new(0, height - thick_y, width, thick_y),
        Rect::new(0, 0, thick_x, height),
        Rect::new(width - thick_x, 0, thick_x, height),
    ]
}

/// The four corner squares.
pub fn corner_squares(width: u32, height: u32) -> [Rect; 4] {
    let size_x = scaled(width, CORNER_RATIO).clamp(1, CORNER_MAX).min(width);
    let size_y = scaled(height, CORNER_RATIO).clamp(1, CORNER_MAX).min(height);
    [
        Rect::new(0, 0, size_x, size_y),
        Rect::new(width - size_x, 0, size_x, size_y),
        Rect::new(0, height - size_y, size_x, size_y),
        Rect::new(width - size_x, height - size_y, size_x, size_y),
    ]
}

/// One band per side, covering the middle of that side.
///
/// A 25% margin is left at both ends of each side, where the corner squares
/// already sample; the band reaches 15% into the image.
pub fn periphery_bands(width: u32, height: u32) -> [Rect; 4] {
    let margin_x = scaled(width, PERIPHERY_MARGIN_RATIO);
    let margin_y = scaled(height, PERIPHERY_MARGIN_RATIO);
    let band_x = scaled(width, PERIPHERY_BAND_RATIO).clamp(1, width);
    let band_y = scaled(height, PERIPHERY_BAND_RATIO).clamp(1, height);
    let span_x = width.saturating_sub(2 * margin_x);
    let span_y = height.saturating_sub(2 * margin_y);
    [
        Rect::new(margin_x, 0, span_x, band_y),
        Rect::new(margin_x, height - band_y, span_x, band_y),
        Rect::new(0, margin_y, band_x, span_y),
        Rect::new(width - band_x, margin_y, band_x, span_y),
    ]
}

/// Up to five connected regions grown from border seeds.
///
/// Seeds are the corners, the side midpoints and then an even walk along the
/// border. Each region is capped at 30% of the image; regions smaller than
/// 16 pixels (or the cap, on tiny images) are dropped as noise.
pub fn border_flood_regions(ctx: &ImageContext) -> Vec<Region> {
    let cap = ((ctx.len() as f64 * FLOOD_AREA_RATIO) as usize).max(1);
    let min_area = FLOOD_MIN_AREA.min(cap);
    let mut visited = vec![false; ctx.len()];
    let mut regions = Vec::new();

    for seed in border_seeds(ctx) {
        if regions.len() >= FLOOD_MAX_REGIONS {
            break;
        }
        if visited[seed] {
            continue;
        }
        let filled = flood_fill(ctx, seed, FLOOD_THRESHOLD, cap, &mut visited);
        if filled.area() >= min_area {
            regions.push(Region::Pixels {
                indices: filled.indices,
                bounds: filled.bounds,
            });
        }
    }
    regions
}

fn border_seeds(ctx: &ImageContext) -> Vec<usize> {
    let (width, height) = ctx.dimensions();
    let (max_x, max_y) = (width - 1, height - 1);
    let mut seeds = vec![
        ctx.index(0, 0),
        ctx.index(max_x, 0),
        ctx.index(0, max_y),
        ctx.index(max_x, max_y),
        ctx.index(max_x / 2, 0),
        ctx.index(max_x / 2, max_y),
        ctx.index(0, max_y / 2),
        ctx.index(max_x, max_y / 2),
    ];

    let border = ctx.border_indices();
    let step = (border.len() / FLOOD_SEED_STEPS).max(1);
    seeds.extend(border.into_iter().step_by(step));
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_noise_image, create_square_fixture};
    use image::{Rgba, RgbaImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context(image: RgbaImage) -> ImageContext {
        ImageContext::new(image).unwrap()
    }

    #[test]
    fn test_edge_strips_are_capped() {
        let [top, bottom, left, right] = edge_strips(1000, 100);
        assert_eq!(top, Rect::new(0, 0, 1000, 8));
        assert_eq!(bottom, Rect::new(0, 92, 1000, 8));
        assert_eq!(left, Rect::new(0, 0, 20, 100));
        assert_eq!(right, Rect::new(980, 0, 20, 100));
    }

    #[test]
    fn test_corner_squares_are_capped() {
        let corners = corner_squares(1000, 100);
        assert_eq!(corners[0], Rect::new(0, 0, 30, 12));
        assert_eq!(corners[3], Rect::new(970, 88, 30, 12));
    }

    #[test]
    fn test_periphery_bands_leave_margins() {
        let [top, _, left, _] = periphery_bands(100, 200);
        assert_eq!(top, Rect::new(25, 0, 50, 30));
        assert_eq!(left, Rect::new(0, 50, 15, 100));
    }

    #[test]
    fn test_tiny_image_regions_stay_in_bounds() {
        for rect in edge_strips(1, 1)
            .into_iter()
            .chain(corner_squares(1, 1))
            .chain(periphery_bands(1, 1))
        {
            assert!(rect.x + rect.width <= 1);
            assert!(rect.y + rect.height <= 1);
        }
    }

    #[test]
    fn test_region_stride_grows_with_area() {
        assert_eq!(Region::Rect(Rect::new(0, 0, 10, 10)).stride(), 1);
        assert_eq!(Region::Rect(Rect::new(0, 0, 100, 100)).stride(), 5);
        let ctx = context(RgbaImage::from_pixel(100, 100, Rgba([1, 2, 3, 255])));
        assert_eq!(Region::Rect(Rect::new(0, 0, 100, 100)).samples(&ctx).len(), 400);
    }

    #[test]
    fn test_flood_regions_are_capped_and_bounded_in_count() {
        let ctx = context(RgbaImage::from_pixel(100, 100, Rgba([50, 50, 50, 255])));
        let regions = border_flood_regions(&ctx);
        assert!(!regions.is_empty());
        assert!(regions.len() <= FLOOD_MAX_REGIONS);
        assert!(regions.iter().all(|r| r.area() <= 3000));
    }

    #[test]
    fn test_uniform_region_has_full_confidence() {
        let ctx = context(RgbaImage::from_pixel(50, 50, Rgba([10, 200, 30, 255])));
        let sampler = RegionSampler::new(&MattingConfig::default());
        let candidate = CandidateRegion {
            tier: RegionTier::EdgeStrip,
            region: Region::Rect(Rect::new(0, 0, 50, 4)),
        };
        let sample = sampler
            .sample_region(&ctx, &candidate, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(sample.confidence, 1.0);
        assert_eq!(sample.repetitions, 8);
        assert_eq!(sample.clusters.len(), 1);
    }

    #[test]
    fn test_noisy_region_has_lower_confidence() {
        let ctx = context(create_noise_image(40, 40, 11));
        let sampler = RegionSampler::new(&MattingConfig::default());
        let candidate = CandidateRegion {
            tier: RegionTier::Corner,
            region: Region::Rect(Rect::new(0, 0, 40, 40)),
        };
        let sample = sampler
            .sample_region(&ctx, &candidate, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(sample.confidence < 1.0);
        assert!(sample.repetitions <= 6);
        assert!(sample.clusters.len() <= SUB_CLUSTERS);
    }

    #[test]
    fn test_pool_of_square_fixture_is_background_only() {
        let ctx = context(create_square_fixture(100, 100, 20));
        let sampler = RegionSampler::new(&MattingConfig::default());
        let pool = sampler.sample_pool(&ctx, &mut StdRng::seed_from_u64(5));
        assert!(!pool.is_empty());
        assert!(pool.iter().all(|&c| c == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_candidate_regions_cover_all_tiers() {
        let ctx = context(create_square_fixture(60, 60, 10));
        let sampler = RegionSampler::new(&MattingConfig::default());
        let candidates = sampler.candidate_regions(&ctx);
        for tier in [
            RegionTier::EdgeStrip,
            RegionTier::Corner,
            RegionTier::Periphery,
            RegionTier::FloodFill,
        ] {
            assert!(candidates.iter().any(|c| c.tier == tier));
        }
    }
}
