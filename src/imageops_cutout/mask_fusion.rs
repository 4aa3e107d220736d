//! Fusion of the per-pixel signals into one foreground confidence
//!
//! The base value is a weighted average of the subject, edge, color
//! distance and texture masks pushed through a logistic contrast curve.
//! An optional refinement then uses connectivity to the image border:
//! background-colored pixels reachable from the border are damped, and
//! pixels far from every background color are lifted.

use crate::imageops_cutout::color_clusterer::BackgroundModel;
use crate::imageops_cutout::color_metrics::MAX_PERCEPTUAL_DISTANCE;
use crate::imageops_cutout::confidence_mask::ConfidenceMask;
use crate::imageops_cutout::config::FusionWeights;
use crate::imageops_cutout::context::ImageContext;
use crate::imageops_cutout::flood_fill::flood_from_border;
use crate::utils::{sigmoid, smoothstep};

/// Color distance below which a pixel counts as background-colored.
const BACKGROUND_DISTANCE: f32 = 0.08;
/// Color distance from which a pixel starts being lifted.
const LIFT_START: f32 = 0.25;
/// Distance span over which the lift ramps up to full confidence.
const LIFT_SPAN: f32 = 0.25;
const BORDER_DAMPING: f32 = 0.5;

/// The four signals fused into the final confidence
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMasks {
    pub subject: ConfidenceMask,
    pub edges: ConfidenceMask,
    pub color_distance: ConfidenceMask,
    pub texture: ConfidenceMask,
}

/// Normalized perceptual distance of each pixel to its nearest background cluster.
pub fn color_distance_mask(ctx: &ImageContext, background: &BackgroundModel) -> ConfidenceMask {
    ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| {
        let (_, distance) = background.nearest(ctx.color(x, y));
        (distance / MAX_PERCEPTUAL_DISTANCE) as f32
    })
}

/// Weighted average of the signals followed by the contrast sigmoid.
///
/// Weights are normalized by their sum, so they need not add up to one.
/// A zero weight sum falls back to the neutral value 0.5 before the sigmoid.
pub fn fuse(signals: &SignalMasks, weights: &FusionWeights, steepness: f32) -> ConfidenceMask {
    let (width, height) = signals.subject.dimensions();
    let total = weights.total();

    ConfidenceMask::from_fn(width, height, |x, y| {
        let i = y as usize * width as usize + x as usize;
        let average = if total > 0.0 {
            (signals.subject.get(i) * weights.subject
                + signals.edges.get(i) * weights.edge
                + signals.color_distance.get(i) * weights.color_distance
                + signals.texture.get(i) * weights.texture)
                / total
        } else {
            0.5
        };
        sigmoid(average, steepness)
    })
}

/// Damps border-connected background and lifts distinctly off-palette pixels.
pub fn refine_connectivity(
    ctx: &ImageContext,
    fused: &ConfidenceMask,
    color_distance: &ConfidenceMask,
) -> ConfidenceMask {
    let reached = flood_from_border(ctx, |i| color_distance.get(i) < BACKGROUND_DISTANCE);
    let damped = reached.iter().filter(|&&r| r).count();
    log::debug!(
        "connectivity refinement: {} of {} pixels border-connected background",
        damped,
        ctx.len()
    );

    ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| {
        let i = ctx.index(x, y);
        let value = fused.get(i);
        let distance = color_distance.get(i);
        if reached[i] {
            value * BORDER_DAMPING
        } else if distance >= LIFT_START {
            value.max(smoothstep((distance - LIFT_START) / LIFT_SPAN))
        } else {
            value
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imageops_cutout::color_clusterer::ColorCluster;
    use crate::test_utils::create_square_fixture;
    use image::Rgb;

    fn white_background() -> BackgroundModel {
        BackgroundModel::from_clusters(vec![ColorCluster {
            centroid: Rgb([255, 255, 255]),
            count: 1,
            weight: 1.0,
        }])
    }

    fn flat(value: f32) -> ConfidenceMask {
        ConfidenceMask::filled(4, 4, value)
    }

    #[test]
    fn test_color_distance_is_zero_on_background() {
        let ctx = ImageContext::new(create_square_fixture(20, 20, 6)).unwrap();
        let mask = color_distance_mask(&ctx, &white_background());
        assert_eq!(mask.get(0), 0.0);
        let red = mask.get(ctx.index(10, 10));
        assert!((red - 0.882).abs() < 0.01);
    }

    #[test]
    fn test_fuse_neutral_signals_map_to_half() {
        let signals = SignalMasks {
            subject: flat(0.5),
            edges: flat(0.5),
            color_distance: flat(0.5),
            texture: flat(0.5),
        };
        let fused = fuse(&signals, &FusionWeights::default(), 8.0);
        assert!(fused.as_slice().iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_fuse_is_monotonic_in_each_signal() {
        let low = SignalMasks {
            subject: flat(0.2),
            edges: flat(0.2),
            color_distance: flat(0.2),
            texture: flat(0.2),
        };
        let high = SignalMasks {
            subject: flat(0.9),
            ..low.clone()
        };
        let weights = FusionWeights::default();
        assert!(fuse(&high, &weights, 8.0).get(0) > fuse(&low, &weights, 8.0).get(0));
    }

    #[test]
    fn test_fuse_applies_contrast_sigmoid() {
        let signals = SignalMasks {
            subject: flat(0.2),
            edges: flat(0.2),
            color_distance: flat(0.2),
            texture: flat(0.2),
        };
        let fused = fuse(&signals, &FusionWeights::default(), 8.0);
        // 1 / (1 + e^(8 * 0.3))
        let expected = 1.0 / (1.0 + 2.4f32.exp());
        assert!((fused.get(0) - expected).abs() < 1e-4);
        assert!((fused.get(0) - 0.0832).abs() < 1e-3);

        let steeper = fuse(&signals, &FusionWeights::default(), 16.0);
        assert!(steeper.get(0) < fused.get(0));
    }

    #[test]
    fn test_zero_weights_fall_back_to_neutral() {
        let signals = SignalMasks {
            subject: flat(1.0),
            edges: flat(1.0),
            color_distance: flat(1.0),
            texture: flat(1.0),
        };
        let zero = FusionWeights {
            subject: 0.0,
            edge: 0.0,
            color_distance: 0.0,
            texture: 0.0,
        };
        assert!((fuse(&signals, &zero, 8.0).get(0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_refinement_damps_background_and_lifts_subject() {
        let ctx = ImageContext::new(create_square_fixture(20, 20, 6)).unwrap();
        let distance = color_distance_mask(&ctx, &white_background());
        let fused = ConfidenceMask::filled(20, 20, 0.4);
        let refined = refine_connectivity(&ctx, &fused, &distance);

        assert!((refined.get(0) - 0.2).abs() < 1e-6);
        assert_eq!(refined.get(ctx.index(10, 10)), 1.0);
    }

    #[test]
    fn test_enclosed_background_color_is_not_damped() {
        // White interior inside a red frame is never reached from the border.
        let image = image::RgbaImage::from_fn(9, 9, |x, y| {
            let ring = x == 0 || y == 0 || x == 8 || y == 8;
            if ring {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let ctx = ImageContext::new(image).unwrap();
        let distance = color_distance_mask(&ctx, &white_background());
        let fused = ConfidenceMask::filled(9, 9, 0.4);
        let refined = refine_connectivity(&ctx, &fused, &distance);
        assert!((refined.get(ctx.index(4, 4)) - 0.4).abs() < 1e-6);
    }
}
