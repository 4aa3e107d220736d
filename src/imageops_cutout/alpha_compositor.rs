//! Conversion of fused confidence into a refined alpha channel
//!
//! Six passes run in a fixed order. Each one reads an immutable snapshot
//! of the previous plane and writes a fresh one clamped to `[0, 255]`, so
//! the result does not depend on traversal order and rows can be computed
//! in parallel.
//!
//! 1. Seed: hard thresholds at 0.1 and 0.9 with a smoothstep ramp between.
//! 2. Anti-aliasing: bilateral smoothing where the alpha is jagged.
//! 3. Edge detail: Laplacian sharpening on confident pixels.
//! 4. Feathering: bilateral blur across uncertain alpha edges.
//! 5. Detail recovery: unsharp mask on confident pixels.
//! 6. Consistency: pulls outliers toward their similar neighbors.

use image::{ImageBuffer, Luma};
use imageproc::{definitions::Image, filter::gaussian_blur_f32};

use crate::imageops_cutout::confidence_mask::ConfidenceMask;
use crate::utils::{build_plane, clamp_alpha, clamp_unit, smoothstep};

/// Final 8-bit alpha plane
pub type AlphaChannel = Image<Luma<u8>>;

/// Working alpha plane, values in `[0, 255]`.
type AlphaPlane = Image<Luma<f32>>;

const TRANSPARENT_BELOW: f32 = 0.1;
const OPAQUE_ABOVE: f32 = 0.9;
const SOFT_MIN: f32 = 0.05;
const SOFT_MAX: f32 = 0.95;

const JAGGED_THRESHOLD: f32 = 0.3;
const ALPHA_SIMILARITY_SIGMA: f32 = 0.25;
const MAX_RADIUS: f32 = 3.0;

const DETAIL_MIN_CONFIDENCE: f32 = 0.6;
const DETAIL_STRENGTH: f32 = 0.15;

const FEATHER_EDGE_DELTA: f32 = 30.0;
const FEATHER_MAX_CONFIDENCE: f32 = 0.8;

const UNSHARP_MIN_CONFIDENCE: f32 = 0.7;
const UNSHARP_SIGMA: f32 = 1.0;
const UNSHARP_STRENGTH: f32 = 0.4;

const CONSISTENCY_SIGMA: f32 = 0.15;
const CONSISTENCY_MIN_WEIGHT: f32 = 0.6;
const CONSISTENCY_BLEND: f32 = 0.4;

const NEIGHBORS8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];
const NEIGHBORS4: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Runs every compositing pass over a fused confidence mask.
pub fn composite(fused: &ConfidenceMask) -> AlphaChannel {
    let seeded = seed(fused);
    let smoothed = anti_alias(&seeded, fused);
    let detailed = enhance_edges(&smoothed, fused);
    let feathered = feather(&detailed, fused);
    let recovered = recover_detail(&feathered, fused);
    let consistent = enforce_consistency(&recovered);

    let (width, height) = fused.dimensions();
    let alpha = ImageBuffer::from_fn(width, height, |x, y| {
        Luma([clamp_alpha(consistent.get_pixel(x, y)[0])])
    });
    log::debug!("composited {}x{} alpha channel", width, height);
    alpha
}

/// Initial alpha from the fused confidence.
fn seed(fused: &ConfidenceMask) -> AlphaPlane {
    map_plane(fused.dimensions(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let value = fused.get_clamped(x, y);

        if value < TRANSPARENT_BELOW {
            0.0
        } else if value > OPAQUE_ABOVE {
            255.0 * edge_alpha(fused, x, y)
        } else {
            255.0 * smoothstep(value).clamp(SOFT_MIN, SOFT_MAX)
        }
    })
}

/// 1 inside a confident area, less on its rim.
fn edge_alpha(fused: &ConfidenceMask, x: i64, y: i64) -> f32 {
    let confident = NEIGHBORS8
        .iter()
        .filter(|&&(dx, dy)| fused.get_clamped(x + dx, y + dy) > OPAQUE_ABOVE)
        .count();
    if confident == NEIGHBORS8.len() {
        1.0
    } else {
        0.15f32.mul_add(confident as f32 / 8.0, 0.85)
    }
}

fn anti_alias(plane: &AlphaPlane, fused: &ConfidenceMask) -> AlphaPlane {
    map_plane(plane.dimensions(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let jag = jaggedness(plane, x, y);
        if jag <= JAGGED_THRESHOLD {
            return at(plane, x, y);
        }
        let confidence = fused.get_clamped(x, y);
        let radius = 2.0f32.mul_add(jag, 1.0 - confidence).round() + 1.0;
        bilateral(plane, x, y, radius.clamp(1.0, MAX_RADIUS) as i64)
    })
}

/// Local unevenness of the alpha, in `[0, 1]`.
///
/// Mixes the 3×3 standard deviation with the imbalance between the
/// horizontal and vertical gradients.
fn jaggedness(plane: &AlphaPlane, x: i64, y: i64) -> f32 {
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let v = at(plane, x + dx, y + dy);
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / 9.0;
    let deviation = (sum_sq / 9.0 - mean * mean).max(0.0).sqrt();

    let gh = (at(plane, x + 1, y) - at(plane, x - 1, y)).abs();
    let gv = (at(plane, x, y + 1) - at(plane, x, y - 1)).abs();

    clamp_unit(0.6f32.mul_add(deviation / 127.5, 0.4 * (gh - gv).abs() / 255.0))
}

fn enhance_edges(plane: &AlphaPlane, fused: &ConfidenceMask) -> AlphaPlane {
    map_plane(plane.dimensions(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let alpha = at(plane, x, y);
        let confidence = fused.get_clamped(x, y);
        if confidence <= DETAIL_MIN_CONFIDENCE {
            return alpha;
        }
        let neighbors: f32 = NEIGHBORS4
            .iter()
            .map(|&(dx, dy)| at(plane, x + dx, y + dy))
            .sum();
        let laplacian = 4.0f32.mul_add(alpha, -neighbors);
        (laplacian * confidence).mul_add(DETAIL_STRENGTH, alpha)
    })
}

fn feather(plane: &AlphaPlane, fused: &ConfidenceMask) -> AlphaPlane {
    map_plane(plane.dimensions(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let alpha = at(plane, x, y);
        let confidence = fused.get_clamped(x, y);
        let gradient = NEIGHBORS4
            .iter()
            .map(|&(dx, dy)| (at(plane, x + dx, y + dy) - alpha).abs())
            .fold(0.0, f32::max);

        if gradient <= FEATHER_EDGE_DELTA || confidence >= FEATHER_MAX_CONFIDENCE {
            return alpha;
        }
        let radius = 2.0f32.mul_add(1.0 - confidence, gradient / 255.0).round() + 1.0;
        bilateral(plane, x, y, radius.clamp(1.0, MAX_RADIUS) as i64)
    })
}

fn recover_detail(plane: &AlphaPlane, fused: &ConfidenceMask) -> AlphaPlane {
    let blurred = gaussian_blur_f32(plane, UNSHARP_SIGMA);
    map_plane(plane.dimensions(), |x, y| {
        let alpha = plane.get_pixel(x, y)[0];
        let confidence = fused.get_clamped(i64::from(x), i64::from(y));
        if confidence <= UNSHARP_MIN_CONFIDENCE {
            return alpha;
        }
        let detail = alpha - blurred.get_pixel(x, y)[0];
        (detail * confidence).mul_add(UNSHARP_STRENGTH, alpha)
    })
}

fn enforce_consistency(plane: &AlphaPlane) -> AlphaPlane {
    let denominator = 2.0 * CONSISTENCY_SIGMA * CONSISTENCY_SIGMA;
    map_plane(plane.dimensions(), |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let alpha = at(plane, x, y);

        let (weight_sum, weighted) = NEIGHBORS8.iter().fold((0.0, 0.0), |(ws, acc), &(dx, dy)| {
            let neighbor = at(plane, x + dx, y + dy);
            let delta = (neighbor - alpha) / 255.0;
            let weight = (-(delta * delta) / denominator).exp();
            (ws + weight, weight.mul_add(neighbor, acc))
        });

        if weight_sum / 8.0 >= CONSISTENCY_MIN_WEIGHT || weight_sum <= 0.0 {
            return alpha;
        }
        (1.0 - CONSISTENCY_BLEND).mul_add(alpha, CONSISTENCY_BLEND * weighted / weight_sum)
    })
}

/// Spatial × alpha-similarity weighted mean over a square window.
fn bilateral(plane: &AlphaPlane, x: i64, y: i64, radius: i64) -> f32 {
    let center = at(plane, x, y);
    let spatial_denominator = 2.0 * (radius * radius) as f32;
    let range_denominator = 2.0 * ALPHA_SIMILARITY_SIGMA * ALPHA_SIMILARITY_SIGMA;

    let mut sum = 0.0;
    let mut weight_sum = 0.0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let value = at(plane, x + dx, y + dy);
            let spatial = (-((dx * dx + dy * dy) as f32) / spatial_denominator).exp();
            let delta = (value - center) / 255.0;
            let weight = spatial * (-(delta * delta) / range_denominator).exp();
            sum = weight.mul_add(value, sum);
            weight_sum += weight;
        }
    }
    // The center tap always has weight 1.
    sum / weight_sum
}

#[inline]
fn at(plane: &AlphaPlane, x: i64, y: i64) -> f32 {
    let cx = x.clamp(0, i64::from(plane.width()) - 1) as u32;
    let cy = y.clamp(0, i64::from(plane.height()) - 1) as u32;
    plane.get_pixel(cx, cy)[0]
}

fn map_plane<F>((width, height): (u32, u32), f: F) -> AlphaPlane
where
    F: Fn(u32, u32) -> f32 + Sync + Send,
{
    build_plane(width, height, |x, y| {
        let value = f(x, y);
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 255.0)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(size: u32, start: u32, end: u32, inside: f32, outside: f32) -> ConfidenceMask {
        ConfidenceMask::from_fn(size, size, |x, y| {
            if (start..end).contains(&x) && (start..end).contains(&y) {
                inside
            } else {
                outside
            }
        })
    }

    #[test]
    fn test_uncertain_everywhere_is_transparent() {
        let alpha = composite(&ConfidenceMask::filled(12, 12, 0.05));
        assert!(alpha.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_confident_everywhere_is_opaque() {
        let alpha = composite(&ConfidenceMask::filled(12, 12, 1.0));
        assert!(alpha.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_seed_thresholds_and_ramp() {
        let mask = ConfidenceMask::from_vec(3, 1, vec![0.05, 0.5, 0.95]).unwrap();
        let seeded = seed(&mask);
        assert_eq!(seeded.get_pixel(0, 0)[0], 0.0);
        assert!((seeded.get_pixel(1, 0)[0] - 127.5).abs() < 1e-3);
        // Clamped taps past the border replicate the pixel itself.
        let expected = 255.0 * 0.15f32.mul_add(5.0 / 8.0, 0.85);
        assert!((seeded.get_pixel(2, 0)[0] - expected).abs() < 1e-3);
    }

    #[test]
    fn test_ramp_is_clamped_away_from_hard_values() {
        let mask = ConfidenceMask::from_vec(2, 1, vec![0.1, 0.9]).unwrap();
        let seeded = seed(&mask);
        assert!((seeded.get_pixel(0, 0)[0] - 255.0 * 0.05).abs() < 1e-3);
        assert!((seeded.get_pixel(1, 0)[0] - 255.0 * 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_square_keeps_opaque_core_and_clear_surroundings() {
        let alpha = composite(&square_mask(40, 12, 28, 1.0, 0.0));
        assert_eq!(alpha.get_pixel(20, 20)[0], 255);
        assert_eq!(alpha.get_pixel(16, 16)[0], 255);
        assert_eq!(alpha.get_pixel(2, 2)[0], 0);
        assert_eq!(alpha.get_pixel(20, 5)[0], 0);
    }

    #[test]
    fn test_jaggedness_of_flat_plane_is_zero() {
        let plane = map_plane((5, 5), |_, _| 128.0);
        assert_eq!(jaggedness(&plane, 2, 2), 0.0);
    }

    #[test]
    fn test_consistency_pulls_isolated_outlier() {
        let plane = map_plane((5, 5), |x, y| if (x, y) == (2, 2) { 255.0 } else { 0.0 });
        let result = enforce_consistency(&plane);
        assert!((result.get_pixel(2, 2)[0] - 153.0).abs() < 1e-3);
        assert_eq!(result.get_pixel(0, 0)[0], 0.0);
    }

    #[test]
    fn test_bilateral_ignores_dissimilar_alpha() {
        let plane = map_plane((7, 7), |x, _| if x < 3 { 0.0 } else { 255.0 });
        let value = bilateral(&plane, 4, 3, 2);
        assert!(value > 254.0);
    }

    #[test]
    fn test_anti_alias_smooths_jagged_staircase() {
        // Alternating 48/208 has jaggedness ~0.37 everywhere.
        let plane = map_plane((9, 9), |x, y| if (x + y) % 2 == 0 { 208.0 } else { 48.0 });
        let fused = ConfidenceMask::filled(9, 9, 0.5);
        assert!(jaggedness(&plane, 4, 4) > JAGGED_THRESHOLD);

        let smoothed = anti_alias(&plane, &fused);
        let high = smoothed.get_pixel(4, 4)[0];
        let low = smoothed.get_pixel(4, 5)[0];
        assert!(high < 205.0 && high > 128.0, "high pixel became {high}");
        assert!(low > 51.0 && low < 128.0, "low pixel became {low}");
    }

    #[test]
    fn test_anti_alias_keeps_smooth_plane() {
        let plane = map_plane((6, 6), |x, _| x as f32 * 10.0);
        let smoothed = anti_alias(&plane, &ConfidenceMask::filled(6, 6, 0.5));
        assert_eq!(smoothed, plane);
    }

    #[test]
    fn test_edge_detail_applies_laplacian_on_confident_pixels() {
        let plane = map_plane((5, 5), |x, y| if (x, y) == (2, 2) { 150.0 } else { 100.0 });

        let detailed = enhance_edges(&plane, &ConfidenceMask::filled(5, 5, 1.0));
        // (4 * 150 - 400) * 1.0 * 0.15 = 30
        assert!((detailed.get_pixel(2, 2)[0] - 180.0).abs() < 1e-3);
        assert!((detailed.get_pixel(3, 2)[0] - 92.5).abs() < 1e-3);
        assert_eq!(detailed.get_pixel(0, 0)[0], 100.0);

        let uncertain = enhance_edges(&plane, &ConfidenceMask::filled(5, 5, 0.5));
        assert_eq!(uncertain, plane);
    }

    #[test]
    fn test_feather_blurs_uncertain_step() {
        let plane = map_plane((9, 9), |x, _| if x < 4 { 64.0 } else { 192.0 });

        let feathered = feather(&plane, &ConfidenceMask::filled(9, 9, 0.5));
        assert!(feathered.get_pixel(3, 4)[0] > 70.0);
        assert!(feathered.get_pixel(4, 4)[0] < 186.0);
        // Away from the step nothing moves.
        assert_eq!(feathered.get_pixel(0, 4)[0], 64.0);
        assert_eq!(feathered.get_pixel(8, 4)[0], 192.0);

        let confident = feather(&plane, &ConfidenceMask::filled(9, 9, 0.9));
        assert_eq!(confident, plane);
    }

    #[test]
    fn test_detail_recovery_sharpens_confident_edge() {
        let plane = map_plane((9, 9), |x, _| if x < 4 { 50.0 } else { 200.0 });

        let recovered = recover_detail(&plane, &ConfidenceMask::filled(9, 9, 0.9));
        assert!(recovered.get_pixel(4, 4)[0] > 205.0);
        assert!(recovered.get_pixel(3, 4)[0] < 45.0);

        let uncertain = recover_detail(&plane, &ConfidenceMask::filled(9, 9, 0.5));
        assert_eq!(uncertain, plane);
    }

    #[test]
    fn test_single_pixel_image() {
        let alpha = composite(&ConfidenceMask::filled(1, 1, 0.95));
        assert_eq!(alpha.dimensions(), (1, 1));
        assert_eq!(alpha.get_pixel(0, 0)[0], 255);
    }
}
