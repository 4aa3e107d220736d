//! Per-pixel subject classifiers
//!
//! Four independent scores are combined with a weighted maximum
//! `max(skin, 0.8·hair, 0.6·fabric, 0.4·shape)` and the result is closed
//! with a dilate (radius 2) followed by an erode (radius 1).

use image::Rgb;

use crate::imageops_cutout::color_metrics::{brightness, channel_spread, to_hsv, to_lab, to_ycbcr};
use crate::imageops_cutout::confidence_mask::ConfidenceMask;
use crate::imageops_cutout::context::ImageContext;
use crate::imageops_cutout::flood_fill::{segment_regions, FilledRegion};

const SKIN_WEIGHT: f32 = 1.0;
const HAIR_WEIGHT: f32 = 0.8;
const FABRIC_WEIGHT: f32 = 0.6;
const SHAPE_WEIGHT: f32 = 0.4;

const SHAPE_THRESHOLD: f64 = 30.0;
const SHAPE_REGION_CAP: usize = 1000;
const SHAPE_MATCH: f32 = 0.7;
const SHAPE_MISS: f32 = 0.2;

const DILATE_RADIUS: u32 = 2;
const ERODE_RADIUS: u32 = 1;

/// Whether the color passes any of the four skin tests.
pub fn is_skin(color: Rgb<u8>) -> bool {
    skin_ycbcr(color) || skin_rgb(color) || skin_hsv(color) || skin_lab(color)
}

/// `1.0` for skin, `0.0` otherwise.
#[inline]
pub fn skin_score(color: Rgb<u8>) -> f32 {
    if is_skin(color) {
        1.0
    } else {
        0.0
    }
}

fn skin_ycbcr(color: Rgb<u8>) -> bool {
    let ycc = to_ycbcr(color);
    (77.0..=127.0).contains(&ycc.cb) && (133.0..=173.0).contains(&ycc.cr)
}

fn skin_rgb(color: Rgb<u8>) -> bool {
    let Rgb([r, g, b]) = color;
    r > 95 && g > 40 && b > 20 && r > g && g > b && r - g > 15 && r - b > 15
}

fn skin_hsv(color: Rgb<u8>) -> bool {
    let hsv = to_hsv(color);
    hsv.h <= 50.0 && (0.23..=0.68).contains(&hsv.s) && hsv.v >= 0.35
}

fn skin_lab(color: Rgb<u8>) -> bool {
    let lab = to_lab(color);
    lab.l > 20.0
        && lab.l < 95.0
        && lab.a > 5.0
        && lab.a < 40.0
        && lab.b > 0.0
        && lab.b < 40.0
        && lab.a > lab.b
}

/// Weighted maximum over the black, brown, red, blond and gray hair tests.
pub fn hair_score(color: Rgb<u8>) -> f32 {
    let Rgb([r, g, b]) = color;
    let (r, g, b) = (i16::from(r), i16::from(g), i16::from(b));
    let light = brightness(color);
    let spread = channel_spread(color);

    let tests = [
        (light < 60.0 && spread < 30, 1.0),
        (r > g && g > b && r - b > 15 && (40.0..140.0).contains(&light), 0.9),
        (r > 100 && r - g > 30 && g > b && b < 100, 0.8),
        (r > 150 && g > 120 && g > b && r - b > 30 && light > 140.0, 0.7),
        (spread < 20 && (100.0..200.0).contains(&light), 0.5),
    ];

    tests
        .into_iter()
        .filter(|&(hit, _)| hit)
        .map(|(_, score)| score)
        .fold(0.0, f32::max)
}

/// `0.5` for saturated mid-brightness colors typical of clothing.
#[inline]
pub fn fabric_score(color: Rgb<u8>) -> f32 {
    let light = brightness(color);
    if channel_spread(color) > 15 && light > 20.0 && light < 230.0 {
        0.5
    } else {
        0.0
    }
}

/// Scores every pixel by the shape of the color region it belongs to.
///
/// Regions with an aspect ratio in `[0.3, 2.5]` that fill more than 30% of
/// their bounding box read as object-like.
pub fn shape_mask(ctx: &ImageContext) -> ConfidenceMask {
    let mut values = vec![0.0; ctx.len()];
    let regions = segment_regions(ctx, SHAPE_THRESHOLD, SHAPE_REGION_CAP);
    let mut object_like = 0usize;

    for region in &regions {
        let score = region_shape_score(region);
        if score == SHAPE_MATCH {
            object_like += 1;
        }
        for &i in &region.indices {
            values[i] = score;
        }
    }

    log::trace!(
        "shape analysis: {} regions, {} object-like",
        regions.len(),
        object_like
    );
    ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| values[ctx.index(x, y)])
}

fn region_shape_score(region: &FilledRegion) -> f32 {
    let aspect = region.bounds.aspect_ratio();
    if (0.3..=2.5).contains(&aspect) && region.fill_ratio() > 0.3 {
        SHAPE_MATCH
    } else {
        SHAPE_MISS
    }
}

/// Raw subject confidence for every pixel.
pub fn detect_subject(ctx: &ImageContext) -> ConfidenceMask {
    let shape = shape_mask(ctx);
    let combined = ConfidenceMask::from_fn(ctx.width(), ctx.height(), |x, y| {
        let i = ctx.index(x, y);
        let color = ctx.color_at(i);
        (skin_score(color) * SKIN_WEIGHT)
            .max(hair_score(color) * HAIR_WEIGHT)
            .max(fabric_score(color) * FABRIC_WEIGHT)
            .max(shape.get(i) * SHAPE_WEIGHT)
    });

    let closed = combined.dilate(DILATE_RADIUS).erode(ERODE_RADIUS);
    log::debug!("subject mask mean {:.3}", closed.mean());
    closed
}
