use std::collections::VecDeque;

use image::Rgb;

use crate::imageops_cutout::color_metrics::distance;
use crate::imageops_cutout::context::ImageContext;
use crate::imageops_cutout::region_sampler::Rect;

/// A connected set of pixels grown from a seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledRegion {
    /// Row-major pixel indices, each listed once
    pub indices: Vec<usize>,
    pub bounds: Rect,
}

impl FilledRegion {
    #[inline]
    pub fn area(&self) -> usize {
        self.indices.len()
    }

    /// Share of the bounding box covered by the region.
    #[inline]
    pub fn fill_ratio(&self) -> f64 {
        self.area() as f64 / self.bounds.area().max(1) as f64
    }
}

/// Grows a 4-connected region from `seed`
///
/// A pixel joins when its Euclidean RGB distance to the seed color is at
/// most `threshold`. Growth stops once `cap` pixels have joined. Pixels are
/// marked in `visited` only when they join, so a rejected pixel stays
/// available to later regions and no pixel is ever added twice.
pub fn flood_fill(
    ctx: &ImageContext,
    seed: usize,
    threshold: f64,
    cap: usize,
    visited: &mut [bool],
) -> FilledRegion {
    let seed_color = ctx.color_at(seed);
    let (sx, sy) = ctx.coords(seed);
    let mut bounds = [sx, sy, sx, sy];
    let mut indices = Vec::new();
    let mut queue = VecDeque::from([seed]);

    while let Some(index) = queue.pop_front() {
        if indices.len() >= cap {
            break;
        }
        if visited[index] || !within(ctx.color_at(index), seed_color, threshold) {
            continue;
        }
        visited[index] = true;
        indices.push(index);

        let (x, y) = ctx.coords(index);
        update_bounds(&mut bounds, x, y);

        queue.extend(ctx.neighbors4(index).filter(|&n| !visited[n]));
    }

    FilledRegion {
        indices,
        bounds: Rect::from_corners(bounds[0], bounds[1], bounds[2], bounds[3]),
    }
}

/// Partitions the whole image into capped color-similar regions.
pub fn segment_regions(ctx: &ImageContext, threshold: f64, cap: usize) -> Vec<FilledRegion> {
    let mut visited = vec![false; ctx.len()];
    let mut regions = Vec::new();
    for seed in 0..ctx.len() {
        if !visited[seed] {
            regions.push(flood_fill(ctx, seed, threshold, cap, &mut visited));
        }
    }
    regions
}

/// Marks every pixel reachable from the border through accepted pixels.
///
/// Border pixels themselves must be accepted to start a flood.
pub fn flood_from_border<F>(ctx: &ImageContext, accept: F) -> Vec<bool>
where
    F: Fn(usize) -> bool,
{
    let mut reached = vec![false; ctx.len()];
    let mut queue: VecDeque<usize> = ctx
        .border_indices()
        .into_iter()
        .filter(|&i| accept(i))
        .collect();
    queue.iter().for_each(|&i| reached[i] = true);

    while let Some(index) = queue.pop_front() {
        for neighbor in ctx.neighbors4(index) {
            if !reached[neighbor] && accept(neighbor) {
                reached[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }

    reached
}

#[inline]
fn within(color: Rgb<u8>, seed: Rgb<u8>, threshold: f64) -> bool {
    distance(color, seed) <= threshold
}

fn update_bounds(bounds: &mut [u32; 4], x: u32, y: u32) {
    bounds[0] = bounds[0].min(x);
    bounds[1] = bounds[1].min(y);
    bounds[2] = bounds[2].max(x);
    bounds[3] = bounds[3].max(y);
}
