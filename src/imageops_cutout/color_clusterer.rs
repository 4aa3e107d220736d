//! K-means++ clustering of sampled colors
//!
//! Seeding follows the standard K-means++ scheme: the first centroid is a
//! uniformly drawn sample, every further centroid is drawn with probability
//! proportional to its squared perceptual distance from the closest existing
//! centroid. Lloyd iterations then refine the centroids until none of them
//! moves by the convergence threshold or the iteration budget runs out.
//!
//! The random source is always passed in, so callers that need repeatable
//! output seed it themselves.

use std::cmp::Reverse;

use image::Rgb;
use rand::Rng;

use crate::imageops_cutout::color_metrics::{
    distance_f64, perceptual_distance, perceptual_distance_f64,
};
use crate::imageops_cutout::config::MattingConfig;

/// A centroid color and how many samples it absorbed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCluster {
    pub centroid: Rgb<u8>,
    /// Number of samples assigned to this centroid
    pub count: usize,
    /// `count` divided by the total number of clustered samples
    pub weight: f64,
}

const WHITE_CLUSTER: ColorCluster = ColorCluster {
    centroid: Rgb([255, 255, 255]),
    count: 0,
    weight: 1.0,
};

/// Ranked palette of dominant background colors
///
/// Never empty and ordered by descending weight. Without any samples it
/// holds a single white cluster, which keeps every downstream division
/// well defined.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundModel {
    clusters: Vec<ColorCluster>,
}

impl BackgroundModel {
    pub fn from_clusters(mut clusters: Vec<ColorCluster>) -> Self {
        if clusters.is_empty() {
            return Self::default();
        }
        clusters.sort_by_key(|cluster| Reverse(cluster.count));
        Self { clusters }
    }

    pub fn clusters(&self) -> &[ColorCluster] {
        &self.clusters
    }

    /// The highest-weighted cluster.
    pub fn dominant(&self) -> &ColorCluster {
        &self.clusters[0]
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Index of and perceptual distance to the closest centroid.
    pub fn nearest(&self, color: Rgb<u8>) -> (usize, f64) {
        nearest_centroid(
            self.clusters.iter().map(|cluster| cluster.centroid),
            color,
        )
    }
}

impl Default for BackgroundModel {
    fn default() -> Self {
        Self {
            clusters: vec![WHITE_CLUSTER],
        }
    }
}

/// K-means++ clusterer over RGB samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorClusterer {
    max_clusters: usize,
    max_iterations: usize,
    convergence_threshold: f64,
}

impl ColorClusterer {
    /// Creates a clusterer. Zero counts are raised to one.
    pub fn new(max_clusters: usize, max_iterations: usize, convergence_threshold: f64) -> Self {
        Self {
            max_clusters: max_clusters.max(1),
            max_iterations: max_iterations.max(1),
            convergence_threshold,
        }
    }

    pub fn from_config(config: &MattingConfig) -> Self {
        Self::new(
            config.max_clusters,
            config.max_iterations,
            config.convergence_threshold,
        )
    }

    /// Same iteration budget, different cluster count.
    pub fn with_max_clusters(self, max_clusters: usize) -> Self {
        Self::new(max_clusters, self.max_iterations, self.convergence_threshold)
    }

    #[inline]
    pub const fn max_clusters(&self) -> usize {
        self.max_clusters
    }

    /// Clusters `samples` and returns the clusters ranked by count.
    ///
    /// Empty input yields a single white cluster. Identical samples never
    /// produce duplicate centroids: seeding stops as soon as every sample
    /// already coincides with a centroid.
    pub fn cluster<R>(&self, samples: &[Rgb<u8>], rng: &mut R) -> Vec<ColorCluster>
    where
        R: Rng + ?Sized,
    {
        if samples.is_empty() {
            return vec![WHITE_CLUSTER];
        }

        let points: Vec<[f64; 3]> = samples
            .iter()
            .map(|&Rgb([r, g, b])| [f64::from(r), f64::from(g), f64::from(b)])
            .collect();

        let mut centroids = seed_centroids(&points, self.max_clusters, rng);
        let mut assignments = vec![0usize; points.len()];

        for _ in 0..self.max_iterations {
            assign(&points, &centroids, &mut assignments);
            let updated = recompute(&points, &assignments, &centroids);
            let converged = centroids
                .iter()
                .zip(&updated)
                .all(|(old, new)| distance_f64(old, new) < self.convergence_threshold);
            centroids = updated;
            if converged {
                break;
            }
        }
        assign(&points, &centroids, &mut assignments);

        let mut counts = vec![0usize; centroids.len()];
        assignments.iter().for_each(|&c| counts[c] += 1);

        let total = points.len() as f64;
        let mut clusters: Vec<ColorCluster> = centroids
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(centroid, count)| ColorCluster {
                centroid: to_color(centroid),
                count,
                weight: count as f64 / total,
            })
            .collect();
        clusters.sort_by_key(|cluster| Reverse(cluster.count));
        clusters
    }

    /// Clusters `samples` into a [`BackgroundModel`].
    pub fn background_model<R>(&self, samples: &[Rgb<u8>], rng: &mut R) -> BackgroundModel
    where
        R: Rng + ?Sized,
    {
        BackgroundModel::from_clusters(self.cluster(samples, rng))
    }
}

fn seed_centroids<R>(points: &[[f64; 3]], k: usize, rng: &mut R) -> Vec<[f64; 3]>
where
    R: Rng + ?Sized,
{
    let first = points[rng.gen_range(0..points.len())];
    let mut centroids = vec![first];
    let mut nearest_sq: Vec<f64> = points
        .iter()
        .map(|p| perceptual_distance_f64(p, &first).powi(2))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest_sq.iter().sum();
        if total <= 0.0 {
            break;
        }

        let target = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut chosen = None;
        for (i, &d) in nearest_sq.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            cumulative += d;
            chosen = Some(i);
            if cumulative >= target {
                break;
            }
        }
        let Some(chosen) = chosen else { break };

        let centroid = points[chosen];
        centroids.push(centroid);
        for (d, p) in nearest_sq.iter_mut().zip(points) {
            *d = d.min(perceptual_distance_f64(p, &centroid).powi(2));
        }
    }

    centroids
}

fn assign(points: &[[f64; 3]], centroids: &[[f64; 3]], assignments: &mut [usize]) {
    for (point, slot) in points.iter().zip(assignments.iter_mut()) {
        *slot = centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, perceptual_distance_f64(point, c)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(i, _)| i);
    }
}

fn recompute(points: &[[f64; 3]], assignments: &[usize], centroids: &[[f64; 3]]) -> Vec<[f64; 3]> {
    let mut sums = vec![[0.0f64; 3]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (point, &cluster) in points.iter().zip(assignments) {
        for c in 0..3 {
            sums[cluster][c] += point[c];
        }
        counts[cluster] += 1;
    }

    sums.iter()
        .zip(&counts)
        .zip(centroids)
        .map(|((sum, &count), old)| {
            if count == 0 {
                *old
            } else {
                sum.map(|s| s / count as f64)
            }
        })
        .collect()
}

#[inline]
fn to_color(centroid: &[f64; 3]) -> Rgb<u8> {
    Rgb(centroid.map(|c| c.round().clamp(0.0, 255.0) as u8))
}

pub(crate) fn nearest_centroid<I>(centroids: I, color: Rgb<u8>) -> (usize, f64)
where
    I: IntoIterator<Item = Rgb<u8>>,
{
    centroids
        .into_iter()
        .enumerate()
        .map(|(i, c)| (i, perceptual_distance(color, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, 0.0))
}
