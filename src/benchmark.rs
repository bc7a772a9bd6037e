//! Synthetic datasets and brute-force reference answers.
//!
//! The index trades recall for speed, so every evaluation needs an exact
//! baseline: a linear scan over the full pointset. This module provides
//! that scan for both query kinds, seeded generators for synthetic
//! pointsets, and the agreement metric used to report how often the index
//! and the baseline reach the same verdict.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::distance::{squared_euclidean, Neighbor};
use crate::pointset::{Coordinate, PointSet};

/// Generate `n * dim` scalars uniform in `[0, 1)`, row-major.
#[must_use]
pub fn uniform_pointset(n: usize, dim: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n * dim).map(|_| rng.random::<f32>()).collect()
}

/// Generate a clustered pointset: `clusters` uniform centers with Gaussian
/// noise of deviation `spread` around them. More realistic than uniform
/// data, which has no neighborhood structure to find.
#[must_use]
pub fn clustered_pointset(
    n: usize,
    dim: usize,
    clusters: usize,
    spread: f32,
    seed: u64,
) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers: Vec<f32> = (0..clusters * dim).map(|_| rng.random::<f32>()).collect();

    let mut out = Vec::with_capacity(n * dim);
    for _ in 0..n {
        let c = rng.random_range(0..clusters);
        for d in 0..dim {
            let z: f32 = rng.sample(StandardNormal);
            out.push(centers[c * dim + d] + z * spread);
        }
    }
    out
}

/// Exact radius answer: the first point (in index order) within
/// `squared_radius` of `query`, scanning the whole set.
#[must_use]
pub fn linear_radius_scan<T: Coordinate>(
    points: &PointSet<T>,
    query: &[T],
    squared_radius: f32,
) -> Option<u32> {
    (0..points.len())
        .find(|&i| squared_euclidean(points.point(i), query) <= squared_radius)
        .map(|i| i as u32)
}

/// Exact nearest neighbor over the whole set. Ties keep the earlier index.
#[must_use]
pub fn linear_nearest<T: Coordinate>(points: &PointSet<T>, query: &[T]) -> Option<Neighbor> {
    let mut best: Option<Neighbor> = None;
    for i in 0..points.len() {
        let d = squared_euclidean(points.point(i), query);
        if best.map_or(true, |b| d < b.distance) {
            best = Some(Neighbor {
                index: i as u32,
                distance: d,
            });
        }
    }
    best
}

/// Fraction of queries on which the index and the reference agree on
/// *whether* a point exists within the radius (both found one, or both
/// found none). The two sides may legitimately return different indices
/// for the same query, so identity of the answer is not compared.
#[must_use]
pub fn radius_agreement(results: &[Option<u32>], reference: &[Option<u32>]) -> f32 {
    if results.is_empty() {
        return 1.0;
    }
    let agree = results
        .iter()
        .zip(reference.iter())
        .filter(|(r, b)| r.is_some() == b.is_some())
        .count();
    agree as f32 / results.len() as f32
}
