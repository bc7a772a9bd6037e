//! Stable-distribution projection hash.
//!
//! One hash of the family `h(x) = floor((<a, x> + b) / r)`, with `a` drawn
//! i.i.d. from `N(mean, deviation)` and `b` uniform on `[0, r]`. Points that
//! land in the same bucket later share one uniformly drawn bit, which is how
//! a K-long sequence of these hashes relabels every point as a vertex of the
//! K-dimensional Hamming cube.
//!
//! # References
//!
//! - Datar, Immorlica, Indyk & Mirrokni (2004): "Locality-sensitive hashing
//!   scheme based on p-stable distributions"
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards removing
//!   the curse of dimensionality"

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::pointset::{Coordinate, PointSet};

/// Indices of the points that share one projection bucket. Most buckets hold
/// a handful of points, so spill to the heap only past four.
pub(crate) type BucketList = SmallVec<[u32; 4]>;

/// Parameters of the projection family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Quantization width `r` of the stable-distribution hash. Smaller
    /// values mean more buckets and finer bits.
    pub width: u32,
    /// Mean of the normal distribution the projection lanes are drawn from.
    pub mean: f32,
    /// Deviation of that normal distribution.
    pub deviation: f32,
    /// Externally supplied base seed. `None` seeds from wall-clock time,
    /// which makes runs non-reproducible; set a seed for determinism.
    pub seed: Option<u64>,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            width: 4,
            mean: 0.0,
            deviation: 1.0,
            seed: None,
        }
    }
}

/// A single stable-projection hash together with the tables it populates
/// during build: bucket key -> point indices, and bucket key -> bit.
#[derive(Debug, Clone)]
pub struct StableHash {
    /// Projection vector `a`, one normal draw per input lane.
    directions: Vec<f32>,
    /// Uniform integer offset `b` in `[0, width]`.
    offset: f32,
    width: f32,
    /// Salt for the deterministic unseen-bucket query bit.
    fallback_salt: u64,
    rng: StdRng,
    pub(crate) buckets: HashMap<i64, BucketList>,
    pub(crate) bits: HashMap<i64, u8>,
}

/// SplitMix64 finalizer. Used to scramble worker tags into seeds and to
/// derive the unseen-bucket query bit.
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

impl StableHash {
    /// Draw a fresh hash for `dim`-dimensional points.
    ///
    /// `tag` identifies the hash position so that concurrent workers seeded
    /// in the same instant still get distinct PRNG streams; it is scrambled
    /// and XORed into the base seed (the configured seed, or wall-clock).
    pub fn new(dim: usize, params: &ProjectionParams, tag: u64) -> Self {
        let base = params.seed.unwrap_or_else(wall_clock_seed);
        let mut rng = StdRng::seed_from_u64(base ^ splitmix64(tag));

        let directions = (0..dim)
            .map(|_| {
                let z: f32 = rng.sample(StandardNormal);
                params.mean + params.deviation * z
            })
            .collect();
        let offset = rng.random_range(0..=params.width) as f32;
        let fallback_salt = rng.random();

        Self {
            directions,
            offset,
            width: params.width as f32,
            fallback_salt,
            rng,
            buckets: HashMap::new(),
            bits: HashMap::new(),
        }
    }

    /// Bucket key of one point: `floor((<a, x> + b) / r)`.
    #[inline]
    #[must_use]
    pub fn key<T: Coordinate>(&self, point: &[T]) -> i64 {
        let dot: f32 = self
            .directions
            .iter()
            .zip(point.iter())
            .map(|(a, &x)| a * x.as_())
            .sum();
        ((dot + self.offset) / self.width).floor() as i64
    }

    /// Hash every point of the set into the bucket table.
    pub fn insert_points<T: Coordinate>(&mut self, points: &PointSet<T>) {
        for i in 0..points.len() {
            let key = self.key(points.point(i));
            self.buckets.entry(key).or_default().push(i as u32);
        }
    }

    /// Draw one uniform bit per observed bucket key.
    ///
    /// After this, every key in the bucket table has exactly one entry in
    /// the bit table, and all points sharing a bucket share that bit.
    pub fn assign_bits(&mut self) {
        for &key in self.buckets.keys() {
            let bit = self.rng.random_range(0..=1u8);
            self.bits.insert(key, bit);
        }
    }

    /// Write this hash's bit into column `column` of the row-major code
    /// buffer (`code_len` bits per row).
    pub fn scatter_bits(&self, codes: &mut [u8], column: usize, code_len: usize) {
        for (key, list) in &self.buckets {
            let bit = self.bits[key];
            for &i in list {
                codes[i as usize * code_len + column] = bit;
            }
        }
    }

    /// Bit of one query at this hash's position.
    ///
    /// A query landing in a bucket observed at build time gets that bucket's
    /// recorded bit, so co-hashed pairs agree deterministically. An unseen
    /// bucket has no canonical assignment; its bit is derived uniformly from
    /// the per-hash salt and the key, which is stable across re-queries.
    #[must_use]
    pub fn query_bit<T: Coordinate>(&self, point: &[T]) -> u8 {
        let key = self.key(point);
        match self.bits.get(&key) {
            Some(&bit) => bit,
            None => (splitmix64(self.fallback_salt ^ key as u64) & 1) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointset::PointSet;

    fn seeded(seed: u64) -> ProjectionParams {
        ProjectionParams {
            seed: Some(seed),
            ..ProjectionParams::default()
        }
    }

    #[test]
    fn same_seed_same_tag_reproduces_projection() {
        let a = StableHash::new(8, &seeded(7), 3);
        let b = StableHash::new(8, &seeded(7), 3);
        assert_eq!(a.directions, b.directions);
        assert_eq!(a.offset, b.offset);
    }

    #[test]
    fn distinct_tags_give_distinct_projections() {
        let a = StableHash::new(16, &seeded(7), 0);
        let b = StableHash::new(16, &seeded(7), 1);
        assert_ne!(a.directions, b.directions);
    }

    #[test]
    fn bucket_and_bit_tables_align() {
        let data: Vec<f32> = (0..40).map(|i| (i % 7) as f32).collect();
        let ps = PointSet::new(&data, 4).unwrap();
        let mut h = StableHash::new(4, &seeded(11), 0);
        h.insert_points(&ps);
        h.assign_bits();

        assert_eq!(h.buckets.len(), h.bits.len());
        for key in h.buckets.keys() {
            assert!(h.bits.contains_key(key));
        }
        let total: usize = h.buckets.values().map(|l| l.len()).sum();
        assert_eq!(total, ps.len());
    }

    #[test]
    fn co_hashed_points_share_a_bit() {
        let data = [1.0_f32, 2.0, 1.0, 2.0, 50.0, -3.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let mut h = StableHash::new(2, &seeded(5), 0);
        h.insert_points(&ps);
        h.assign_bits();

        // Identical points always share a bucket, hence a bit.
        assert_eq!(h.key(ps.point(0)), h.key(ps.point(1)));
        assert_eq!(h.query_bit(ps.point(0)), h.query_bit(ps.point(1)));
    }

    #[test]
    fn unseen_bucket_bit_is_stable() {
        let data = [0.0_f32, 0.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let mut h = StableHash::new(2, &seeded(13), 0);
        h.insert_points(&ps);
        h.assign_bits();

        let far = [1e6_f32, -1e6];
        assert_eq!(h.query_bit(&far), h.query_bit(&far));
    }

    #[test]
    fn scatter_bits_fills_one_column() {
        let data = [0.0_f32, 0.0, 0.1, 0.1, 9.0, 9.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let mut h = StableHash::new(2, &seeded(29), 0);
        h.insert_points(&ps);
        h.assign_bits();

        let code_len = 3;
        let mut codes = vec![2u8; ps.len() * code_len];
        h.scatter_bits(&mut codes, 1, code_len);
        for i in 0..ps.len() {
            assert_eq!(codes[i * code_len], 2, "untouched column written");
            assert!(codes[i * code_len + 1] <= 1, "column 1 must hold a bit");
            assert_eq!(codes[i * code_len + 2], 2, "untouched column written");
            assert_eq!(codes[i * code_len + 1], h.bits[&h.key(ps.point(i))]);
        }
    }

    #[test]
    fn params_roundtrip_through_json() {
        let params = ProjectionParams {
            width: 8,
            mean: 0.5,
            deviation: 2.0,
            seed: Some(42),
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: ProjectionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
