//! The Hamming-hypercube index.
//!
//! K stable-projection hashes relabel every reference point as a K-bit code,
//! i.e. a vertex of the K-dimensional Hamming cube. The terminal (K-th) hash
//! phase additionally installs the cube table mapping each realized code to
//! the points carrying it. Queries project the same way, then walk cube
//! vertices outward from the query's own vertex in ascending Hamming
//! distance, handing each vertex's occupants to the exact-distance kernel
//! until an answer is found or the examination budget runs out.
//!
//! # Build
//!
//! Build is one-shot. The first `K - 1` hashes are populated in parallel by
//! `W` workers over contiguous position ranges (each worker owns its hashes
//! by value and gets a distinct PRNG stream via its position tag); after the
//! join, the coordinator scatters their bits into the row-major code buffer,
//! then runs the terminal hash sequentially and installs the cube table from
//! the completed code rows. Once `build` returns, all state is frozen and
//! any number of queries may run concurrently.
//!
//! # References
//!
//! - Datar, Immorlica, Indyk & Mirrokni (2004): "Locality-sensitive hashing
//!   scheme based on p-stable distributions"
//! - Anagnostopoulos, Emiris & Psarros (2017): "Low-quality dimension
//!   reduction and high-dimensional Approximate Nearest Neighbor"

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::distance::{self, BestNeighbor, Neighbor};
use crate::error::{CubeError, Result};
use crate::parallel;
use crate::pointset::{Coordinate, PointSet};
use crate::projection::{ProjectionParams, StableHash};

/// Build-time parameters of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypercubeParams {
    /// Code length K: the dimension of the Hamming cube.
    pub code_bits: usize,
    /// Worker count W for the build. One worker always takes the serial
    /// path; more than one requires `W < K` and `(K - 1) % W == 0` so the
    /// head positions split into equal contiguous ranges.
    pub workers: usize,
    /// Parameters of the projection family shared by all K hashes.
    pub projection: ProjectionParams,
}

impl HypercubeParams {
    /// Parameters with `code_bits` positions, hardware-parallelism workers,
    /// and default projections.
    #[must_use]
    pub fn new(code_bits: usize) -> Self {
        Self {
            code_bits,
            workers: default_workers(),
            projection: ProjectionParams::default(),
        }
    }
}

/// `log2(n) / 2`, the customary code length for an n-point set (at least 1).
#[must_use]
pub fn default_code_bits(n: usize) -> usize {
    (((n.max(2)) as f64).log2() / 2.0).floor().max(1.0) as usize
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A frozen Hamming-hypercube index over a borrowed pointset.
///
/// The pointset is borrowed for the index's lifetime and never copied.
/// After [`Hypercube::build`] returns, every method takes `&self`; queries
/// over independent query vectors may run on any number of threads.
#[derive(Debug, Clone)]
pub struct Hypercube<'a, T> {
    points: PointSet<'a, T>,
    /// The K hashes in position order. The last one is the terminal hash
    /// whose buckets fed the cube table.
    hashes: Vec<StableHash>,
    /// Row-major `N x K` buffer of code bits, one byte per bit.
    codes: Vec<u8>,
    /// Cube table: realized K-byte code -> indices of points carrying it.
    vertices: HashMap<Box<[u8]>, Vec<u32>>,
    code_bits: usize,
}

impl<'a, T: Coordinate> Hypercube<'a, T> {
    /// Build an index over `points`.
    ///
    /// Fails on invalid configuration (zero code length, worker count
    /// violating the partition precondition) without publishing any state.
    pub fn build(points: PointSet<'a, T>, params: &HypercubeParams) -> Result<Self> {
        let n = points.len();
        let dim = points.dim();
        let k = params.code_bits;
        let w = params.workers;

        if k == 0 {
            return Err(CubeError::InvalidParameter(
                "code length must be positive".into(),
            ));
        }
        if w == 0 {
            return Err(CubeError::InvalidParameter(
                "worker count must be positive".into(),
            ));
        }
        if w > 1 && (w >= k || (k - 1) % w != 0) {
            return Err(CubeError::WorkerPartition {
                workers: w,
                code_bits: k,
            });
        }
        if params.projection.width == 0 {
            return Err(CubeError::InvalidParameter(
                "projection width must be positive".into(),
            ));
        }
        if !(params.projection.mean.is_finite() && params.projection.deviation.is_finite())
            || params.projection.deviation < 0.0
        {
            return Err(CubeError::InvalidParameter(
                "projection distribution parameters must be finite, deviation non-negative".into(),
            ));
        }

        let mut codes = vec![0u8; n * k];

        // Head phase: the first K - 1 hashes, one contiguous position range
        // per worker. Workers own their hashes and rngs; the shared code
        // buffer is written only after the join.
        let head = k - 1;
        let mut hashes: Vec<StableHash> = parallel::map_batches(head, w, |_, start, end| {
            (start..end)
                .map(|pos| {
                    let mut h = StableHash::new(dim, &params.projection, pos as u64);
                    h.insert_points(&points);
                    h.assign_bits();
                    h
                })
                .collect::<Vec<_>>()
        })
        .into_iter()
        .flatten()
        .collect();

        for (pos, h) in hashes.iter().enumerate() {
            h.scatter_bits(&mut codes, pos, k);
        }

        // Terminal phase, sequential: the cube table keys are complete code
        // rows, so the last bit must land after every head column is in.
        let mut terminal = StableHash::new(dim, &params.projection, head as u64);
        terminal.insert_points(&points);
        terminal.assign_bits();
        terminal.scatter_bits(&mut codes, k - 1, k);
        hashes.push(terminal);

        let mut vertices: HashMap<Box<[u8]>, Vec<u32>> = HashMap::new();
        for i in 0..n {
            let row = &codes[i * k..(i + 1) * k];
            vertices.entry(row.into()).or_default().push(i as u32);
        }

        Ok(Self {
            points,
            hashes,
            codes,
            vertices,
            code_bits: k,
        })
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no points. Build rejects empty pointsets, so
    /// this is `false` for any built index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimensionality of indexed points.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Code length K.
    #[must_use]
    pub fn code_bits(&self) -> usize {
        self.code_bits
    }

    /// For each of the `queries` (row-major, `dim()` scalars each), find any
    /// one point whose Euclidean distance to the query is at most `radius`,
    /// examining at most `budget` candidates per query.
    ///
    /// `out[q]` is `Some(index)` of a point within `radius` of query `q`, or
    /// `None` if the traversal found nothing within the budget. Queries are
    /// partitioned into `workers` contiguous batches.
    pub fn radius_query(
        &self,
        queries: &[T],
        radius: f32,
        budget: usize,
        workers: usize,
    ) -> Result<Vec<Option<u32>>> {
        self.check_query_args(queries, budget, workers)?;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(CubeError::InvalidParameter(
                "radius must be finite and non-negative".into(),
            ));
        }
        let dim = self.points.dim();
        let squared_radius = radius * radius;

        let mut out = vec![None; queries.len() / dim];
        parallel::for_each_batch_mut(&mut out, workers, |_, offset, chunk| {
            let mut code = vec![0u8; self.code_bits];
            for (j, slot) in chunk.iter_mut().enumerate() {
                let q = &queries[(offset + j) * dim..(offset + j + 1) * dim];
                self.encode_query(q, &mut code);
                *slot = self.radius_probe(&mut code, q, squared_radius, budget);
            }
        });
        Ok(out)
    }

    /// For each query, the closest point discovered within `budget`
    /// candidate examinations, with its exact squared Euclidean distance.
    ///
    /// `out[q]` is `None` only if the traversal examined zero points (the
    /// query's neighborhood of the cube is empty under the budget).
    pub fn nearest_neighbor_query(
        &self,
        queries: &[T],
        budget: usize,
        workers: usize,
    ) -> Result<Vec<Option<Neighbor>>> {
        self.check_query_args(queries, budget, workers)?;
        let dim = self.points.dim();

        let mut out = vec![None; queries.len() / dim];
        parallel::for_each_batch_mut(&mut out, workers, |_, offset, chunk| {
            let mut code = vec![0u8; self.code_bits];
            for (j, slot) in chunk.iter_mut().enumerate() {
                let q = &queries[(offset + j) * dim..(offset + j + 1) * dim];
                self.encode_query(q, &mut code);
                *slot = self.nearest_probe(&mut code, q, budget);
            }
        });
        Ok(out)
    }

    /// Occupancy of every realized cube vertex, largest first. Codes render
    /// as bit strings ("0110..."); empty vertices are not stored and so do
    /// not appear.
    #[must_use]
    pub fn vertex_occupancy(&self) -> Vec<(String, usize)> {
        let mut occ: Vec<(String, usize)> = self
            .vertices
            .iter()
            .map(|(code, list)| {
                let label: String = code.iter().map(|&b| char::from(b'0' + b)).collect();
                (label, list.len())
            })
            .collect();
        occ.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        occ
    }

    fn check_query_args(&self, queries: &[T], budget: usize, workers: usize) -> Result<()> {
        let dim = self.points.dim();
        if queries.len() % dim != 0 {
            return Err(CubeError::DimensionMismatch {
                len: queries.len(),
                dim,
            });
        }
        if workers == 0 {
            return Err(CubeError::InvalidParameter(
                "worker count must be positive".into(),
            ));
        }
        if budget == 0 || budget > self.points.len() {
            return Err(CubeError::BudgetOutOfRange {
                budget,
                points: self.points.len(),
            });
        }
        Ok(())
    }

    /// Project one query through all K hashes into its cube vertex.
    fn encode_query(&self, q: &[T], code: &mut [u8]) {
        for (k, h) in self.hashes.iter().enumerate() {
            code[k] = h.query_bit(q);
        }
    }

    /// Radius traversal for one query. Starts at the query's own vertex,
    /// then sweeps Hamming distance 1, 2, ... K, stopping at the first hit
    /// or when the budget is exhausted.
    fn radius_probe(
        &self,
        code: &mut [u8],
        q: &[T],
        squared_radius: f32,
        budget: usize,
    ) -> Option<u32> {
        let mut checked = 0usize;
        if let Some(hit) = self.probe_vertex_radius(code, q, squared_radius, budget, &mut checked) {
            return Some(hit);
        }
        let mut dist = 1;
        while checked < budget && dist <= self.code_bits {
            let top = self.code_bits as isize - 1;
            if let Some(hit) =
                self.flip_radius(code, top, dist, q, squared_radius, budget, &mut checked)
            {
                return Some(hit);
            }
            dist += 1;
        }
        None
    }

    /// Check one vertex's occupants against the radius predicate under the
    /// remaining budget. Charges the vertex's full list size to `checked`,
    /// so the last vertex visited may overshoot the budget.
    fn probe_vertex_radius(
        &self,
        code: &[u8],
        q: &[T],
        squared_radius: f32,
        budget: usize,
        checked: &mut usize,
    ) -> Option<u32> {
        let list = self.vertices.get(code)?;
        let remaining = budget.saturating_sub(*checked);
        let hit = distance::first_within_radius(&self.points, list, q, squared_radius, remaining);
        *checked += list.len();
        hit
    }

    /// Enumerate all codes at a fixed Hamming distance from `code` by the
    /// flip/keep recursion over positions `pos` down to 0, probing each
    /// realized vertex. Every flip is undone on the non-terminating paths,
    /// so `code` is intact whenever the recursion finishes a full level.
    #[allow(clippy::too_many_arguments)]
    fn flip_radius(
        &self,
        code: &mut [u8],
        pos: isize,
        flips: usize,
        q: &[T],
        squared_radius: f32,
        budget: usize,
        checked: &mut usize,
    ) -> Option<u32> {
        if flips == 0 {
            return self.probe_vertex_radius(code, q, squared_radius, budget, checked);
        }
        if pos < 0 {
            return None;
        }
        let p = pos as usize;

        code[p] ^= 1;
        if let Some(hit) =
            self.flip_radius(code, pos - 1, flips - 1, q, squared_radius, budget, checked)
        {
            return Some(hit);
        }
        code[p] ^= 1;

        if *checked >= budget {
            return None;
        }
        self.flip_radius(code, pos - 1, flips, q, squared_radius, budget, checked)
    }

    /// Nearest-neighbor traversal for one query: same vertex order as the
    /// radius traversal, but every vertex refines the best-so-far and only
    /// budget exhaustion (or running out of cube) stops the sweep.
    fn nearest_probe(&self, code: &mut [u8], q: &[T], budget: usize) -> Option<Neighbor> {
        let mut checked = 0usize;
        let mut best = BestNeighbor::default();
        self.probe_vertex_nearest(code, q, budget, &mut checked, &mut best);
        let mut dist = 1;
        while checked < budget && dist <= self.code_bits {
            let top = self.code_bits as isize - 1;
            self.flip_nearest(code, top, dist, q, budget, &mut checked, &mut best);
            dist += 1;
        }
        best.into_neighbor()
    }

    fn probe_vertex_nearest(
        &self,
        code: &[u8],
        q: &[T],
        budget: usize,
        checked: &mut usize,
        best: &mut BestNeighbor,
    ) {
        if let Some(list) = self.vertices.get(code) {
            let remaining = budget.saturating_sub(*checked);
            distance::refine_nearest(&self.points, list, q, best, remaining);
            *checked += list.len();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn flip_nearest(
        &self,
        code: &mut [u8],
        pos: isize,
        flips: usize,
        q: &[T],
        budget: usize,
        checked: &mut usize,
        best: &mut BestNeighbor,
    ) {
        if flips == 0 {
            self.probe_vertex_nearest(code, q, budget, checked, best);
            return;
        }
        if pos < 0 {
            return;
        }
        let p = pos as usize;

        code[p] ^= 1;
        self.flip_nearest(code, pos - 1, flips - 1, q, budget, checked, best);
        code[p] ^= 1;

        if *checked >= budget {
            return;
        }
        self.flip_nearest(code, pos - 1, flips, q, budget, checked, best);
    }

    /// Validate the structural invariants of a built index. Intended for
    /// tests and diagnostics; a healthy index always passes.
    ///
    /// Checked: every code row matches its per-hash bit-table lookups; the
    /// cube table's lists agree exactly with the code rows; occupancies sum
    /// to N; every hash's bucket and bit tables key-align.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let n = self.points.len();
        let k = self.code_bits;

        for (pos, h) in self.hashes.iter().enumerate() {
            for (key, list) in &h.buckets {
                let Some(&bit) = h.bits.get(key) else {
                    return Err(format!("hash {pos}: bucket {key} has no bit"));
                };
                for &i in list {
                    if self.codes[i as usize * k + pos] != bit {
                        return Err(format!("point {i}: code bit {pos} disagrees with bucket bit"));
                    }
                }
            }
            if h.buckets.len() != h.bits.len() {
                return Err(format!("hash {pos}: bucket/bit table sizes differ"));
            }
            let hashed: usize = h.buckets.values().map(|l| l.len()).sum();
            if hashed != n {
                return Err(format!("hash {pos}: {hashed} of {n} points bucketed"));
            }
        }

        let mut assigned = 0usize;
        for (vertex, list) in &self.vertices {
            assigned += list.len();
            for &i in list {
                let row = &self.codes[i as usize * k..(i as usize + 1) * k];
                if row != vertex.as_ref() {
                    return Err(format!("point {i} listed under a foreign vertex"));
                }
            }
        }
        if assigned != n {
            return Err(format!("cube table covers {assigned} of {n} points"));
        }
        Ok(())
    }
}
