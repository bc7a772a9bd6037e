//! kyvos: approximate nearest neighbor search on the Hamming hypercube.
//!
//! An LSH index that embeds a D-dimensional pointset onto the vertices of a
//! K-dimensional Hamming cube and answers two query kinds against it:
//!
//! - **Radius queries**: return any one point whose squared Euclidean
//!   distance to the query is within a bound.
//! - **Approximate nearest neighbor**: return the closest point discovered
//!   within a bounded examination budget.
//!
//! # Algorithm
//!
//! 1. Draw K stable-distribution hashes `h(x) = floor((<a, x> + b) / r)`
//!    with `a ~ N(mean, deviation)` per lane ([`projection`]).
//! 2. Give every observed bucket of every hash one uniformly random bit;
//!    a point's K-bit code is the concatenation of its buckets' bits, which
//!    places it on a cube vertex ([`cube`]).
//! 3. At query time, project the query to its own vertex with the same
//!    hashes, then visit vertices in ascending Hamming distance, checking
//!    exact Euclidean distances under a global budget ([`distance`]).
//!
//! The distances reported are always exact; "approximate" refers only to
//! which candidates the cube offers.
//!
//! # Trade-offs
//!
//! | Knob | Effect |
//! |------|--------|
//! | `code_bits` (K) | More vertices: smaller candidate lists, slower traversal. `log2(N)/2` is a reasonable default. |
//! | `width` (r) | Smaller width: more buckets per hash, finer bits. |
//! | budget (B) | Hard cap on exact distance evaluations per query. |
//! | workers (W) | OS threads for build and for query batches. |
//!
//! # Usage
//!
//! ```
//! use kyvos::{Hypercube, HypercubeParams, PointSet};
//!
//! # fn main() -> kyvos::Result<()> {
//! let data: Vec<f32> = kyvos::benchmark::uniform_pointset(512, 16, 42);
//! let points = PointSet::new(&data, 16)?;
//!
//! let mut params = HypercubeParams::new(4);
//! params.workers = 1;
//! params.projection.seed = Some(7);
//! let cube = Hypercube::build(points, &params)?;
//!
//! let query = data[..16].to_vec();
//! let hits = cube.radius_query(&query, 0.5, 64, 1)?;
//! let nearest = cube.nearest_neighbor_query(&query, 64, 1)?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(nearest.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - Indyk & Motwani (1998): "Approximate nearest neighbors: towards
//!   removing the curse of dimensionality"
//! - Datar, Immorlica, Indyk & Mirrokni (2004): "Locality-sensitive hashing
//!   scheme based on p-stable distributions"
//! - Anagnostopoulos, Emiris & Psarros (2017): "Low-quality dimension
//!   reduction and high-dimensional Approximate Nearest Neighbor"

pub mod benchmark;
pub mod cube;
pub mod distance;
pub mod error;
pub mod io;
pub mod parallel;
pub mod pointset;
pub mod projection;

pub use cube::{default_code_bits, Hypercube, HypercubeParams};
pub use distance::Neighbor;
pub use error::{CubeError, Result};
pub use pointset::{Coordinate, PointSet};
pub use projection::ProjectionParams;
