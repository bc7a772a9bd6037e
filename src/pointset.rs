//! Borrowed, flat, row-major view over a set of points.
//!
//! The index never copies the pointset: it borrows one contiguous buffer of
//! `N * D` scalars for its whole lifetime. Point `i` occupies the slice
//! `[i * D, (i + 1) * D)`.

use num_traits::AsPrimitive;

use crate::error::{CubeError, Result};

/// Scalar type of a pointset coordinate.
///
/// The pointset may hold integers or floats; projections and distances are
/// always computed in `f32`. Implemented for every primitive that converts
/// losslessly enough via [`AsPrimitive`] (`f32`, `f64`, `i32`, `u8`, ...).
pub trait Coordinate: Copy + Send + Sync + AsPrimitive<f32> {}

impl<T> Coordinate for T where T: Copy + Send + Sync + AsPrimitive<f32> {}

/// A borrowed `N x D` pointset over a flat row-major buffer.
#[derive(Debug, Clone, Copy)]
pub struct PointSet<'a, T> {
    data: &'a [T],
    dim: usize,
}

impl<'a, T: Coordinate> PointSet<'a, T> {
    /// Wrap a flat buffer as a pointset of `data.len() / dim` points.
    ///
    /// Fails if `dim` is zero, the buffer is empty, or the buffer length is
    /// not a whole number of rows.
    pub fn new(data: &'a [T], dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(CubeError::InvalidParameter(
                "dimension must be positive".into(),
            ));
        }
        if data.is_empty() {
            return Err(CubeError::EmptyPointset);
        }
        if data.len() % dim != 0 {
            return Err(CubeError::DimensionMismatch {
                len: data.len(),
                dim,
            });
        }
        Ok(Self { data, dim })
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Whether the set holds no points. Construction rejects empty buffers,
    /// so this is `false` for any successfully built set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Dimensionality of each point.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `i`.
    #[inline]
    #[must_use]
    pub fn point(&self, i: usize) -> &'a [T] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// The underlying flat buffer.
    #[must_use]
    pub fn as_flat(&self) -> &'a [T] {
        self.data
    }
}
