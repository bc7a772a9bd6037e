//! Exact-distance kernel over candidate lists.
//!
//! These are the only places the index touches original coordinates. The
//! hypercube decides *which* candidates to offer; the kernel reports exact
//! squared Euclidean distances for them, bounded by an examination budget.
//! "Approximate" in kyvos refers to candidate selection, never to the
//! distances reported here.

use crate::pointset::{Coordinate, PointSet};

/// An answer to a nearest-neighbor query: a pointset index and its exact
/// squared Euclidean distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: u32,
    pub distance: f32,
}

/// Best-so-far state refined across cube vertices during one query.
///
/// Starts at `(no index, +inf)` so the first examined point always wins.
#[derive(Debug, Clone, Copy)]
pub struct BestNeighbor {
    pub index: Option<u32>,
    pub distance: f32,
}

impl Default for BestNeighbor {
    fn default() -> Self {
        Self {
            index: None,
            distance: f32::INFINITY,
        }
    }
}

impl BestNeighbor {
    /// Collapse into a [`Neighbor`], or `None` if no point was ever examined.
    #[must_use]
    pub fn into_neighbor(self) -> Option<Neighbor> {
        self.index.map(|index| Neighbor {
            index,
            distance: self.distance,
        })
    }
}

/// Squared Euclidean distance between two D-vectors, in `f32`.
#[inline]
#[must_use]
pub fn squared_euclidean<T: Coordinate>(p: &[T], q: &[T]) -> f32 {
    p.iter()
        .zip(q.iter())
        .map(|(&x, &y)| {
            let d = x.as_() - y.as_();
            d * d
        })
        .sum()
}

/// Scan the first `min(candidates.len(), budget)` candidates in order and
/// return the first whose squared distance to `query` is within
/// `squared_radius`.
///
/// The candidate ordering is the caller's; no re-sorting happens here.
#[must_use]
pub fn first_within_radius<T: Coordinate>(
    points: &PointSet<T>,
    candidates: &[u32],
    query: &[T],
    squared_radius: f32,
    budget: usize,
) -> Option<u32> {
    candidates
        .iter()
        .take(budget)
        .copied()
        .find(|&i| squared_euclidean(points.point(i as usize), query) <= squared_radius)
}

/// Scan the first `min(candidates.len(), budget)` candidates and fold any
/// strict improvement into `best`. Ties keep the earlier-found candidate.
pub fn refine_nearest<T: Coordinate>(
    points: &PointSet<T>,
    candidates: &[u32],
    query: &[T],
    best: &mut BestNeighbor,
    budget: usize,
) {
    for &i in candidates.iter().take(budget) {
        let d = squared_euclidean(points.point(i as usize), query);
        if d < best.distance {
            best.index = Some(i);
            best.distance = d;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_euclidean_symmetric_and_zero_on_self() {
        let p = [1.0_f32, -2.5, 3.0];
        let q = [0.0_f32, 1.5, 3.0];
        assert_eq!(squared_euclidean(&p, &q), squared_euclidean(&q, &p));
        assert_eq!(squared_euclidean(&p, &p), 0.0);
        assert_eq!(squared_euclidean(&p, &q), 1.0 + 16.0);
    }

    #[test]
    fn first_within_radius_respects_candidate_order() {
        let data = [0.0_f32, 0.0, 3.0, 0.0, 0.5, 0.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let q = [0.0_f32, 0.0];
        // Point 2 is closer than point 1, but candidate order decides.
        let hit = first_within_radius(&ps, &[1, 2], &q, 100.0, 10);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn first_within_radius_honors_budget() {
        let data = [5.0_f32, 0.0, 0.0, 0.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let q = [0.0_f32, 0.0];
        // Point 1 matches but sits past the budget cutoff.
        assert_eq!(first_within_radius(&ps, &[0, 1], &q, 1.0, 1), None);
        assert_eq!(first_within_radius(&ps, &[0, 1], &q, 1.0, 2), Some(1));
    }

    #[test]
    fn refine_nearest_keeps_earlier_on_tie() {
        let data = [1.0_f32, 0.0, -1.0, 0.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let q = [0.0_f32, 0.0];
        let mut best = BestNeighbor::default();
        refine_nearest(&ps, &[0, 1], &q, &mut best, 10);
        // Both candidates sit at distance 1; the first seen wins.
        assert_eq!(best.index, Some(0));
        assert_eq!(best.distance, 1.0);
    }

    #[test]
    fn refine_nearest_budget_bounds_examinations() {
        let data = [9.0_f32, 0.0, 1.0, 0.0];
        let ps = PointSet::new(&data, 2).unwrap();
        let q = [0.0_f32, 0.0];
        let mut best = BestNeighbor::default();
        refine_nearest(&ps, &[0, 1], &q, &mut best, 1);
        assert_eq!(best.index, Some(0));
        assert_eq!(best.distance, 81.0);
    }

    #[test]
    fn unexamined_best_collapses_to_none() {
        assert_eq!(BestNeighbor::default().into_neighbor(), None);
    }
}
