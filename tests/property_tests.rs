//! Property-based tests for kyvos.
//!
//! Invariants that must hold for any pointset and any query:
//! - radius answers are sound (never outside the radius),
//! - reported distances are the exact squared Euclidean distances,
//! - re-querying an unchanged index is idempotent,
//! - the distance kernel is a metric-squared (symmetric, zero on self).

use proptest::prelude::*;

use kyvos::benchmark::linear_nearest;
use kyvos::distance::squared_euclidean;
use kyvos::{Hypercube, HypercubeParams, PointSet, ProjectionParams};

fn params(code_bits: usize, seed: u64) -> HypercubeParams {
    HypercubeParams {
        code_bits,
        workers: 1,
        projection: ProjectionParams {
            seed: Some(seed),
            ..ProjectionParams::default()
        },
    }
}

prop_compose! {
    fn arb_flat(rows: usize, dim: usize)
        (v in prop::collection::vec(-10.0f32..10.0, rows * dim)) -> Vec<f32> {
        v
    }
}

mod kernel_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn squared_euclidean_symmetric(a in arb_flat(1, 16), b in arb_flat(1, 16)) {
            prop_assert_eq!(squared_euclidean(&a, &b), squared_euclidean(&b, &a));
        }

        #[test]
        fn squared_euclidean_zero_on_self(a in arb_flat(1, 16)) {
            prop_assert_eq!(squared_euclidean(&a, &a), 0.0);
        }

        #[test]
        fn squared_euclidean_non_negative(a in arb_flat(1, 8), b in arb_flat(1, 8)) {
            prop_assert!(squared_euclidean(&a, &b) >= 0.0);
        }
    }
}

mod index_props {
    use super::*;

    const N: usize = 40;
    const DIM: usize = 4;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn radius_answers_are_sound(
            data in arb_flat(N, DIM),
            query in arb_flat(1, DIM),
            radius in 0.0f32..5.0,
            seed in 0u64..1000,
        ) {
            let points = PointSet::new(&data, DIM).unwrap();
            let cube = Hypercube::build(points, &params(3, seed)).unwrap();
            let hits = cube.radius_query(&query, radius, N / 2, 1).unwrap();
            if let Some(i) = hits[0] {
                let d = squared_euclidean(points.point(i as usize), &query);
                prop_assert!(d <= radius * radius, "hit {} at distance {}", i, d);
            }
        }

        #[test]
        fn nn_distance_is_exact_for_the_returned_index(
            data in arb_flat(N, DIM),
            query in arb_flat(1, DIM),
            seed in 0u64..1000,
        ) {
            let points = PointSet::new(&data, DIM).unwrap();
            let cube = Hypercube::build(points, &params(3, seed)).unwrap();
            let nn = cube.nearest_neighbor_query(&query, N / 2, 1).unwrap();
            if let Some(n) = nn[0] {
                let d = squared_euclidean(points.point(n.index as usize), &query);
                prop_assert_eq!(n.distance, d);
                // An approximate answer can never beat the exact one.
                let exact = linear_nearest(&points, &query).unwrap();
                prop_assert!(n.distance >= exact.distance);
            }
        }

        #[test]
        fn requery_is_idempotent(
            data in arb_flat(N, DIM),
            query in arb_flat(2, DIM),
            seed in 0u64..1000,
        ) {
            let points = PointSet::new(&data, DIM).unwrap();
            let cube = Hypercube::build(points, &params(3, seed)).unwrap();

            let a = cube.radius_query(&query, 1.0, N / 2, 1).unwrap();
            let b = cube.radius_query(&query, 1.0, N / 2, 1).unwrap();
            prop_assert_eq!(a, b);

            let na = cube.nearest_neighbor_query(&query, N / 2, 1).unwrap();
            let nb = cube.nearest_neighbor_query(&query, N / 2, 1).unwrap();
            prop_assert_eq!(na, nb);
        }

        #[test]
        fn full_budget_nn_matches_brute_force(
            data in arb_flat(N, DIM),
            query in arb_flat(1, DIM),
            seed in 0u64..1000,
        ) {
            let points = PointSet::new(&data, DIM).unwrap();
            let cube = Hypercube::build(points, &params(3, seed)).unwrap();
            let nn = cube.nearest_neighbor_query(&query, N, 1).unwrap();
            let exact = linear_nearest(&points, &query).unwrap();
            let got = nn[0].expect("full budget examines every point");
            prop_assert_eq!(got.distance, exact.distance);
        }

        #[test]
        fn built_index_validates(
            data in arb_flat(N, DIM),
            seed in 0u64..1000,
        ) {
            let points = PointSet::new(&data, DIM).unwrap();
            let cube = Hypercube::build(points, &params(4, seed)).unwrap();
            prop_assert!(cube.validate().is_ok());
        }
    }
}
