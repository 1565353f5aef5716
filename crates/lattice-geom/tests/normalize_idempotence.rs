// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests for the coordinate normalizer.

use lattice_geom::{normalize, CoordSource, CoordTree};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -180.0f64..180.0
}

fn pair() -> BoxedStrategy<CoordSource> {
    (coord(), coord())
        .prop_map(|(x, y)| CoordSource::List(vec![CoordSource::Number(x), CoordSource::Number(y)]))
        .boxed()
}

/// Depth-correct coordinate trees with non-empty fanout at every level.
fn coords_of_depth(depth: usize) -> BoxedStrategy<CoordSource> {
    if depth <= 1 {
        pair()
    } else {
        proptest::collection::vec(coords_of_depth(depth - 1), 1..4)
            .prop_map(CoordSource::List)
            .boxed()
    }
}

fn depth_and_tree() -> impl Strategy<Value = (usize, CoordSource)> {
    (1usize..=4).prop_flat_map(|depth| coords_of_depth(depth).prop_map(move |tree| (depth, tree)))
}

proptest! {
    #[test]
    fn normalize_is_idempotent((depth, input) in depth_and_tree()) {
        let once = normalize(depth, &input).expect("depth-correct input is valid");
        let rebuilt = CoordSource::try_from(&once.to_json()).expect("normalized trees are literal");
        let twice = normalize(depth, &rebuilt).expect("normalized output stays valid");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn flat_numbers_pair_consecutively(points in proptest::collection::vec((coord(), coord()), 2..6)) {
        let flat: Vec<f64> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        let tree = normalize(2, &CoordSource::from(flat)).expect("even flat lists are valid");
        match tree {
            CoordTree::List(items) => {
                prop_assert_eq!(items.len(), points.len());
                for (item, (x, y)) in items.iter().zip(points) {
                    prop_assert_eq!(item, &CoordTree::Pair([x, y]));
                }
            }
            CoordTree::Pair(_) => prop_assert!(false, "two or more points never collapse to one"),
        }
    }

    #[test]
    fn odd_flat_counts_never_validate(numbers in proptest::collection::vec(coord(), 3..9)) {
        prop_assume!(numbers.len() % 2 == 1);
        for depth in 1..=4 {
            prop_assert!(normalize(depth, &CoordSource::from(numbers.clone())).is_err());
        }
    }
}
