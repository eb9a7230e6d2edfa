//! Property-based tests comparing quadtree queries against brute force.

use approx::assert_relative_eq;
use proptest::prelude::*;

use spatium_geom::Point3;
use spatium_idx::{Bounds, PointQuadtree, QuadtreeConfig};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_point() -> impl Strategy<Value = Point3> {
    (-50.0f64..50.0, -50.0f64..50.0, -5.0f64..5.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

/// Points snapped to a coarse lattice so duplicates and centre-line hits occur.
fn arb_lattice_point() -> impl Strategy<Value = Point3> {
    (-8i32..8, -8i32..8).prop_map(|(x, y)| Point3::new(x as f64 * 2.5, y as f64 * 2.5, 0.0))
}

fn arb_points() -> impl Strategy<Value = Vec<Point3>> {
    prop_oneof![
        prop::collection::vec(arb_point(), 0..200),
        prop::collection::vec(arb_lattice_point(), 0..200),
    ]
}

fn arb_config() -> impl Strategy<Value = QuadtreeConfig> {
    (1usize..12, 2usize..12).prop_map(|(max_points_per_leaf, max_depth)| QuadtreeConfig {
        max_points_per_leaf,
        max_depth,
    })
}

fn arb_region() -> impl Strategy<Value = Bounds> {
    (arb_point(), arb_point()).prop_map(|(a, b)| {
        let min = Point3::new(a.x.min(b.x), a.y.min(b.y), -10.0);
        let max = Point3::new(a.x.max(b.x), a.y.max(b.y), 10.0);
        Bounds::from_min_max(min, max).unwrap()
    })
}

fn sorted(mut points: Vec<Point3>) -> Vec<Point3> {
    points.sort_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    });
    points
}

fn sorted_distances(points: &[Point3], target: &Point3) -> Vec<f64> {
    let mut d: Vec<f64> = points.iter().map(|p| p.distance_squared_to(target)).collect();
    d.sort_by(f64::total_cmp);
    d
}

/// Every node contains its points, and subdivided nodes hold none.
fn check_structure(tree: &PointQuadtree) -> Result<(), TestCaseError> {
    let arena = tree.tree();
    for (depth, id) in arena.depth_first() {
        let node = arena.node(id).unwrap();
        let object = node.object();
        if node.has_children() {
            prop_assert_eq!(node.child_count(), 4);
            prop_assert!(object.points().is_empty());
        } else if depth < tree.config().max_depth {
            prop_assert!(object.points().len() <= tree.config().max_points_per_leaf);
        }
        for p in object.points() {
            prop_assert!(object.bounds().contains(p), "{} outside {}", p, object.bounds());
        }
    }
    prop_assert_eq!(tree.points().len(), tree.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn build_keeps_structural_invariants(points in arb_points(), config in arb_config()) {
        let tree = PointQuadtree::build_from_points(&points, config).unwrap();
        prop_assert_eq!(tree.len(), points.len());
        prop_assert!(tree.depth() <= config.max_depth);
        check_structure(&tree)?;
        prop_assert_eq!(sorted(tree.points()), sorted(points));
    }

    #[test]
    fn remove_keeps_structural_invariants(
        points in arb_points(),
        config in arb_config(),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let mut tree = PointQuadtree::build_from_points(&points, config).unwrap();
        let mut remaining = points.clone();
        for index in removals {
            if remaining.is_empty() {
                break;
            }
            let p = remaining.swap_remove(index.index(remaining.len()));
            prop_assert!(tree.remove(&p));
        }
        prop_assert_eq!(tree.len(), remaining.len());
        check_structure(&tree)?;
        prop_assert_eq!(sorted(tree.points()), sorted(remaining));
    }

    // -----------------------------------------------------------------------
    // Queries against brute force
    // -----------------------------------------------------------------------

    #[test]
    fn query_region_matches_brute_force(points in arb_points(), config in arb_config(), region in arb_region()) {
        let tree = PointQuadtree::build_from_points(&points, config).unwrap();
        let expected: Vec<Point3> = points.iter().copied().filter(|p| region.contains(p)).collect();
        prop_assert_eq!(sorted(tree.query_region(&region)), sorted(expected));
    }

    #[test]
    fn query_radius_matches_brute_force(
        points in arb_points(),
        config in arb_config(),
        center in arb_point(),
        radius in 0.0f64..40.0,
    ) {
        let tree = PointQuadtree::build_from_points(&points, config).unwrap();
        let r2 = radius * radius;
        let expected: Vec<Point3> = points
            .iter()
            .copied()
            .filter(|p| p.distance_squared_to(&center) <= r2)
            .collect();
        prop_assert_eq!(sorted(tree.query_radius(&center, radius)), sorted(expected));
    }

    #[test]
    fn k_nearest_matches_brute_force(
        points in arb_points(),
        config in arb_config(),
        target in arb_point(),
        k in 0usize..20,
    ) {
        let tree = PointQuadtree::build_from_points(&points, config).unwrap();
        let found = tree.k_nearest(&target, k);
        prop_assert_eq!(found.len(), k.min(points.len()));

        let mut expected = sorted_distances(&points, &target);
        expected.truncate(k);
        let distances: Vec<f64> = found.iter().map(|p| p.distance_squared_to(&target)).collect();
        prop_assert_eq!(distances, expected);
    }

    #[test]
    fn nearest_matches_brute_force(points in arb_points(), config in arb_config(), target in arb_point()) {
        let tree = PointQuadtree::build_from_points(&points, config).unwrap();
        match tree.nearest(&target) {
            None => prop_assert!(points.is_empty()),
            Some(p) => {
                let best = sorted_distances(&points, &target)[0];
                prop_assert_eq!(p.distance_squared_to(&target), best);
            }
        }
    }
}

#[test]
fn nearest_on_sparse_cloud() {
    let points = [
        Point3::new(-40.0, -40.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(40.0, 40.0, 0.0),
    ];
    let tree = PointQuadtree::build_from_points(&points, QuadtreeConfig::with_leaf_capacity(1)).unwrap();
    let target = Point3::new(3.0, 4.0, 0.0);
    let nearest = tree.nearest(&target).unwrap();
    assert_eq!(nearest, points[1]);
    assert_relative_eq!(nearest.distance_to(&target), 65.0f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn quadtree_config_parses_partial_json() {
    let config: QuadtreeConfig = serde_json::from_str(r#"{"max_depth": 6}"#).unwrap();
    assert_eq!(config.max_depth, 6);
    assert_eq!(config.max_points_per_leaf, QuadtreeConfig::default().max_points_per_leaf);
}
