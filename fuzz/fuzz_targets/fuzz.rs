#![no_main]
use std::collections::HashSet;
use std::fmt::Debug;

use aabb_tree::{
    AabbTree, BoundingHierarchy, BruteForce, Element, Intersects, IntersectsAabb, Line,
    LinearQuery, PointDistance, Primitive, Ray, Segment, Triangle,
};
use approx::relative_eq;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use nalgebra::Point3;
use ordered_float::NotNan;

type Float = f64;
const LIMIT: Float = 1_000.0;

fuzz_target!(|workload: Workload| {
    workload.fuzz();
});

#[derive(Debug, Arbitrary)]
struct ArbitraryPoint {
    coordinates: [NotNan<Float>; 3],
}

impl ArbitraryPoint {
    fn point(&self) -> Point3<Float> {
        Point3::from_slice(&self.coordinates).map(|f| f.into_inner().clamp(-LIMIT, LIMIT))
    }
}

#[derive(Debug, Arbitrary)]
struct ArbitraryTriangle {
    a: ArbitraryPoint,
    b: ArbitraryPoint,
    c: ArbitraryPoint,
}

impl ArbitraryTriangle {
    fn triangle(&self) -> Triangle<Float> {
        Triangle::new(self.a.point(), self.b.point(), self.c.point())
    }
}

#[derive(Debug, Arbitrary)]
struct Workload {
    triangles: Vec<ArbitraryTriangle>,
    from: ArbitraryPoint,
    to: ArbitraryPoint,
    query: ArbitraryPoint,
}

type Face = Element<Triangle<Float>, usize>;
type Tree = AabbTree<Float, 3, Face>;

impl Workload {
    fn fuzz(self) {
        let triangles = self.triangles.iter().map(ArbitraryTriangle::triangle);
        let tree: Tree = AabbTree::build(Element::enumerate(triangles));
        assert!(tree.is_consistent());
        assert_eq!(tree.bvh(), AabbTree::build_par(tree.primitives().to_vec()).bvh());
        let oracle = BruteForce::new(tree.primitives());

        let (from, to) = (self.from.point(), self.to.point());
        if from != to {
            agree_on_intersections(&tree, &oracle, &Segment::new(from, to));
            agree_on_intersections(&tree, &oracle, &Ray::through(from, to));
            agree_on_intersections(&tree, &oracle, &Line::through(from, to));
        }

        if !tree.is_empty() {
            let query = self.query.point();
            let distance = tree.squared_distance(&query);
            let reference = oracle.squared_distance(&query);
            assert!(
                relative_eq!(distance, reference, epsilon = 1e-9, max_relative = 1e-9),
                "{distance} != {reference}"
            );

            let closest = tree.closest_point_and_primitive(&query);
            let datum = tree.primitives()[closest.id].datum();
            assert!(datum.distance_squared(&closest.point) <= 1e-6);
        }
    }
}

fn agree_on_intersections<Q>(tree: &Tree, oracle: &BruteForce<Float, 3, Face>, query: &Q)
where
    Q: IntersectsAabb<Float, 3> + LinearQuery<Float, 3> + Debug,
    Triangle<Float>: Intersects<Float, 3, Q>,
{
    assert_eq!(tree.do_intersect(query), oracle.do_intersect(query), "{query:?}");
    assert_eq!(
        tree.number_of_intersected_primitives(query),
        oracle.number_of_intersected_primitives(query),
        "{query:?}"
    );

    let mut ids = HashSet::new();
    tree.all_intersected_primitives(query, &mut ids);
    let mut reference = HashSet::new();
    oracle.all_intersected_primitives(query, &mut reference);
    assert_eq!(ids, reference, "{query:?}");

    assert_eq!(tree.any_intersected_primitive(query).is_some(), !ids.is_empty());
    if let Some(first) = tree.first_intersection(query) {
        let expected = oracle
            .first_intersection(query)
            .map(|hit| hit.intersection.parameter_along(query));
        assert_eq!(Some(first.intersection.parameter_along(query)), expected, "{query:?}");
    } else {
        assert!(ids.is_empty());
    }
}
