//! This module defines the [`AabbTree`], the query engine over a collection of primitives.
//!
//! [`AabbTree`]: struct.AabbTree.html
//!

use log::debug;
use nalgebra::Point;

use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::{
    BHValue, BoundingHierarchy, IntersectionAndPrimitive, PointAndPrimitive,
};
use crate::bvh::Bvh;
use crate::point_query::PointDistance;
use crate::primitive::Primitive;
use crate::ray::LinearQuery;
use crate::shapes::Intersects;
use crate::utils::distance_squared;

/// A secondary hierarchy over the reference points of the primitives, used to seed
/// distance queries close to their answer.
#[derive(Debug, Clone)]
struct DistanceAccelerator<T: BHValue, const D: usize> {
    points: Vec<Point<T, D>>,
    bvh: Bvh<T, D>,
}

/// A bounding volume hierarchy over a collection of [`Primitive`]s.
///
/// The tree owns the primitives and caches their boxes at construction. It is immutable
/// afterwards and can be queried from any number of threads.
///
/// # Examples
/// ```
/// use aabb_tree::{AabbTree, BoundingHierarchy, Element, Segment};
/// use nalgebra::Point3;
///
/// let segments = vec![
///     Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
///     Segment::new(Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)),
///     Segment::new(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 0.0)),
/// ];
/// let tree: AabbTree<f64, 3, _> = Element::enumerate(segments).collect();
///
/// let query = Segment::new(Point3::new(0.5, -1.0, 0.0), Point3::new(0.5, 2.0, 0.0));
/// assert_eq!(tree.number_of_intersected_primitives(&query), 2);
/// assert_eq!(tree.squared_distance(&Point3::new(-2.0, 0.5, 0.0)), 4.0);
/// ```
///
/// [`Primitive`]: ../primitive/trait.Primitive.html
#[derive(Debug, Clone)]
pub struct AabbTree<T: BHValue, const D: usize, P> {
    primitives: Vec<P>,
    boxes: Vec<Aabb<T, D>>,
    bvh: Bvh<T, D>,
    bbox: Aabb<T, D>,
    accelerator: Option<DistanceAccelerator<T, D>>,
}

impl<T: BHValue, const D: usize, P: Primitive<T, D>> AabbTree<T, D, P> {
    fn build_with(
        primitives: Vec<P>,
        build: impl FnOnce(&[Aabb<T, D>]) -> Bvh<T, D>,
    ) -> AabbTree<T, D, P> {
        let boxes = primitives.iter().map(|p| p.aabb()).collect::<Vec<_>>();
        let bbox = boxes
            .iter()
            .fold(Aabb::empty(), |joint, aabb| joint.join(aabb));
        let bvh = build(&boxes);
        debug!(
            "built a tree over {} primitives, bounding box {}",
            primitives.len(),
            bbox
        );
        AabbTree {
            primitives,
            boxes,
            bvh,
            bbox,
            accelerator: None,
        }
    }

    /// Builds a tree over `primitives`.
    pub fn build(primitives: impl IntoIterator<Item = P>) -> AabbTree<T, D, P> {
        Self::build_with(primitives.into_iter().collect(), Bvh::build)
    }

    /// Builds a tree over `primitives`, building large subtrees in parallel.
    /// The resulting tree is identical to the one built by [`AabbTree::build`].
    #[cfg(feature = "rayon")]
    pub fn build_par(primitives: impl IntoIterator<Item = P>) -> AabbTree<T, D, P> {
        Self::build_with(primitives.into_iter().collect(), Bvh::build_par)
    }

    /// Builds a secondary hierarchy over the reference points of the primitives. The
    /// unhinted distance queries then start from the reference point closest to the query
    /// instead of the first primitive's one. Only the cost of the queries changes.
    pub fn accelerate_distance_queries(mut self) -> Self {
        if self.accelerator.is_none() {
            let points = self
                .primitives
                .iter()
                .map(|p| p.reference_point())
                .collect::<Vec<_>>();
            let bvh = Bvh::build(&points);
            self.accelerator = Some(DistanceAccelerator { points, bvh });
        }
        self
    }

    /// Returns `true` if [`AabbTree::accelerate_distance_queries`] was called.
    pub fn are_distance_queries_accelerated(&self) -> bool {
        self.accelerator.is_some()
    }

    /// Returns the union of the boxes of all primitives, or an empty box for an empty tree.
    pub fn bbox(&self) -> Aabb<T, D> {
        self.bbox
    }

    /// The primitives, in the order they were given.
    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    /// Returns the primitive at position `index` of the input sequence.
    pub fn primitive(&self, index: usize) -> Option<&P> {
        self.primitives.get(index)
    }

    /// The underlying hierarchy, built over the primitive boxes.
    pub fn bvh(&self) -> &Bvh<T, D> {
        &self.bvh
    }

    /// Checks the containment invariant of the hierarchy, see [`Bvh::is_consistent`].
    pub fn is_consistent(&self) -> bool {
        self.bvh.is_consistent(&self.boxes)
    }

    /// Logs the hierarchy at debug level.
    pub fn pretty_print(&self) {
        self.bvh.pretty_print();
    }

    /// Iterates over the primitives whose box and all of whose ancestors' boxes intersect
    /// `query`.
    fn candidates<'a, Q: IntersectsAabb<T, D>>(
        &'a self,
        query: &'a Q,
    ) -> impl Iterator<Item = &'a P> + 'a {
        self.bvh
            .traverse_iterator(query, &self.boxes)
            .map(move |index| &self.primitives[index])
    }

    fn assert_not_empty(&self) {
        if self.primitives.is_empty() {
            panic!("distance queries require at least one primitive");
        }
    }

    /// Runs a best-first distance search seeded with `bound`, returning the closest point
    /// strictly below it.
    fn closest_below(
        &self,
        query: &Point<T, D>,
        bound: T,
    ) -> Option<PointAndPrimitive<T, D, P::Id>> {
        self.bvh
            .traverse_best_first(
                bound,
                |aabb| Some(aabb.min_distance_squared(query)),
                |index| {
                    let primitive = &self.primitives[index];
                    let point = primitive.datum().closest_point(query);
                    Some((
                        distance_squared(&point, query),
                        PointAndPrimitive::new(point, primitive.id()),
                    ))
                },
            )
            .map(|(_, closest)| closest)
    }
}

impl<T: BHValue, const D: usize, P: Primitive<T, D>> FromIterator<P> for AabbTree<T, D, P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        AabbTree::build(iter)
    }
}

impl<T: BHValue, const D: usize, P: Primitive<T, D>> BoundingHierarchy<T, D, P>
    for AabbTree<T, D, P>
{
    fn size(&self) -> usize {
        self.primitives.len()
    }

    fn do_intersect<Q>(&self, query: &Q) -> bool
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.candidates(query).any(|p| p.datum().intersects(query))
    }

    fn number_of_intersected_primitives<Q>(&self, query: &Q) -> usize
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.candidates(query)
            .filter(|p| p.datum().intersects(query))
            .count()
    }

    fn all_intersected_primitives<Q, E>(&self, query: &Q, out: &mut E)
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
        E: Extend<P::Id>,
    {
        out.extend(
            self.candidates(query)
                .filter(|p| p.datum().intersects(query))
                .map(|p| p.id()),
        );
    }

    fn any_intersected_primitive<Q>(&self, query: &Q) -> Option<P::Id>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.candidates(query)
            .find(|p| p.datum().intersects(query))
            .map(|p| p.id())
    }

    fn all_intersections<Q, E>(&self, query: &Q, out: &mut E)
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
        E: Extend<IntersectionAndPrimitive<T, D, P::Id>>,
    {
        out.extend(self.candidates(query).filter_map(|p| {
            p.datum()
                .intersection(query)
                .map(|intersection| IntersectionAndPrimitive::new(intersection, p.id()))
        }));
    }

    fn any_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.candidates(query).find_map(|p| {
            p.datum()
                .intersection(query)
                .map(|intersection| IntersectionAndPrimitive::new(intersection, p.id()))
        })
    }

    fn first_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D> + LinearQuery<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.bvh
            .traverse_best_first(
                T::infinity(),
                |aabb| query.clip_aabb(aabb).map(|(entry, _)| entry),
                |index| {
                    let primitive = &self.primitives[index];
                    primitive.datum().intersection(query).map(|intersection| {
                        (
                            intersection.parameter_along(query),
                            IntersectionAndPrimitive::new(intersection, primitive.id()),
                        )
                    })
                },
            )
            .map(|(_, hit)| hit)
    }

    fn closest_point_hinted(&self, query: &Point<T, D>, hint: Point<T, D>) -> Point<T, D> {
        self.assert_not_empty();
        self.closest_below(query, distance_squared(&hint, query))
            .map_or(hint, |closest| closest.point)
    }

    fn closest_point_and_primitive_hinted(
        &self,
        query: &Point<T, D>,
        hint: PointAndPrimitive<T, D, P::Id>,
    ) -> PointAndPrimitive<T, D, P::Id> {
        self.assert_not_empty();
        self.closest_below(query, distance_squared(&hint.point, query))
            .unwrap_or(hint)
    }

    fn any_reference_point_and_id(&self) -> Option<PointAndPrimitive<T, D, P::Id>> {
        self.primitives
            .first()
            .map(|p| PointAndPrimitive::new(p.reference_point(), p.id()))
    }

    fn default_hint(&self, query: &Point<T, D>) -> PointAndPrimitive<T, D, P::Id> {
        let nearest_reference = self.accelerator.as_ref().and_then(|accelerator| {
            accelerator.bvh.traverse_best_first(
                T::infinity(),
                |aabb| Some(aabb.min_distance_squared(query)),
                |index| {
                    let point = accelerator.points[index];
                    Some((
                        distance_squared(&point, query),
                        PointAndPrimitive::new(point, self.primitives[index].id()),
                    ))
                },
            )
        });
        match nearest_reference {
            Some((_, hint)) => hint,
            None => match self.any_reference_point_and_id() {
                Some(hint) => hint,
                None => panic!("distance queries require at least one primitive"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::aabb::Aabb;
    use crate::bounding_hierarchy::{BoundingHierarchy, PointAndPrimitive};
    use crate::oracle::BruteForce;
    use crate::point_query::PointDistance;
    use crate::primitive::Element;
    use crate::ray::{Line, Ray};
    use crate::shapes::{Intersection, Segment, Triangle};
    use crate::testbase::{
        random_points, random_triangle_soup, sphere_mesh, TPoint3, TVector3,
    };
    use crate::tree::AabbTree;

    type SegmentTree = AabbTree<f64, 3, Element<Segment<f64, 3>, usize>>;
    type TriangleTree = AabbTree<f64, 3, Element<Triangle<f64>, usize>>;

    fn unit_right_triangle_boundary() -> SegmentTree {
        let p = TPoint3::new(0.0, 0.0, 0.0);
        let q = TPoint3::new(1.0, 0.0, 0.0);
        let r = TPoint3::new(0.0, 1.0, 0.0);
        Element::enumerate([Segment::new(p, q), Segment::new(q, r), Segment::new(r, p)]).collect()
    }

    #[test]
    /// A ray through the cube around the triangle meets its corner at the origin.
    fn test_ray_through_triangle_boundary() {
        let tree = unit_right_triangle_boundary();
        let ray = Ray::through(TPoint3::new(-0.5, -0.5, -0.5), TPoint3::new(0.5, 0.5, 0.5));
        assert!(tree.is_consistent());
        assert!(tree.do_intersect(&ray));
        assert!(tree.number_of_intersected_primitives(&ray) >= 1);

        let mut hits = HashSet::new();
        tree.all_intersected_primitives(&ray, &mut hits);
        assert_eq!(hits, HashSet::from([0, 2]));
        let hit = tree.any_intersection(&ray).unwrap();
        match hit.intersection {
            Intersection::Point(p) => assert!(p.coords.norm() < 1e-12),
            Intersection::Segment(_) => panic!("a crossing ray should meet a single point"),
        }
    }

    #[test]
    fn test_far_query_on_single_triangle() {
        let triangle = Triangle::new(
            TPoint3::new(0.0, 0.0, 0.0),
            TPoint3::new(1.0, 0.0, 0.0),
            TPoint3::new(0.0, 1.0, 0.0),
        );
        let tree: TriangleTree = Element::enumerate([triangle]).collect();
        let query = TPoint3::new(100.0, 200.0, -300.0);

        let closest = tree.closest_point_and_primitive(&query);
        assert_eq!(closest.id, 0);
        assert!(triangle.distance_squared(&closest.point) < 1e-20);
        assert!(Aabb::with_bounds(TPoint3::origin(), TPoint3::new(1.0, 1.0, 0.0))
            .approx_contains_eps(&closest.point, 1e-12));
        assert_eq!(tree.closest_point(&query), closest.point);
    }

    #[test]
    fn test_equidistant_query_between_two_triangles() {
        let left = Triangle::new(
            TPoint3::new(-100.0, 0.0, 0.0),
            TPoint3::new(-101.0, 1.0, 0.0),
            TPoint3::new(-101.0, -1.0, 0.0),
        );
        let right = Triangle::new(
            TPoint3::new(100.0, 0.0, 0.0),
            TPoint3::new(101.0, 1.0, 0.0),
            TPoint3::new(101.0, -1.0, 0.0),
        );
        let tree: TriangleTree = Element::enumerate([left, right]).collect();
        let query = TPoint3::new(0.0, 0.0, 0.0);

        let closest = tree.closest_point_and_primitive(&query);
        assert!(closest.id == 0 || closest.id == 1);
        let distance = (closest.point - query).dot(&(closest.point - query));
        assert_eq!(distance, tree.squared_distance(&query));
        assert_eq!(distance, 10000.0);
    }

    #[test]
    /// On ties, the hint's primitive is kept.
    fn test_ties_keep_the_hint() {
        let segments = [
            Segment::new(TPoint3::new(-1.0, 1.0, 0.0), TPoint3::new(1.0, 1.0, 0.0)),
            Segment::new(TPoint3::new(-1.0, -1.0, 0.0), TPoint3::new(1.0, -1.0, 0.0)),
        ];
        let tree: SegmentTree = Element::enumerate(segments).collect();
        let query = TPoint3::origin();
        for id in 0..2 {
            let hint = PointAndPrimitive::new(segments[id].closest_point(&query), id);
            assert_eq!(tree.closest_point_and_primitive_hinted(&query, hint), hint);
        }

        // The oracle keeps the earliest primitive.
        let oracle = BruteForce::new(tree.primitives());
        assert_eq!(oracle.closest_point_and_primitive(&query).id, 0);
    }

    #[test]
    /// Every query on an empty tree answers with the empty result.
    fn test_empty_tree_queries() {
        let tree: TriangleTree = AabbTree::build(Vec::new());
        let ray = Ray::new(TPoint3::origin(), TVector3::x());
        let line = Line::new(TPoint3::origin(), TVector3::y());
        assert!(tree.is_empty());
        assert!(tree.bbox().is_empty());
        assert!(tree.is_consistent());
        assert!(!tree.do_intersect(&ray));
        assert_eq!(tree.number_of_intersected_primitives(&line), 0);
        let mut ids = Vec::new();
        tree.all_intersected_primitives(&ray, &mut ids);
        assert!(ids.is_empty());
        let mut intersections = Vec::new();
        tree.all_intersections(&line, &mut intersections);
        assert!(intersections.is_empty());
        assert_eq!(tree.any_intersected_primitive(&ray), None);
        assert_eq!(tree.any_intersection(&line), None);
        assert_eq!(tree.first_intersection(&ray), None);
        assert_eq!(tree.any_reference_point_and_id(), None);
    }

    #[test]
    #[should_panic(expected = "distance queries require at least one primitive")]
    fn test_empty_tree_distance_query_panics() {
        let tree: TriangleTree = AabbTree::build(Vec::new());
        tree.closest_point(&TPoint3::origin());
    }

    #[test]
    fn test_bbox_is_union_of_primitive_boxes() {
        let triangles = random_triangle_soup(200, 5);
        let expected = triangles
            .iter()
            .fold(Aabb::empty(), |joint, t| joint.join(&crate::aabb::Bounded::aabb(t)));
        let tree: TriangleTree = Element::enumerate(triangles).collect();
        assert_eq!(tree.bbox(), expected);
        assert_eq!(tree.size(), 200);
        assert_eq!(tree.primitive(7).map(|p| p.id), Some(7));
        assert!(tree.primitive(200).is_none());
    }

    #[test]
    /// The first hit along a ray is the oracle's hit with the smallest parameter.
    fn test_first_intersection_matches_oracle() {
        let mesh = sphere_mesh(24, 12);
        let tree = AabbTree::build(mesh.faces());
        let oracle = BruteForce::new(tree.primitives());
        for (i, origin) in random_points(50, 3, 3.0).into_iter().enumerate() {
            let target = TPoint3::new(0.1 * i as f64 - 2.5, 0.3, -0.2);
            let ray = Ray::through(origin, target);
            let from_tree = tree.first_intersection(&ray);
            let from_oracle = oracle.first_intersection(&ray);
            assert_eq!(from_tree.is_some(), from_oracle.is_some());
            if let (Some(a), Some(b)) = (from_tree, from_oracle) {
                let ta = a.intersection.parameter_along(&ray);
                let tb = b.intersection.parameter_along(&ray);
                assert!((ta - tb).abs() <= 1e-9 * ta.abs().max(1.0));
            }
        }
    }

    #[test]
    /// Seeding with the nearest reference point gives the same distances.
    fn test_accelerated_distance_queries() {
        let triangles = random_triangle_soup(1000, 17);
        let plain: TriangleTree = Element::enumerate(triangles.clone()).collect();
        let accelerated: TriangleTree =
            Element::enumerate(triangles).collect::<TriangleTree>().accelerate_distance_queries();
        assert!(!plain.are_distance_queries_accelerated());
        assert!(accelerated.are_distance_queries_accelerated());

        for query in random_points(100, 23, 15.0) {
            let expected = plain.squared_distance(&query);
            let actual = accelerated.squared_distance(&query);
            assert!((expected - actual).abs() <= 1e-9 * expected.max(1.0));
            let closest = accelerated.closest_point_and_primitive(&query);
            let on_primitive = accelerated.primitive(closest.id).unwrap().geometry;
            assert!(on_primitive.distance_squared(&closest.point) < 1e-12);
        }
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_build_matches_sequential() {
        let triangles = random_triangle_soup(3000, 29);
        let sequential: TriangleTree = AabbTree::build(Element::enumerate(triangles.clone()));
        let parallel: TriangleTree = AabbTree::build_par(Element::enumerate(triangles));
        assert!(parallel.is_consistent());
        assert_eq!(sequential.bvh(), parallel.bvh());
        let query = TPoint3::new(1.0, 2.0, 3.0);
        assert_eq!(
            sequential.closest_point_and_primitive(&query),
            parallel.closest_point_and_primitive(&query)
        );
    }

    #[test]
    fn test_tree_is_sync() {
        fn assert_sync<S: Sync + Send>() {}
        assert_sync::<TriangleTree>();
    }

    #[test]
    /// Threads sharing one tree each get the oracle's answers from their own heap pool.
    fn test_concurrent_queries_match_oracle() {
        let tree: TriangleTree = Element::enumerate(random_triangle_soup(3000, 31)).collect();
        let oracle = BruteForce::new(tree.primitives());
        std::thread::scope(|scope| {
            for seed in 0..8 {
                let (tree, oracle) = (&tree, &oracle);
                scope.spawn(move || {
                    let points = random_points(200, 100 + seed, 15.0);
                    for query in &points {
                        assert_eq!(tree.squared_distance(query), oracle.squared_distance(query));
                    }
                    for pair in points.windows(2) {
                        let ray = Ray::through(pair[0], pair[1]);
                        let from_tree = tree.first_intersection(&ray);
                        let from_oracle = oracle.first_intersection(&ray);
                        assert_eq!(from_tree.is_some(), from_oracle.is_some());
                        if let (Some(a), Some(b)) = (from_tree, from_oracle) {
                            let ta = a.intersection.parameter_along(&ray);
                            let tb = b.intersection.parameter_along(&ray);
                            assert!((ta - tb).abs() <= 1e-9 * ta.abs().max(1.0));
                        }
                    }
                });
            }
        });
    }
}
