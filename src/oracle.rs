//! A brute-force implementation of the [`BoundingHierarchy`] queries, used as the reference
//! the [`AabbTree`] is checked against.
//!
//! [`BoundingHierarchy`]: ../bounding_hierarchy/trait.BoundingHierarchy.html
//! [`AabbTree`]: ../tree/struct.AabbTree.html

use std::marker::PhantomData;

use nalgebra::Point;

use crate::aabb::IntersectsAabb;
use crate::bounding_hierarchy::{
    BHValue, BoundingHierarchy, IntersectionAndPrimitive, PointAndPrimitive,
};
use crate::point_query::PointDistance;
use crate::primitive::Primitive;
use crate::ray::LinearQuery;
use crate::shapes::Intersects;
use crate::utils::distance_squared;

/// Answers every query by testing all primitives in order.
///
/// Uses the same predicates as the [`AabbTree`], without any pruning. The distance
/// queries keep the first strictly closer point, so among equally close primitives the
/// earliest one wins.
///
/// [`AabbTree`]: ../tree/struct.AabbTree.html
#[derive(Debug)]
pub struct BruteForce<'a, T: BHValue, const D: usize, P> {
    primitives: &'a [P],
    _marker: PhantomData<T>,
}

impl<T: BHValue, const D: usize, P> Clone for BruteForce<'_, T, D, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: BHValue, const D: usize, P> Copy for BruteForce<'_, T, D, P> {}

impl<'a, T: BHValue, const D: usize, P: Primitive<T, D>> BruteForce<'a, T, D, P> {
    /// Creates an oracle over `primitives`.
    pub fn new(primitives: &'a [P]) -> Self {
        BruteForce {
            primitives,
            _marker: PhantomData,
        }
    }

    fn intersections<'q, Q>(
        &'q self,
        query: &'q Q,
    ) -> impl Iterator<Item = IntersectionAndPrimitive<T, D, P::Id>> + 'q
    where
        P::Datum: Intersects<T, D, Q>,
    {
        let primitives: &'q [P] = self.primitives;
        primitives.iter().filter_map(move |p| {
            p.datum()
                .intersection(query)
                .map(|intersection| IntersectionAndPrimitive::new(intersection, p.id()))
        })
    }
}

impl<T: BHValue, const D: usize, P: Primitive<T, D>> BoundingHierarchy<T, D, P>
    for BruteForce<'_, T, D, P>
{
    fn size(&self) -> usize {
        self.primitives.len()
    }

    fn do_intersect<Q>(&self, query: &Q) -> bool
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.primitives.iter().any(|p| p.datum().intersects(query))
    }

    fn number_of_intersected_primitives<Q>(&self, query: &Q) -> usize
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.primitives
            .iter()
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
            self.primitives
                .iter()
                .filter(|p| p.datum().intersects(query))
                .map(|p| p.id()),
        );
    }

    fn any_intersected_primitive<Q>(&self, query: &Q) -> Option<P::Id>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.primitives
            .iter()
            .find(|p| p.datum().intersects(query))
            .map(|p| p.id())
    }

    fn all_intersections<Q, E>(&self, query: &Q, out: &mut E)
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
        E: Extend<IntersectionAndPrimitive<T, D, P::Id>>,
    {
        out.extend(self.intersections(query));
    }

    fn any_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.intersections(query).next()
    }

    fn first_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D> + LinearQuery<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        let mut first: Option<(T, IntersectionAndPrimitive<T, D, P::Id>)> = None;
        for hit in self.intersections(query) {
            let parameter = hit.intersection.parameter_along(query);
            if first.as_ref().map_or(true, |(best, _)| parameter < *best) {
                first = Some((parameter, hit));
            }
        }
        first.map(|(_, hit)| hit)
    }

    fn closest_point_hinted(&self, query: &Point<T, D>, hint: Point<T, D>) -> Point<T, D> {
        self.closest_point_and_primitive_hinted(
            query,
            PointAndPrimitive::new(hint, self.default_hint(query).id),
        )
        .point
    }

    fn closest_point_and_primitive_hinted(
        &self,
        query: &Point<T, D>,
        hint: PointAndPrimitive<T, D, P::Id>,
    ) -> PointAndPrimitive<T, D, P::Id> {
        if self.primitives.is_empty() {
            panic!("distance queries require at least one primitive");
        }
        let mut best = hint;
        let mut best_distance = distance_squared(&hint.point, query);
        for primitive in self.primitives {
            let point = primitive.datum().closest_point(query);
            let distance = distance_squared(&point, query);
            if distance < best_distance {
                best = PointAndPrimitive::new(point, primitive.id());
                best_distance = distance;
            }
        }
        best
    }

    fn any_reference_point_and_id(&self) -> Option<PointAndPrimitive<T, D, P::Id>> {
        self.primitives
            .first()
            .map(|p| PointAndPrimitive::new(p.reference_point(), p.id()))
    }
}

#[cfg(test)]
mod tests {
    use crate::bounding_hierarchy::BoundingHierarchy;
    use crate::oracle::BruteForce;
    use crate::primitive::Element;
    use crate::ray::{Line, Ray};
    use crate::shapes::Segment;
    use crate::testbase::{TPoint3, TVector3};

    fn ladder() -> Vec<Element<Segment<f64, 3>, usize>> {
        Element::enumerate((0..5).map(|i| {
            let y = i as f64;
            Segment::new(TPoint3::new(-1.0, y, 0.0), TPoint3::new(1.0, y, 0.0))
        }))
        .collect()
    }

    #[test]
    fn test_scan_counts_every_rung() {
        let rungs = ladder();
        let oracle = BruteForce::new(&rungs);
        let line = Line::new(TPoint3::new(0.0, 0.0, 0.0), TVector3::new(0.0, 1.0, 0.0));
        assert!(oracle.do_intersect(&line));
        assert_eq!(oracle.number_of_intersected_primitives(&line), 5);
        assert_eq!(oracle.any_intersected_primitive(&line), Some(0));

        let ray = Ray::new(TPoint3::new(0.5, 2.5, 0.0), TVector3::new(0.0, 1.0, 0.0));
        let mut ids = Vec::new();
        oracle.all_intersected_primitives(&ray, &mut ids);
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_first_intersection_takes_smallest_parameter() {
        let rungs = ladder();
        let oracle = BruteForce::new(&rungs);
        let ray = Ray::new(TPoint3::new(0.0, 10.0, 0.0), TVector3::new(0.0, -1.0, 0.0));
        assert_eq!(oracle.first_intersected_primitive(&ray), Some(4));
        let line = Line::new(TPoint3::new(0.0, 10.0, 0.0), TVector3::new(0.0, 1.0, 0.0));
        assert_eq!(oracle.first_intersected_primitive(&line), Some(0));
    }

    #[test]
    fn test_closest_point_keeps_earliest_of_ties() {
        let rungs = ladder();
        let oracle = BruteForce::new(&rungs);
        let closest = oracle.closest_point_and_primitive(&TPoint3::new(3.0, 1.5, 0.0));
        assert_eq!(closest.id, 1);
        assert_eq!(closest.point, TPoint3::new(1.0, 1.0, 0.0));
        assert_eq!(oracle.squared_distance(&TPoint3::new(0.0, -2.0, 0.0)), 4.0);
    }
}
