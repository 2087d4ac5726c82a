//! This module defines the [`BoundingHierarchy`] trait, the query contract shared by the
//! [`AabbTree`] and the [`BruteForce`] oracle, and the values it returns.
//!
//! [`AabbTree`]: ../tree/struct.AabbTree.html
//! [`BruteForce`]: ../oracle/struct.BruteForce.html

use core::fmt::Display;

use nalgebra::{
    ClosedAddAssign, ClosedDivAssign, ClosedMulAssign, ClosedSubAssign, Point, Scalar,
    SimdPartialOrd,
};
use num_traits::{Float, FromPrimitive, ToPrimitive};

use crate::aabb::IntersectsAabb;
use crate::primitive::Primitive;
use crate::ray::LinearQuery;
use crate::shapes::{Intersection, Intersects};
use crate::utils::distance_squared;

/// Encapsulates the required traits for the value type used in the hierarchy
/// and the geometric kernel. Implemented for `f32` and `f64`.
pub trait BHValue:
    Scalar
    + Copy
    + FromPrimitive
    + ToPrimitive
    + ClosedMulAssign
    + ClosedAddAssign
    + ClosedSubAssign
    + ClosedDivAssign
    + Float
    + SimdPartialOrd
    + Send
    + Sync
    + Display
{
}

impl<T> BHValue for T where
    T: Scalar
        + Copy
        + FromPrimitive
        + ToPrimitive
        + ClosedMulAssign
        + ClosedAddAssign
        + ClosedSubAssign
        + ClosedDivAssign
        + Float
        + SimdPartialOrd
        + Send
        + Sync
        + Display
{
}

/// A point on a primitive together with the identity of that primitive.
///
/// Returned by the closest point queries and accepted as a hint by
/// [`BoundingHierarchy::closest_point_and_primitive_hinted`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointAndPrimitive<T: BHValue, const D: usize, Id> {
    /// The point, lying on the primitive.
    pub point: Point<T, D>,
    /// The identity of the primitive.
    pub id: Id,
}

impl<T: BHValue, const D: usize, Id> PointAndPrimitive<T, D, Id> {
    /// Pairs a `point` with the `id` of the primitive it lies on.
    pub fn new(point: Point<T, D>, id: Id) -> Self {
        PointAndPrimitive { point, id }
    }
}

/// The intersection of a query with a primitive, together with the identity of that primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionAndPrimitive<T: BHValue, const D: usize, Id> {
    /// The intersection geometry.
    pub intersection: Intersection<T, D>,
    /// The identity of the intersected primitive.
    pub id: Id,
}

impl<T: BHValue, const D: usize, Id> IntersectionAndPrimitive<T, D, Id> {
    /// Pairs an `intersection` with the `id` of the intersected primitive.
    pub fn new(intersection: Intersection<T, D>, id: Id) -> Self {
        IntersectionAndPrimitive { intersection, id }
    }
}

/// The query contract over a collection of primitives.
///
/// Intersection queries accept any query shape `Q` which can be tested against an
/// [`Aabb`] and against the primitives' data; distance queries accept a point.
///
/// No query ever fails: on an empty collection intersection queries return `false`, `0`,
/// nothing, or `None`. Distance queries, however, need at least one primitive.
///
/// [`Aabb`]: ../aabb/struct.Aabb.html
pub trait BoundingHierarchy<T: BHValue, const D: usize, P: Primitive<T, D>> {
    /// Returns the number of primitives.
    fn size(&self) -> usize;

    /// Returns `true` if there are no primitives.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if at least one primitive intersects `query`.
    fn do_intersect<Q>(&self, query: &Q) -> bool
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>;

    /// Returns the number of primitives intersecting `query`. Each primitive is counted once.
    fn number_of_intersected_primitives<Q>(&self, query: &Q) -> usize
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>;

    /// Pushes the identity of every primitive intersecting `query` into `out`, once each,
    /// in no particular order.
    fn all_intersected_primitives<Q, E>(&self, query: &Q, out: &mut E)
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
        E: Extend<P::Id>;

    /// Returns the identity of some primitive intersecting `query`, if there is one.
    fn any_intersected_primitive<Q>(&self, query: &Q) -> Option<P::Id>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>;

    /// Pushes the intersection of `query` with every intersected primitive into `out`,
    /// in no particular order.
    fn all_intersections<Q, E>(&self, query: &Q, out: &mut E)
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>,
        E: Extend<IntersectionAndPrimitive<T, D, P::Id>>;

    /// Returns the intersection of `query` with some primitive, if there is one.
    fn any_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D>,
        P::Datum: Intersects<T, D, Q>;

    /// Returns the intersection of the linear `query` with the smallest parameter along
    /// `query`, i.e. the first primitive hit when walking along it.
    fn first_intersection<Q>(&self, query: &Q) -> Option<IntersectionAndPrimitive<T, D, P::Id>>
    where
        Q: IntersectsAabb<T, D> + LinearQuery<T, D>,
        P::Datum: Intersects<T, D, Q>;

    /// Returns the identity of the first primitive hit when walking along `query`.
    fn first_intersected_primitive<Q>(&self, query: &Q) -> Option<P::Id>
    where
        Q: IntersectsAabb<T, D> + LinearQuery<T, D>,
        P::Datum: Intersects<T, D, Q>,
    {
        self.first_intersection(query).map(|hit| hit.id)
    }

    /// Returns the point of the primitives closest to `query`, starting the search from
    /// `hint`, which must lie on one of the primitives.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn closest_point_hinted(&self, query: &Point<T, D>, hint: Point<T, D>) -> Point<T, D>;

    /// Returns the closest point and its primitive, starting the search from `hint`.
    /// When several primitives are equally close, the hint's primitive is kept if it is one
    /// of them.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn closest_point_and_primitive_hinted(
        &self,
        query: &Point<T, D>,
        hint: PointAndPrimitive<T, D, P::Id>,
    ) -> PointAndPrimitive<T, D, P::Id>;

    /// Returns a point on some primitive, with the primitive's identity.
    /// Used as the default seed of the distance queries.
    fn any_reference_point_and_id(&self) -> Option<PointAndPrimitive<T, D, P::Id>>;

    /// Returns the point of the primitives closest to `query`.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn closest_point(&self, query: &Point<T, D>) -> Point<T, D> {
        let hint = self.default_hint(query);
        self.closest_point_hinted(query, hint.point)
    }

    /// Returns the closest point to `query` and the primitive it lies on.
    /// When several primitives are equally close, any of them may be returned.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn closest_point_and_primitive(&self, query: &Point<T, D>) -> PointAndPrimitive<T, D, P::Id> {
        let hint = self.default_hint(query);
        self.closest_point_and_primitive_hinted(query, hint)
    }

    /// Returns the squared distance from `query` to the closest primitive.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn squared_distance(&self, query: &Point<T, D>) -> T {
        distance_squared(&self.closest_point(query), query)
    }

    /// Returns the squared distance from `query` to the closest primitive, starting the search
    /// from `hint`.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn squared_distance_hinted(&self, query: &Point<T, D>, hint: Point<T, D>) -> T {
        distance_squared(&self.closest_point_hinted(query, hint), query)
    }

    /// Returns the seed used by the unhinted distance queries.
    ///
    /// # Panics
    ///
    /// Panics if there are no primitives.
    fn default_hint(&self, _query: &Point<T, D>) -> PointAndPrimitive<T, D, P::Id> {
        match self.any_reference_point_and_id() {
            Some(hint) => hint,
            None => panic!("distance queries require at least one primitive"),
        }
    }
}
