//! This module defines a Segment and its intersection with the linear queries.

use nalgebra::{Point, SVector};

use super::{Intersection, Intersects};
use crate::aabb::{Aabb, Bounded, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::point_query::PointDistance;
use crate::ray::LinearQuery;
use crate::utils::{distance_squared, fast_max, fast_min, magnitude, tolerance};

/// A segment between two points. Used both as a primitive and as a query.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment<T: BHValue, const D: usize> {
    /// First end point
    pub a: Point<T, D>,
    /// Second end point
    pub b: Point<T, D>,
}

#[inline]
fn clamp<T: BHValue>(x: T, lo: T, hi: T) -> T {
    fast_min(fast_max(x, lo), hi)
}

impl<T: BHValue, const D: usize> Segment<T, D> {
    /// Creates a new segment from `a` to `b`.
    pub fn new(a: Point<T, D>, b: Point<T, D>) -> Segment<T, D> {
        Segment { a, b }
    }

    /// Returns the squared length of the segment.
    pub fn length_squared(&self) -> T {
        distance_squared(&self.a, &self.b)
    }

    fn point_at_unit(&self, s: T) -> Point<T, D> {
        self.a + (self.b - self.a) * s
    }

    /// Intersection of a non-degenerate query with this segment seen as a point, or with the
    /// collinear query when both are parallel.
    fn parallel_intersection<Q: LinearQuery<T, D>>(
        &self,
        query: &Q,
        direction: &SVector<T, D>,
        tolerance_squared: T,
    ) -> Option<Intersection<T, D>> {
        let length_squared = direction.dot(direction);
        let parameter = |p: &Point<T, D>| (p - query.origin()).dot(direction) / length_squared;
        let (t_min, t_max) = query.parameter_range();

        let ta = parameter(&self.a);
        if distance_squared(&query.point_at(ta), &self.a) > tolerance_squared {
            return None;
        }
        let tb = parameter(&self.b);
        let lo = fast_max(fast_min(ta, tb), t_min);
        let hi = fast_min(fast_max(ta, tb), t_max);
        if lo > hi {
            return None;
        }
        let start = query.point_at(lo);
        let end = query.point_at(hi);
        if distance_squared(&start, &end) <= tolerance_squared {
            Some(Intersection::Point(start))
        } else {
            Some(Intersection::Segment(Segment::new(start, end)))
        }
    }
}

impl<T: BHValue, const D: usize> Bounded<T, D> for Segment<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::empty().grow(&self.a).grow(&self.b)
    }
}

impl<T: BHValue, const D: usize> PointDistance<T, D> for Segment<T, D> {
    fn closest_point(&self, query: &Point<T, D>) -> Point<T, D> {
        let e = self.b - self.a;
        let length_squared = e.dot(&e);
        if length_squared <= T::zero() {
            return self.a;
        }
        let s = (query - self.a).dot(&e) / length_squared;
        self.point_at_unit(clamp(s, T::zero(), T::one()))
    }
}

impl<T: BHValue, const D: usize> LinearQuery<T, D> for Segment<T, D> {
    fn origin(&self) -> Point<T, D> {
        self.a
    }

    fn direction(&self) -> SVector<T, D> {
        self.b - self.a
    }

    fn parameter_range(&self) -> (T, T) {
        (T::zero(), T::one())
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Segment<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        self.clip_aabb(aabb).is_some()
    }
}

/// Intersection of a segment with a ray, a line or another segment.
///
/// Two linear objects meet when their closest points are within a tolerance relative to
/// the magnitude of the segment's coordinates. Parallel objects meet along their overlap.
impl<T: BHValue, const D: usize, Q: LinearQuery<T, D>> Intersects<T, D, Q> for Segment<T, D> {
    fn intersection(&self, query: &Q) -> Option<Intersection<T, D>> {
        let tol = tolerance(magnitude([&self.a, &self.b]));
        let tol2 = tol * tol;

        let e = self.b - self.a;
        let d = query.direction();
        let r = self.a - query.origin();
        let a = e.dot(&e);
        let b = e.dot(&d);
        let c = d.dot(&d);
        let dd = e.dot(&r);
        let ee = d.dot(&r);

        if c <= T::zero() {
            // The query degenerates to its origin.
            let origin = query.origin();
            let closest = self.closest_point(&origin);
            return (distance_squared(&closest, &origin) <= tol2)
                .then_some(Intersection::Point(closest));
        }

        let (t_min, t_max) = query.parameter_range();
        if a <= tol2 {
            // The segment degenerates to a point.
            let t = clamp(ee / c, t_min, t_max);
            return (distance_squared(&query.point_at(t), &self.a) <= tol2)
                .then_some(Intersection::Point(self.a));
        }

        let denom = a * c - b * b;
        if denom <= T::epsilon() * a * c {
            return self.parallel_intersection(query, &d, tol2);
        }

        // Closest points of the two objects, clamping to the segment then to the query.
        let mut s = clamp((b * ee - c * dd) / denom, T::zero(), T::one());
        let mut t = (b * s + ee) / c;
        if t < t_min || t > t_max {
            t = clamp(t, t_min, t_max);
            s = clamp((t * b - dd) / a, T::zero(), T::one());
        }
        let on_segment = self.point_at_unit(s);
        let on_query = query.point_at(t);
        (distance_squared(&on_segment, &on_query) <= tol2).then_some(Intersection::Point(on_segment))
    }
}
