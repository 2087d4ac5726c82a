//! Contains the [`PointDistance`] trait used for querying the distance from a point to the
//! primitives of a tree.
use nalgebra::Point;

use crate::bounding_hierarchy::BHValue;
use crate::utils::distance_squared;

/// A trait implemented by shapes that can be queried for their distance to a point.
///
/// Used by the closest point queries of the [`BoundingHierarchy`] trait.
///
/// [`BoundingHierarchy`]: ../bounding_hierarchy/trait.BoundingHierarchy.html
pub trait PointDistance<T: BHValue, const D: usize> {
    /// Returns the point of the shape closest to `query_point`.
    fn closest_point(&self, query_point: &Point<T, D>) -> Point<T, D>;

    /// Returns the squared distance from `query_point` to the shape.
    fn distance_squared(&self, query_point: &Point<T, D>) -> T {
        distance_squared(&self.closest_point(query_point), query_point)
    }

    /// Returns the closest point of the shape if it is strictly closer to `query_point`
    /// than `current_best`, and `current_best` otherwise.
    fn closer_point(&self, query_point: &Point<T, D>, current_best: Point<T, D>) -> Point<T, D> {
        let candidate = self.closest_point(query_point);
        if distance_squared(&candidate, query_point) < distance_squared(&current_best, query_point) {
            candidate
        } else {
            current_best
        }
    }
}

impl<T: BHValue, const D: usize> PointDistance<T, D> for Point<T, D> {
    fn closest_point(&self, _query_point: &Point<T, D>) -> Point<T, D> {
        *self
    }
}
