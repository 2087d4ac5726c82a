//! An infinite line query.

use nalgebra::{Point, SVector};

use super::linear::LinearQuery;
use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;

/// A line through `origin` along `direction`, unbounded in both directions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line<T: BHValue, const D: usize> {
    /// A point on the line.
    pub origin: Point<T, D>,

    /// The direction of the line. Must not be zero.
    pub direction: SVector<T, D>,
}

impl<T: BHValue, const D: usize> Line<T, D> {
    /// Creates a new [`Line`] through `origin` along `direction`.
    ///
    /// [`Line`]: struct.Line.html
    pub fn new(origin: Point<T, D>, direction: SVector<T, D>) -> Line<T, D> {
        Line { origin, direction }
    }

    /// Creates the [`Line`] through two distinct points.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::ray::{Line, LinearQuery};
    /// use nalgebra::Point3;
    ///
    /// let line = Line::through(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
    /// assert_eq!(line.point_at(-2.0), Point3::new(-2.0, -2.0, 0.0));
    /// ```
    ///
    /// [`Line`]: struct.Line.html
    pub fn through(a: Point<T, D>, b: Point<T, D>) -> Line<T, D> {
        Line::new(a, b - a)
    }
}

impl<T: BHValue, const D: usize> LinearQuery<T, D> for Line<T, D> {
    fn origin(&self) -> Point<T, D> {
        self.origin
    }

    fn direction(&self) -> SVector<T, D> {
        self.direction
    }

    fn parameter_range(&self) -> (T, T) {
        (T::neg_infinity(), T::infinity())
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Line<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        self.clip_aabb(aabb).is_some()
    }
}
