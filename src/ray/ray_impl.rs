//! This module defines a Ray structure and its intersection with axis aligned bounding boxes.

use nalgebra::{Point, SVector};
use num_traits::Float;

use super::linear::{clip_slabs, LinearQuery};
use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;

/// A struct which defines a ray and some of its cached values.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ray<T: BHValue, const D: usize> {
    /// The ray origin.
    pub origin: Point<T, D>,

    /// The ray direction, normalized.
    pub direction: SVector<T, D>,

    /// Inverse (1/x) ray direction. Cached for use in [`Aabb`] intersections.
    ///
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    ///
    pub inv_direction: SVector<T, D>,
}

impl<T: BHValue, const D: usize> Ray<T, D> {
    /// Creates a new [`Ray`] from an `origin` and a `direction`.
    /// `direction` will be normalized and must not be zero.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::ray::Ray;
    /// use nalgebra::{Point3,Vector3};
    ///
    /// let origin = Point3::new(0.0,0.0,0.0);
    /// let direction = Vector3::new(2.0,0.0,0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// assert_eq!(ray.origin, origin);
    /// assert_eq!(ray.direction, Vector3::new(1.0,0.0,0.0));
    /// ```
    ///
    /// [`Ray`]: struct.Ray.html
    ///
    pub fn new(origin: Point<T, D>, direction: SVector<T, D>) -> Ray<T, D> {
        let length = Float::sqrt(direction.dot(&direction));
        let direction = direction / length;
        Ray {
            origin,
            direction,
            inv_direction: direction.map(|x| T::one() / x),
        }
    }

    /// Creates a new [`Ray`] starting at `from` and passing through `to`.
    ///
    /// [`Ray`]: struct.Ray.html
    ///
    pub fn through(from: Point<T, D>, to: Point<T, D>) -> Ray<T, D> {
        Ray::new(from, to - from)
    }

    /// Tests the intersection of a [`Ray`] with an [`Aabb`] using the slab method.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use aabb_tree::ray::Ray;
    /// use nalgebra::{Point3,Vector3};
    ///
    /// let origin = Point3::new(0.0,0.0,0.0);
    /// let direction = Vector3::new(1.0,0.0,0.0);
    /// let ray = Ray::new(origin, direction);
    ///
    /// let point1 = Point3::new(99.9,-1.0,-1.0);
    /// let point2 = Point3::new(100.1,1.0,1.0);
    /// let aabb = Aabb::with_bounds(point1, point2);
    ///
    /// assert!(ray.intersects_aabb(&aabb));
    /// ```
    ///
    /// [`Ray`]: struct.Ray.html
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    ///
    pub fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        self.clip_aabb(aabb).is_some()
    }
}

impl<T: BHValue, const D: usize> LinearQuery<T, D> for Ray<T, D> {
    fn origin(&self) -> Point<T, D> {
        self.origin
    }

    fn direction(&self) -> SVector<T, D> {
        self.direction
    }

    fn parameter_range(&self) -> (T, T) {
        (T::zero(), T::infinity())
    }

    fn clip_aabb(&self, aabb: &Aabb<T, D>) -> Option<(T, T)> {
        clip_slabs(
            &self.origin,
            &self.direction,
            &self.inv_direction,
            self.parameter_range(),
            aabb,
        )
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Ray<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        Ray::intersects_aabb(self, aabb)
    }
}
