//! The [`LinearQuery`] trait: a point moving along a direction over a parameter range.

use nalgebra::{Point, SVector};

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::utils::{fast_max, fast_min, magnitude, real, tolerance};

/// A query shape of the form `origin + t * direction` for `t` in a parameter range:
/// `[0, ∞)` for a [`Ray`], `(-∞, ∞)` for a [`Line`] and `[0, 1]` for a [`Segment`].
///
/// [`Ray`]: struct.Ray.html
/// [`Line`]: struct.Line.html
/// [`Segment`]: ../shapes/struct.Segment.html
pub trait LinearQuery<T: BHValue, const D: usize> {
    /// The point at parameter zero.
    fn origin(&self) -> Point<T, D>;

    /// The (not necessarily normalized) direction.
    fn direction(&self) -> SVector<T, D>;

    /// The inclusive range of valid parameters.
    fn parameter_range(&self) -> (T, T);

    /// Returns the point at parameter `t`.
    fn point_at(&self, t: T) -> Point<T, D> {
        self.origin() + self.direction() * t
    }

    /// Returns `true` if `t` lies inside the parameter range.
    fn contains_parameter(&self, t: T) -> bool {
        let (t_min, t_max) = self.parameter_range();
        t >= t_min && t <= t_max
    }

    /// Clips the parameter range against an [`Aabb`] with the slab method.
    /// Returns the entry and exit parameters, or `None` if the query misses the box.
    ///
    /// The box is padded by a tolerance relative to the magnitude of its coordinates, so
    /// the test never misses a box containing a point reported by a primitive predicate.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use aabb_tree::ray::{LinearQuery, Ray};
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    /// let aabb = Aabb::with_bounds(Point3::new(2.0, -1.0, -1.0), Point3::new(3.0, 1.0, 1.0));
    /// let (entry, exit) = ray.clip_aabb(&aabb).unwrap();
    ///
    /// assert!((entry - 2.0_f64).abs() < 1e-9);
    /// assert!((exit - 3.0_f64).abs() < 1e-9);
    /// ```
    ///
    /// [`Aabb`]: ../aabb/struct.Aabb.html
    ///
    fn clip_aabb(&self, aabb: &Aabb<T, D>) -> Option<(T, T)> {
        let direction = self.direction();
        let inv_direction = direction.map(|x| T::one() / x);
        clip_slabs(
            &self.origin(),
            &direction,
            &inv_direction,
            self.parameter_range(),
            aabb,
        )
    }
}

/// Slab test shared by the linear queries, taking the precomputed inverse direction.
pub(crate) fn clip_slabs<T: BHValue, const D: usize>(
    origin: &Point<T, D>,
    direction: &SVector<T, D>,
    inv_direction: &SVector<T, D>,
    (mut t_min, mut t_max): (T, T),
    aabb: &Aabb<T, D>,
) -> Option<(T, T)> {
    if aabb.is_empty() {
        return None;
    }
    let pad = tolerance(magnitude([&aabb.min, &aabb.max])) * real::<T>(2.0);
    for i in 0..D {
        let lo = aabb.min[i] - pad;
        let hi = aabb.max[i] + pad;
        if direction[i] == T::zero() {
            // Parallel to the slab: inside for every parameter, or never.
            if origin[i] < lo || origin[i] > hi {
                return None;
            }
            continue;
        }
        let mut t0 = (lo - origin[i]) * inv_direction[i];
        let mut t1 = (hi - origin[i]) * inv_direction[i];
        if t0 > t1 {
            core::mem::swap(&mut t0, &mut t1);
        }
        t_min = fast_max(t0, t_min);
        t_max = fast_min(t1, t_max);
        if t_min > t_max {
            return None;
        }
    }
    Some((t_min, t_max))
}

#[cfg(test)]
mod tests {
    use crate::ray::{Line, LinearQuery};
    use crate::shapes::Segment;
    use crate::testbase::{TAabb3, TPoint3, TVector3};

    fn unit_cube() -> TAabb3 {
        TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_segment_stops_before_box() {
        let short = Segment::new(TPoint3::new(-2.0, 0.5, 0.5), TPoint3::new(-1.0, 0.5, 0.5));
        let long = Segment::new(TPoint3::new(-2.0, 0.5, 0.5), TPoint3::new(0.5, 0.5, 0.5));
        assert!(short.clip_aabb(&unit_cube()).is_none());
        let (entry, exit) = long.clip_aabb(&unit_cube()).unwrap();
        assert!((entry - 0.8).abs() < 1e-9);
        assert_eq!(exit, 1.0);
    }

    #[test]
    fn test_line_hits_box_behind_origin() {
        let line = Line::new(TPoint3::new(5.0, 0.5, 0.5), TVector3::new(1.0, 0.0, 0.0));
        let (entry, exit) = line.clip_aabb(&unit_cube()).unwrap();
        assert!((entry + 5.0).abs() < 1e-9);
        assert!((exit + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_parallel_query_outside_slab() {
        let line = Line::new(TPoint3::new(0.5, 2.0, 0.5), TVector3::new(1.0, 0.0, 0.0));
        assert!(line.clip_aabb(&unit_cube()).is_none());
        assert!(line.clip_aabb(&TAabb3::empty()).is_none());
        assert!(line.clip_aabb(&TAabb3::infinite()).is_some());
    }

    #[test]
    fn test_flat_box_is_hit() {
        let flat = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 1.0), TPoint3::new(1.0, 1.0, 1.0));
        let line = Line::through(TPoint3::new(0.2, 0.2, 0.0), TPoint3::new(0.7, 0.9, 2.0));
        assert!(line.clip_aabb(&flat).is_some());
        assert!(line.contains_parameter(-1e300));
    }
}
