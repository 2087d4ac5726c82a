use nalgebra::Point;

use crate::{aabb::Aabb, bounding_hierarchy::BHValue};

/// A trait implemented by queries that may or may not intersect an AABB and, by extension,
/// queries that can be used to descend an [`AabbTree`].
///
/// It must be conservative: whenever the query intersects something inside `aabb`,
/// `intersects_aabb` must return `true`.
///
/// [`AabbTree`]: ../tree/struct.AabbTree.html
pub trait IntersectsAabb<T: BHValue, const D: usize> {
    /// Returns whether this object intersects an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::{Aabb, IntersectsAabb};
    /// use nalgebra::Point3;
    ///
    /// struct XyPlane;
    ///
    /// impl IntersectsAabb<f32,3> for XyPlane {
    ///     fn intersects_aabb(&self, aabb: &Aabb<f32,3>) -> bool {
    ///         aabb.min[2] <= 0.0 && aabb.max[2] >= 0.0
    ///     }
    /// }
    ///
    /// let xy_plane = XyPlane;
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0,-1.0,-1.0), Point3::new(1.0,1.0,1.0));
    /// assert!(xy_plane.intersects_aabb(&aabb));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool;
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Aabb<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        for i in 0..D {
            if self.max[i] < aabb.min[i] || aabb.max[i] < self.min[i] {
                return false;
            }
        }
        true
    }
}

impl<T: BHValue, const D: usize> IntersectsAabb<T, D> for Point<T, D> {
    fn intersects_aabb(&self, aabb: &Aabb<T, D>) -> bool {
        aabb.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::IntersectsAabb;
    use crate::testbase::{TAabb3, TPoint3};

    #[test]
    fn test_touching_boxes_intersect() {
        let a = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0));
        let b = TAabb3::with_bounds(TPoint3::new(1.0, 0.5, 0.5), TPoint3::new(2.0, 2.0, 2.0));
        let c = TAabb3::with_bounds(TPoint3::new(1.5, 0.5, 0.5), TPoint3::new(2.0, 2.0, 2.0));
        assert!(a.intersects_aabb(&b));
        assert!(b.intersects_aabb(&a));
        assert!(!a.intersects_aabb(&c));
        assert!(!TAabb3::empty().intersects_aabb(&a));
    }

    #[test]
    fn test_point_intersects_aabb() {
        let aabb = TAabb3::with_bounds(TPoint3::new(0.0, 0.0, 0.0), TPoint3::new(1.0, 1.0, 1.0));
        assert!(TPoint3::new(1.0, 1.0, 0.0).intersects_aabb(&aabb));
        assert!(!TPoint3::new(1.0, 1.0, -0.1).intersects_aabb(&aabb));
    }
}
