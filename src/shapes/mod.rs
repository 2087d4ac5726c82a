//! Geometric primitives and their intersection with the linear queries.

mod segment;
mod triangle;

pub use self::segment::*;
pub use self::triangle::*;

use nalgebra::Point;

use crate::bounding_hierarchy::BHValue;
use crate::ray::LinearQuery;
use crate::utils::fast_min;

/// The geometry of an intersection between a query and a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intersection<T: BHValue, const D: usize> {
    /// The query crosses the primitive in a single point.
    Point(Point<T, D>),
    /// The query overlaps the primitive along a segment.
    Segment(Segment<T, D>),
}

impl<T: BHValue, const D: usize> Intersection<T, D> {
    /// Returns the smallest parameter of the intersection along `query`, i.e. where `query`
    /// first meets the primitive.
    pub fn parameter_along<Q: LinearQuery<T, D>>(&self, query: &Q) -> T {
        let direction = query.direction();
        let length_squared = direction.dot(&direction);
        let parameter = |p: &Point<T, D>| (p - query.origin()).dot(&direction) / length_squared;
        match self {
            Intersection::Point(p) => parameter(p),
            Intersection::Segment(s) => fast_min(parameter(&s.a), parameter(&s.b)),
        }
    }
}

/// A trait implemented by primitive geometry which can be intersected by queries of type `Q`.
pub trait Intersects<T: BHValue, const D: usize, Q> {
    /// Returns the intersection of this geometry with `query`, if there is one.
    fn intersection(&self, query: &Q) -> Option<Intersection<T, D>>;

    /// Returns `true` if this geometry intersects `query`.
    fn intersects(&self, query: &Q) -> bool {
        self.intersection(query).is_some()
    }
}

#[cfg(test)]
mod tests {
    use crate::ray::Ray;
    use crate::shapes::{Intersection, Segment};
    use crate::testbase::{TPoint3, TVector3};

    #[test]
    fn test_parameter_along_takes_nearest_end() {
        let ray = Ray::new(TPoint3::new(0.0, 0.0, 0.0), TVector3::new(0.0, 2.0, 0.0));
        let point = Intersection::Point(TPoint3::new(3.0, 4.0, 0.0));
        let overlap = Intersection::Segment(Segment::new(
            TPoint3::new(0.0, 7.0, 0.0),
            TPoint3::new(0.0, 5.0, 0.0),
        ));
        assert_eq!(point.parameter_along(&ray), 4.0);
        assert_eq!(overlap.parameter_along(&ray), 5.0);
    }
}
