//! This module defines a Triangle and its intersection algorithms.

use nalgebra::{Point3, Vector3};
use num_traits::Float;

use super::{Intersection, Intersects, Segment};
use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::point_query::PointDistance;
use crate::ray::LinearQuery;
use crate::utils::{distance_squared, fast_max, fast_min, magnitude, tolerance};

/// A triangle struct. Instance of a more complex `Bounded` primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle<T: BHValue> {
    /// First point on the triangle
    pub a: Point3<T>,
    /// Second point on the triangle
    pub b: Point3<T>,
    /// Third point on the triangle
    pub c: Point3<T>,
}

impl<T: BHValue> Triangle<T> {
    /// Creates a new triangle given a counter clockwise set of points
    pub fn new(a: Point3<T>, b: Point3<T>, c: Point3<T>) -> Triangle<T> {
        Triangle { a, b, c }
    }

    /// Returns the (unnormalized) normal `(b - a) × (c - a)`.
    pub fn normal(&self) -> Vector3<T> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Returns `true` if the three points are (numerically) collinear.
    pub fn is_degenerate(&self) -> bool {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let n = ab.cross(&ac);
        n.dot(&n) <= T::epsilon() * ab.dot(&ab) * ac.dot(&ac)
    }

    /// Returns the three edges of the triangle.
    pub fn edges(&self) -> [Segment<T, 3>; 3] {
        [
            Segment::new(self.a, self.b),
            Segment::new(self.b, self.c),
            Segment::new(self.c, self.a),
        ]
    }

    /// Intersection of a query lying in the plane of the triangle: the query is clipped
    /// against the inner half-planes of the three edges.
    fn coplanar_intersection<Q: LinearQuery<T, 3>>(
        &self,
        query: &Q,
        normal: &Vector3<T>,
        tol: T,
    ) -> Option<Intersection<T, 3>> {
        let origin = query.origin();
        let direction = query.direction();
        let (mut t_min, mut t_max) = query.parameter_range();
        for (p, q) in [(self.a, self.b), (self.b, self.c), (self.c, self.a)] {
            // Points towards the opposite vertex.
            let inward = normal.cross(&(q - p));
            let slack = tol * Float::sqrt(inward.dot(&inward));
            let offset = inward.dot(&(origin - p)) + slack;
            let rate = inward.dot(&direction);
            if rate == T::zero() {
                if offset < T::zero() {
                    return None;
                }
                continue;
            }
            let t = -offset / rate;
            if rate > T::zero() {
                t_min = fast_max(t_min, t);
            } else {
                t_max = fast_min(t_max, t);
            }
            if t_min > t_max {
                return None;
            }
        }
        let start = query.point_at(t_min);
        let end = query.point_at(t_max);
        if distance_squared(&start, &end) <= tol * tol {
            Some(Intersection::Point(start))
        } else {
            Some(Intersection::Segment(Segment::new(start, end)))
        }
    }
}

impl<T: BHValue> Bounded<T, 3> for Triangle<T> {
    fn aabb(&self) -> Aabb<T, 3> {
        Aabb::empty().grow(&self.a).grow(&self.b).grow(&self.c)
    }
}

/// Closest point by Voronoi regions of the vertices, the edges and the face.
/// Degenerate triangles are treated as the union of their edges.
impl<T: BHValue> PointDistance<T, 3> for Triangle<T> {
    fn closest_point(&self, p: &Point3<T>) -> Point3<T> {
        if self.is_degenerate() {
            let [ab, bc, ca] = self.edges();
            return bc.closer_point(p, ca.closer_point(p, ab.closest_point(p)));
        }

        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;

        let ap = p - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= T::zero() && d2 <= T::zero() {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= T::zero() && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= T::zero() && d1 >= T::zero() && d3 <= T::zero() {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= T::zero() && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= T::zero() && d2 >= T::zero() && d6 <= T::zero() {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= T::zero() && (d4 - d3) >= T::zero() && (d5 - d6) >= T::zero() {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = T::one() / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        a + ab * v + ac * w
    }
}

/// Intersection of a triangle with a ray, a line or a segment.
///
/// Uses the two-sided
/// [Möller-Trumbore algorithm](https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm)
/// for transversal queries. Queries in the plane of the triangle intersect it along a
/// segment (or a point). Degenerate triangles are never intersected.
impl<T: BHValue, Q: LinearQuery<T, 3>> Intersects<T, 3, Q> for Triangle<T> {
    #[allow(clippy::many_single_char_names)]
    fn intersection(&self, query: &Q) -> Option<Intersection<T, 3>> {
        if self.is_degenerate() {
            return None;
        }
        let tol = tolerance(magnitude([&self.a, &self.b, &self.c]));
        let a_to_b = self.b - self.a;
        let a_to_c = self.c - self.a;
        let normal = a_to_b.cross(&a_to_c);
        let direction = query.direction();
        let direction_squared = direction.dot(&direction);
        let normal_squared = normal.dot(&normal);

        if direction_squared <= T::zero() {
            // The query degenerates to its origin.
            let origin = query.origin();
            let closest = self.closest_point(&origin);
            return (distance_squared(&closest, &origin) <= tol * tol)
                .then_some(Intersection::Point(closest));
        }

        let a_to_origin = query.origin() - self.a;

        // u_vec lies in view plane
        let u_vec = direction.cross(&a_to_c);

        // The determinant corresponds to the parallelepiped volume:
        // det = 0 => [dir, a_to_b, a_to_c] not linearly independent
        let det = a_to_b.dot(&u_vec);

        if det * det <= T::epsilon() * normal_squared * direction_squared {
            // Parallel to the plane, possibly in it.
            let height = normal.dot(&a_to_origin);
            if height * height <= tol * tol * normal_squared {
                return self.coplanar_intersection(query, &normal, tol);
            }
            if det == T::zero() {
                return None;
            }
        }

        let inv_det = T::one() / det;

        // Calculate u parameter and test bounds
        let u = a_to_origin.dot(&u_vec) * inv_det;
        if u < T::zero() || u > T::one() {
            return None;
        }

        // Calculate v parameter and test bound
        let v_vec = a_to_origin.cross(&a_to_b);
        let v = direction.dot(&v_vec) * inv_det;
        if v < T::zero() || u + v > T::one() {
            return None;
        }

        let t = a_to_c.dot(&v_vec) * inv_det;
        query
            .contains_parameter(t)
            .then(|| Intersection::Point(query.point_at(t)))
    }
}
