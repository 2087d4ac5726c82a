//! An AABB tree over arbitrary geometric primitives, answering intersection and
//! closest point queries.
//!
//! ## About
//!
//! The [`AabbTree`] owns a collection of [`Primitive`]s (segments, triangles, faces or
//! edges of a [`TriangleMesh`], or any user type implementing the trait), builds a
//! bounding volume hierarchy over their boxes once, and then answers queries by descending
//! the hierarchy and pruning every subtree that cannot contribute:
//!
//! - intersection queries with a [`Ray`], [`Line`] or [`Segment`]: existence, counting,
//!   enumeration of the intersected primitives or of the intersections themselves, and
//!   "any" variants returning a single hit,
//! - closest point queries: closest point, closest point and primitive, squared distance,
//!   each with a hinted variant that only changes the cost of the search.
//!
//! A brute-force [`BruteForce`] oracle implements the same [`BoundingHierarchy`] contract
//! by scanning every primitive, and the [`differential`] module cross-checks both over
//! random queries.
//!
//! ## Example
//!
//! ```
//! use aabb_tree::{AabbTree, BoundingHierarchy, Element, Ray, Triangle};
//! use nalgebra::{Point3, Vector3};
//!
//! let triangles = (0..100).map(|i| {
//!     let x = i as f64;
//!     Triangle::new(
//!         Point3::new(x, 0.0, 0.0),
//!         Point3::new(x + 0.5, 1.0, 0.0),
//!         Point3::new(x, 1.0, 0.0),
//!     )
//! });
//! let tree: AabbTree<f64, 3, _> = AabbTree::build(Element::enumerate(triangles));
//!
//! let ray = Ray::new(Point3::new(10.2, 0.5, 1.0), Vector3::new(0.0, 0.0, -1.0));
//! assert_eq!(tree.any_intersected_primitive(&ray), Some(10));
//!
//! let closest = tree.closest_point_and_primitive(&Point3::new(42.2, 0.5, 3.0));
//! assert_eq!(closest.id, 42);
//! assert_eq!(tree.squared_distance(&Point3::new(42.2, 0.5, 3.0)), 9.0);
//! ```
//!
//! ## Features
//!
//! - `rayon` (default **enabled**) - adds [`AabbTree::build_par`] and [`bvh::Bvh::build_par`]
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for
//!   boxes, hierarchies, shapes and the differential tester configuration
//!

pub mod aabb;
pub mod bounding_hierarchy;
pub mod bvh;
pub mod differential;
pub mod mesh;
pub mod oracle;
pub mod point_query;
pub mod primitive;
pub mod ray;
pub mod shapes;
pub mod tree;
mod utils;

#[cfg(test)]
mod testbase;

pub use crate::aabb::{Aabb, Bounded, IntersectsAabb};
pub use crate::bounding_hierarchy::{
    BHValue, BoundingHierarchy, IntersectionAndPrimitive, PointAndPrimitive,
};
pub use crate::mesh::{
    EdgeIndex, EdgePrimitive, FaceIndex, FacePrimitive, MeshError, TriangleMesh,
};
pub use crate::oracle::BruteForce;
pub use crate::point_query::PointDistance;
pub use crate::primitive::{Element, Primitive};
pub use crate::ray::{Line, LinearQuery, Ray};
pub use crate::shapes::{Intersection, Intersects, Segment, Triangle};
pub use crate::tree::AabbTree;
