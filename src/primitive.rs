//! The [`Primitive`] trait, which adapts user geometry to the [`AabbTree`], and the
//! [`Element`] adapter for owned geometry.
//!
//! [`AabbTree`]: ../tree/struct.AabbTree.html

use std::fmt::Debug;
use std::hash::Hash;

use nalgebra::Point;

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;
use crate::point_query::PointDistance;

/// An element of the collection a tree is built over.
///
/// A primitive has a stable identity, handed back by the queries, and a datum: the geometry
/// the predicates are evaluated on. Primitives are static, a tree has to be rebuilt when
/// they change.
pub trait Primitive<T: BHValue, const D: usize> {
    /// The identity of a primitive. Only compared for equality.
    type Id: Copy + Eq + Hash + Debug;

    /// The geometry of a primitive.
    type Datum: Bounded<T, D> + PointDistance<T, D>;

    /// Returns the identity of this primitive.
    fn id(&self) -> Self::Id;

    /// Returns the geometry of this primitive.
    fn datum(&self) -> Self::Datum;

    /// Returns some point lying on this primitive.
    fn reference_point(&self) -> Point<T, D> {
        let datum = self.datum();
        datum.closest_point(&datum.aabb().center())
    }

    /// Returns the bounding box of this primitive.
    fn aabb(&self) -> Aabb<T, D> {
        self.datum().aabb()
    }
}

/// Owned geometry tagged with an identity.
///
/// # Examples
/// ```
/// use aabb_tree::{Element, Primitive, Segment};
/// use nalgebra::Point3;
///
/// let segments = vec![
///     Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
///     Segment::new(Point3::new(0.0, 1.0, 0.0), Point3::new(1.0, 1.0, 0.0)),
/// ];
/// let elements = Element::enumerate(segments).collect::<Vec<_>>();
///
/// assert_eq!(elements[1].id(), 1);
/// assert_eq!(elements[1].reference_point(), Point3::new(0.5, 1.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element<G, Id> {
    /// The geometry.
    pub geometry: G,
    /// The identity.
    pub id: Id,
}

impl<G, Id> Element<G, Id> {
    /// Tags `geometry` with `id`.
    pub fn new(geometry: G, id: Id) -> Self {
        Element { geometry, id }
    }
}

impl<G> Element<G, usize> {
    /// Tags every geometry of `geometries` with its position in the sequence.
    pub fn enumerate(
        geometries: impl IntoIterator<Item = G>,
    ) -> impl Iterator<Item = Element<G, usize>> {
        geometries
            .into_iter()
            .enumerate()
            .map(|(id, geometry)| Element::new(geometry, id))
    }
}

impl<T, const D: usize, G, Id> Primitive<T, D> for Element<G, Id>
where
    T: BHValue,
    G: Bounded<T, D> + PointDistance<T, D> + Clone,
    Id: Copy + Eq + Hash + Debug,
{
    type Id = Id;
    type Datum = G;

    fn id(&self) -> Id {
        self.id
    }

    fn datum(&self) -> G {
        self.geometry.clone()
    }

    fn aabb(&self) -> Aabb<T, D> {
        self.geometry.aabb()
    }
}
