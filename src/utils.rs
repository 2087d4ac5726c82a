//! Utilities module.

use nalgebra::{Point, Scalar};

use crate::aabb::{Aabb, Bounded};
use crate::bounding_hierarchy::BHValue;

/// Fast floating point minimum.  This function matches the semantics of
///
/// ```no_compile
/// if x < y { x } else { y }
/// ```
///
/// which has efficient instruction sequences on many platforms (1 instruction on x86).  For most
/// values, it matches the semantics of `x.min(y)`; the special cases are:
///
/// ```text
/// min(-0.0, +0.0); +0.0
/// min(+0.0, -0.0): -0.0
/// min( NaN,  1.0):  1.0
/// min( 1.0,  NaN):  NaN
/// ```
///
/// Note: This exists because [`std::cmp::min`] requires Ord which floating point types do not satisfy
#[inline(always)]
pub(crate) fn fast_min<T: Scalar + Copy + PartialOrd>(x: T, y: T) -> T {
    if x < y {
        x
    } else {
        y
    }
}

/// Fast floating point maximum.  This function matches the semantics of
///
/// ```no_compile
/// if x > y { x } else { y }
/// ```
///
/// See [`fast_min`] for the special cases.
#[inline(always)]
pub(crate) fn fast_max<T: Scalar + Copy + PartialOrd>(x: T, y: T) -> T {
    if x > y {
        x
    } else {
        y
    }
}

/// Converts an `f64` constant into `T`.
#[inline(always)]
pub(crate) fn real<T: BHValue>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Squared euclidean distance between two points.
#[inline]
pub(crate) fn distance_squared<T: BHValue, const D: usize>(a: &Point<T, D>, b: &Point<T, D>) -> T {
    let diff = a - b;
    diff.dot(&diff)
}

/// Absolute tolerance of the geometric predicates for coordinates of magnitude `scale`.
///
/// Boxes are padded by twice this value before being tested against linear queries, so
/// that every hit reported by a predicate lies in the padded box of its primitive.
#[inline]
pub(crate) fn tolerance<T: BHValue>(scale: T) -> T {
    T::epsilon() * real::<T>(64.0) * fast_max(scale, T::one())
}

/// Largest absolute coordinate among `points`.
pub(crate) fn magnitude<'a, T: BHValue, const D: usize>(
    points: impl IntoIterator<Item = &'a Point<T, D>>,
) -> T {
    points
        .into_iter()
        .flat_map(|p| p.iter())
        .fold(T::zero(), |acc, x| fast_max(acc, x.abs()))
}

/// Defines a Bucket utility object. Used to store the properties of shape-partitions
/// in the [`Bvh`] build procedure using SAH.
///
/// [`Bvh`]: ../bvh/struct.Bvh.html
#[derive(Clone, Copy)]
pub(crate) struct Bucket<T: BHValue, const D: usize> {
    /// The number of shapes in this `Bucket`.
    pub size: usize,

    /// The joint [`Aabb`] of the shapes in this [`Bucket`].
    pub aabb: Aabb<T, D>,

    /// The [`Aabb`] of the centers of the shapes in this [`Bucket`].
    pub centroid: Aabb<T, D>,
}

impl<T: BHValue, const D: usize> Bucket<T, D> {
    /// Returns an empty bucket.
    pub fn empty() -> Bucket<T, D> {
        Bucket {
            size: 0,
            aabb: Aabb::empty(),
            centroid: Aabb::empty(),
        }
    }

    /// Extend this [`Bucket`] by a shape with the given [`Aabb`].
    pub fn add_aabb(&mut self, aabb: &Aabb<T, D>) {
        self.size += 1;
        self.aabb = self.aabb.join(aabb);
        self.centroid.grow_mut(&aabb.center());
    }

    /// Join the contents of two [`Bucket`]'s.
    pub fn join_bucket(a: Bucket<T, D>, b: &Bucket<T, D>) -> Bucket<T, D> {
        Bucket {
            size: a.size + b.size,
            aabb: a.aabb.join(&b.aabb),
            centroid: a.centroid.join(&b.centroid),
        }
    }
}

/// Returns the joint [`Aabb`] of the indexed shapes and the [`Aabb`] of their centers.
pub(crate) fn joint_aabb_of_shapes<T: BHValue, const D: usize, Shape: Bounded<T, D>>(
    indices: &[usize],
    shapes: &[Shape],
) -> (Aabb<T, D>, Aabb<T, D>) {
    let mut aabb = Aabb::empty();
    let mut centroid = Aabb::empty();
    for index in indices {
        let shape_aabb = shapes[*index].aabb();
        aabb.join_mut(&shape_aabb);
        centroid.grow_mut(&shape_aabb.center());
    }
    (aabb, centroid)
}
