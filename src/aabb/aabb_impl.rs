//! Axis Aligned Bounding Boxes.

use core::fmt;
use core::ops::Index;

use nalgebra::{Point, SVector};

use crate::bounding_hierarchy::BHValue;
use crate::utils::{fast_max, fast_min, real};

/// [`Aabb`] struct.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<T: BHValue, const D: usize> {
    /// Minimum coordinates
    pub min: Point<T, D>,

    /// Maximum coordinates
    pub max: Point<T, D>,
}

impl<T: BHValue, const D: usize> fmt::Display for Aabb<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Min bound: {}; Max bound: {}", self.min, self.max)
    }
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
///
/// [`Aabb`]: struct.Aabb.html
///
pub trait Bounded<T: BHValue, const D: usize> {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::{Aabb, Bounded};
    /// use nalgebra::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded<f32, 3> for Something {
    ///     fn aabb(&self) -> Aabb<f32, 3> {
    ///         let point1 = Point3::new(0.0,0.0,0.0);
    ///         let point2 = Point3::new(1.0,1.0,1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0,0.0,0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0,1.0,1.0)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    fn aabb(&self) -> Aabb<T, D>;
}

impl<T: BHValue, const D: usize> Aabb<T, D> {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0,-1.0,-1.0), Point3::new(1.0,1.0,1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn with_bounds(min: Point<T, D>, max: Point<T, D>) -> Self {
        Aabb { min, max }
    }

    /// Creates a new empty [`Aabb`]. Its bounds are inverted infinities, so that joining
    /// it with anything yields that thing.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::<f32, 3>::empty();
    /// assert!(aabb.is_empty());
    /// assert!(!aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn empty() -> Self {
        Self {
            min: Point::from(SVector::<T, D>::repeat(T::infinity())),
            max: Point::from(SVector::<T, D>::repeat(T::neg_infinity())),
        }
    }

    /// Creates a new infinite [`Aabb`], containing every finite point.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn infinite() -> Self {
        Self {
            min: Point::from(SVector::<T, D>::repeat(T::neg_infinity())),
            max: Point::from(SVector::<T, D>::repeat(T::infinity())),
        }
    }

    /// Returns true if the [`Point`] is inside the [`Aabb`]. Points on the boundary are inside.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 0.0, -1.0)));
    /// assert!(!aabb.contains(&Point3::new(1.5, 0.0, 0.0)));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn contains(&self, p: &Point<T, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns true if the [`Point`] is approximately inside the [`Aabb`]
    /// with respect to some `epsilon`.
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn approx_contains_eps(&self, p: &Point<T, D>, epsilon: T) -> bool {
        (0..D).all(|i| (p[i] - self.min[i]) > -epsilon && (p[i] - self.max[i]) < epsilon)
    }

    /// Returns true if the `other` [`Aabb`] is approximately inside this [`Aabb`]
    /// with respect to some `epsilon`.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn approx_contains_aabb_eps(&self, other: &Aabb<T, D>, epsilon: T) -> bool {
        self.approx_contains_eps(&other.min, epsilon)
            && self.approx_contains_eps(&other.max, epsilon)
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    /// The result is the convex hull of the both [`Aabb`]s.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0,0.0,0.0), Point3::new(-100.0,1.0,1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0,0.0,0.0), Point3::new(101.0,1.0,1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert_eq!(joint.min, Point3::new(-101.0, 0.0, 0.0));
    /// assert_eq!(joint.max, Point3::new(101.0, 1.0, 1.0));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn join(&self, other: &Aabb<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(
            self.min.coords.zip_map(&other.min.coords, fast_min).into(),
            self.max.coords.zip_map(&other.max.coords, fast_max).into(),
        )
    }

    /// Mutable version of [`Aabb::join`].
    ///
    /// [`Aabb::join`]: struct.Aabb.html
    ///
    pub fn join_mut(&mut self, other: &Aabb<T, D>) {
        *self = self.join(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point`] `other`.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::empty()
    ///     .grow(&Point3::new(1.0, 2.0, 3.0))
    ///     .grow(&Point3::new(-1.0, 0.0, 5.0));
    ///
    /// assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 3.0));
    /// assert_eq!(aabb.max, Point3::new(1.0, 2.0, 5.0));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn grow(&self, other: &Point<T, D>) -> Aabb<T, D> {
        Aabb::with_bounds(
            self.min.coords.zip_map(&other.coords, fast_min).into(),
            self.max.coords.zip_map(&other.coords, fast_max).into(),
        )
    }

    /// Mutable version of [`Aabb::grow`].
    ///
    /// [`Aabb::grow`]: struct.Aabb.html
    ///
    pub fn grow_mut(&mut self, other: &Point<T, D>) {
        *self = self.grow(other);
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Bounded`]
    /// `other`.
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Bounded`]: trait.Bounded.html
    ///
    pub fn join_bounded<B: Bounded<T, D>>(&self, other: &B) -> Aabb<T, D> {
        self.join(&other.aabb())
    }

    /// Returns the size of this [`Aabb`] in all dimensions.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn size(&self) -> SVector<T, D> {
        self.max - self.min
    }

    /// Returns half of the size of this [`Aabb`] in all dimensions.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn half_size(&self) -> SVector<T, D> {
        self.size() * real::<T>(0.5)
    }

    /// Returns the center [`Point`] of the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -2.0, 0.0), Point3::new(1.0, 4.0, 2.0));
    /// assert_eq!(aabb.center(), Point3::new(0.0, 1.0, 1.0));
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn center(&self) -> Point<T, D> {
        self.min + self.half_size()
    }

    /// An empty [`Aabb`] is an [`Aabb`] where the lower bound is greater than
    /// the upper bound in at least one component.
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Returns the total surface area of this [`Aabb`]: the sum, over every axis, of twice
    /// the product of the extents along the other axes.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(aabb.surface_area(), 22.0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn surface_area(&self) -> T {
        let size = self.size();
        let mut area = T::zero();
        for i in 0..D {
            let mut face = T::one();
            for j in 0..D {
                if i != j {
                    face *= size[j];
                }
            }
            area += face;
        }
        area * real::<T>(2.0)
    }

    /// Returns the volume of this [`Aabb`].
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn volume(&self) -> T {
        self.size().iter().fold(T::one(), |volume, extent| volume * *extent)
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-100.0,0.0,0.0), Point3::new(100.0,0.1,0.1));
    /// assert_eq!(aabb.largest_axis(), 0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn largest_axis(&self) -> usize {
        let size = self.size();
        let mut axis = 0;
        for i in 1..D {
            if size[i] > size[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Returns the [`Point`] of the [`Aabb`] closest to `point`.
    /// Points inside the [`Aabb`] are returned unchanged.
    ///
    /// [`Aabb`]: struct.Aabb.html
    /// [`Point`]: nalgebra::Point
    ///
    pub fn closest_point(&self, point: &Point<T, D>) -> Point<T, D> {
        let mut closest = *point;
        for i in 0..D {
            closest[i] = fast_min(fast_max(point[i], self.min[i]), self.max[i]);
        }
        closest
    }

    /// Returns the squared distance from `point` to the [`Aabb`]: a lower bound of the
    /// squared distance from `point` to anything inside it. Zero for points inside.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min_distance_squared(&Point3::new(3.0, 1.5, 0.5)), 4.25);
    /// assert_eq!(aabb.min_distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
    /// ```
    ///
    /// [`Aabb`]: struct.Aabb.html
    ///
    pub fn min_distance_squared(&self, point: &Point<T, D>) -> T {
        let mut distance_squared = T::zero();
        for i in 0..D {
            let excess = if point[i] < self.min[i] {
                self.min[i] - point[i]
            } else if point[i] > self.max[i] {
                point[i] - self.max[i]
            } else {
                continue;
            };
            distance_squared += excess * excess;
        }
        distance_squared
    }
}

impl<T: BHValue, const D: usize> Default for Aabb<T, D> {
    fn default() -> Aabb<T, D> {
        Aabb::empty()
    }
}

/// Make [`Aabb`]s indexable. `aabb[0]` gives a reference to the minimum bound.
/// All other indices return a reference to the maximum bound.
///
/// [`Aabb`]: struct.Aabb.html
///
impl<T: BHValue, const D: usize> Index<usize> for Aabb<T, D> {
    type Output = Point<T, D>;

    fn index(&self, index: usize) -> &Point<T, D> {
        if index == 0 {
            &self.min
        } else {
            &self.max
        }
    }
}

/// Implementation of [`Bounded`] for [`Aabb`].
///
/// [`Aabb`]: struct.Aabb.html
/// [`Bounded`]: trait.Bounded.html
///
impl<T: BHValue, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        *self
    }
}

/// Implementation of [`Bounded`] for [`Point`]s: a zero-volume [`Aabb`].
///
/// [`Bounded`]: trait.Bounded.html
/// [`Point`]: nalgebra::Point
///
impl<T: BHValue, const D: usize> Bounded<T, D> for Point<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::with_bounds(*self, *self)
    }
}
