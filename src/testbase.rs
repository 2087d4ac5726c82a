//! Common utilities shared by unit tests.
#![cfg(test)]

use std::io::BufRead;

use nalgebra::{Point, SVector};
use obj::raw::object::Polygon;
use obj::raw::parse_obj;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aabb::{Aabb, Bounded};
use crate::bvh::Bvh;
use crate::mesh::TriangleMesh;
use crate::ray::Ray;
use crate::shapes::Triangle;

/// Point type for testing.
pub type TPoint3 = Point<f64, 3>;

/// Vector type for testing.
pub type TVector3 = SVector<f64, 3>;

/// Ray type for testing.
pub type TRay3 = Ray<f64, 3>;

/// Aabb type for testing.
pub type TAabb3 = Aabb<f64, 3>;

/// Bvh type for testing.
pub type TBvh3 = Bvh<f64, 3>;

/// A vector represented as a tuple
pub type TupleVec = (f64, f64, f64);

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e6 to 10e6
/// A small enough range for the geometric predicates to stay well conditioned
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (-10e6_f64..10e6_f64, -10e6_f64..10e6_f64, -10e6_f64..10e6_f64)
}

/// Generate a `TupleVec` for [`proptest::strategy::Strategy`] from -10e30 to 10e30
/// A small enough range to prevent `f64::MAX` ranges from breaking certain tests
pub fn tuplevec_large_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e30_f64..10e30_f64,
        -10e30_f64..10e30_f64,
        -10e30_f64..10e30_f64,
    )
}

/// Convert a `TupleVec` to a [`TPoint3`].
pub fn tuple_to_point(tpl: &TupleVec) -> TPoint3 {
    TPoint3::new(tpl.0, tpl.1, tpl.2)
}

/// Convert a `TupleVec` to a [`TVector3`].
pub fn tuple_to_vector(tpl: &TupleVec) -> TVector3 {
    TVector3::new(tpl.0, tpl.1, tpl.2)
}

/// Define some `Bounded` structure.
pub struct UnitBox {
    pub id: i32,
    pub pos: TPoint3,
}

impl UnitBox {
    pub fn new(id: i32, pos: TPoint3) -> UnitBox {
        UnitBox { id, pos }
    }
}

/// `UnitBox`'s `Aabb`s are unit `Aabb`s centered on the box's position.
impl Bounded<f64, 3> for UnitBox {
    fn aabb(&self) -> TAabb3 {
        let min = self.pos + TVector3::new(-0.5, -0.5, -0.5);
        let max = self.pos + TVector3::new(0.5, 0.5, 0.5);
        TAabb3::with_bounds(min, max)
    }
}

/// Generate 21 `UnitBox`s along the X axis centered on whole numbers (-10,9,..,10).
/// The index is set to the rounded x-coordinate of the box center.
pub fn generate_aligned_boxes() -> Vec<UnitBox> {
    // Create 21 boxes along the x-axis
    let mut shapes = Vec::new();
    for x in -10..11 {
        shapes.push(UnitBox::new(x, TPoint3::new(x as f64, 0.0, 0.0)));
    }
    shapes
}

/// Returns `n` deterministic random points in the cube of half size `half_extent` around
/// the origin.
pub fn random_points(n: usize, seed: u64, half_extent: f64) -> Vec<TPoint3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            TPoint3::new(
                rng.random_range(-half_extent..half_extent),
                rng.random_range(-half_extent..half_extent),
                rng.random_range(-half_extent..half_extent),
            )
        })
        .collect()
}

/// Returns `n` deterministic random triangles of size up to 2 scattered in the cube of
/// half size 10 around the origin. Every tenth triangle is degenerate.
pub fn random_triangle_soup(n: usize, seed: u64) -> Vec<Triangle<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = |rng: &mut StdRng| {
        TVector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        )
    };
    (0..n)
        .map(|i| {
            let center = TPoint3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let a = center + offset(&mut rng);
            let b = center + offset(&mut rng);
            let c = if i % 10 == 9 {
                // Collinear with a and b.
                a + (b - a) * 0.5
            } else {
                center + offset(&mut rng)
            };
            Triangle::new(a, b, c)
        })
        .collect()
}

/// Creates a unit size cube centered at `pos` and pushes the triangles to `shapes`.
pub fn push_cube(pos: TPoint3, shapes: &mut Vec<Triangle<f64>>) {
    let top_front_right = pos + TVector3::new(0.5, 0.5, -0.5);
    let top_back_right = pos + TVector3::new(0.5, 0.5, 0.5);
    let top_back_left = pos + TVector3::new(-0.5, 0.5, 0.5);
    let top_front_left = pos + TVector3::new(-0.5, 0.5, -0.5);
    let bottom_front_right = pos + TVector3::new(0.5, -0.5, -0.5);
    let bottom_back_right = pos + TVector3::new(0.5, -0.5, 0.5);
    let bottom_back_left = pos + TVector3::new(-0.5, -0.5, 0.5);
    let bottom_front_left = pos + TVector3::new(-0.5, -0.5, -0.5);

    let faces = [
        [top_back_right, top_front_right, top_front_left],
        [top_front_left, top_back_left, top_back_right],
        [bottom_front_left, bottom_front_right, bottom_back_right],
        [bottom_back_right, bottom_back_left, bottom_front_left],
        [top_back_left, top_front_left, bottom_front_left],
        [bottom_front_left, bottom_back_left, top_back_left],
        [bottom_front_right, top_front_right, top_back_right],
        [top_back_right, bottom_back_right, bottom_front_right],
        [top_front_left, top_front_right, bottom_front_right],
        [bottom_front_right, bottom_front_left, top_front_left],
        [bottom_back_right, top_back_right, top_back_left],
        [top_back_left, bottom_back_left, bottom_back_right],
    ];
    shapes.extend(faces.iter().map(|[a, b, c]| Triangle::new(*a, *b, *c)));
}

/// Creates `n` deterministic random unit cubes on the integer grid of half size 20.
/// Returns the `Vec` of surface `Triangle`s.
pub fn create_n_cubes(n: usize, seed: u64) -> Vec<Triangle<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shapes = Vec::with_capacity(12 * n);
    for _ in 0..n {
        let pos = TPoint3::new(
            rng.random_range(-20..=20) as f64,
            rng.random_range(-20..=20) as f64,
            rng.random_range(-20..=20) as f64,
        );
        push_cube(pos, &mut shapes);
    }
    shapes
}

/// A regular tetrahedron-like mesh with 4 faces and 6 edges.
pub fn tetrahedron() -> TriangleMesh<f64> {
    let vertices = vec![
        TPoint3::new(0.0, 0.0, 0.0),
        TPoint3::new(1.0, 0.0, 0.0),
        TPoint3::new(0.0, 1.0, 0.0),
        TPoint3::new(0.0, 0.0, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
    TriangleMesh::new(vertices, faces).unwrap()
}

/// A closed unit sphere around the origin with `slices` meridians and `stacks` parallels.
pub fn sphere_mesh(slices: usize, stacks: usize) -> TriangleMesh<f64> {
    let mut vertices = vec![TPoint3::new(0.0, 0.0, 1.0)];
    for stack in 1..stacks {
        let polar = std::f64::consts::PI * stack as f64 / stacks as f64;
        for slice in 0..slices {
            let azimuth = 2.0 * std::f64::consts::PI * slice as f64 / slices as f64;
            vertices.push(TPoint3::new(
                polar.sin() * azimuth.cos(),
                polar.sin() * azimuth.sin(),
                polar.cos(),
            ));
        }
    }
    vertices.push(TPoint3::new(0.0, 0.0, -1.0));
    let south = vertices.len() - 1;
    let ring = |stack: usize, slice: usize| 1 + (stack - 1) * slices + slice % slices;

    let mut faces = Vec::new();
    for slice in 0..slices {
        faces.push([0, ring(1, slice), ring(1, slice + 1)]);
        faces.push([south, ring(stacks - 1, slice + 1), ring(stacks - 1, slice)]);
    }
    for stack in 1..stacks - 1 {
        for slice in 0..slices {
            let (a, b) = (ring(stack, slice), ring(stack, slice + 1));
            let (c, d) = (ring(stack + 1, slice), ring(stack + 1, slice + 1));
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }
    TriangleMesh::new(vertices, faces).unwrap()
}

/// Loads a triangulated mesh from OBJ data, splitting polygons into triangle fans.
pub fn load_obj_mesh(input: impl BufRead) -> TriangleMesh<f64> {
    let raw = parse_obj(input).unwrap();
    let vertices = raw
        .positions
        .iter()
        .map(|p| TPoint3::new(p.0 as f64, p.1 as f64, p.2 as f64))
        .collect();
    let mut faces = Vec::new();
    for polygon in raw.polygons {
        let indices = match polygon {
            Polygon::P(vec) => vec,
            Polygon::PT(vec) | Polygon::PN(vec) => vec.iter().map(|vertex| vertex.0).collect(),
            Polygon::PTN(vec) => vec.iter().map(|vertex| vertex.0).collect(),
        };
        for window in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[window], indices[window + 1]]);
        }
    }
    TriangleMesh::new(vertices, faces).unwrap()
}

#[test]
fn test_generated_meshes_are_closed() {
    // Every edge of a closed triangle mesh is shared by two faces: E = 3F / 2.
    let sphere = sphere_mesh(16, 8);
    assert_eq!(sphere.edge_count() * 2, sphere.face_count() * 3);
    assert_eq!(sphere.vertices().len(), 2 + 16 * 7);
    assert!(sphere.faces().all(|f| !crate::primitive::Primitive::datum(&f).is_degenerate()));

    let cube = load_obj_mesh(
        "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\n\
         f 1 4 3 2\nf 5 6 7 8\nf 1 2 6 5\nf 2 3 7 6\nf 3 4 8 7\nf 4 1 5 8\n"
            .as_bytes(),
    );
    assert_eq!(cube.face_count(), 12);
    assert_eq!(cube.edge_count() * 2, cube.face_count() * 3);
}

#[test]
fn test_tuple_conversions() {
    let tpl = (1.0, -2.0, 3.5);
    assert_eq!(tuple_to_point(&tpl).coords, tuple_to_vector(&tpl));
    assert_eq!(create_n_cubes(3, 0).len(), 36);
}
