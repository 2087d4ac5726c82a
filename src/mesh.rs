//! An indexed triangle mesh and the primitives adapting its faces and edges.

use std::collections::HashSet;

use log::debug;
use nalgebra::Point3;
use thiserror::Error;

use crate::bounding_hierarchy::BHValue;
use crate::primitive::Primitive;
use crate::shapes::{Segment, Triangle};

/// Errors returned when assembling a [`TriangleMesh`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A face refers to a vertex that does not exist.
    #[error("face {face} refers to vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// The offending face.
        face: usize,
        /// The missing vertex index.
        vertex: usize,
        /// The number of vertices of the mesh.
        vertex_count: usize,
    },
}

/// The identity of a face of a [`TriangleMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceIndex(pub usize);

/// The identity of an undirected edge of a [`TriangleMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeIndex(pub usize);

/// A triangle mesh given by vertex positions and faces of three vertex indices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleMesh<T: BHValue> {
    vertices: Vec<Point3<T>>,
    faces: Vec<[usize; 3]>,
    edges: Vec<[usize; 2]>,
}

impl<T: BHValue> TriangleMesh<T> {
    /// Assembles a mesh, collecting its unique undirected edges in order of first appearance.
    ///
    /// # Examples
    /// ```
    /// use aabb_tree::TriangleMesh;
    /// use nalgebra::Point3;
    ///
    /// let square = TriangleMesh::new(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(1.0, 1.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2], [0, 2, 3]],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(square.faces().count(), 2);
    /// assert_eq!(square.edges().count(), 5);
    /// ```
    pub fn new(vertices: Vec<Point3<T>>, faces: Vec<[usize; 3]>) -> Result<Self, MeshError> {
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for (face_index, face) in faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|v| **v >= vertices.len()) {
                return Err(MeshError::VertexOutOfRange {
                    face: face_index,
                    vertex,
                    vertex_count: vertices.len(),
                });
            }
            for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                let edge = [face[i].min(face[j]), face[i].max(face[j])];
                if seen.insert(edge) {
                    edges.push(edge);
                }
            }
        }
        debug!(
            "assembled a mesh of {} vertices, {} faces and {} edges",
            vertices.len(),
            faces.len(),
            edges.len()
        );
        Ok(TriangleMesh {
            vertices,
            faces,
            edges,
        })
    }

    /// The vertex positions.
    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    /// Returns the number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the number of unique undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the triangle of face `face`.
    pub fn triangle(&self, face: FaceIndex) -> Triangle<T> {
        let [a, b, c] = self.faces[face.0];
        Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c])
    }

    /// Returns the segment of edge `edge`.
    pub fn segment(&self, edge: EdgeIndex) -> Segment<T, 3> {
        let [a, b] = self.edges[edge.0];
        Segment::new(self.vertices[a], self.vertices[b])
    }

    /// Returns a primitive for every face.
    pub fn faces(&self) -> impl ExactSizeIterator<Item = FacePrimitive<'_, T>> + '_ {
        (0..self.faces.len()).map(move |index| FacePrimitive {
            mesh: self,
            index: FaceIndex(index),
        })
    }

    /// Returns a primitive for every unique undirected edge.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = EdgePrimitive<'_, T>> + '_ {
        (0..self.edges.len()).map(move |index| EdgePrimitive {
            mesh: self,
            index: EdgeIndex(index),
        })
    }
}

/// A face of a [`TriangleMesh`], borrowing the mesh.
#[derive(Debug, Clone, Copy)]
pub struct FacePrimitive<'a, T: BHValue> {
    mesh: &'a TriangleMesh<T>,
    index: FaceIndex,
}

impl<T: BHValue> Primitive<T, 3> for FacePrimitive<'_, T> {
    type Id = FaceIndex;
    type Datum = Triangle<T>;

    fn id(&self) -> FaceIndex {
        self.index
    }

    fn datum(&self) -> Triangle<T> {
        self.mesh.triangle(self.index)
    }

    fn reference_point(&self) -> Point3<T> {
        self.mesh.vertices[self.mesh.faces[self.index.0][0]]
    }
}

/// An undirected edge of a [`TriangleMesh`], borrowing the mesh.
#[derive(Debug, Clone, Copy)]
pub struct EdgePrimitive<'a, T: BHValue> {
    mesh: &'a TriangleMesh<T>,
    index: EdgeIndex,
}

impl<T: BHValue> Primitive<T, 3> for EdgePrimitive<'_, T> {
    type Id = EdgeIndex;
    type Datum = Segment<T, 3>;

    fn id(&self) -> EdgeIndex {
        self.index
    }

    fn datum(&self) -> Segment<T, 3> {
        self.mesh.segment(self.index)
    }

    fn reference_point(&self) -> Point3<T> {
        self.mesh.vertices[self.mesh.edges[self.index.0][0]]
    }
}
