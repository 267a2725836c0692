//! In-memory triangle mesh.
//!
//! Order of vertices and triangles is significant: two meshes are equal only
//! if they hold the same values in the same order. Coordinates compare by
//! exact value, there is no tolerance.

use std::fmt::{ self, Display, Formatter };

use serde::{ Deserialize, Serialize };

/// A vertex position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vertex { x, y, z }
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Three vertex indices.
///
/// Indices are stored as found; they are not checked against the vertex count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Triangle {
    pub a: i32,
    pub b: i32,
    pub c: i32,
}

impl Triangle {
    pub fn new(a: i32, b: i32, c: i32) -> Self {
        Triangle { a, b, c }
    }
}

impl Display for Triangle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}, {}, {}", self.a, self.b, self.c)
    }
}

/// Vertices plus the triangles indexing into them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub triangles: Vec<Triangle>,
    pub vertices: Vec<Vertex>,
}

/// Largest strip [`TriangleMesh::synthesize`] builds. Its last vertex index
/// is `i32::MAX - 1`.
pub const MAX_STRIP_TRIANGLES: i32 = i32::MAX - 2;

impl TriangleMesh {
    pub fn new(triangles: Vec<Triangle>, vertices: Vec<Vertex>) -> Self {
        TriangleMesh { triangles, vertices }
    }

    /// Builds a deterministic strip of `num_triangles` triangles.
    ///
    /// Vertex `i` is `(i/2, (i+1)/2, (i+2)/2)` and triangle `i` is
    /// `(i, i+1, i+2)`, so `num_triangles + 2` vertices are generated. All
    /// coordinates are multiples of one half and therefore exact in `f32`
    /// for any realistic size. Negative counts give an empty strip and counts
    /// above [`MAX_STRIP_TRIANGLES`] are clamped.
    pub fn synthesize(num_triangles: i32) -> Self {
        let num_triangles = num_triangles.clamp(0, MAX_STRIP_TRIANGLES);
        let vertices = (0..num_triangles as usize + 2)
            .map(|i| {
                let i = i as f32;
                Vertex::new(i / 2.0, (i + 1.0) / 2.0, (i + 2.0) / 2.0)
            })
            .collect();
        let triangles = (0..num_triangles)
            .map(|i| Triangle::new(i, i + 1, i + 2))
            .collect();
        TriangleMesh { triangles, vertices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesize_small() {
        let m = TriangleMesh::synthesize(2);
        assert_eq!(m.vertices, vec![
            Vertex::new(0.0, 0.5, 1.0),
            Vertex::new(0.5, 1.0, 1.5),
            Vertex::new(1.0, 1.5, 2.0),
            Vertex::new(1.5, 2.0, 2.5),
        ]);
        assert_eq!(m.triangles, vec![Triangle::new(0, 1, 2), Triangle::new(1, 2, 3)]);
    }

    #[test]
    fn synthesize_empty() {
        let m = TriangleMesh::synthesize(0);
        assert_eq!(m.vertices.len(), 2);
        assert!(m.triangles.is_empty());
        assert_eq!(TriangleMesh::synthesize(-5), m);
    }

    #[test]
    fn largest_strip_indices_fit_i32() {
        let last = MAX_STRIP_TRIANGLES - 1;
        assert_eq!(last.checked_add(2), Some(i32::MAX - 1));
        assert!(usize::try_from(MAX_STRIP_TRIANGLES).unwrap().checked_add(2).is_some());
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = TriangleMesh::new(vec![], vec![Vertex::new(0.0, 0.0, 0.0), Vertex::new(1.0, 1.0, 1.0)]);
        let b = TriangleMesh::new(vec![], vec![Vertex::new(1.0, 1.0, 1.0), Vertex::new(0.0, 0.0, 0.0)]);
        assert_ne!(a, b);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Vertex::new(0.5, -1.0, 2.0)), "(0.5, -1, 2)");
        assert_eq!(format!("{}", Triangle::new(0, 1, 2)), "0, 1, 2");
    }
}
