//! CPU-side mesh representation produced by the loader.

use bytemuck::{Pod, Zeroable};

/// Floats per interleaved vertex: 3 position + 3 color.
pub const FLOATS_PER_VERTEX: usize = 6;

/// Vertex with position/color. Position is in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// Expanded (one vertex per face corner) triangle list.
///
/// `indices` are 0-based indices into the position list of the source file,
/// kept alongside the already-expanded vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Flat `[x, y, z, r, g, b, ...]` view of the vertices.
    pub fn interleaved(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of vertices; equals `interleaved().len() / FLOATS_PER_VERTEX`.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Returns `true` if there is at least one complete triangle.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.len() % 3 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_view_matches_vertex_count() {
        let mesh = MeshBuffer::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ],
            vec![0, 1, 2],
        );
        assert!(mesh.is_valid());
        assert_eq!(mesh.interleaved().len(), 18);
        assert_eq!(
            mesh.interleaved().len() / FLOATS_PER_VERTEX,
            mesh.vertex_count() as usize
        );
        assert_eq!(&mesh.interleaved()[6..12], &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn empty_mesh_is_invalid() {
        assert!(!MeshBuffer::default().is_valid());
    }
}
