//! Renderer-facing projection of decoded meshes.
//!
//! Splits [`MeshData`] into per-attribute buffers, a flat index buffer and
//! draw groups. The projection copies values as decoded; nothing is
//! recomputed or reordered.

use crate::mesh::MeshData;

/// Floats per vertex in [`RenderMesh::interleaved`]: position, normal, color.
pub const INTERLEAVED_STRIDE: usize = 10;

/// One draw call over a range of the index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshGroup {
    /// First index-buffer element.
    pub start: u32,
    /// Number of index-buffer elements.
    pub count: u32,
    /// Shader id of the sub-mesh.
    pub material: u16,
}

/// Attribute-split vertex buffers ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub groups: Vec<MeshGroup>,
}

impl RenderMesh {
    /// Vertex data interleaved as `[px, py, pz, nx, ny, nz, r, g, b, a]`.
    #[must_use]
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.positions.len() * INTERLEAVED_STRIDE);
        for ((position, normal), color) in self.positions.iter().zip(&self.normals).zip(&self.colors) {
            out.extend_from_slice(position);
            out.extend_from_slice(normal);
            out.extend_from_slice(color);
        }
        out
    }
}

impl MeshData {
    /// Project into renderer buffers.
    #[must_use]
    pub fn to_render_mesh(&self) -> RenderMesh {
        RenderMesh {
            positions: self.vertices.iter().map(|v| v.position).collect(),
            normals: self.vertices.iter().map(|v| v.normal).collect(),
            colors: self.vertices.iter().map(|v| v.color).collect(),
            indices: self
                .triangles
                .iter()
                .flat_map(|t| t.vertices.map(u32::from))
                .collect(),
            groups: self
                .sub_meshes
                .meshes
                .iter()
                .map(|sub| MeshGroup {
                    start: sub.start_index,
                    count: sub.index_count(),
                    material: sub.shader_id,
                })
                .collect(),
        }
    }
}

impl From<&MeshData> for RenderMesh {
    fn from(mesh: &MeshData) -> Self {
        mesh.to_render_mesh()
    }
}
