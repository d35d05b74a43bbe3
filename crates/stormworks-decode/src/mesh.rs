//! Binary `.mesh` decoding.
//!
//! # Format
//!
//! All values are little-endian.
//!
//! - Bytes 0-7: header (`"mesh"` followed by a version word)
//! - u16 vertex count, then 4 reserved bytes
//! - Vertex records, 28 bytes each:
//!   - 3 × f32 position
//!   - 4 × u8 RGBA color
//!   - 3 × f32 normal
//! - u32 index field; the triangle count is `field * 2 / 6`
//! - Triangles, 3 × u16 each
//! - u16 sub-mesh count, then per sub-mesh:
//!   - u32 start index, u32 end index, 2 padding bytes
//!   - u16 shader id
//!   - 3 × f32 culling max, 3 × f32 culling min
//!   - 2 padding bytes
//!   - u16 identifier length; the length field, identifier and trailing
//!     padding span `length + 16` bytes
//!
//! The source format is left-handed, so the x components of positions and
//! normals are negated on read.

use crate::error::{DecodeError, DecodeResult};

/// Magic bytes at the start of every mesh file.
pub const MESH_MAGIC: &[u8; 4] = b"mesh";

/// Length of the fixed file header.
pub const HEADER_LEN: usize = 8;

/// Size of one vertex record.
pub const VERTEX_STRIDE: usize = 28;

const TRIANGLE_STRIDE: usize = 6;

/// A decoded vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    /// RGBA, normalized to `0.0..=1.0`.
    pub color: [f32; 4],
    pub normal: [f32; 3],
}

/// Three indices into [`MeshData::vertices`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [u16; 3],
}

/// Axis-aligned culling bounds of a sub-mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CullingArea {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// A range of the index buffer drawn with one shader.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubMesh {
    /// First index-buffer element (3 per triangle).
    pub start_index: u32,
    /// One past the last index-buffer element.
    pub end_index: u32,
    pub shader_id: u16,
    pub culling_area: CullingArea,
}

impl SubMesh {
    /// Number of index-buffer elements covered.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.end_index.saturating_sub(self.start_index)
    }
}

/// The sub-mesh table as stored in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMeshTable {
    pub count: u16,
    pub meshes: Vec<SubMesh>,
}

/// A decoded mesh file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertex_count: u16,
    pub vertices: Vec<Vertex>,
    /// Raw index field the triangle count is derived from.
    pub edge_buffer: u32,
    pub triangles: Vec<Triangle>,
    pub sub_meshes: SubMeshTable,
}

impl MeshData {
    /// Number of index-buffer elements (three per triangle).
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.triangles.len() * 3
    }

    /// Check triangle indices and sub-mesh ranges against the decoded data.
    pub fn validate(&self) -> DecodeResult<()> {
        let vertex_count = usize::from(self.vertex_count);
        for triangle in &self.triangles {
            for &index in &triangle.vertices {
                if usize::from(index) >= vertex_count {
                    return Err(DecodeError::IndexOutOfBounds {
                        index: usize::from(index),
                        len: vertex_count,
                    });
                }
            }
        }

        let index_count = self.index_count();
        for (i, sub_mesh) in self.sub_meshes.meshes.iter().enumerate() {
            let start = sub_mesh.start_index as usize;
            let end = sub_mesh.end_index as usize;
            if end < start || end > index_count {
                return Err(DecodeError::InvalidFormat {
                    context: "sub-mesh",
                    detail: format!(
                        "sub-mesh {i} range {start}..{end} invalid for {index_count} indices"
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Number of triangles encoded by an index field value.
///
/// The source tooling loops while `i < field * 2 / 6` using fractional
/// division, so a non-multiple rounds up.
#[must_use]
pub fn triangle_count(edge_buffer: u32) -> usize {
    let count = (u64::from(edge_buffer) * 2).div_ceil(TRIANGLE_STRIDE as u64);
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Decode a `.mesh` file.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if any read runs past the end of
/// `data`, and a validation error if indices or sub-mesh ranges don't fit
/// the decoded buffers.
pub fn decode_mesh(data: &[u8]) -> DecodeResult<MeshData> {
    if data.len() >= MESH_MAGIC.len() && &data[..MESH_MAGIC.len()] != MESH_MAGIC {
        tracing::debug!(magic = ?&data[..MESH_MAGIC.len()], "unexpected mesh magic");
    }

    let mut offset = HEADER_LEN;

    let vertex_count = read_u16(data, offset)?;
    offset += 6;

    let mut vertices = Vec::with_capacity(usize::from(vertex_count));
    for _ in 0..vertex_count {
        vertices.push(read_vertex(data, offset)?);
        offset += VERTEX_STRIDE;
    }

    let edge_buffer = read_u32(data, offset)?;
    offset += 4;

    let count = triangle_count(edge_buffer);
    let remaining = data.len().saturating_sub(offset) / TRIANGLE_STRIDE;
    let mut triangles = Vec::with_capacity(count.min(remaining));
    for _ in 0..count {
        triangles.push(Triangle {
            vertices: [
                read_u16(data, offset)?,
                read_u16(data, offset + 2)?,
                read_u16(data, offset + 4)?,
            ],
        });
        offset += TRIANGLE_STRIDE;
    }

    let sub_mesh_count = read_u16(data, offset)?;
    offset += 2;

    let mut meshes = Vec::with_capacity(usize::from(sub_mesh_count));
    for _ in 0..sub_mesh_count {
        let start_index = read_u32(data, offset)?;
        offset += 4;
        let end_index = read_u32(data, offset)?;
        offset += 6;
        let shader_id = read_u16(data, offset)?;
        offset += 2;

        // Stored max first, then min.
        let max = read_vec3(data, offset)?;
        let min = read_vec3(data, offset + 12)?;
        offset += 24;

        meshes.push(SubMesh {
            start_index,
            end_index,
            shader_id,
            culling_area: CullingArea { min, max },
        });

        offset += 2;
        let id_len = read_u16(data, offset)?;
        offset += usize::from(id_len) + 16;
    }

    let mesh = MeshData {
        vertex_count,
        vertices,
        edge_buffer,
        triangles,
        sub_meshes: SubMeshTable {
            count: sub_mesh_count,
            meshes,
        },
    };
    mesh.validate()?;
    Ok(mesh)
}

fn read_vertex(data: &[u8], offset: usize) -> DecodeResult<Vertex> {
    let [px, py, pz] = read_vec3(data, offset)?;
    let rgba = read_array::<4>(data, offset + 12)?;
    let [nx, ny, nz] = read_vec3(data, offset + 16)?;

    Ok(Vertex {
        position: [-px, py, pz],
        color: rgba.map(|c| f32::from(c) / 255.0),
        normal: [-nx, ny, nz],
    })
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> DecodeResult<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::Truncated {
            offset,
            needed: N,
            len: data.len(),
        })
}

fn read_u16(data: &[u8], offset: usize) -> DecodeResult<u16> {
    read_array(data, offset).map(u16::from_le_bytes)
}

fn read_u32(data: &[u8], offset: usize) -> DecodeResult<u32> {
    read_array(data, offset).map(u32::from_le_bytes)
}

fn read_f32(data: &[u8], offset: usize) -> DecodeResult<f32> {
    read_array(data, offset).map(f32::from_le_bytes)
}

fn read_vec3(data: &[u8], offset: usize) -> DecodeResult<[f32; 3]> {
    Ok([
        read_f32(data, offset)?,
        read_f32(data, offset + 4)?,
        read_f32(data, offset + 8)?,
    ])
}
