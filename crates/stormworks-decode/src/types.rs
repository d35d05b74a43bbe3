//! Decoded part-definition model.
//!
//! All values are plain owned data; decoding the same input twice produces
//! two independent, structurally equal graphs.

use glam::{Mat3, Vec3};

/// Metadata from a mod's `mod.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mod {
    pub name: String,
    pub author: String,
    /// Read from the `desc` attribute.
    pub description: String,
}

/// A point in the part's voxel grid (one unit per voxel).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// A voxel's custom physics-shape rotation, stored row-major.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationMatrix {
    rows: [[f32; 3]; 3],
}

impl RotationMatrix {
    /// Cell names used by the game files, in positional (row-major) order.
    pub const CELL_NAMES: [&'static str; 9] = ["00", "01", "02", "10", "11", "12", "20", "21", "22"];

    /// Fill cells in row-major order from `values`.
    ///
    /// Values beyond the ninth are ignored; missing cells stay zero.
    pub fn from_row_major(values: impl IntoIterator<Item = f32>) -> Self {
        let mut matrix = Self::default();
        for (index, value) in values.into_iter().take(9).enumerate() {
            let (row, col) = Self::cell_coords(index);
            matrix.rows[row][col] = value;
        }
        matrix
    }

    /// Row and column of the `index`th cell in row-major order.
    #[must_use]
    pub const fn cell_coords(index: usize) -> (usize, usize) {
        (index / 3, index % 3)
    }

    #[must_use]
    pub fn rows(&self) -> [[f32; 3]; 3] {
        self.rows
    }

    /// Cell at `row`, `col`, or `None` outside the 3x3 range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.rows.get(row)?.get(col).copied()
    }

    #[must_use]
    pub fn to_mat3(&self) -> Mat3 {
        Mat3::from_cols_array_2d(&self.rows).transpose()
    }

    /// Euler angles `(x, y, z)` as the viewer applies them to a voxel.
    #[must_use]
    pub fn euler_angles(&self) -> Vec3 {
        let m = &self.rows;
        Vec3::new(
            m[1][0].atan2(m[0][0]),
            (-m[2][0]).clamp(-1.0, 1.0).asin(),
            m[2][1].atan2(m[2][2]),
        )
    }
}

/// A face attached to a voxel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Surface {
    /// One of six axis-aligned base rotations (0..=5).
    pub orientation: i32,
    pub rotation: i32,
    /// Index into the shape catalog; unknown values are kept as-is.
    pub shape: i32,
    pub trans_type: i32,
    pub position: Option<Position>,
}

/// Buoyancy surfaces share the surface schema.
pub type BuoyancySurface = Surface;

/// A typed logic or physical connection point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogicNode {
    pub orientation: i32,
    pub label: String,
    pub mode: i32,
    /// Signal category, see [`crate::LogicKind`].
    pub node_type: i32,
    pub description: String,
    pub flags: i32,
    pub position: Option<Position>,
}

/// One unit cube of the part's physical volume.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Voxel {
    pub flags: i32,
    pub physics_shape: i32,
    pub buoy_pipes: i32,
    pub position: Option<Position>,
    /// `None` means the orientation-derived default rotation applies.
    pub physics_shape_rotation: Option<RotationMatrix>,
}

impl Voxel {
    /// Reserve voxels are placeholders that don't contribute to the shape.
    #[must_use]
    pub fn is_reserve(&self) -> bool {
        self.flags != 1
    }
}

/// An attachment point used when chaining parts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Connection {
    pub position: Option<Position>,
    pub normal: Option<Position>,
}

/// Ordered attachment points at each end of a part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartConnections {
    pub prev: Vec<Connection>,
    pub next: Vec<Connection>,
}

/// Which mesh reference on a part a name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    Data,
    Mesh0,
    Mesh1,
    EditorOnly,
}

/// A decoded part definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Part {
    pub name: String,
    pub category: i32,
    pub part_type: i32,
    pub mass: f32,
    pub value: i32,
    pub surfaces: Vec<Surface>,
    pub buoyancy_surfaces: Vec<BuoyancySurface>,
    pub logic_nodes: Vec<LogicNode>,
    pub voxels: Vec<Voxel>,
    pub connections: PartConnections,
    pub mesh_data_name: String,
    pub mesh_0_name: String,
    pub mesh_1_name: String,
    pub mesh_editor_only_name: String,
}

impl Part {
    /// Non-empty mesh references, by slot.
    pub fn mesh_names(&self) -> impl Iterator<Item = (MeshSlot, &str)> {
        [
            (MeshSlot::Data, self.mesh_data_name.as_str()),
            (MeshSlot::Mesh0, self.mesh_0_name.as_str()),
            (MeshSlot::Mesh1, self.mesh_1_name.as_str()),
            (MeshSlot::EditorOnly, self.mesh_editor_only_name.as_str()),
        ]
        .into_iter()
        .filter(|(_, name)| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_row_major_partial() {
        let m = RotationMatrix::from_row_major([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.rows(), [[1.0, 2.0, 3.0], [4.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_rotation_from_row_major_extra_values_ignored() {
        let m = RotationMatrix::from_row_major((1..=12).map(|v| v as f32));
        assert_eq!(m.get(2, 2), Some(9.0));
        assert_eq!(m.get(3, 0), None);
        assert_eq!(m.get(0, 3), None);
    }

    #[test]
    fn test_to_mat3_keeps_rows() {
        let m = RotationMatrix::from_row_major([0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        let mat = m.to_mat3();
        // Row 0 of the source is (0, -1, 0), so x-axis maps to (0, 1, 0).
        assert_eq!(mat * Vec3::X, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(mat.row(0), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_identity_euler_is_zero() {
        let m = RotationMatrix::from_row_major([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(m.euler_angles(), Vec3::ZERO);
    }

    #[test]
    fn test_reserve_voxel() {
        let real = Voxel {
            flags: 1,
            ..Voxel::default()
        };
        assert!(!real.is_reserve());
        assert!(Voxel::default().is_reserve());
    }

    #[test]
    fn test_mesh_names_skip_empty() {
        let part = Part {
            mesh_data_name: "meshes/a.mesh".to_string(),
            mesh_editor_only_name: "meshes/b.mesh".to_string(),
            ..Part::default()
        };
        let names: Vec<_> = part.mesh_names().collect();
        assert_eq!(
            names,
            vec![
                (MeshSlot::Data, "meshes/a.mesh"),
                (MeshSlot::EditorOnly, "meshes/b.mesh")
            ]
        );
    }
}
