//! Decode Stormworks part definitions and binary mesh files.
//!
//! This crate provides pure synchronous decoders for the two asset formats a
//! mod ships: part definition XML (plus the mod's `mod.xml`) and `.mesh`
//! geometry. Nothing here touches the filesystem; callers hand in text or
//! bytes and get owned values back.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Forgiving on game data**: Missing or malformed scalars default, a bad
//!   voxel is replaced rather than failing the part
//! - **Strict on binary layout**: Any out-of-bounds mesh read is an error

pub mod catalog;
mod error;
pub mod math;
pub mod mesh;
pub mod normalize;
pub mod part;
pub mod render;
pub mod types;
pub mod xml;

pub use catalog::{LogicKind, describe_shape, has_geometry, shape_name, trans_type_color};
pub use error::{DecodeError, DecodeResult};
pub use mesh::{CullingArea, MeshData, SubMesh, SubMeshTable, Triangle, Vertex, decode_mesh};
pub use normalize::normalize_xml;
pub use part::{ElementDiagnostic, parse_mod, parse_part_definition, parse_part_definition_with};
pub use render::{MeshGroup, RenderMesh};
pub use types::{
    BuoyancySurface, Connection, LogicNode, MeshSlot, Mod, Part, PartConnections, Position,
    RotationMatrix, Surface, Voxel,
};
