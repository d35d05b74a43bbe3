//! Known meanings of the integer codes stored in part definitions.
//!
//! The catalogs are incomplete by nature: the game adds IDs that have not
//! been mapped yet. Lookups never fail, unknown codes get an explicit
//! fallback instead.

/// Names of surface shape IDs known to exist.
const SHAPE_NAMES: [&str; 67] = [
    "none",
    "square",
    "triangle",
    "transmission",
    "static",
    "weight",
    "diagonal square",
    "diagonal triangle",
    "inv_triangle",
    "triangle 2a",
    "triangle 2b",
    "triangle 2a alt",
    "triangle 2b alt",
    "triangle 4a",
    "triangle 4b",
    "triangle 4c",
    "triangle 4d",
    "triangle 4a alt",
    "triangle 4b alt",
    "triangle 4c alt",
    "triangle 4d alt",
    "diagonal square 2a",
    "diagonal square 2b",
    "diagonal square 4a",
    "diagonal square 4b",
    "diagonal square 4c",
    "diagonal square 4d",
    "diagonal triangle 2a",
    "diagonal triangle 2b",
    "diagonal triangle 4a",
    "diagonal triangle 4b",
    "diagonal triangle 4c",
    "diagonal triangle 4d",
    "diagonal triangle 2x2a",
    "diagonal triangle 2x2b",
    "diagonal triangle 2x4a",
    "diagonal triangle 2x4b",
    "diagonal triangle 2x4c",
    "diagonal triangle 2x4d",
    "diagonal triangle 2x4a alt",
    "diagonal triangle 2x4b alt",
    "diagonal triangle 2x4c alt",
    "diagonal triangle 2x4d alt",
    "diagonal triangle 4x4a",
    "diagonal triangle 4x4b",
    "diagonal triangle 4x4c",
    "diagonal triangle 4x4d",
    "diagonal inv_triangle 2a",
    "diagonal inv_triangle 2b",
    "diagonal inv_triangle 4a",
    "diagonal inv_triangle 4b",
    "diagonal inv_triangle 4c",
    "diagonal inv_triangle 4d",
    "diagonal inv_triangle 2x2a",
    "diagonal inv_triangle 2x2b",
    "diagonal inv_triangle 2x4a",
    "diagonal inv_triangle 2x4b",
    "diagonal inv_triangle 2x4c",
    "diagonal inv_triangle 2x4d",
    "diagonal inv_triangle 2x4a alt",
    "diagonal inv_triangle 2x4b alt",
    "diagonal inv_triangle 2x4c alt",
    "diagonal inv_triangle 2x4d alt",
    "diagonal inv_triangle 4x4a",
    "diagonal inv_triangle 4x4b",
    "diagonal inv_triangle 4x4c",
    "diagonal inv_triangle 4x4d",
];

/// Fallback label for unmapped codes.
pub const UNKNOWN: &str = "unknown";

/// Name of a surface shape ID, if it is known.
#[must_use]
pub fn shape_name(shape: i32) -> Option<&'static str> {
    usize::try_from(shape)
        .ok()
        .and_then(|index| SHAPE_NAMES.get(index))
        .copied()
}

/// Name of a surface shape ID, or [`UNKNOWN`].
#[must_use]
pub fn describe_shape(shape: i32) -> &'static str {
    shape_name(shape).unwrap_or(UNKNOWN)
}

/// Whether the shape's outline is known well enough to build geometry.
///
/// Shapes without it are drawn as a placeholder.
#[must_use]
pub fn has_geometry(shape: i32) -> bool {
    matches!(shape, 0..=32 | 49..=52)
}

/// Signal category of a logic node's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicKind {
    Boolean,
    Number,
    Rps,
    Fluid,
    Electric,
    Composite,
    Video,
    Audio,
    Rope,
    Unknown(i32),
}

impl LogicKind {
    #[must_use]
    pub fn from_type(node_type: i32) -> Self {
        match node_type {
            0 => Self::Boolean,
            1 => Self::Number,
            2 => Self::Rps,
            3 => Self::Fluid,
            4 => Self::Electric,
            5 => Self::Composite,
            6 => Self::Video,
            7 => Self::Audio,
            8 => Self::Rope,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Rps => "rps",
            Self::Fluid => "fluid",
            Self::Electric => "electric",
            Self::Composite => "composite",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Rope => "rope",
            Self::Unknown(_) => UNKNOWN,
        }
    }

    /// Physical connections (shafts and pipes) are drawn on the surface,
    /// logical ones as billboards.
    #[must_use]
    pub fn is_physical(self) -> bool {
        matches!(self, Self::Rps | Self::Fluid)
    }

    /// Display color as RGB.
    #[must_use]
    pub fn color(self) -> [u8; 3] {
        match self {
            Self::Boolean => [0xcc, 0x23, 0x4a],
            Self::Number => [0x00, 0x80, 0x00],
            Self::Rps => [0xff, 0x99, 0x00],
            Self::Fluid => [0x14, 0x80, 0xc8],
            Self::Electric => [0xbc, 0xbc, 0x2f],
            Self::Composite => [0x80, 0x00, 0xff],
            Self::Video => [0x33, 0xd2, 0xad],
            Self::Audio => [0x5d, 0x87, 0x29],
            Self::Rope => [0x3b, 0x3b, 0x3b],
            Self::Unknown(_) => [0xff, 0x00, 0xff],
        }
    }

    /// Billboard offset that keeps overlapping logical nodes apart.
    #[must_use]
    pub fn offset(self) -> f32 {
        match self {
            Self::Electric => -0.01,
            Self::Composite => 0.01,
            Self::Video => -0.02,
            Self::Audio => 0.02,
            Self::Rope => -0.03,
            _ => 0.0,
        }
    }
}

/// Display color (RGB) of a surface's `trans_type`, if the code is known.
#[must_use]
pub fn trans_type_color(trans_type: i32) -> Option<[u8; 3]> {
    match trans_type {
        0 => Some([0xff, 0xff, 0xff]),
        1 => Some([0xff, 0xa5, 0x00]),
        2 => Some([0x00, 0x80, 0x80]),
        3 => Some([0x00, 0x00, 0xff]),
        4 => Some([0x00, 0x00, 0x00]),
        _ => None,
    }
}
