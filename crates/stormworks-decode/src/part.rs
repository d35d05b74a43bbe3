//! Part definition and mod metadata decoding.
//!
//! Game files are loosely structured. Scalar attributes fall back to zero or
//! an empty string when missing or unparsable, structural children are
//! optional, and a voxel that fails to parse is replaced by a zeroed default
//! instead of failing the whole part.

use crate::error::{DecodeError, DecodeResult};
use crate::normalize::normalize_xml;
use crate::types::{
    Connection, LogicNode, Mod, Part, PartConnections, Position, RotationMatrix, Surface, Voxel,
};
use crate::xml::{Element, parse_document};

/// A recovered, per-element decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDiagnostic {
    /// Tag of the element that failed, e.g. `"voxel"`.
    pub element: &'static str,
    /// Position of the element among its siblings of the same kind.
    pub index: usize,
    /// The element's markup as parsed.
    pub markup: String,
    pub error: DecodeError,
}

/// Normalize and parse raw XML text into an element tree.
pub fn load_document(xml: &str) -> DecodeResult<Element> {
    let normalized = normalize_xml(xml);
    parse_document(&normalized)
}

/// Decode a part definition, logging recovered element failures.
pub fn parse_part_definition(xml: &str) -> DecodeResult<Part> {
    parse_part_definition_with(xml, |_| {})
}

/// Decode a part definition, reporting each recovered element failure to
/// `on_diagnostic` in addition to logging it.
pub fn parse_part_definition_with(
    xml: &str,
    mut on_diagnostic: impl FnMut(ElementDiagnostic),
) -> DecodeResult<Part> {
    let document = load_document(xml)?;
    let definition = document
        .find_inclusive("definition")
        .ok_or(DecodeError::MissingRootElement {
            expected: "definition",
        })?;

    Ok(Part {
        name: string_attr(definition, "name"),
        category: int_attr(definition, "category"),
        part_type: int_attr(definition, "type"),
        mass: float_attr(definition, "mass"),
        value: int_attr(definition, "value"),
        mesh_data_name: string_attr(definition, "mesh_data_name"),
        mesh_0_name: string_attr(definition, "mesh_0_name"),
        mesh_1_name: string_attr(definition, "mesh_1_name"),
        mesh_editor_only_name: string_attr(definition, "mesh_editor_only_name"),

        surfaces: parse_surfaces(definition.find("surfaces")),
        buoyancy_surfaces: parse_surfaces(definition.find("buoyancy_surfaces")),
        logic_nodes: parse_logic_nodes(definition.find("logic_nodes")),
        voxels: parse_voxels(definition.find("voxels"), &mut on_diagnostic),
        connections: PartConnections {
            prev: parse_connections(definition.find("jet_engine_connections_prev")),
            next: parse_connections(definition.find("jet_engine_connections_next")),
        },
    })
}

/// Decode a mod's `mod.xml`.
pub fn parse_mod(xml: &str) -> DecodeResult<Mod> {
    let document = load_document(xml)?;
    let root = document
        .find_inclusive("mod")
        .ok_or(DecodeError::MissingRootElement { expected: "mod" })?;

    Ok(Mod {
        name: string_attr(root, "name"),
        author: string_attr(root, "author"),
        description: string_attr(root, "desc"),
    })
}

fn parse_surfaces(surfaces: Option<&Element>) -> Vec<Surface> {
    let Some(surfaces) = surfaces else {
        return Vec::new();
    };

    surfaces
        .find_all("surface")
        .map(|surface| Surface {
            orientation: int_attr(surface, "orientation"),
            rotation: int_attr(surface, "rotation"),
            shape: int_attr(surface, "shape"),
            trans_type: int_attr(surface, "trans_type"),
            position: parse_position(surface.find("position")),
        })
        .collect()
}

fn parse_logic_nodes(nodes: Option<&Element>) -> Vec<LogicNode> {
    let Some(nodes) = nodes else {
        return Vec::new();
    };

    nodes
        .find_all("logic_node")
        .map(|node| LogicNode {
            orientation: int_attr(node, "orientation"),
            label: string_attr(node, "label"),
            mode: int_attr(node, "mode"),
            node_type: int_attr(node, "type"),
            description: string_attr(node, "description"),
            flags: int_attr(node, "flags"),
            position: parse_position(node.find("position")),
        })
        .collect()
}

fn parse_voxels(
    voxels: Option<&Element>,
    on_diagnostic: &mut impl FnMut(ElementDiagnostic),
) -> Vec<Voxel> {
    let Some(voxels) = voxels else {
        return Vec::new();
    };

    let mut elements: Vec<&Element> = voxels.find_all("voxel").collect();
    if elements.is_empty() {
        // Some files spell the tag differently; fall back to direct children.
        elements = voxels
            .children()
            .filter(|e| e.name().eq_ignore_ascii_case("voxel"))
            .collect();
    }

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| match parse_voxel(element) {
            Ok(voxel) => voxel,
            Err(error) => {
                let markup = element.to_markup();
                tracing::warn!(index, %markup, %error, "failed to parse voxel, using default");
                on_diagnostic(ElementDiagnostic {
                    element: "voxel",
                    index,
                    markup,
                    error,
                });
                Voxel::default()
            }
        })
        .collect()
}

/// Voxels are parsed strictly so a corrupt one is replaced as a whole.
fn parse_voxel(voxel: &Element) -> DecodeResult<Voxel> {
    Ok(Voxel {
        flags: strict_int_attr(voxel, "voxel", "flags")?,
        physics_shape: strict_int_attr(voxel, "voxel", "physics_shape")?,
        buoy_pipes: strict_int_attr(voxel, "voxel", "buoy_pipes")?,
        position: voxel
            .find("position")
            .map(strict_position)
            .transpose()?,
        physics_shape_rotation: voxel.find("physics_shape_rotation").map(parse_rotation_matrix),
    })
}

fn parse_connections(connections: Option<&Element>) -> Vec<Connection> {
    let Some(connections) = connections else {
        return Vec::new();
    };

    connections
        .find_all("j")
        .map(|connection| Connection {
            position: parse_position(connection.find("pos")),
            normal: parse_position(connection.find("normal")),
        })
        .collect()
}

fn parse_position(position: Option<&Element>) -> Option<Position> {
    let position = position?;
    Some(Position {
        x: float_attr(position, "x"),
        y: float_attr(position, "y"),
        z: float_attr(position, "z"),
    })
}

fn strict_position(position: &Element) -> DecodeResult<Position> {
    Ok(Position {
        x: strict_float_attr(position, "position", "x")?,
        y: strict_float_attr(position, "position", "y")?,
        z: strict_float_attr(position, "position", "z")?,
    })
}

/// Parse a rotation matrix from whitespace-separated text.
///
/// Non-numeric tokens are skipped and the first nine numbers fill the cells
/// row-major. When the text holds no numbers at all, the normalized cell
/// attributes (`_00` .. `_22`) are read instead.
fn parse_rotation_matrix(element: &Element) -> RotationMatrix {
    let text = element.text_content();
    let values: Vec<f32> = text.split_whitespace().filter_map(parse_float_prefix).collect();
    if !values.is_empty() {
        return RotationMatrix::from_row_major(values);
    }

    RotationMatrix::from_row_major(RotationMatrix::CELL_NAMES.iter().map(|cell| {
        element
            .attr(&format!("_{cell}"))
            .and_then(parse_float_prefix)
            .unwrap_or(0.0)
    }))
}

fn string_attr(element: &Element, name: &str) -> String {
    element.attr(name).unwrap_or_default().to_string()
}

fn int_attr(element: &Element, name: &str) -> i32 {
    element.attr(name).and_then(parse_int_prefix).unwrap_or(0)
}

fn float_attr(element: &Element, name: &str) -> f32 {
    element.attr(name).and_then(parse_float_prefix).unwrap_or(0.0)
}

fn strict_int_attr(element: &Element, tag: &'static str, name: &str) -> DecodeResult<i32> {
    match element.attr(name) {
        None => Ok(0),
        Some(value) => value.trim().parse().map_err(|_| invalid(tag, name, value)),
    }
}

fn strict_float_attr(element: &Element, tag: &'static str, name: &str) -> DecodeResult<f32> {
    match element.attr(name) {
        None => Ok(0.0),
        Some(value) => value
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(tag, name, value)),
    }
}

fn invalid(element: &'static str, attribute: &str, value: &str) -> DecodeError {
    DecodeError::InvalidAttribute {
        element,
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

/// Integer from the leading `[+-]digits` of `value`, like the game's own
/// tooling reads them (`"12abc"` is 12). Out-of-range values are rejected.
fn parse_int_prefix(value: &str) -> Option<i32> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    value[..sign_len + digits].parse().ok()
}

/// Float from the longest numeric prefix of `value` (`"1.5m"` is 1.5).
fn parse_float_prefix(value: &str) -> Option<f32> {
    let value = value.trim_start();
    let candidate_len = value
        .bytes()
        .take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        .count();
    (1..=candidate_len)
        .rev()
        .find_map(|len| value[..len].parse::<f32>().ok())
        .filter(|v| v.is_finite())
}
