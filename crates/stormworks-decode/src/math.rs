//! Coordinate and orientation conversions for placing decoded components.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;

use crate::types::{Position, Surface};

/// Rendered edge length of one voxel grid unit.
pub const VOXEL_SIZE: f32 = 0.25;

/// Scale a grid position into local render space. `None` is the origin.
#[must_use]
pub fn position_to_local(position: Option<&Position>) -> Vec3 {
    position.map_or(Vec3::ZERO, |p| p.to_vec3() * VOXEL_SIZE)
}

/// Euler angles (XYZ) that turn a +Z facing component toward `orientation`.
///
/// | orientation | facing |
/// |-------------|--------|
/// | 0           | +X     |
/// | 1           | -X     |
/// | 2           | +Y     |
/// | 3           | -Y     |
/// | 4           | +Z     |
/// | 5           | -Z     |
///
/// Any other value yields no rotation.
#[must_use]
pub fn orientation_to_euler(orientation: i32) -> Vec3 {
    match orientation {
        0 => Vec3::new(0.0, FRAC_PI_2, 0.0),
        1 => Vec3::new(0.0, -FRAC_PI_2, 0.0),
        2 => Vec3::new(-FRAC_PI_2, 0.0, 0.0),
        3 => Vec3::new(FRAC_PI_2, 0.0, 0.0),
        5 => Vec3::new(0.0, PI, 0.0),
        _ => Vec3::ZERO,
    }
}

/// In-plane rotation of a surface's shape, in radians.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn surface_rotation_angle(surface: &Surface) -> f32 {
    let mut angle = FRAC_PI_2 * -(surface.rotation as f32);
    match surface.orientation {
        0 => angle -= FRAC_PI_2,
        1 => angle += FRAC_PI_2,
        2 | 4 => angle += PI,
        _ => {}
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_to_local() {
        let p = Position::new(4.0, -2.0, 1.0);
        assert_eq!(position_to_local(Some(&p)), Vec3::new(1.0, -0.5, 0.25));
        assert_eq!(position_to_local(None), Vec3::ZERO);
    }

    #[test]
    fn test_orientations() {
        assert_eq!(orientation_to_euler(0), Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert_eq!(orientation_to_euler(3), Vec3::new(FRAC_PI_2, 0.0, 0.0));
        assert_eq!(orientation_to_euler(4), Vec3::ZERO);
        assert_eq!(orientation_to_euler(5), Vec3::new(0.0, PI, 0.0));
        assert_eq!(orientation_to_euler(42), Vec3::ZERO);
        assert_eq!(orientation_to_euler(-1), Vec3::ZERO);
    }

    #[test]
    fn test_surface_rotation() {
        let surface = |orientation, rotation| Surface {
            orientation,
            rotation,
            ..Surface::default()
        };
        assert_eq!(surface_rotation_angle(&surface(3, 0)), 0.0);
        assert_eq!(surface_rotation_angle(&surface(3, 1)), -FRAC_PI_2);
        assert_eq!(surface_rotation_angle(&surface(0, 0)), -FRAC_PI_2);
        assert_eq!(surface_rotation_angle(&surface(1, 0)), FRAC_PI_2);
        assert_eq!(surface_rotation_angle(&surface(4, 0)), PI);
    }
}
