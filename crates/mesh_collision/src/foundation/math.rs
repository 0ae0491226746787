//! Math utilities and types
//!
//! Provides the vector and matrix aliases used by the collision code, plus
//! the Euler-angle helpers that poses are expressed in.

pub use nalgebra::{
    Vector3,
    Matrix3,
    Rotation3,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Index of pitch in an angles vector
pub const PITCH: usize = 0;
/// Index of yaw in an angles vector
pub const YAW: usize = 1;
/// Index of roll in an angles vector
pub const ROLL: usize = 2;

/// Wrap an angle in degrees into `[-180, 180)`
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Shortest signed difference `b - a` between two angles in degrees
pub fn angle_delta(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Build a rotation matrix from `(pitch, yaw, roll)` Euler angles in degrees.
///
/// Yaw turns about +Z, pitch about +Y and roll about +X, applied roll first,
/// then pitch, then yaw.
pub fn rotation_from_angles(angles: Vec3) -> Mat3 {
    let pitch = angles[PITCH].to_radians();
    let yaw = angles[YAW].to_radians();
    let roll = angles[ROLL].to_radians();

    let rotation = Rotation3::from_axis_angle(&Vec3::z_axis(), yaw)
        * Rotation3::from_axis_angle(&Vec3::y_axis(), pitch)
        * Rotation3::from_axis_angle(&Vec3::x_axis(), roll);
    rotation.into_inner()
}

/// Component-wise minimum of two vectors
pub fn component_min(a: &Vec3, b: &Vec3) -> Vec3 {
    a.inf(b)
}

/// Component-wise maximum of two vectors
pub fn component_max(a: &Vec3, b: &Vec3) -> Vec3 {
    a.sup(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_wraps() {
        assert_relative_eq!(normalize_angle(190.0), -170.0, epsilon = 1e-4);
        assert_relative_eq!(normalize_angle(-190.0), 170.0, epsilon = 1e-4);
        assert_relative_eq!(normalize_angle(720.0), 0.0, epsilon = 1e-4);
        assert!(normalize_angle(-1e-9) < 180.0);
    }

    #[test]
    fn test_angle_delta_across_wrap() {
        assert_relative_eq!(angle_delta(359.5, 0.5), 1.0, epsilon = 1e-3);
        assert_relative_eq!(angle_delta(0.5, 359.5), -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_yaw_rotation_turns_x_into_y() {
        let rotation = rotation_from_angles(Vec3::new(0.0, 90.0, 0.0));
        let rotated = rotation * Vec3::x();
        assert_relative_eq!(rotated, Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_zero_angles_are_identity() {
        let rotation = rotation_from_angles(Vec3::zeros());
        assert_relative_eq!(rotation, Mat3::identity(), epsilon = 1e-6);
    }
}
