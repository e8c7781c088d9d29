// ==============================================================================
// kinematics.rs — GROUND-PLANE BASIS + POINT VELOCITY (WORLD SPACE)
// ------------------------------------------------------------------------------
// Conventions (shared by the physics model and the AI steering):
// - world up is +Y
// - a body's local forward is +Z, local right is +X
// - right = up × forward, so a positive yaw about +Y turns forward toward right
//
// horizontal_forward(rot):
// - Chassis forward projected on the ground plane and normalized. Falls back to
//   world +Z when the body points straight up/down (projection ~ zero).
//
// forward_speed(linvel, rot):
// - Signed speed along the horizontal forward: dot(v_h, forward_h).
//
// signed_angle_about_up(from, to):
// - Angle (radians) that rotates `from` onto `to` about world up, in (-π, π].
//   Positive when `to` lies to the right of `from`.
// ==============================================================================

use nalgebra::{Point3, UnitQuaternion, Vector3};

const EPS: f32 = 1e-6;

#[inline]
pub fn up() -> Vector3<f32> {
    Vector3::y()
}

#[inline]
pub fn local_forward() -> Vector3<f32> {
    Vector3::z()
}

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, 0.0, v.z)
}

#[inline]
pub fn safe_normalize(v: Vector3<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
    let n = v.norm();
    if n > EPS && n.is_finite() { v / n } else { fallback }
}

/// Unit horizontal direction, or `None` when the projection is degenerate.
#[inline]
pub fn horizontal_dir(v: Vector3<f32>) -> Option<Vector3<f32>> {
    let h = horizontal(v);
    let n = h.norm();
    (n > EPS && n.is_finite()).then(|| h / n)
}

#[inline]
pub fn horizontal_forward(rot: &UnitQuaternion<f32>) -> Vector3<f32> {
    safe_normalize(horizontal(rot * local_forward()), local_forward())
}

/// right = up × forward
#[inline]
pub fn horizontal_right(forward: &Vector3<f32>) -> Vector3<f32> {
    safe_normalize(up().cross(forward), Vector3::x())
}

#[inline]
pub fn forward_speed(linvel: &Vector3<f32>, rot: &UnitQuaternion<f32>) -> f32 {
    horizontal(*linvel).dot(&horizontal_forward(rot))
}

#[inline]
pub fn signed_angle_about_up(from: &Vector3<f32>, to: &Vector3<f32>) -> f32 {
    let cross = from.cross(to).dot(&up());
    let dot = from.dot(to);
    if cross.abs() < EPS && dot.abs() < EPS {
        return 0.0;
    }
    cross.atan2(dot)
}

/// World-space velocity of an arbitrary point rigidly attached to the body:
/// v(p) = v_com + ω × (p - com)
#[inline]
pub fn point_velocity(linvel: Vector3<f32>, angvel: Vector3<f32>, com: Point3<f32>, p: Point3<f32>) -> Vector3<f32> {
    let r = p.coords - com.coords;
    linvel + angvel.cross(&r)
}

/// Yaw increment about the body's local up axis.
#[inline]
pub fn yaw_delta_degrees(degrees: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_faces_plus_z_with_right_plus_x() {
        let rot = UnitQuaternion::identity();
        let fwd = horizontal_forward(&rot);
        assert_relative_eq!(fwd, Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(horizontal_right(&fwd), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn positive_angle_means_target_on_the_right() {
        let angle = signed_angle_about_up(&Vector3::z(), &Vector3::x());
        assert_relative_eq!(angle, FRAC_PI_2, epsilon = 1e-5);
        let angle = signed_angle_about_up(&Vector3::z(), &-Vector3::x());
        assert_relative_eq!(angle, -FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn positive_yaw_turns_forward_toward_right() {
        let rot = yaw_delta_degrees(90.0);
        assert_relative_eq!(rot * Vector3::z(), Vector3::x(), epsilon = 1e-5);
    }

    #[test]
    fn forward_speed_is_signed() {
        let rot = UnitQuaternion::identity();
        assert_relative_eq!(forward_speed(&Vector3::new(0.0, 3.0, 4.0), &rot), 4.0);
        assert_relative_eq!(forward_speed(&Vector3::new(1.0, 0.0, -2.0), &rot), -2.0);
    }

    #[test]
    fn vertical_forward_falls_back_to_world_forward() {
        let pitched = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
        let fwd = horizontal_forward(&pitched);
        assert!(fwd.norm() > 0.99);
        assert!(fwd.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn point_velocity_adds_rotational_term() {
        let v = point_velocity(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Point3::origin(),
            Point3::new(0.0, 0.0, 1.0),
        );
        assert_relative_eq!(v, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
    }
}
