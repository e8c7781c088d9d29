// ==============================================================================
// steering.rs — POSE + TARGET -> THROTTLE / STEERING / TILT / BRAKING
// ------------------------------------------------------------------------------
// Per call (no state kept between calls, previous tilt passed in):
//
//   to_target_h = horizontal unit vector body -> target
//   forward_h   = horizontal unit forward
//   angle       = signed angle about up (deg, + = target on the right)
//   n           = clamp(angle / max_steering_angle, -1, 1)
//   steering    = clamp(n * turn_sharpness, -1, 1)
//   tilt        = tilt + (n - tilt) * (1 - exp(-tilt_responsiveness * dt))
//
//   d = |target - position|           (3D)
//   d < brake_distance -> throttle = max_throttle * d / brake_distance, braking
//   otherwise          -> throttle = max_throttle, no braking
//
// A target straight above/below (no horizontal component) gives zero error.
// ==============================================================================

use nalgebra::{Isometry3, Point3};

use crate::ai::direction::AvoidDirection;
use crate::config::AiConfig;
use crate::hover_model::kinematics::{horizontal_dir, horizontal_forward, signed_angle_about_up};
use crate::input::InputSignal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringConfig {
    pub max_throttle: f32,
    pub max_steering_angle_deg: f32,
    pub turn_sharpness: f32,
    pub brake_distance: f32,
    pub tilt_responsiveness: f32, // 1/s
}

impl Default for SteeringConfig {
    fn default() -> Self {
        SteeringConfig::from(&AiConfig::default())
    }
}

impl From<&AiConfig> for SteeringConfig {
    fn from(ai: &AiConfig) -> Self {
        Self {
            max_throttle: ai.max_throttle,
            max_steering_angle_deg: ai.max_steering_angle_deg,
            turn_sharpness: ai.turn_sharpness,
            brake_distance: ai.brake_distance,
            tilt_responsiveness: ai.tilt_responsiveness,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringController {
    pub config: SteeringConfig,
}

impl SteeringController {
    pub fn new(config: SteeringConfig) -> Self {
        Self { config }
    }

    /// Normalized heading error in [-1, 1]; positive when the target is to the right.
    pub fn heading_error(&self, pose: &Isometry3<f32>, target: &Point3<f32>) -> f32 {
        let position = Point3::from(pose.translation.vector);
        let Some(to_target) = horizontal_dir(target - position) else { return 0.0 };
        let forward = horizontal_forward(&pose.rotation);

        let angle = signed_angle_about_up(&forward, &to_target).to_degrees();
        let max = self.config.max_steering_angle_deg;
        if !(max > 0.0) || !angle.is_finite() {
            return 0.0;
        }
        (angle / max).clamp(-1.0, 1.0)
    }

    pub fn smooth_tilt(&self, current: f32, target: f32, dt: f32) -> f32 {
        let current = if current.is_finite() { current } else { 0.0 };
        let rate = self.config.tilt_responsiveness.max(0.0);
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let alpha = 1.0 - (-rate * dt).exp();
        (current + (target - current) * alpha).clamp(-1.0, 1.0)
    }

    pub fn steer_toward(&self, pose: &Isometry3<f32>, target: &Point3<f32>, prev_tilt: f32, dt: f32) -> InputSignal {
        let c = &self.config;
        let n = self.heading_error(pose, target);

        let steering = (n * c.turn_sharpness).clamp(-1.0, 1.0);
        let tilt = self.smooth_tilt(prev_tilt, n, dt);

        let position = Point3::from(pose.translation.vector);
        let distance = (target - position).norm();
        let (throttle, braking) = if distance < c.brake_distance {
            (c.max_throttle * (distance / c.brake_distance), true)
        } else {
            (c.max_throttle, false)
        };

        InputSignal { throttle, steering, tilt, braking }.sanitized()
    }

    /// Hard swerve: no drive, brakes on, full lock toward `direction`.
    pub fn avoid(&self, direction: AvoidDirection, prev_tilt: f32, dt: f32) -> InputSignal {
        let steering = (direction.sign() * self.config.turn_sharpness).clamp(-1.0, 1.0);
        let tilt = self.smooth_tilt(prev_tilt, steering, dt);
        InputSignal { throttle: 0.0, steering, tilt, braking: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn ctl() -> SteeringController {
        SteeringController::default()
    }

    fn pose(x: f32, z: f32, yaw_deg: f32) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::new(x, 1.0, z),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_deg.to_radians()),
        )
    }

    #[test]
    fn target_on_the_right_steers_right() {
        let out = ctl().steer_toward(&pose(0.0, 0.0, 0.0), &Point3::new(10.0, 1.0, 10.0), 0.0, DT);
        // 45° right, max 45° -> n = 1, sharpened and clamped
        assert_relative_eq!(out.steering, 1.0);
        assert!(out.tilt > 0.0);
        assert_relative_eq!(out.throttle, 1.0);
        assert!(!out.braking);
    }

    #[test]
    fn small_error_is_sharpened_linearly() {
        // target 15° to the left
        let yaw = -15.0_f32.to_radians();
        let target = Point3::new(yaw.sin() * 20.0, 1.0, yaw.cos() * 20.0);
        let out = ctl().steer_toward(&pose(0.0, 0.0, 0.0), &target, 0.0, DT);
        assert_relative_eq!(out.steering, -15.0 / 45.0 * 1.5, epsilon = 1e-4);
    }

    #[test]
    fn throttle_ramps_inside_brake_distance() {
        let out = ctl().steer_toward(&pose(0.0, 0.0, 0.0), &Point3::new(0.0, 1.0, 2.5), 0.0, DT);
        assert_relative_eq!(out.throttle, 0.5, epsilon = 1e-5);
        assert!(out.braking);

        let out = ctl().steer_toward(&pose(0.0, 0.0, 0.0), &Point3::new(0.0, 1.0, 0.0), 0.0, DT);
        assert_eq!(out.throttle, 0.0);
        assert_eq!(out.steering, 0.0);
        assert!(out.braking);
    }

    #[test]
    fn target_straight_above_gives_zero_error() {
        let out = ctl().steer_toward(&pose(0.0, 0.0, 30.0), &Point3::new(0.0, 40.0, 0.0), 0.2, DT);
        assert_eq!(out.steering, 0.0);
        assert!(out.tilt < 0.2 && out.tilt > 0.0);
    }

    #[test]
    fn tilt_converges_to_error_sign() {
        let c = ctl();
        let p = pose(0.0, 0.0, 0.0);
        let left = Point3::new(-30.0, 1.0, 5.0);
        let mut tilt = 0.0;
        for _ in 0..600 {
            tilt = c.steer_toward(&p, &left, tilt, DT).tilt;
        }
        assert!(tilt < -0.99, "tilt {tilt}");
    }

    #[test]
    fn avoid_brakes_and_locks_steering() {
        let out = ctl().avoid(AvoidDirection::Left, 0.0, DT);
        assert_eq!(out.throttle, 0.0);
        assert_eq!(out.steering, -1.0);
        assert!(out.braking);
        assert!(out.tilt < 0.0);
    }

    #[test]
    fn tilt_smoothing_depends_on_elapsed_time_not_tick_count() {
        let c = ctl();
        let one_long = c.smooth_tilt(0.0, 1.0, 2.0 * DT);
        let two_short = c.smooth_tilt(c.smooth_tilt(0.0, 1.0, DT), 1.0, DT);
        assert_relative_eq!(one_long, two_short, epsilon = 1e-6);

        // 30 Hz vs 120 Hz over one second
        let mut slow = 0.25;
        for _ in 0..30 {
            slow = c.smooth_tilt(slow, -0.5, 1.0 / 30.0);
        }
        let mut fast = 0.25;
        for _ in 0..120 {
            fast = c.smooth_tilt(fast, -0.5, 1.0 / 120.0);
        }
        assert_relative_eq!(slow, fast, epsilon = 1e-4);
    }

    proptest! {
        #[test]
        fn outputs_stay_in_range(
            x in -500.0f32..500.0, y in -50.0f32..50.0, z in -500.0f32..500.0,
            yaw in -360.0f32..360.0, prev in -1.0f32..1.0, dt in 0.0f32..0.5,
        ) {
            let out = ctl().steer_toward(&pose(0.0, 0.0, yaw), &Point3::new(x, y, z), prev, dt);
            prop_assert!((-1.0..=1.0).contains(&out.steering));
            prop_assert!((-1.0..=1.0).contains(&out.tilt));
            prop_assert!((0.0..=1.0).contains(&out.throttle));
        }
    }
}
