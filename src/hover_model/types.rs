//! Core shared types for `hover_model` (engine-agnostic).
// hover_model/types.rs
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

use crate::hover_model::curve::ResponseCurve;
use crate::hover_model::kinematics::point_velocity;

// ============================================
// ----- body state (read once per step) -----
// ============================================
#[derive(Debug, Clone, Copy)]
pub struct BodySample {
    pub pose: Isometry3<f32>,         // world pose
    pub linvel: Vector3<f32>,         // m/s
    pub angvel: Vector3<f32>,         // rad/s
    pub center_of_mass: Point3<f32>,  // world space
}

impl BodySample {
    /// A body sitting still at `pose`, centre of mass at its origin.
    pub fn at_rest(pose: Isometry3<f32>) -> Self {
        Self {
            pose,
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
            center_of_mass: Point3::from(pose.translation.vector),
        }
    }

    #[inline]
    pub fn rotation(&self) -> &UnitQuaternion<f32> {
        &self.pose.rotation
    }

    /// World-space velocity of a point rigidly attached to the body.
    #[inline]
    pub fn velocity_at(&self, p: &Point3<f32>) -> Vector3<f32> {
        point_velocity(self.linvel, self.angvel, self.center_of_mass, *p)
    }
}

// ============================================
// ----- hover sampling (from the raycast pass) -----
// ============================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverContact {
    pub point: Point3<f32>,     // hover point in world space
    pub clearance: Option<f32>, // distance to ground, None when nothing within hover height
}

// ============================================
// ----- configs --------------------------------
// ============================================
#[derive(Debug, Clone, Copy)]
pub struct SolveContext<'a> {
    pub dt: f32,                  // s

    pub hover_height: f32,        // m, ray length
    pub hover_force: f32,         // N at zero clearance (per point)
    pub damping: f32,             // N*s/m (per point)

    pub max_force: f32,           // N, forward drive at full throttle
    pub max_speed: f32,           // m/s, speed ratio denominator
    pub brake_strength: f32,      // N

    pub strafe_force: f32,        // N at full steering
    pub rotation_speed: f32,      // deg/s at full tilt
    pub turn_steer: f32,          // deg per step at full steering

    pub velocity_threshold: f32,  // m/s below which steering/braking is skipped
    pub acceleration_curve: Option<&'a ResponseCurve>,
}

// ============================================
// ----- outputs -----
// ============================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceCommand {
    /// Force in world space (N). `at_point: None` => applied at the centre of mass.
    Force {
        force: Vector3<f32>,
        at_point: Option<Point3<f32>>,
    },
    /// Incremental rotation composed onto the body's current orientation (local frame).
    Rotate { delta: UnitQuaternion<f32> },
}

#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub forward_speed: f32,
    pub commands: Vec<ForceCommand>,
}

impl StepOutput {
    /// Sum of every force command (point forces included).
    pub fn net_force(&self) -> Vector3<f32> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ForceCommand::Force { force, .. } => Some(*force),
                ForceCommand::Rotate { .. } => None,
            })
            .fold(Vector3::zeros(), |acc, f| acc + f)
    }

    /// Forces applied at the centre of mass only.
    pub fn body_forces(&self) -> impl Iterator<Item = &Vector3<f32>> {
        self.commands.iter().filter_map(|c| match c {
            ForceCommand::Force { force, at_point: None } => Some(force),
            _ => None,
        })
    }

    /// Forces applied at a specific point.
    pub fn point_forces(&self) -> impl Iterator<Item = (&Vector3<f32>, &Point3<f32>)> {
        self.commands.iter().filter_map(|c| match c {
            ForceCommand::Force { force, at_point: Some(p) } => Some((force, p)),
            _ => None,
        })
    }

    pub fn rotations(&self) -> impl Iterator<Item = &UnitQuaternion<f32>> {
        self.commands.iter().filter_map(|c| match c {
            ForceCommand::Rotate { delta } => Some(delta),
            _ => None,
        })
    }
}
