use nalgebra::Isometry3;
use rapier3d::prelude::{point, Point, Real, RigidBodyHandle};
use serde::{Deserialize, Serialize};

use crate::hover_model::{ResponseCurve, SolveContext};
use crate::input::InputSignal;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub mass: f32,                  // kg
    pub half_extents: [f32; 3],     // chassis box [hx, hy, hz] meters
    pub linear_damping: f32,        // drag
    pub angular_damping: f32,       // rotational drag

    // --- Hover ---
    pub hover_points: Vec<[f32; 3]>, // chassis local space
    pub hover_height: f32,           // m, ray length
    pub hover_force: f32,            // N per point at zero clearance
    pub damping: f32,                // N*s/m per point

    // --- Drive ---
    pub max_force: f32,             // N
    pub max_speed: f32,             // m/s
    pub brake_strength: f32,        // N
    pub acceleration_curve: Option<ResponseCurve>,

    // --- Steering ---
    pub strafe_force: f32,          // N at full steering
    pub rotation_speed: f32,        // deg/s at full tilt
    pub turn_steer: f32,            // deg per step at full steering
    pub velocity_threshold: f32,    // m/s
}

impl Default for VehicleConfig {
    fn default() -> Self {
        let [hx, hy, hz] = [0.5, 0.3, 1.2];
        Self {
            mass: 100.0,
            half_extents: [hx, hy, hz],
            linear_damping: 0.5,
            angular_damping: 1.0,

            hover_points: vec![
                [-hx, -hy, hz],  // front left
                [hx, -hy, hz],   // front right
                [-hx, -hy, -hz], // rear left
                [hx, -hy, -hz],  // rear right
            ],
            hover_height: 3.0,
            hover_force: 1000.0,
            damping: 5.0,

            max_force: 1000.0,
            max_speed: 50.0,
            brake_strength: 500.0,
            acceleration_curve: None,

            strafe_force: 500.0,
            rotation_speed: 3.0,
            turn_steer: 0.5,
            velocity_threshold: 0.1,
        }
    }
}

impl VehicleConfig {
    pub fn solve_context(&self, dt: f32) -> SolveContext<'_> {
        SolveContext {
            dt,
            hover_height: self.hover_height,
            hover_force: self.hover_force,
            damping: self.damping,
            max_force: self.max_force,
            max_speed: self.max_speed,
            brake_strength: self.brake_strength,
            strafe_force: self.strafe_force,
            rotation_speed: self.rotation_speed,
            turn_steer: self.turn_steer,
            velocity_threshold: self.velocity_threshold,
            acceleration_curve: self.acceleration_curve.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HoverPoint {
    pub offset: Point<Real>,        // position in chassis local space
    pub clearance: Option<f32>,     // last sampled ground distance
}

impl HoverPoint {
    pub fn new(offset: [f32; 3]) -> Self {
        Self { offset: point![offset[0], offset[1], offset[2]], clearance: None }
    }
}

pub struct Vehicle {
    pub body: RigidBodyHandle,      // the chassis body
    pub config: VehicleConfig,      // vehicle parameters
    pub input: InputSignal,         // latest controller output
    pub hover_points: Vec<HoverPoint>,
    pub speed: f32,                 // signed forward speed, last step
    pub active: bool,               // false => frozen, no forces applied
    pub home: Isometry3<f32>,       // safety-reset pose
}

impl Vehicle {
    pub fn new(body: RigidBodyHandle, config: VehicleConfig, home: Isometry3<f32>) -> Self {
        let hover_points = config.hover_points.iter().copied().map(HoverPoint::new).collect();
        Self {
            body,
            config,
            input: InputSignal::neutral(),
            hover_points,
            speed: 0.0,
            active: true,
            home,
        }
    }
}
