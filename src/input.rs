// ==============================================================================
// input.rs — CONTROL SIGNAL + CONTROLLER CAPABILITY
// ------------------------------------------------------------------------------
// InputSignal is the only thing a controller hands to the physics side:
//
//     throttle ∈ [0, 1]    steering ∈ [-1, 1]    tilt ∈ [-1, 1]    braking
//
// It is produced fresh every tick with all four fields set together. The
// neutral signal (after reset) is "no drive, brakes on".
//
// Controller:
// - NavigationStateMachine (AI) and ManualInput (host-driven axes) implement it.
// - The variant is chosen when the agent is spawned; nothing probes at runtime.
// ==============================================================================

use std::sync::{Arc, Mutex, PoisonError};

use nalgebra::{Isometry3, Point3};
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use crate::ai::direction::DirectionSource;
use crate::ai::fsm::NavigationState;
use crate::ai::registry::{AgentId, AgentRegistry};
use crate::ai::wall::WallProbe;
use crate::physics::RayQuery;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSignal {
    pub throttle: f32, // 0..1
    pub steering: f32, // -1 (left) .. 1 (right)
    pub tilt: f32,     // -1 .. 1, smoothed lean
    pub braking: bool,
}

impl Default for InputSignal {
    fn default() -> Self {
        Self::neutral()
    }
}

impl InputSignal {
    pub const fn neutral() -> Self {
        Self { throttle: 0.0, steering: 0.0, tilt: 0.0, braking: true }
    }

    /// Clamp every axis into its range; NaN collapses to 0.
    pub fn sanitized(&self) -> Self {
        fn axis(v: f32, lo: f32, hi: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(lo, hi) }
        }
        Self {
            throttle: axis(self.throttle, 0.0, 1.0),
            steering: axis(self.steering, -1.0, 1.0),
            tilt: axis(self.tilt, -1.0, 1.0),
            braking: self.braking,
        }
    }
}

/// Everything a controller may read while producing this tick's signal.
pub struct ControlContext<'a> {
    pub agent: AgentId,
    pub pose: Isometry3<f32>,
    pub body: RigidBodyHandle,
    pub dt: f32,
    pub world: &'a dyn RayQuery,
    pub registry: &'a AgentRegistry,
    pub directions: &'a mut dyn DirectionSource,
}

pub trait Controller: Send {
    fn update(&mut self, ctx: &mut ControlContext<'_>) -> InputSignal;

    /// Back to the freshly-spawned state; the next `update` starts over.
    fn reset(&mut self);

    fn navigation_state(&self) -> Option<NavigationState> {
        None
    }

    /// Last forward wall probe, for the debug overlay.
    fn wall_probe(&self) -> Option<WallProbe> {
        None
    }

    /// Point currently steered at, for the debug overlay.
    fn steering_target(&self, _registry: &AgentRegistry) -> Option<Point3<f32>> {
        None
    }
}

// ============================================
// ----- human adapter -----
// ============================================

/// Host-side writer for a [`ManualInput`]. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ManualInputHandle {
    shared: Arc<Mutex<InputSignal>>,
}

impl ManualInputHandle {
    pub fn set(&self, signal: InputSignal) {
        *self.lock() = signal;
    }

    /// Write the analog axes, keeping the current braking flag.
    pub fn set_axes(&self, throttle: f32, steering: f32, tilt: f32) {
        let mut s = self.lock();
        s.throttle = throttle;
        s.steering = steering;
        s.tilt = tilt;
    }

    pub fn start_braking(&self) {
        self.lock().braking = true;
    }

    pub fn stop_braking(&self) {
        self.lock().braking = false;
    }

    pub fn current(&self) -> InputSignal {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InputSignal> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub struct ManualInput {
    handle: ManualInputHandle,
}

impl ManualInput {
    pub fn new() -> (Self, ManualInputHandle) {
        let handle = ManualInputHandle::default();
        (Self { handle: handle.clone() }, handle)
    }
}

impl Controller for ManualInput {
    fn update(&mut self, _ctx: &mut ControlContext<'_>) -> InputSignal {
        self.handle.current().sanitized()
    }

    fn reset(&mut self) {
        self.handle.set(InputSignal::neutral());
    }
}
