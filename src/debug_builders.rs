// ==============================================================================
// debug_builders.rs — DEBUG OVERLAY PRIMITIVES (SIMULATION -> SNAPSHOT)
// ------------------------------------------------------------------------------
// Defines serializable debug primitives:
// - DebugChassis: per-bike box pose
// - DebugRay: hover raycasts and forward wall probes (hit point when they hit)
// - DebugLine: navigation line from a bike to what it is steering at
//
// Helpers:
// - push_chassis() / push_hover_rays(): per-vehicle geometry
// - push_wall_probe(): green when clear, red on hit
// - push_nav_line(): colour by navigation state
//
// This file is purely visualization scaffolding and should not contain physics
// side effects.
// ==============================================================================

use nalgebra::{Isometry3, Point3, Vector3};
use serde::Serialize;

use crate::ai::fsm::NavigationState;
use crate::ai::registry::AgentId;
use crate::ai::wall::WallProbe;
use crate::vehicle::Vehicle;

const GREEN: [f32; 3] = [0.2, 0.9, 0.2];
const RED: [f32; 3] = [1.0, 0.1, 0.1];
const YELLOW: [f32; 3] = [1.0, 0.9, 0.1];
const CYAN: [f32; 3] = [0.1, 0.9, 1.0];
const GREY: [f32; 3] = [0.6, 0.6, 0.6];

#[derive(Debug, Clone, Default, Serialize)]
pub struct DebugOverlay {
    pub chassis: Vec<DebugChassis>,
    pub hover_rays: Vec<DebugRay>,
    pub wall_probes: Vec<DebugRay>,
    pub nav_lines: Vec<DebugLine>,
}

impl DebugOverlay {
    pub fn clear(&mut self) {
        self.chassis.clear();
        self.hover_rays.clear();
        self.wall_probes.clear();
        self.nav_lines.clear();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugRay {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub length: f32,
    pub hit: Option<[f32; 3]>,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugChassis {
    pub agent: AgentId,
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion
    pub half_extents: [f32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugLine {
    pub agent: AgentId,
    pub from: [f32; 3],
    pub to: [f32; 3],
    pub color: [f32; 3],
}

pub fn push_chassis(overlay: &mut DebugOverlay, agent: AgentId, pose: &Isometry3<f32>, vehicle: &Vehicle) {
    let q = pose.rotation;
    overlay.chassis.push(DebugChassis {
        agent,
        position: pose.translation.vector.into(),
        rotation: [q.i, q.j, q.k, q.w],
        half_extents: vehicle.config.half_extents,
    });
}

pub fn push_hover_rays(overlay: &mut DebugOverlay, pose: &Isometry3<f32>, vehicle: &Vehicle) {
    let dir = -Vector3::y();
    for hp in &vehicle.hover_points {
        let origin = pose * hp.offset;
        overlay.hover_rays.push(DebugRay {
            origin: origin.into(),
            direction: dir.into(),
            length: vehicle.config.hover_height,
            hit: hp.clearance.map(|d| (origin + dir * d).into()),
            color: if hp.clearance.is_some() { GREEN } else { GREY },
        });
    }
}

pub fn push_wall_probe(overlay: &mut DebugOverlay, probe: &WallProbe) {
    let origin = Point3::from(probe.origin);
    let dir = Vector3::from(probe.direction);
    overlay.wall_probes.push(DebugRay {
        origin: probe.origin,
        direction: probe.direction,
        length: probe.max_distance,
        hit: probe.hit_distance.map(|d| (origin + dir * d).into()),
        color: if probe.is_hit() { RED } else { GREEN },
    });
}

pub fn push_nav_line(
    overlay: &mut DebugOverlay,
    agent: AgentId,
    from: Point3<f32>,
    to: Point3<f32>,
    state: NavigationState,
) {
    let color = match state {
        NavigationState::Start => CYAN,
        NavigationState::FollowPath => YELLOW,
        NavigationState::Chase => RED,
        NavigationState::AvoidWall => GREY,
    };
    overlay.nav_lines.push(DebugLine { agent, from: from.into(), to: to.into(), color });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_probe_hit_point_lies_along_the_ray() {
        let mut overlay = DebugOverlay::default();
        let probe = WallProbe { origin: [0.0, 1.0, 0.0], direction: [0.0, 0.0, 1.0], max_distance: 5.0, hit_distance: Some(3.0) };
        push_wall_probe(&mut overlay, &probe);
        let ray = &overlay.wall_probes[0];
        assert_eq!(ray.hit, Some([0.0, 1.0, 3.0]));
        assert_eq!(ray.color, RED);

        overlay.clear();
        assert!(overlay.wall_probes.is_empty());
    }
}
