use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use tracing::debug;

use crate::ai::registry::AgentId;
use crate::config::SpawnPoint;

/// Side-by-side spacing when several agents share one spawn point.
const SHARED_SLOT_SPACING: f32 = 3.0;

/// Default grid slot when the arena defines none.
const FALLBACK_SPAWN: SpawnPoint = SpawnPoint { position: [0.0, 2.5, 0.0], yaw_degrees: 0.0 };

// ---------------------------------------------
// SPAWN RESULT RETURNED TO THE SIMULATION
// ---------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnInfo {
    pub agent: AgentId,
    pub slot: usize,
    pub pose: Isometry3<f32>,
}

// ---------------------------------------------
// SPAWN MANAGER FOR ONE ARENA
// ---------------------------------------------
#[derive(Debug)]
pub struct SpawnManager {
    points: Vec<SpawnPoint>,

    /// How many agents were placed on each spawn point
    usage: Vec<usize>,

    /// Respawn pose per agent
    assigned: HashMap<AgentId, SpawnInfo>,
}

impl SpawnManager {
    pub fn new(points: &[SpawnPoint]) -> Self {
        let points = if points.is_empty() { vec![FALLBACK_SPAWN] } else { points.to_vec() };
        Self {
            usage: vec![0; points.len()],
            points,
            assigned: HashMap::new(),
        }
    }

    // ---------------------------------------------------------
    // Least-used spawn point, lowest index on ties
    // ---------------------------------------------------------
    fn choose_slot(&self) -> usize {
        self.usage
            .iter()
            .enumerate()
            .min_by_key(|&(i, &n)| (n, i))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn pose_for(&self, slot: usize, shared: usize) -> Isometry3<f32> {
        let sp = self.points[slot];
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), sp.yaw_degrees.to_radians());
        let right = rotation * Vector3::x();
        let [x, y, z] = sp.position;
        let offset = right * (shared as f32 * SHARED_SLOT_SPACING);
        Isometry3::from_parts(Translation3::new(x + offset.x, y, z + offset.z), rotation)
    }

    // ---------------------------------------------------------
    // Full allocation pipeline called from the simulation
    // ---------------------------------------------------------
    pub fn allocate_spawn(&mut self, agent: AgentId) -> SpawnInfo {
        if let Some(info) = self.assigned.get(&agent) {
            return *info;
        }

        let slot = self.choose_slot();
        let pose = self.pose_for(slot, self.usage[slot]);
        self.usage[slot] += 1;

        let info = SpawnInfo { agent, slot, pose };
        self.assigned.insert(agent, info);
        debug!(%agent, slot, position = ?pose.translation.vector, "spawn allocated");
        info
    }

    pub fn respawn_pose(&self, agent: AgentId) -> Option<Isometry3<f32>> {
        self.assigned.get(&agent).map(|info| info.pose)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<SpawnPoint> {
        vec![
            SpawnPoint { position: [0.0, 2.5, 0.0], yaw_degrees: 0.0 },
            SpawnPoint { position: [10.0, 2.5, 0.0], yaw_degrees: 90.0 },
        ]
    }

    #[test]
    fn balances_across_points_then_offsets_sideways() {
        let mut sm = SpawnManager::new(&points());
        let a = sm.allocate_spawn(AgentId::new());
        let b = sm.allocate_spawn(AgentId::new());
        let c = sm.allocate_spawn(AgentId::new());
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 0));

        let p = c.pose.translation.vector;
        assert!((p.x - SHARED_SLOT_SPACING).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn same_agent_keeps_its_pose() {
        let mut sm = SpawnManager::new(&points());
        let id = AgentId::new();
        let first = sm.allocate_spawn(id);
        assert_eq!(sm.allocate_spawn(id), first);
        assert_eq!(sm.respawn_pose(id), Some(first.pose));
        assert!(sm.respawn_pose(AgentId::new()).is_none());
    }

    #[test]
    fn no_points_falls_back_to_origin() {
        let mut sm = SpawnManager::new(&[]);
        let info = sm.allocate_spawn(AgentId::new());
        assert_eq!(info.pose.translation.vector, Vector3::new(0.0, 2.5, 0.0));
    }
}
