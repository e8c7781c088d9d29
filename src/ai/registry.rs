// ==============================================================================
// registry.rs — AGENT REGISTRY (EXPLICIT, PASSED BY REFERENCE)
// ------------------------------------------------------------------------------
// One entry per racer, in insertion order (ties in target search resolve to the
// earlier entry). An entry is a target only while it is alive AND has an aim
// point; both are written together so no reader sees one without the other.
// ==============================================================================

use std::fmt;

use nalgebra::Point3;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentEntry {
    pub id: AgentId,
    pub name: String,
    pub alive: bool,
    pub position: Point3<f32>,
    pub aim_point: Option<Point3<f32>>,
}

impl AgentEntry {
    pub fn is_targetable(&self) -> bool {
        self.alive && self.aim_point.is_some()
    }
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    entries: Vec<AgentEntry>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a live agent; replaces an existing entry with the same id in place.
    pub fn register(&mut self, id: AgentId, name: impl Into<String>, position: Point3<f32>, aim_point: Point3<f32>) {
        let entry = AgentEntry { id, name: name.into(), alive: true, position, aim_point: Some(aim_point) };
        match self.index_of(id) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Refresh base position and, for live agents, the aim point.
    pub fn update_pose(&mut self, id: AgentId, position: Point3<f32>, aim_point: Point3<f32>) {
        if let Some(e) = self.get_mut(id) {
            e.position = position;
            if e.alive {
                e.aim_point = Some(aim_point);
            }
        }
    }

    pub fn mark_eliminated(&mut self, id: AgentId) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                *e = AgentEntry { alive: false, aim_point: None, ..e.clone() };
                true
            }
            None => false,
        }
    }

    pub fn mark_alive(&mut self, id: AgentId, position: Point3<f32>, aim_point: Point3<f32>) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                *e = AgentEntry { alive: true, position, aim_point: Some(aim_point), ..e.clone() };
                true
            }
            None => false,
        }
    }


    pub fn get(&self, id: AgentId) -> Option<&AgentEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: AgentId) -> Option<&mut AgentEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn index_of(&self, id: AgentId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.entries.iter().filter(|e| e.alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32) -> Point3<f32> {
        Point3::new(x, 0.0, 0.0)
    }

    #[test]
    fn elimination_clears_alive_and_aim_together() {
        let mut reg = AgentRegistry::new();
        let id = AgentId::new();
        reg.register(id, "a", p(1.0), p(2.0));
        assert!(reg.get(id).unwrap().is_targetable());

        assert!(reg.mark_eliminated(id));
        let e = reg.get(id).unwrap();
        assert!(!e.alive);
        assert!(e.aim_point.is_none());

        // dead agents keep their aim point cleared on pose updates
        reg.update_pose(id, p(5.0), p(6.0));
        assert!(reg.get(id).unwrap().aim_point.is_none());
        assert_eq!(reg.get(id).unwrap().position, p(5.0));

        assert!(reg.mark_alive(id, p(0.0), p(1.0)));
        assert!(reg.get(id).unwrap().is_targetable());
    }

    #[test]
    fn keeps_insertion_order_and_reregisters_in_place() {
        let mut reg = AgentRegistry::new();
        let ids: Vec<_> = (0..3).map(|_| AgentId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            reg.register(*id, format!("r{i}"), p(i as f32), p(i as f32));
        }
        reg.register(ids[0], "again", p(9.0), p(9.0));

        let order: Vec<_> = reg.iter().map(|e| e.id).collect();
        assert_eq!(order, ids);
        assert_eq!(reg.get(ids[0]).unwrap().name, "again");

        assert_eq!(reg.len(), 3);
        assert!(!reg.mark_eliminated(AgentId::new()));
    }
}
