// ==============================================================================
// chase.rs — NEAREST LIVE TARGET SEARCH
// ------------------------------------------------------------------------------
// Two searches with deliberately different distance measures:
//
//   nearest(from, me)           -> any range, distance to candidate AIM POINT
//                                  (used while already chasing, to re-aim)
//   nearest_in_range(from, me)  -> distance to candidate BASE POSITION,
//                                  must be <= trigger range
//                                  (used to enter / keep Chase)
//
// Candidate: not `me`, alive, has an aim point. Strict `<` on distance, so ties
// go to the earlier registry entry. O(N) per call.
// ==============================================================================

use nalgebra::Point3;

use crate::ai::registry::{AgentEntry, AgentId, AgentRegistry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseTargetSelector {
    pub trigger_range: f32,
}

impl ChaseTargetSelector {
    pub fn new(trigger_range: f32) -> Self {
        Self { trigger_range }
    }

    fn candidates<'r>(registry: &'r AgentRegistry, me: AgentId) -> impl Iterator<Item = &'r AgentEntry> {
        registry.iter().filter(move |e| e.id != me && e.is_targetable())
    }

    fn closest<'r>(
        candidates: impl Iterator<Item = &'r AgentEntry>,
        distance: impl Fn(&AgentEntry) -> Option<f32>,
    ) -> Option<&'r AgentEntry> {
        let mut best: Option<(&AgentEntry, f32)> = None;
        for e in candidates {
            let Some(d) = distance(e) else { continue };
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((e, d));
            }
        }
        best.map(|(e, _)| e)
    }

    /// Unconditional nearest target, measured to its aim point.
    pub fn nearest<'r>(&self, registry: &'r AgentRegistry, from: Point3<f32>, me: AgentId) -> Option<&'r AgentEntry> {
        Self::closest(Self::candidates(registry, me), |e| {
            e.aim_point.map(|aim| (aim - from).norm()).filter(|d| d.is_finite())
        })
    }

    /// Nearest target whose base position lies within the trigger range.
    pub fn nearest_in_range<'r>(
        &self,
        registry: &'r AgentRegistry,
        from: Point3<f32>,
        me: AgentId,
    ) -> Option<&'r AgentEntry> {
        let range = self.trigger_range;
        Self::closest(Self::candidates(registry, me), |e| {
            let d = (e.position - from).norm();
            (d.is_finite() && d <= range).then_some(d)
        })
    }

    /// O(1)-per-lookup validity check for an already chosen target.
    pub fn still_in_range(&self, registry: &AgentRegistry, from: Point3<f32>, me: AgentId, target: AgentId) -> bool {
        registry
            .get(target)
            .filter(|e| e.id != me && e.is_targetable())
            .is_some_and(|e| (e.position - from).norm() <= self.trigger_range)
    }
}

/// Accumulating interval timer for throttled rescans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshTimer {
    elapsed: f32,
    interval: f32,
}

impl RefreshTimer {
    /// Starts expired so the first check scans immediately.
    pub fn new(interval: f32) -> Self {
        Self { elapsed: interval, interval }
    }

    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub fn is_due(&self) -> bool {
        self.elapsed >= self.interval
    }

    pub fn restart(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn expire(&mut self) {
        self.elapsed = self.interval;
    }
}
