// ==============================================================================
// pilot.rs — BEHAVIOUR PRIMITIVES DRIVEN BY THE NAVIGATION STATE MACHINE
// ------------------------------------------------------------------------------
// Owns the per-agent driving state the state machine commands:
// - waypoint loop + wrapping index
// - start-approach flag ("reached start" gates everything else)
// - avoidance direction, picked once per avoidance episode
// - chase target (weak: an AgentId resolved through the registry each tick)
// - the current InputSignal (tilt carries over between ticks)
//
// Every behaviour writes all four InputSignal fields.
// ==============================================================================

use nalgebra::{Isometry3, Point3};

use crate::ai::chase::{ChaseTargetSelector, RefreshTimer};
use crate::ai::direction::{AvoidDirection, DirectionSource};
use crate::ai::registry::{AgentId, AgentRegistry};
use crate::ai::steering::SteeringController;
use crate::input::InputSignal;

#[derive(Debug, Clone)]
pub struct Pilot {
    steering: SteeringController,
    waypoints: Vec<Point3<f32>>,
    start_waypoint: Option<Point3<f32>>,
    waypoint_radius: f32,

    index: usize,                      // current waypoint
    reached_start: bool,
    avoid: Option<AvoidDirection>,     // Some while avoiding
    chase_target: Option<AgentId>,
    chase_refresh: RefreshTimer,       // unconditional re-aim
    signal: InputSignal,
}

impl Pilot {
    /// `waypoints` must be non-empty.
    pub fn new(
        steering: SteeringController,
        waypoints: Vec<Point3<f32>>,
        start_waypoint: Option<Point3<f32>>,
        waypoint_radius: f32,
        chase_refresh_interval: f32,
    ) -> Self {
        Self {
            steering,
            waypoints,
            start_waypoint,
            waypoint_radius,
            index: 0,
            reached_start: false,
            avoid: None,
            chase_target: None,
            chase_refresh: RefreshTimer::new(chase_refresh_interval),
            signal: InputSignal::neutral(),
        }
    }

    pub fn signal(&self) -> InputSignal {
        self.signal
    }

    pub fn waypoint_index(&self) -> usize {
        self.index
    }

    pub fn current_waypoint(&self) -> Point3<f32> {
        self.waypoints[self.index]
    }

    pub fn start_waypoint(&self) -> Option<Point3<f32>> {
        self.start_waypoint
    }

    pub fn reached_start(&self) -> bool {
        self.reached_start
    }

    pub fn avoid_direction(&self) -> Option<AvoidDirection> {
        self.avoid
    }

    pub fn is_avoiding(&self) -> bool {
        self.avoid.is_some()
    }

    pub fn chase_target(&self) -> Option<AgentId> {
        self.chase_target
    }

    fn steer_at(&mut self, pose: &Isometry3<f32>, target: &Point3<f32>, dt: f32) {
        self.signal = self.steering.steer_toward(pose, target, self.signal.tilt, dt);
    }

    /// Steer at the current waypoint, then advance past it once inside the arrival radius.
    /// The arrival tick still steers (and brakes) toward the waypoint just reached.
    pub fn follow_path(&mut self, pose: &Isometry3<f32>, dt: f32) {
        let target = self.current_waypoint();
        self.steer_at(pose, &target, dt);

        let position = Point3::from(pose.translation.vector);
        if (target - position).norm() < self.waypoint_radius {
            self.index = (self.index + 1) % self.waypoints.len();
        }
    }

    /// Returns true once the start waypoint has been reached (immediately without one).
    pub fn navigate_to_start(&mut self, pose: &Isometry3<f32>, dt: f32) -> bool {
        if self.reached_start {
            return true;
        }
        let Some(start) = self.start_waypoint else {
            self.reached_start = true;
            return true;
        };

        self.steer_at(pose, &start, dt);

        let position = Point3::from(pose.translation.vector);
        if (start - position).norm() < self.waypoint_radius {
            self.reached_start = true;
        }
        self.reached_start
    }

    pub fn avoid_wall(&mut self, directions: &mut dyn DirectionSource, dt: f32) {
        let direction = *self.avoid.get_or_insert_with(|| directions.pick());
        self.signal = self.steering.avoid(direction, self.signal.tilt, dt);
    }

    pub fn end_avoidance(&mut self) {
        self.avoid = None;
    }

    pub fn set_chase_target(&mut self, target: AgentId) {
        self.chase_target = Some(target);
        self.chase_refresh.restart();
    }

    pub fn clear_chase_target(&mut self) {
        self.chase_target = None;
    }

    /// Steer at the chase target's aim point. The target is re-picked (nearest by aim
    /// point, any range) once a full refresh interval passes without `set_chase_target`,
    /// or as soon as it stops being targetable. Returns false when nothing can be chased.
    pub fn chase(
        &mut self,
        registry: &AgentRegistry,
        selector: &ChaseTargetSelector,
        me: AgentId,
        pose: &Isometry3<f32>,
        dt: f32,
    ) -> bool {
        let position = Point3::from(pose.translation.vector);
        let due = self.chase_refresh.is_due();
        self.chase_refresh.advance(dt);

        let valid = self
            .chase_target
            .and_then(|id| registry.get(id))
            .is_some_and(|e| e.is_targetable());

        if !valid || due {
            self.chase_target = selector.nearest(registry, position, me).map(|e| e.id);
            self.chase_refresh.restart();
        }

        let aim = self
            .chase_target
            .and_then(|id| registry.get(id))
            .and_then(|e| e.aim_point);

        match aim {
            Some(aim) => {
                self.steer_at(pose, &aim, dt);
                true
            }
            None => {
                self.chase_target = None;
                false
            }
        }
    }

    /// Neutral inputs (braking), start approach re-armed, back to the first waypoint.
    pub fn reset(&mut self) {
        self.signal = InputSignal::neutral();
        self.reached_start = false;
        self.index = 0;
        self.avoid = None;
        self.chase_target = None;
        self.chase_refresh.expire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::direction::FixedDirection;
    use crate::ai::steering::SteeringConfig;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn pilot(start: Option<Point3<f32>>) -> Pilot {
        let waypoints = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 20.0), Point3::new(20.0, 0.0, 20.0)];
        Pilot::new(SteeringController::new(SteeringConfig::default()), waypoints, start, 3.0, 2.0)
    }

    #[test]
    fn waypoint_index_advances_and_wraps() {
        let mut p = pilot(None);
        p.follow_path(&Isometry3::translation(0.5, 0.0, 0.5), DT);
        assert_eq!(p.waypoint_index(), 1);

        p.follow_path(&Isometry3::translation(0.0, 0.0, 19.0), DT);
        assert_eq!(p.waypoint_index(), 2);

        p.follow_path(&Isometry3::translation(19.0, 0.0, 20.0), DT);
        assert_eq!(p.waypoint_index(), 0);
    }

    #[test]
    fn arrival_tick_steers_at_the_reached_waypoint() {
        let mut p = pilot(None);
        p.follow_path(&Isometry3::translation(0.5, 0.0, 0.5), DT);
        assert_eq!(p.waypoint_index(), 1);

        // 0.707 m from waypoint 0, inside the 5 m brake ramp
        let s = p.signal();
        assert!(s.braking);
        assert_relative_eq!(s.throttle, 0.5f32.sqrt() / 5.0, epsilon = 1e-4);
    }

    #[test]
    fn far_from_waypoint_keeps_index() {
        let mut p = pilot(None);
        p.follow_path(&Isometry3::translation(0.0, 0.0, -50.0), DT);
        assert_eq!(p.waypoint_index(), 0);
        assert_eq!(p.signal().throttle, 1.0);
    }

    #[test]
    fn start_without_waypoint_is_reached_immediately() {
        let mut p = pilot(None);
        assert!(p.navigate_to_start(&Isometry3::translation(100.0, 0.0, 100.0), DT));
        assert!(p.reached_start());
    }

    #[test]
    fn start_reached_inside_radius() {
        let mut p = pilot(Some(Point3::new(0.0, 0.0, 10.0)));
        assert!(!p.navigate_to_start(&Isometry3::identity(), DT));
        assert!(p.navigate_to_start(&Isometry3::translation(0.0, 0.0, 8.0), DT));
        // sticky once reached
        assert!(p.navigate_to_start(&Isometry3::translation(0.0, 0.0, -80.0), DT));
    }

    #[test]
    fn avoidance_direction_is_picked_once_per_episode() {
        let mut p = pilot(None);
        let mut dirs = FixedDirection::new(AvoidDirection::Right);
        p.avoid_wall(&mut dirs, DT);
        p.avoid_wall(&mut dirs, DT);
        p.avoid_wall(&mut dirs, DT);
        assert_eq!(dirs.picks, 1);
        assert_eq!(p.signal().steering, 1.0);

        p.end_avoidance();
        p.avoid_wall(&mut dirs, DT);
        assert_eq!(dirs.picks, 2);
    }

    #[test]
    fn chase_drops_vanished_target() {
        let mut reg = AgentRegistry::new();
        let me = AgentId::new();
        let other = AgentId::new();
        reg.register(other, "other", Point3::new(0.0, 0.0, 10.0), Point3::new(0.0, 0.0, 12.0));

        let sel = ChaseTargetSelector::new(20.0);
        let mut p = pilot(None);
        p.set_chase_target(other);
        assert!(p.chase(&reg, &sel, me, &Isometry3::identity(), DT));

        reg.mark_eliminated(other);
        assert!(!p.chase(&reg, &sel, me, &Isometry3::identity(), DT));
        assert!(p.chase_target().is_none());
    }

    #[test]
    fn reset_restores_neutral_braking_inputs() {
        let mut p = pilot(Some(Point3::new(0.0, 0.0, 1.0)));
        p.navigate_to_start(&Isometry3::identity(), DT);
        p.follow_path(&Isometry3::identity(), DT);
        p.reset();
        assert_eq!(p.signal(), InputSignal::neutral());
        assert!(!p.reached_start());
        assert_eq!(p.waypoint_index(), 0);
    }
}
