// ==============================================================================
// fsm.rs — PER-AGENT NAVIGATION STATE MACHINE
// ------------------------------------------------------------------------------
// States: Start, FollowPath, AvoidWall, Chase. Created in Start.
//
// Tick order (first match wins, every branch leaves a fresh InputSignal):
//
// 0) timers      range scan timer advances; recovery timer firing ends the
//                avoidance episode and forces FollowPath
// 1) gating      start not reached        -> Start
// 2) AvoidWall   wall still ahead         -> keep swerving, done
//                wall gone                -> cancel recovery, FollowPath (falls through)
// 3) Start       steer to start waypoint; reached -> FollowPath, follow path now
// 4) Chase       wall ahead               -> AvoidWall
//                target still valid / found within trigger range -> chase it
//                otherwise                -> FollowPath, follow path now
// 5) FollowPath  wall ahead               -> AvoidWall
//                scan due and target in range -> Chase, chase it now
//                otherwise                -> steer to waypoint, advance on arrival
//
// Entering AvoidWall (from anything but AvoidWall) picks a direction once and
// (re)arms the recovery timer, cancelling any pending one. The live wall check
// and the recovery timer are independent exits.
// ==============================================================================

use std::fmt;

use nalgebra::Point3;
use serde::Serialize;
use tracing::debug;

use crate::ai::chase::{ChaseTargetSelector, RefreshTimer};
use crate::ai::pilot::Pilot;
use crate::ai::registry::AgentRegistry;
use crate::ai::steering::{SteeringConfig, SteeringController};
use crate::ai::timer::OneShotTimer;
use crate::ai::wall::{WallDetector, WallProbe};
use crate::config::AiConfig;
use crate::error::SetupError;
use crate::input::{ControlContext, Controller, InputSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationState {
    Start,
    FollowPath,
    AvoidWall,
    Chase,
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationState::Start => "start",
            NavigationState::FollowPath => "follow_path",
            NavigationState::AvoidWall => "avoid_wall",
            NavigationState::Chase => "chase",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct NavigationStateMachine {
    name: String,
    state: NavigationState,
    pilot: Pilot,
    wall: WallDetector,
    selector: ChaseTargetSelector,
    scan: RefreshTimer,           // range-limited decision scan
    recovery: OneShotTimer,       // forced exit from AvoidWall
    recovery_delay: f32,
    last_probe: Option<WallProbe>,
}

impl NavigationStateMachine {
    pub fn new(
        name: impl Into<String>,
        waypoints: Vec<Point3<f32>>,
        start_waypoint: Option<Point3<f32>>,
        ai: &AiConfig,
    ) -> Result<Self, SetupError> {
        let name = name.into();
        if waypoints.is_empty() {
            return Err(SetupError::NoWaypoints { agent: name });
        }

        let steering = SteeringController::new(SteeringConfig::from(ai));
        Ok(Self {
            name,
            state: NavigationState::Start,
            pilot: Pilot::new(steering, waypoints, start_waypoint, ai.waypoint_radius, ai.chase_refresh_interval),
            wall: WallDetector::new(ai.wall_detection_distance, ai.wall_probe_drop),
            selector: ChaseTargetSelector::new(ai.chase_trigger_range),
            scan: RefreshTimer::new(ai.chase_refresh_interval),
            recovery: OneShotTimer::new(),
            recovery_delay: ai.avoidance_recovery,
            last_probe: None,
        })
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn pilot(&self) -> &Pilot {
        &self.pilot
    }

    pub fn recovery_pending(&self) -> bool {
        self.recovery.is_pending()
    }

    fn transition(&mut self, to: NavigationState) {
        if self.state != to {
            debug!(agent = %self.name, from = %self.state, to = %to, "navigation transition");
            self.state = to;
            if to == NavigationState::FollowPath {
                self.scan.expire();
            }
        }
    }

    fn enter_avoidance(&mut self, ctx: &mut ControlContext<'_>) {
        self.transition(NavigationState::AvoidWall);
        self.recovery.schedule(self.recovery_delay);
        self.pilot.avoid_wall(ctx.directions, ctx.dt);
    }

    fn wall_ahead(&mut self, ctx: &ControlContext<'_>) -> bool {
        let probe = self.wall.probe(ctx.world, &ctx.pose, ctx.body);
        self.last_probe = Some(probe);
        probe.is_hit()
    }

    fn follow_path(&mut self, ctx: &mut ControlContext<'_>) {
        if self.wall_ahead(ctx) {
            self.enter_avoidance(ctx);
            return;
        }

        if self.scan.is_due() {
            self.scan.restart();
            let position = Point3::from(ctx.pose.translation.vector);
            if let Some(target) = self.selector.nearest_in_range(ctx.registry, position, ctx.agent) {
                let id = target.id;
                self.transition(NavigationState::Chase);
                self.pilot.set_chase_target(id);
                if self.pilot.chase(ctx.registry, &self.selector, ctx.agent, &ctx.pose, ctx.dt) {
                    return;
                }
                self.transition(NavigationState::FollowPath);
            }
        }

        self.pilot.follow_path(&ctx.pose, ctx.dt);
    }

    fn chase(&mut self, ctx: &mut ControlContext<'_>) {
        if self.wall_ahead(ctx) {
            self.enter_avoidance(ctx);
            return;
        }

        let position = Point3::from(ctx.pose.translation.vector);
        let current = self
            .pilot
            .chase_target()
            .filter(|&t| self.selector.still_in_range(ctx.registry, position, ctx.agent, t));

        let target = if current.is_none() || self.scan.is_due() {
            self.scan.restart();
            self.selector.nearest_in_range(ctx.registry, position, ctx.agent).map(|e| e.id)
        } else {
            current
        };

        // The range-checked pick is re-asserted every tick; the pilot's own
        // any-range refresh never overrides it while chasing.
        if let Some(id) = target {
            self.pilot.set_chase_target(id);
            if self.pilot.chase(ctx.registry, &self.selector, ctx.agent, &ctx.pose, ctx.dt) {
                return;
            }
        }

        self.pilot.clear_chase_target();
        self.transition(NavigationState::FollowPath);
        self.pilot.follow_path(&ctx.pose, ctx.dt);
    }

    /// One control tick. Returns the fresh InputSignal.
    pub fn tick(&mut self, ctx: &mut ControlContext<'_>) -> InputSignal {
        // 0) timers
        self.scan.advance(ctx.dt);
        if self.recovery.tick(ctx.dt) {
            self.pilot.end_avoidance();
            if self.state == NavigationState::AvoidWall {
                self.transition(NavigationState::FollowPath);
            }
        }

        // 1) gating
        if !self.pilot.reached_start() {
            self.transition(NavigationState::Start);
        }

        // 2) live wall check while avoiding
        if self.state == NavigationState::AvoidWall {
            if self.wall_ahead(ctx) {
                self.pilot.avoid_wall(ctx.directions, ctx.dt);
                return self.pilot.signal();
            }
            self.recovery.cancel();
            self.pilot.end_avoidance();
            self.transition(NavigationState::FollowPath);
        }

        match self.state {
            NavigationState::Start => {
                self.last_probe = None;
                if self.pilot.navigate_to_start(&ctx.pose, ctx.dt) {
                    self.transition(NavigationState::FollowPath);
                    self.pilot.follow_path(&ctx.pose, ctx.dt);
                }
            }
            NavigationState::Chase => self.chase(ctx),
            NavigationState::FollowPath => self.follow_path(ctx),
            NavigationState::AvoidWall => {}
        }

        self.pilot.signal()
    }
}

impl Controller for NavigationStateMachine {
    fn update(&mut self, ctx: &mut ControlContext<'_>) -> InputSignal {
        self.tick(ctx)
    }

    fn reset(&mut self) {
        debug!(agent = %self.name, from = %self.state, "navigation reset");
        self.state = NavigationState::Start;
        self.recovery.cancel();
        self.scan.expire();
        self.pilot.reset();
        self.last_probe = None;
    }

    fn navigation_state(&self) -> Option<NavigationState> {
        Some(self.state)
    }

    fn wall_probe(&self) -> Option<WallProbe> {
        self.last_probe
    }

    fn steering_target(&self, registry: &AgentRegistry) -> Option<Point3<f32>> {
        match self.state {
            NavigationState::Start => self.pilot.start_waypoint(),
            NavigationState::FollowPath => Some(self.pilot.current_waypoint()),
            NavigationState::Chase => self
                .pilot
                .chase_target()
                .and_then(|id| registry.get(id))
                .and_then(|e| e.aim_point),
            NavigationState::AvoidWall => None,
        }
    }
}
