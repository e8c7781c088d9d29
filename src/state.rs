// ==============================================================================
// state.rs — SIMULATION SESSION (AGENTS, CONTROLLERS, LIFECYCLE, SNAPSHOTS)
// ------------------------------------------------------------------------------
// One fixed tick:
// 1) control   every live agent's controller produces a fresh InputSignal
//              (reads body pose, hazard rays, registry; writes nothing shared)
// 2) physics   inputs stored on the vehicles, hover model solved, rapier stepped
// 3) registry  base position + aim point refreshed from the new poses
// 4) overlay   debug primitives rebuilt
//
// Lifecycle:
// - eliminate: registry entry dead (aim point cleared in the same write), body
//   frozen, controller no longer driven, Eliminated event
// - respawn:   body teleported to its spawn pose, controller reset to Start,
//   registry entry alive again, Respawned event
// ==============================================================================

use nalgebra::{Isometry3, Point3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;
use tracing::{debug_span, error, info, warn};

use crate::ai::direction::{DirectionSource, RandomDirection};
use crate::ai::fsm::{NavigationState, NavigationStateMachine};
use crate::ai::registry::{AgentId, AgentRegistry};
use crate::config::{ControllerKind, SimConfig, WallSpec};
use crate::debug_builders::{push_chassis, push_hover_rays, push_nav_line, push_wall_probe, DebugOverlay};
use crate::error::SetupError;
use crate::hover_model::kinematics::horizontal_forward;
use crate::input::{ControlContext, Controller, InputSignal, ManualInput, ManualInputHandle};
use crate::physics::PhysicsWorld;
use crate::spawn::SpawnManager;

pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub body: RigidBodyHandle,
    pub controller: Box<dyn Controller>,
    pub enabled: bool,        // false once the control core hit a fatal error
    pub eliminated: bool,
    pub last_input: InputSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Eliminated { id: AgentId },
    Respawned { id: AgentId },
}

#[derive(Debug, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    pub alive: bool,
    pub state: Option<NavigationState>,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub speed: f32,
    pub input: InputSignal,
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub agents: Vec<AgentSnapshot>,
    pub debug: DebugOverlay,
}

/// Point other racers steer at: a little ahead of the body, on the ground plane.
pub fn aim_point(pose: &Isometry3<f32>, aim_distance: f32) -> Point3<f32> {
    Point3::from(pose.translation.vector) + horizontal_forward(&pose.rotation) * aim_distance
}

pub struct Simulation {
    pub tick: u64,
    pub physics: PhysicsWorld,
    pub registry: AgentRegistry,
    agents: Vec<Agent>,
    spawns: SpawnManager,
    directions: Box<dyn DirectionSource + Send>,
    events: Vec<LifecycleEvent>,
    config: SimConfig,
    debug: DebugOverlay,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let mut physics = PhysicsWorld::new(&config.physics);
        for wall in &config.arena.hazard_walls {
            physics.add_hazard_wall(wall);
        }
        physics.refresh_queries();

        info!(
            seed = config.seed,
            waypoints = config.arena.waypoints.len(),
            walls = config.arena.hazard_walls.len(),
            "simulation created"
        );

        Self {
            tick: 0,
            physics,
            registry: AgentRegistry::new(),
            agents: Vec::new(),
            spawns: SpawnManager::new(&config.arena.spawn_points),
            directions: Box::new(RandomDirection::new(ChaCha8Rng::seed_from_u64(config.seed))),
            events: Vec::new(),
            config,
            debug: DebugOverlay::default(),
        }
    }

    /// Replace the avoidance-direction source (tests pin it).
    pub fn with_direction_source(mut self, source: impl DirectionSource + Send + 'static) -> Self {
        self.directions = Box::new(source);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    fn agent_index(&self, id: AgentId) -> Result<usize, SetupError> {
        self.agents.iter().position(|a| a.id == id).ok_or(SetupError::UnknownAgent(id))
    }

    pub fn navigation_state(&self, id: AgentId) -> Option<NavigationState> {
        self.agent(id).and_then(|a| a.controller.navigation_state())
    }

    /// Spawn every agent listed in the config. Manual agents hand back their input handle.
    pub fn spawn_configured_agents(&mut self) -> Result<Vec<(AgentId, Option<ManualInputHandle>)>, SetupError> {
        let specs = self.config.agents.clone();
        let mut out = Vec::with_capacity(specs.len());
        for spec in specs {
            match spec.controller {
                ControllerKind::Ai => out.push((self.spawn_ai_agent(&spec.name)?, None)),
                ControllerKind::Manual => {
                    let (id, handle) = self.spawn_manual_agent(&spec.name);
                    out.push((id, Some(handle)));
                }
            }
        }
        Ok(out)
    }

    pub fn spawn_ai_agent(&mut self, name: &str) -> Result<AgentId, SetupError> {
        let waypoints: Vec<Point3<f32>> = self.config.arena.waypoints.iter().map(|&p| Point3::from(p)).collect();
        let start = self.config.arena.start_waypoint.map(Point3::from);

        let fsm = NavigationStateMachine::new(name, waypoints, start, &self.config.ai).inspect_err(|e| {
            error!(agent = name, error = %e, "AI agent not spawned");
        })?;
        Ok(self.spawn_agent(name, Box::new(fsm)))
    }

    pub fn spawn_manual_agent(&mut self, name: &str) -> (AgentId, ManualInputHandle) {
        let (manual, handle) = ManualInput::new();
        (self.spawn_agent(name, Box::new(manual)), handle)
    }

    pub fn spawn_agent(&mut self, name: &str, controller: Box<dyn Controller>) -> AgentId {
        let id = AgentId::new();
        let spawn = self.spawns.allocate_spawn(id);
        let body = self.physics.spawn_vehicle(self.config.vehicle.clone(), spawn.pose);

        let position = Point3::from(spawn.pose.translation.vector);
        self.registry.register(id, name, position, aim_point(&spawn.pose, self.config.ai.aim_distance));

        self.agents.push(Agent {
            id,
            name: name.to_string(),
            body,
            controller,
            enabled: true,
            eliminated: false,
            last_input: InputSignal::neutral(),
        });

        info!(agent = name, %id, slot = spawn.slot, "agent spawned");
        id
    }

    /// Drop a hazard wall into the running arena (light-trail segments).
    pub fn add_hazard_wall(&mut self, wall: &WallSpec) {
        self.physics.add_hazard_wall(wall);
        self.physics.refresh_queries();
    }

    pub fn tick(&mut self, dt: f32) {
        self.physics.refresh_queries();

        // 1) Controllers -> inputs
        let mut inputs = Vec::with_capacity(self.agents.len());
        {
            let scene = self.physics.scene();
            for agent in self.agents.iter_mut() {
                if agent.eliminated {
                    continue;
                }
                if !agent.enabled {
                    inputs.push((agent.body, InputSignal::neutral()));
                    continue;
                }

                let Some(pose) = self.physics.body_pose(agent.body) else {
                    let err = SetupError::MissingBody { agent: agent.name.clone() };
                    error!(error = %err, "control core disabled");
                    agent.enabled = false;
                    agent.last_input = InputSignal::neutral();
                    continue;
                };

                let _span = debug_span!("control", agent = %agent.name).entered();
                let mut ctx = ControlContext {
                    agent: agent.id,
                    pose,
                    body: agent.body,
                    dt,
                    world: &scene,
                    registry: &self.registry,
                    directions: &mut *self.directions,
                };
                let input = agent.controller.update(&mut ctx);
                agent.last_input = input;
                inputs.push((agent.body, input));
            }
        }

        for (body, input) in inputs {
            self.physics.set_input(body, input);
        }

        // 2) Physics
        self.physics.step(dt);

        // 3) Registry sync
        let aim_distance = self.config.ai.aim_distance;
        for agent in &self.agents {
            if let Some(pose) = self.physics.body_pose(agent.body) {
                let position = Point3::from(pose.translation.vector);
                self.registry.update_pose(agent.id, position, aim_point(&pose, aim_distance));
            }
        }

        self.tick += 1;

        // 4) Debug overlay
        self.rebuild_debug();
    }

    fn rebuild_debug(&mut self) {
        self.debug.clear();
        for agent in &self.agents {
            let (Some(pose), Some(vehicle)) = (self.physics.body_pose(agent.body), self.physics.vehicle(agent.body)) else {
                continue;
            };
            push_chassis(&mut self.debug, agent.id, &pose, vehicle);
            if agent.eliminated {
                continue;
            }
            push_hover_rays(&mut self.debug, &pose, vehicle);
            if let Some(probe) = agent.controller.wall_probe() {
                push_wall_probe(&mut self.debug, &probe);
            }
            if let (Some(state), Some(target)) =
                (agent.controller.navigation_state(), agent.controller.steering_target(&self.registry))
            {
                push_nav_line(&mut self.debug, agent.id, Point3::from(pose.translation.vector), target, state);
            }
        }
    }

    pub fn eliminate(&mut self, id: AgentId) -> Result<(), SetupError> {
        let i = self.agent_index(id)?;
        let agent = &mut self.agents[i];
        if agent.eliminated {
            return Ok(());
        }

        agent.eliminated = true;
        agent.last_input = InputSignal::neutral();
        self.registry.mark_eliminated(id);
        if !self.physics.freeze(agent.body) {
            warn!(agent = %agent.name, "eliminated agent has no body to freeze");
        }

        info!(agent = %agent.name, %id, "agent eliminated");
        self.events.push(LifecycleEvent::Eliminated { id });
        Ok(())
    }

    pub fn respawn(&mut self, id: AgentId) -> Result<(), SetupError> {
        let i = self.agent_index(id)?;
        let pose = self.spawns.respawn_pose(id).ok_or(SetupError::UnknownAgent(id))?;
        let aim_distance = self.config.ai.aim_distance;

        let agent = &mut self.agents[i];
        if !self.physics.teleport(agent.body, pose) {
            let err = SetupError::MissingBody { agent: agent.name.clone() };
            error!(error = %err, "respawn failed");
            agent.enabled = false;
            return Err(err);
        }

        agent.controller.reset();
        agent.eliminated = false;
        agent.last_input = InputSignal::neutral();
        self.registry
            .mark_alive(id, Point3::from(pose.translation.vector), aim_point(&pose, aim_distance));
        self.physics.refresh_queries();

        info!(agent = %agent.name, %id, "agent respawned");
        self.events.push(LifecycleEvent::Respawned { id });
        Ok(())
    }

    /// Game restart: every agent back to its spawn pose with a fresh controller.
    pub fn reset_all(&mut self) {
        let ids: Vec<AgentId> = self.agents.iter().map(|a| a.id).collect();
        for id in ids {
            if let Err(e) = self.respawn(id) {
                warn!(%id, error = %e, "reset skipped agent");
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        let agents = self
            .agents
            .iter()
            .filter_map(|a| {
                let pose = self.physics.body_pose(a.body)?;
                let q = pose.rotation;
                Some(AgentSnapshot {
                    id: a.id,
                    name: a.name.clone(),
                    alive: !a.eliminated,
                    state: a.controller.navigation_state(),
                    position: pose.translation.vector.into(),
                    rotation: [q.i, q.j, q.k, q.w],
                    speed: self.physics.vehicle(a.body).map_or(0.0, |v| v.speed),
                    input: a.last_input,
                })
            })
            .collect();

        Snapshot { tick: self.tick, agents, debug: self.debug.clone() }
    }
}
