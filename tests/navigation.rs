//! Navigation state machine driven through the full simulation.

use hover_racer::ai::{AvoidDirection, FixedDirection, NavigationState};
use hover_racer::config::{AgentSpec, ControllerKind, SimConfig, SpawnPoint, WallSpec};
use hover_racer::error::SetupError;
use hover_racer::Simulation;

fn arena() -> SimConfig {
    let mut config = SimConfig::default();
    config.arena.waypoints = vec![[0.0, 2.5, 100.0], [100.0, 2.5, 100.0]];
    config.arena.spawn_points = vec![SpawnPoint { position: [0.0, 2.5, 0.0], yaw_degrees: 0.0 }];
    config
}

fn wall_ahead(config: &mut SimConfig) {
    // near face 3 m in front of the spawn point
    config.arena.hazard_walls.push(WallSpec { center: [0.0, 1.0, 3.5], half_extents: [5.0, 2.0, 0.5], yaw_degrees: 0.0 });
}

fn dt(sim: &Simulation) -> f32 {
    sim.config().physics.dt()
}

#[test]
fn no_start_waypoint_goes_straight_to_follow_path() {
    let mut sim = Simulation::new(arena());
    let id = sim.spawn_ai_agent("solo").unwrap();
    assert_eq!(sim.navigation_state(id), Some(NavigationState::Start));

    let dt = dt(&sim);
    sim.tick(dt);
    assert_eq!(sim.navigation_state(id), Some(NavigationState::FollowPath));

    let input = sim.agent(id).unwrap().last_input;
    assert!(input.throttle > 0.0);
    assert!(!input.braking);
}

#[test]
fn wall_ahead_switches_to_avoid_wall() {
    let mut config = arena();
    wall_ahead(&mut config);
    let mut sim = Simulation::new(config).with_direction_source(FixedDirection::new(AvoidDirection::Left));
    let id = sim.spawn_ai_agent("swerver").unwrap();

    let dt = dt(&sim);
    sim.tick(dt);
    sim.tick(dt);
    assert_eq!(sim.navigation_state(id), Some(NavigationState::AvoidWall));

    let input = sim.agent(id).unwrap().last_input;
    assert_eq!(input.throttle, 0.0);
    assert_eq!(input.steering, -1.0);
    assert!(input.braking);

    let snapshot = sim.snapshot();
    assert!(snapshot.debug.wall_probes.iter().any(|r| r.hit.is_some()));
}

#[test]
fn wall_before_start_keeps_start_state() {
    let mut config = arena();
    config.arena.start_waypoint = Some([0.0, 2.5, 60.0]);
    wall_ahead(&mut config);
    let mut sim = Simulation::new(config).with_direction_source(FixedDirection::new(AvoidDirection::Right));
    let id = sim.spawn_ai_agent("waiting").unwrap();

    let dt = dt(&sim);
    for _ in 0..10 {
        sim.tick(dt);
        assert_eq!(sim.navigation_state(id), Some(NavigationState::Start));
    }
}

#[test]
fn nearby_rival_is_chased_until_eliminated() {
    let mut config = arena();
    config.arena.spawn_points = vec![
        SpawnPoint { position: [-3.0, 2.5, 0.0], yaw_degrees: 0.0 },
        SpawnPoint { position: [3.0, 2.5, 0.0], yaw_degrees: 0.0 },
    ];
    config.agents = vec![
        AgentSpec { name: "hunter".into(), controller: ControllerKind::Ai },
        AgentSpec { name: "prey".into(), controller: ControllerKind::Ai },
    ];
    let mut sim = Simulation::new(config);
    let spawned = sim.spawn_configured_agents().unwrap();
    let (hunter, prey) = (spawned[0].0, spawned[1].0);

    let dt = dt(&sim);
    sim.tick(dt); // Start -> FollowPath
    sim.tick(dt); // scan finds the rival 6 m away
    assert_eq!(sim.navigation_state(hunter), Some(NavigationState::Chase));

    sim.eliminate(prey).unwrap();
    for _ in 0..30 {
        sim.tick(dt);
        assert_ne!(sim.navigation_state(hunter), Some(NavigationState::Chase));
    }
    assert!(!sim.registry.get(prey).unwrap().is_targetable());
}

#[test]
fn ai_agent_without_waypoints_is_rejected() {
    let mut config = arena();
    config.arena.waypoints.clear();
    let mut sim = Simulation::new(config);

    let err = sim.spawn_ai_agent("lost").unwrap_err();
    assert!(matches!(err, SetupError::NoWaypoints { .. }));
    assert!(sim.agents().is_empty());
}
