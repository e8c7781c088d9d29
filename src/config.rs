// ==============================================================================
// config.rs — SIMULATION CONFIGURATION (JSON)
// ------------------------------------------------------------------------------
// Every section has defaults, so `{}` is a valid (if empty) arena. Sections:
// - physics: tick rate, gravity, world limit for the safety reset
// - vehicle: hover-bike tuning (see vehicle.rs)
// - ai:      navigation + steering tuning shared by every AI agent
// - arena:   waypoints, start point, spawn points, hazard walls
// - agents:  who to spawn and with which controller
// ==============================================================================

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::vehicle::VehicleConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub physics: PhysicsConfig,
    pub vehicle: VehicleConfig,
    pub ai: AiConfig,
    pub arena: ArenaConfig,
    pub agents: Vec<AgentSpec>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            physics: PhysicsConfig::default(),
            vehicle: VehicleConfig::default(),
            ai: AiConfig::default(),
            arena: ArenaConfig::default(),
            agents: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub tick_hz: f32,             // fixed step rate
    pub gravity: f32,             // m/s², applied along -Y
    pub world_limit: f32,         // |coord| beyond this resets the body
    pub ground_half_extent: f32,  // ground box half size (x/z)
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            gravity: 9.81,
            world_limit: 1_000.0,
            ground_half_extent: 500.0,
        }
    }
}

impl PhysicsConfig {
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub max_throttle: f32,
    pub max_steering_angle_deg: f32,
    pub turn_sharpness: f32,
    pub brake_distance: f32,
    pub tilt_responsiveness: f32,
    pub waypoint_radius: f32,
    pub wall_detection_distance: f32,
    pub wall_probe_drop: f32,           // probe origin sits this far below the body
    pub chase_trigger_range: f32,
    pub chase_refresh_interval: f32,    // s
    pub avoidance_recovery: f32,        // s
    pub aim_distance: f32,              // aim point ahead of the body
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_throttle: 1.0,
            max_steering_angle_deg: 45.0,
            turn_sharpness: 1.5,
            brake_distance: 5.0,
            tilt_responsiveness: 3.0,
            waypoint_radius: 3.0,
            wall_detection_distance: 5.0,
            wall_probe_drop: 0.5,
            chase_trigger_range: 20.0,
            chase_refresh_interval: 2.0,
            avoidance_recovery: 1.0,
            aim_distance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw_degrees: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSpec {
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default)]
    pub yaw_degrees: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub waypoints: Vec<[f32; 3]>,
    pub start_waypoint: Option<[f32; 3]>,
    pub spawn_points: Vec<SpawnPoint>,
    pub hazard_walls: Vec<WallSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Ai,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub controller: ControllerKind,
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("physics.tick_hz", self.physics.tick_hz)?;
        positive("physics.world_limit", self.physics.world_limit)?;
        positive("physics.ground_half_extent", self.physics.ground_half_extent)?;

        let v = &self.vehicle;
        positive("vehicle.mass", v.mass)?;
        positive("vehicle.hover_height", v.hover_height)?;
        non_negative("vehicle.hover_force", v.hover_force)?;
        non_negative("vehicle.damping", v.damping)?;
        non_negative("vehicle.max_force", v.max_force)?;
        non_negative("vehicle.max_speed", v.max_speed)?;
        non_negative("vehicle.brake_strength", v.brake_strength)?;
        non_negative("vehicle.velocity_threshold", v.velocity_threshold)?;
        if v.hover_points.is_empty() {
            return Err(ConfigError::Invalid {
                field: "vehicle.hover_points",
                requirement: "non-empty",
                value: "[]".into(),
            });
        }

        let ai = &self.ai;
        unit_interval("ai.max_throttle", ai.max_throttle)?;
        positive("ai.max_steering_angle_deg", ai.max_steering_angle_deg)?;
        non_negative("ai.turn_sharpness", ai.turn_sharpness)?;
        non_negative("ai.brake_distance", ai.brake_distance)?;
        non_negative("ai.tilt_responsiveness", ai.tilt_responsiveness)?;
        positive("ai.waypoint_radius", ai.waypoint_radius)?;
        positive("ai.wall_detection_distance", ai.wall_detection_distance)?;
        non_negative("ai.chase_trigger_range", ai.chase_trigger_range)?;
        positive("ai.chase_refresh_interval", ai.chase_refresh_interval)?;
        non_negative("ai.avoidance_recovery", ai.avoidance_recovery)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, requirement: "a finite number > 0", value: value.to_string() })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, requirement: "a finite number >= 0", value: value.to_string() })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, requirement: "within [0, 1]", value: value.to_string() })
    }
}
