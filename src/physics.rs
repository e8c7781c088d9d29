// src/physics.rs

use std::collections::HashMap;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::{
    vector, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, DefaultBroadPhase, Group,
    ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline, Ray, Real, RigidBodyBuilder,
    RigidBodyHandle, RigidBodySet, RigidBodyType, Vector,
};
use tracing::{debug, info, warn};

use crate::config::{PhysicsConfig, WallSpec};
use crate::hover_contact::sample_hover_points;
use crate::hover_model::{solve_step, BodySample, ForceCommand, StepOutput};
use crate::input::InputSignal;
use crate::vehicle::{Vehicle, VehicleConfig};

pub const GROUP_GROUND: Group  = Group::from_bits_truncate(0b0001);
pub const GROUP_CHASSIS: Group = Group::from_bits_truncate(0b0010);
pub const GROUP_HAZARD: Group  = Group::from_bits_truncate(0b0100);

// --------------------------------------------------
// Ray queries (surface-class filtered)
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Ground,
    Hazard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFilter {
    pub ground: bool,
    pub hazard: bool,
    pub exclude: Option<RigidBodyHandle>,
}

impl SurfaceFilter {
    /// Walls, trails and other things a racer must not run into.
    pub fn hazard() -> Self {
        Self { ground: false, hazard: true, exclude: None }
    }

    /// Anything a hover ray can rest on.
    pub fn solid() -> Self {
        Self { ground: true, hazard: true, exclude: None }
    }

    pub fn excluding(mut self, body: RigidBodyHandle) -> Self {
        self.exclude = Some(body);
        self
    }

    pub fn accepts(&self, surface: Surface) -> bool {
        match surface {
            Surface::Ground => self.ground,
            Surface::Hazard => self.hazard,
        }
    }

    fn groups(&self) -> Group {
        let mut g = Group::empty();
        if self.ground {
            g |= GROUP_GROUND;
        }
        if self.hazard {
            g |= GROUP_HAZARD;
        }
        g
    }
}

pub trait RayQuery {
    /// Distance along `dir` (unit) to the first accepted surface within `max_dist`.
    fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_dist: f32, filter: SurfaceFilter) -> Option<f32>;
}

/// Read-only view of the rapier scene for ray casts.
pub struct SceneQuery<'a> {
    bodies: &'a RigidBodySet,
    colliders: &'a ColliderSet,
    query_pipeline: &'a QueryPipeline,
}

impl RayQuery for SceneQuery<'_> {
    fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_dist: f32, filter: SurfaceFilter) -> Option<f32> {
        let groups = filter.groups();
        if groups.is_empty() || !(max_dist > 0.0) {
            return None;
        }

        let mut query = QueryFilter::default().groups(InteractionGroups::new(Group::ALL, groups));
        if let Some(body) = filter.exclude {
            query = query.exclude_rigid_body(body);
        }

        let ray = Ray::new(origin, dir);
        self.query_pipeline
            .cast_ray(self.bodies, self.colliders, &ray, max_dist, true, query)
            .map(|(_collider, toi)| toi)
    }
}

// --------------------------------------------------
// World
// --------------------------------------------------

pub struct PhysicsWorld {
    pub gravity: Vector<Real>, // gravity vector
    pub pipeline: PhysicsPipeline, // physics pipeline
    pub island_manager: IslandManager, // manages islands of bodies
    pub broad_phase: DefaultBroadPhase, // broad-phase collision detection
    pub narrow_phase: NarrowPhase, // collision detection
    pub bodies: RigidBodySet, // for rigid bodies
    pub colliders: ColliderSet, // for collision shapes
    pub joints: ImpulseJointSet, // for constraints
    pub multibody_joints: MultibodyJointSet,// for articulated bodies
    pub ccd: CCDSolver, // continuous collision detection
    pub query_pipeline: QueryPipeline, // for raycasting
    pub vehicles: HashMap<RigidBodyHandle, Vehicle>, // body handle → vehicle
    pub world_limit: f32, // safety reset bound
}

fn yaw_pose(center: [f32; 3], yaw_degrees: f32) -> Isometry3<f32> {
    Isometry3::from_parts(
        Translation3::new(center[0], center[1], center[2]),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_degrees.to_radians()),
    )
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let gravity = vector![0.0, -config.gravity, 0.0];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // === Static ground box, top surface exactly at y = 0 ===
        let half = config.ground_half_extent;
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -0.1, 0.0])
            .build();

        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(half, 0.1, half)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(0.0)
            .restitution(0.0)
            .build();

        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            vehicles: HashMap::new(),
            world_limit: config.world_limit,
        }
    }

    /// Static box tagged as a hazard surface (arena wall, light trail segment).
    pub fn add_hazard_wall(&mut self, wall: &WallSpec) -> ColliderHandle {
        let rb = RigidBodyBuilder::fixed()
            .position(yaw_pose(wall.center, wall.yaw_degrees))
            .build();
        let handle = self.bodies.insert(rb);

        let [hx, hy, hz] = wall.half_extents;
        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(GROUP_HAZARD, GROUP_CHASSIS))
            .friction(0.0)
            .restitution(0.0)
            .build();

        let collider = self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        debug!(center = ?wall.center, half_extents = ?wall.half_extents, "hazard wall added");
        collider
    }

    /// Spawn a hover-bike chassis:
    /// - Dynamic rigid body with a box collider.
    /// - Hover points sampled from `config.hover_points`.
    pub fn spawn_vehicle(&mut self, config: VehicleConfig, pose: Isometry3<f32>) -> RigidBodyHandle {
        let [hx, hy, hz] = config.half_extents;
        let volume = 8.0 * hx * hy * hz;     // box size
        let density = config.mass / volume;  // ρ = m / V

        let rb = RigidBodyBuilder::dynamic()
            .position(pose)
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(true)
            .can_sleep(false)
            .build();

        let collider = ColliderBuilder::cuboid(hx, hy, hz)
            .collision_groups(InteractionGroups::new(
                GROUP_CHASSIS,
                GROUP_GROUND | GROUP_HAZARD | GROUP_CHASSIS,
            ))
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.vehicles.insert(handle, Vehicle::new(handle, config, pose));

        info!(?handle, position = ?pose.translation.vector, "spawned hover bike");
        handle
    }

    /// Store the controller output; forces are applied in `step`.
    pub fn set_input(&mut self, body: RigidBodyHandle, input: InputSignal) {
        if let Some(v) = self.vehicles.get_mut(&body) {
            v.input = input.sanitized();
        }
    }

    pub fn vehicle(&self, body: RigidBodyHandle) -> Option<&Vehicle> {
        self.vehicles.get(&body)
    }

    pub fn body_pose(&self, body: RigidBodyHandle) -> Option<Isometry3<f32>> {
        self.bodies.get(body).map(|b| *b.position())
    }

    pub fn body_sample(&self, body: RigidBodyHandle) -> Option<BodySample> {
        self.bodies.get(body).map(|b| BodySample {
            pose: *b.position(),
            linvel: *b.linvel(),
            angvel: *b.angvel(),
            center_of_mass: *b.center_of_mass(),
        })
    }

    /// Kinematic on → pose → zero velocity → kinematic off. Re-enables a frozen vehicle.
    pub fn teleport(&mut self, body: RigidBodyHandle, pose: Isometry3<f32>) -> bool {
        let Some(rb) = self.bodies.get_mut(body) else { return false };

        rb.set_body_type(RigidBodyType::KinematicPositionBased, true);
        rb.set_position(pose, true);
        rb.set_linvel(vector![0.0, 0.0, 0.0], true);
        rb.set_angvel(vector![0.0, 0.0, 0.0], true);
        rb.reset_forces(true);
        rb.reset_torques(true);
        rb.set_body_type(RigidBodyType::Dynamic, true);

        if let Some(v) = self.vehicles.get_mut(&body) {
            v.input = InputSignal::neutral();
            v.speed = 0.0;
            v.active = true;
            for p in v.hover_points.iter_mut() {
                p.clearance = None;
            }
        }
        true
    }

    /// Hold the body still (kinematic, zero velocity) and stop driving it.
    pub fn freeze(&mut self, body: RigidBodyHandle) -> bool {
        let Some(rb) = self.bodies.get_mut(body) else { return false };

        let pose = *rb.position();
        rb.set_body_type(RigidBodyType::KinematicPositionBased, true);
        rb.set_next_kinematic_position(pose);
        rb.set_linvel(vector![0.0, 0.0, 0.0], true);
        rb.set_angvel(vector![0.0, 0.0, 0.0], true);
        rb.reset_forces(true);
        rb.reset_torques(true);

        if let Some(v) = self.vehicles.get_mut(&body) {
            v.input = InputSignal::neutral();
            v.speed = 0.0;
            v.active = false;
        }
        true
    }

    pub fn scene(&self) -> SceneQuery<'_> {
        SceneQuery {
            bodies: &self.bodies,
            colliders: &self.colliders,
            query_pipeline: &self.query_pipeline,
        }
    }

    /// Bring ray queries up to date after bodies were added or moved outside `step`.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    // --------------------------------------------------------------
    // hover + drive: sample, solve, collect (no body mutation here)
    // --------------------------------------------------------------
    fn solve_vehicles(&mut self, dt: Real) -> Vec<(RigidBodyHandle, StepOutput)> {
        let scene = SceneQuery {
            bodies: &self.bodies,
            colliders: &self.colliders,
            query_pipeline: &self.query_pipeline,
        };

        let mut outputs = Vec::with_capacity(self.vehicles.len());

        for (&handle, vehicle) in self.vehicles.iter_mut() {
            if !vehicle.active {
                continue;
            }
            let Some(rb) = self.bodies.get(handle) else { continue };

            let sample = BodySample {
                pose: *rb.position(),
                linvel: *rb.linvel(),
                angvel: *rb.angvel(),
                center_of_mass: *rb.center_of_mass(),
            };

            let contacts = sample_hover_points(
                &scene,
                &sample.pose,
                &mut vehicle.hover_points,
                vehicle.config.hover_height,
                handle,
            );

            let ctx = vehicle.config.solve_context(dt);
            let out = solve_step(&ctx, &vehicle.input, &sample, &contacts);
            vehicle.speed = out.forward_speed;
            outputs.push((handle, out));
        }

        outputs
    }

    fn apply_commands(&mut self, outputs: Vec<(RigidBodyHandle, StepOutput)>) {
        // user forces persist in rapier; clear them every step
        for handle in self.vehicles.keys() {
            if let Some(rb) = self.bodies.get_mut(*handle) {
                rb.reset_forces(false);
                rb.reset_torques(false);
            }
        }

        for (handle, out) in outputs {
            let Some(rb) = self.bodies.get_mut(handle) else { continue };
            for cmd in out.commands {
                match cmd {
                    ForceCommand::Force { force, at_point: Some(p) } => rb.add_force_at_point(force, p, true),
                    ForceCommand::Force { force, at_point: None } => rb.add_force(force, true),
                    ForceCommand::Rotate { delta } => {
                        let rot = *rb.rotation() * delta;
                        rb.set_rotation(rot, true);
                    }
                }
            }
        }
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        self.query_pipeline.update(&self.colliders);

        // 1) Inputs + hover sampling → force commands (NO MUTATION)
        let outputs = self.solve_vehicles(dt);

        // 2) Apply forces / rotation increments
        self.apply_commands(outputs);

        // 3) Step physics.
        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // 4) Safety: prevent bodies from exploding to insane coordinates
        let limit = self.world_limit;
        for vehicle in self.vehicles.values_mut() {
            let Some(body) = self.bodies.get_mut(vehicle.body) else { continue };
            let pos = *body.translation();

            let bad = !pos.iter().all(|c| c.is_finite()) || pos.iter().any(|c| c.abs() > limit);

            if bad {
                body.set_position(vehicle.home, true);
                body.set_linvel(vector![0.0, 0.0, 0.0], true);
                body.set_angvel(vector![0.0, 0.0, 0.0], true);
                vehicle.speed = 0.0;

                warn!(body = ?vehicle.body, home = ?vehicle.home.translation.vector, "reset exploding body");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&PhysicsConfig::default())
    }

    #[test]
    fn ground_ray_hits_top_surface() {
        let mut w = world();
        w.refresh_queries();
        let d = w.scene().cast_ray(Point3::new(0.0, 2.0, 0.0), -Vector3::y(), 5.0, SurfaceFilter::solid());
        let d = d.expect("ground hit");
        assert!((d - 2.0).abs() < 1e-3, "distance {d}");
    }

    #[test]
    fn hazard_filter_ignores_ground_and_sees_walls() {
        let mut w = world();
        w.add_hazard_wall(&WallSpec { center: [0.0, 1.0, 10.0], half_extents: [5.0, 1.0, 0.5], yaw_degrees: 0.0 });
        w.refresh_queries();

        let scene = w.scene();
        assert!(scene.cast_ray(Point3::new(0.0, 2.0, 0.0), -Vector3::y(), 5.0, SurfaceFilter::hazard()).is_none());

        let d = scene
            .cast_ray(Point3::new(0.0, 1.0, 0.0), Vector3::z(), 20.0, SurfaceFilter::hazard())
            .expect("wall hit");
        assert!((d - 9.5).abs() < 1e-3, "distance {d}");
    }

    #[test]
    fn own_body_is_excluded() {
        let mut w = world();
        let pose = Isometry3::translation(0.0, 5.0, 0.0);
        let h = w.spawn_vehicle(VehicleConfig::default(), pose);
        w.refresh_queries();

        // straight down through the chassis: only the ground should count
        let d = w
            .scene()
            .cast_ray(Point3::new(0.0, 5.0, 0.0), -Vector3::y(), 10.0, SurfaceFilter::solid().excluding(h))
            .expect("ground hit");
        assert!((d - 5.0).abs() < 1e-3);
    }

    #[test]
    fn freeze_then_teleport_restores_dynamic_body() {
        let mut w = world();
        let h = w.spawn_vehicle(VehicleConfig::default(), Isometry3::translation(0.0, 3.0, 0.0));

        assert!(w.freeze(h));
        assert!(!w.vehicle(h).unwrap().active);
        assert!(w.bodies[h].is_kinematic());

        let target = Isometry3::translation(4.0, 3.0, -2.0);
        assert!(w.teleport(h, target));
        assert!(w.bodies[h].is_dynamic());
        assert!(w.vehicle(h).unwrap().active);
        assert_eq!(w.body_pose(h).unwrap().translation.vector, target.translation.vector);
        assert_eq!(w.body_sample(h).unwrap().linvel, Vector3::zeros());
    }

    #[test]
    fn exploding_body_is_reset_home() {
        let mut w = world();
        let home = Isometry3::translation(0.0, 3.0, 0.0);
        let h = w.spawn_vehicle(VehicleConfig::default(), home);
        w.bodies.get_mut(h).unwrap().set_translation(vector![5_000.0, 3.0, 0.0], true);

        w.step(1.0 / 60.0);
        let p = w.body_pose(h).unwrap().translation.vector;
        assert!(p.x.abs() < 1.0, "x = {}", p.x);
    }

    #[test]
    fn missing_body_operations_report_false() {
        let mut w = world();
        let ghost = RigidBodyHandle::invalid();
        assert!(!w.freeze(ghost));
        assert!(!w.teleport(ghost, Isometry3::identity()));
        assert!(w.body_pose(ghost).is_none());
    }
}
