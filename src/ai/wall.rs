use nalgebra::{Isometry3, Point3, Vector3};
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;

use crate::hover_model::kinematics::{horizontal_forward, up};
use crate::physics::{RayQuery, SurfaceFilter};

/// One forward probe: where it started, where it looked, what it found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallProbe {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
    pub max_distance: f32,
    pub hit_distance: Option<f32>,
}

impl WallProbe {
    pub fn is_hit(&self) -> bool {
        self.hit_distance.is_some()
    }
}

/// Forward ray against hazard surfaces only. Stateless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallDetector {
    pub detection_distance: f32,
    pub probe_drop: f32, // origin = position - up * probe_drop
}

impl WallDetector {
    pub fn new(detection_distance: f32, probe_drop: f32) -> Self {
        Self { detection_distance, probe_drop }
    }

    pub fn probe(&self, world: &dyn RayQuery, pose: &Isometry3<f32>, body: RigidBodyHandle) -> WallProbe {
        let origin: Point3<f32> = Point3::from(pose.translation.vector) - up() * self.probe_drop;
        let direction: Vector3<f32> = horizontal_forward(&pose.rotation);

        let hit_distance = world.cast_ray(
            origin,
            direction,
            self.detection_distance,
            SurfaceFilter::hazard().excluding(body),
        );

        WallProbe {
            origin: origin.into(),
            direction: direction.into(),
            max_distance: self.detection_distance,
            hit_distance,
        }
    }
}
