// ==============================================================================
// hover_contact.rs — HOVER POINT RAYCASTS
// ------------------------------------------------------------------------------
// Casts one ray per hover point, straight down in world space, up to the hover
// height. Produces a HoverContact per point (world position + optional ground
// clearance) and records the clearance on the HoverPoint for the debug overlay.
//
// Notes:
// - This file does NOT apply forces. It only measures.
// - The own chassis is excluded; any solid surface (ground or hazard top) counts.
// - A hover point already below the surface reports clearance 0.
// ==============================================================================

use nalgebra::{Isometry3, Vector3};
use rapier3d::prelude::RigidBodyHandle;

use crate::hover_model::HoverContact;
use crate::physics::{RayQuery, SurfaceFilter};
use crate::vehicle::HoverPoint;

pub fn sample_hover_points(
    query: &dyn RayQuery,
    pose: &Isometry3<f32>,
    points: &mut [HoverPoint],
    hover_height: f32,
    body: RigidBodyHandle,
) -> Vec<HoverContact> {
    let dir = -Vector3::y();
    let filter = SurfaceFilter::solid().excluding(body);

    points
        .iter_mut()
        .map(|hp| {
            let origin = pose * hp.offset;
            hp.clearance = query.cast_ray(origin, dir, hover_height, filter);
            HoverContact { point: origin, clearance: hp.clearance }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    /// Flat floor at y = 0.
    struct Floor;

    impl RayQuery for Floor {
        fn cast_ray(&self, origin: Point3<f32>, dir: Vector3<f32>, max_dist: f32, filter: SurfaceFilter) -> Option<f32> {
            if !filter.ground || dir.y >= 0.0 {
                return None;
            }
            let d = (origin.y / -dir.y).max(0.0);
            (d <= max_dist).then_some(d)
        }
    }

    #[test]
    fn clearance_recorded_per_point_and_missing_beyond_height() {
        let mut points = vec![HoverPoint::new([0.0, -0.3, 1.0]), HoverPoint::new([0.0, -0.3, -1.0])];
        let pose = Isometry3::translation(0.0, 2.3, 0.0);

        let contacts = sample_hover_points(&Floor, &pose, &mut points, 3.0, RigidBodyHandle::invalid());
        assert_eq!(contacts.len(), 2);
        assert!((contacts[0].clearance.unwrap() - 2.0).abs() < 1e-5);
        assert_eq!(points[1].clearance, contacts[1].clearance);
        assert!((contacts[1].point.z + 1.0).abs() < 1e-6);

        let high = Isometry3::translation(0.0, 10.0, 0.0);
        let contacts = sample_hover_points(&Floor, &high, &mut points, 3.0, RigidBodyHandle::invalid());
        assert!(contacts.iter().all(|c| c.clearance.is_none()));
        assert!(points.iter().all(|p| p.clearance.is_none()));
    }
}
