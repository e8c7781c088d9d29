// ==============================================================================
// solve.rs — HOVER-BIKE STEP (HOVER + STEER + DRIVE + BRAKE)
// ==============================================================================
// One call per fixed physics step, in this order:
//
// 1) speed     v_fwd = dot(v_h, forward_h)                         (signed)
// 2) hover     per point:  hit  -> F_up = up * (1 - d/h) * hover_force  @ point
//                          always -> F_d = -v(point) * damping          @ point
// 3) steer     only when |v| > threshold:
//                rotate   yaw += tilt * rotation_speed * dt             (deg)
//                strafe   F_s  = right * steering * strafe_force        @ COM
//                rotate   yaw += steering * turn_steer                  (deg)
// 4) drive     throttle > 0:
//                ratio = clamp01(v_fwd / max_speed)
//                F = forward_h * throttle * max_force * curve(ratio)    @ COM
// 5) brake     braking && |v| > threshold:
//                F = -v̂ * brake_strength                               @ COM
//
// Inputs are clamped here (a misbehaving controller must not destabilize the
// body) and non-finite values collapse to neutral. Nothing is normalized
// unless its length is above the velocity threshold.
//
// Outputs a list of ForceCommand consumed by physics.rs, which applies:
// - add_force() at COM
// - add_force_at_point() at hover points
// - set_rotation(current * delta) for rotation increments
// ==============================================================================

use nalgebra::Vector3;

use crate::hover_model::kinematics::{
    forward_speed, horizontal_forward, horizontal_right, up, yaw_delta_degrees,
};
use crate::hover_model::types::{BodySample, ForceCommand, HoverContact, SolveContext, StepOutput};
use crate::input::InputSignal;

pub fn solve_step(
    ctx: &SolveContext<'_>,
    input: &InputSignal,
    body: &BodySample,
    contacts: &[HoverContact],
) -> StepOutput {
    let input = input.sanitized();
    let dt = if ctx.dt.is_finite() { ctx.dt.max(0.0) } else { 0.0 };

    let mut commands = Vec::with_capacity(contacts.len() * 2 + 4);

    // --------------------------------------------------
    // 1) Speed
    // --------------------------------------------------
    let rot = body.rotation();
    let forward = horizontal_forward(rot);
    let speed = forward_speed(&body.linvel, rot);
    let velocity_mag = body.linvel.norm();

    // --------------------------------------------------
    // 2) Hover (per-point spring + damper)
    // --------------------------------------------------
    for contact in contacts {
        if let Some(clearance) = contact.clearance {
            if ctx.hover_height > 0.0 {
                let force_percent = 1.0 - clearance / ctx.hover_height;
                commands.push(ForceCommand::Force {
                    force: up() * (force_percent * ctx.hover_force),
                    at_point: Some(contact.point),
                });
            }
        }

        let point_vel = body.velocity_at(&contact.point);
        if point_vel.iter().all(|c| c.is_finite()) {
            commands.push(ForceCommand::Force {
                force: -point_vel * ctx.damping,
                at_point: Some(contact.point),
            });
        }
    }

    // --------------------------------------------------
    // 3) Rotate + strafe (skipped at rest to avoid jitter)
    // --------------------------------------------------
    if velocity_mag > ctx.velocity_threshold {
        // Both rotation increments are yaw about local up, not pitch about local X.
        let tilt_deg = input.tilt * ctx.rotation_speed * dt;
        if tilt_deg != 0.0 {
            commands.push(ForceCommand::Rotate { delta: yaw_delta_degrees(tilt_deg) });
        }

        let right = horizontal_right(&forward);
        commands.push(ForceCommand::Force {
            force: right * (input.steering * ctx.strafe_force),
            at_point: None,
        });

        let turn_deg = input.steering * ctx.turn_steer;
        if turn_deg != 0.0 {
            commands.push(ForceCommand::Rotate { delta: yaw_delta_degrees(turn_deg) });
        }
    }

    // --------------------------------------------------
    // 4) Accelerate
    // --------------------------------------------------
    if input.throttle > 0.0 {
        let speed_ratio = if ctx.max_speed > 0.0 {
            (speed / ctx.max_speed).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let multiplier = match ctx.acceleration_curve {
            Some(curve) if !curve.is_empty() => curve.evaluate(speed_ratio),
            _ => 1.0,
        };

        commands.push(ForceCommand::Force {
            force: forward * (input.throttle * ctx.max_force * multiplier),
            at_point: None,
        });
    }

    // --------------------------------------------------
    // 5) Brake
    // --------------------------------------------------
    if input.braking && velocity_mag > ctx.velocity_threshold && velocity_mag.is_finite() {
        let direction: Vector3<f32> = body.linvel / velocity_mag;
        commands.push(ForceCommand::Force {
            force: -direction * ctx.brake_strength,
            at_point: None,
        });
    }

    StepOutput {
        forward_speed: if speed.is_finite() { speed } else { 0.0 },
        commands,
    }
}
