//! hover_model - engine-agnostic hover-bike locomotion (pure types + solver)

pub mod types;
pub mod curve;
pub mod kinematics;
pub mod solve;

pub use types::*;
pub use curve::{CurveKey, ResponseCurve};
pub use solve::solve_step;
