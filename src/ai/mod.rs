//! ai - per-agent navigation: state machine, steering, wall probe, target search

pub mod chase;
pub mod direction;
pub mod fsm;
pub mod pilot;
pub mod registry;
pub mod steering;
pub mod timer;
pub mod wall;

pub use chase::{ChaseTargetSelector, RefreshTimer};
pub use direction::{AvoidDirection, DirectionSource, FixedDirection, RandomDirection};
pub use fsm::{NavigationState, NavigationStateMachine};
pub use registry::{AgentEntry, AgentId, AgentRegistry};
pub use steering::{SteeringConfig, SteeringController};
pub use wall::{WallDetector, WallProbe};
