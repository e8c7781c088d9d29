//! hover_racer - hover-bike racing core: hover physics, AI navigation, arena simulation

pub mod ai;
pub mod config;
pub mod debug_builders;
pub mod error;
pub mod hover_contact;
pub mod hover_model;
pub mod input;
pub mod physics;
pub mod spawn;
pub mod state;
pub mod vehicle;

pub use config::SimConfig;
pub use input::{Controller, InputSignal, ManualInputHandle};
pub use state::{LifecycleEvent, Simulation, Snapshot};
