use std::path::PathBuf;

use thiserror::Error;

use crate::ai::registry::AgentId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: `{field}` must be {requirement} (got {value})")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },
}

/// An agent's control core could not be built or driven.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("agent `{agent}` has no waypoints to follow")]
    NoWaypoints { agent: String },

    #[error("agent `{agent}` has no physics body")]
    MissingBody { agent: String },

    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
}
