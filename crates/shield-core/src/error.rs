//! Error types for the Storm Shield domain

use thiserror::Error;

/// Core error type shared across the workspace
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Tower not found: {0}")]
    TowerNotFound(String),

    #[error("Topology has no towers")]
    EmptyTopology,

    #[error("Topology needs at least two towers to launch, has {0}")]
    TooFewTowers(usize),

    #[error("Invalid position: latitude={lat}, longitude={lng}")]
    InvalidPosition { lat: f64, lng: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn tower_not_found(id: impl Into<String>) -> Self {
        Self::TowerNotFound(id.into())
    }

    pub fn invalid_position(lat: f64, lng: f64) -> Self {
        Self::InvalidPosition { lat, lng }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
