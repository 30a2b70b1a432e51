//! Service error types
//!
//! Every variant is transient at the engine boundary: the poller swallows
//! and retries on its cadence, the healer maps failures to an ERROR state.

use thiserror::Error;

/// Errors from external collaborator calls
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl ServiceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
