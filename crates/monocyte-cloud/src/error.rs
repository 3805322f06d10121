//! Sweep error types

use thiserror::Error;

/// Errors raised while building handlers or sweeping resources
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Handler construction failed for {service}: {message}")]
    HandlerBuild {
        service: &'static str,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Deletion of {resource_id} failed: {message}")]
    DeletionFailed {
        resource_id: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, SweepError>;
