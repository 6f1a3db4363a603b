//! Service error taxonomy
//!
//! One typed error for every business-rule failure; the API layer maps
//! variants onto the HTTP envelope. Anything not covered by a variant is
//! an internal error whose detail never leaves the server.

use thiserror::Error;

/// Errors surfaced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before persistence
    #[error("{0}")]
    Validation(String),

    /// Authentication missing or invalid
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Entity does not exist or is not visible to the caller
    #[error("{0}")]
    NotFound(String),

    /// Operation conflicts with current state (e.g. wrong moderation status)
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure; detail is logged, not returned
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_pass_through() {
        assert_eq!(
            ServiceError::validation("params_count must be positive").to_string(),
            "params_count must be positive"
        );
        assert_eq!(
            ServiceError::conflict("only modules under review can be approved").to_string(),
            "only modules under review can be approved"
        );
    }

    #[test]
    fn test_anyhow_converts_to_internal() {
        let err: ServiceError = anyhow::anyhow!("db exploded").into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
