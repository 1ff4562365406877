//! Status type returned by RPC handlers.

use thiserror::Error;

/// Error returned by an RPC handler for a single call.
///
/// Variants map to HTTP status codes sent back to callers:
/// - [`ServiceError::InvalidArgument`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::AlreadyExists`] → 409
/// - [`ServiceError::FailedPrecondition`] → 412
/// - [`ServiceError::Internal`] → 500
/// - [`ServiceError::Unimplemented`] → 501
/// - [`ServiceError::Unavailable`] → 503
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request payload was malformed or carried an invalid value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced order, currency, pair or peer does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The entity the request tried to create already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The node is not in a state that allows this call.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// The method is declared by the contract but not served by this node.
    #[error("unimplemented: {0}")]
    Unimplemented(String),

    /// A dependency of the handler is temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Short machine-readable code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::AlreadyExists(_) => "already_exists",
            ServiceError::FailedPrecondition(_) => "failed_precondition",
            ServiceError::Unimplemented(_) => "unimplemented",
            ServiceError::Unavailable(_) => "unavailable",
            ServiceError::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::AlreadyExists(_) => 409,
            ServiceError::FailedPrecondition(_) => 412,
            ServiceError::Unimplemented(_) => 501,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// The human-readable detail without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::InvalidArgument(m)
            | ServiceError::NotFound(m)
            | ServiceError::AlreadyExists(m)
            | ServiceError::FailedPrecondition(m)
            | ServiceError::Unimplemented(m)
            | ServiceError::Unavailable(m)
            | ServiceError::Internal(m) => m,
        }
    }
}
