//! Domain error taxonomy.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors a domain operation can raise.
///
/// The HTTP boundary maps these to status codes and stable error codes; the
/// messages here are safe to show to users.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller supplied an unusable value.
    #[error("{0}")]
    InvalidArgument(String),

    /// The operation is not valid in the current state
    /// (empty cart, disallowed status transition, unavailable product).
    #[error("{0}")]
    InvalidState(String),

    /// Requested quantity exceeds on-hand stock.
    #[error("insufficient stock for product: {product}")]
    InsufficientStock {
        /// Name of the offending product.
        product: String,
    },

    /// A uniqueness rule was violated (duplicate SKU or email).
    #[error("{0}")]
    Conflict(String),

    /// The caller lacks permission for this operation.
    #[error("{0}")]
    Forbidden(String),

    /// The underlying store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
