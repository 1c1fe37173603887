//! Orchestrator error types.

use common::{OrderId, UserId};
use domain::OrderError;
use order_store::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::directory::DirectoryError;

/// The five failure classes a caller can observe.
///
/// Validation, NotFound and Conflict guarantee nothing was written.
/// DependencyUnavailable means the outcome could not be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    DependencyUnavailable,
    Corruption,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::DependencyUnavailable => "dependency_unavailable",
            ErrorKind::Corruption => "corruption",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request failed a domain rule, or asked for an illegal transition.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A request argument outside the domain rules (page size, page token).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The directory answered that the user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No answer from the user directory.
    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// Storage failure.
    #[error("Order store error: {0}")]
    Store(StoreError),
}

impl ServiceError {
    /// Classifies the error for callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Order(e) if e.is_validation() => ErrorKind::Validation,
            ServiceError::Order(_) => ErrorKind::Conflict,
            ServiceError::InvalidArgument(_) => ErrorKind::Validation,
            ServiceError::OrderNotFound(_) | ServiceError::UserNotFound(_) => ErrorKind::NotFound,
            ServiceError::DirectoryUnavailable(_) => ErrorKind::DependencyUnavailable,
            ServiceError::Store(StoreError::OrderNotFound(_)) => ErrorKind::NotFound,
            ServiceError::Store(StoreError::Corrupted { .. } | StoreError::InvalidRow { .. }) => {
                ErrorKind::Corruption
            }
            ServiceError::Store(_) => ErrorKind::DependencyUnavailable,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => ServiceError::OrderNotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

impl From<DirectoryError> for ServiceError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound(id) => ServiceError::UserNotFound(id),
            DirectoryError::Unavailable(reason) => ServiceError::DirectoryUnavailable(reason),
        }
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, ServiceError>;
