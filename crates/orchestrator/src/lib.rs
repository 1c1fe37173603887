//! Order orchestration.
//!
//! The [`OrderOrchestrator`] composes validation, the user directory, the
//! status transition table and the order store into the four order
//! operations:
//! 1. Create an order (user lookup and total computation run concurrently)
//! 2. Get an order with a fresh user snapshot
//! 3. List a user's orders page by page
//! 4. Move an order to a new status
//!
//! Nothing here retries; a failed call is reported once to the caller.

pub mod coordinator;
pub mod directory;
pub mod error;

pub use coordinator::{OrderDetails, OrderOrchestrator};
pub use directory::{
    DirectoryError, HttpUserDirectory, InMemoryUserDirectory, User, UserDirectory,
};
pub use error::{ErrorKind, Result, ServiceError};
