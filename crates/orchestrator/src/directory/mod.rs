//! User directory capability and its implementations.
//!
//! The directory is owned by a separate service; orders only hold a user ID.

pub mod http;
pub mod memory;

pub use http::HttpUserDirectory;
pub use memory::InMemoryUserDirectory;

use async_trait::async_trait;
use common::UserId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Point-in-time snapshot of a user, as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: email.into(),
        }
    }
}

/// Errors returned by a user directory.
///
/// `NotFound` is an answer from the directory; `Unavailable` means no answer
/// was obtained and must never be read as a missing user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("User directory unavailable: {0}")]
    Unavailable(String),
}

/// Trait for looking up users in the external directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetches a user by ID.
    async fn get_user(&self, user_id: &UserId) -> Result<User, DirectoryError>;
}
