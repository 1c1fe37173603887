//! In-memory user directory for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use tokio::sync::RwLock;

use super::{DirectoryError, User, UserDirectory};

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    users: HashMap<UserId, User>,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory user directory.
///
/// Besides the seeded users it can simulate an outage and a slow network,
/// and counts lookups so tests can assert that none happened.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory seeded with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let state = InMemoryDirectoryState {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            calls: Arc::default(),
        }
    }

    /// Adds or replaces a user.
    pub async fn insert(&self, user: User) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Removes a user, leaving any orders that reference it in place.
    pub async fn remove(&self, user_id: &UserId) {
        self.state.write().await.users.remove(user_id);
    }

    /// Makes every lookup fail with `Unavailable` while set.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Delays every lookup by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    /// Number of lookups made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user(&self, user_id: &UserId) -> Result<User, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read().await;
        if state.unavailable {
            return Err(DirectoryError::Unavailable(
                "directory is offline".to_string(),
            ));
        }

        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(user_id.clone()))
    }
}
