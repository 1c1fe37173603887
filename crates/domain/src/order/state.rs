//! Order status state machine.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order in its lifecycle.
///
/// Standard transitions:
/// ```text
/// Pending ──┬──► Processing ──┬──► Completed
///           │                 └──► Failed
///           └──► Cancelled
/// ```
///
/// `Unspecified` only exists as a wire-format default and is never the
/// status of a stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Unspecified,
    Pending,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Unspecified,
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    /// Returns true for statuses with no outgoing transitions in the standard table.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Returns the status name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unspecified => "unspecified",
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

static STANDARD: LazyLock<TransitionTable> = LazyLock::new(|| {
    TransitionTable::from_pairs([
        (OrderStatus::Pending, OrderStatus::Processing),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Completed),
        (OrderStatus::Processing, OrderStatus::Failed),
    ])
});

/// Immutable mapping from a status to the statuses it may move to.
///
/// A status that is not a key has no legal outgoing transitions.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    allowed: HashMap<OrderStatus, HashSet<OrderStatus>>,
}

impl TransitionTable {
    /// The transition table every order uses by default.
    pub fn standard() -> &'static TransitionTable {
        &STANDARD
    }

    /// Builds a table from `(source, target)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (OrderStatus, OrderStatus)>) -> Self {
        let mut allowed: HashMap<OrderStatus, HashSet<OrderStatus>> = HashMap::new();
        for (from, to) in pairs {
            allowed.entry(from).or_default().insert(to);
        }
        Self { allowed }
    }

    /// Returns true if `current -> requested` is a legal transition.
    pub fn is_valid_transition(&self, current: OrderStatus, requested: OrderStatus) -> bool {
        self.allowed
            .get(&current)
            .is_some_and(|targets| targets.contains(&requested))
    }

    /// Returns the legal targets for `status`, in declaration order of [`OrderStatus::ALL`].
    pub fn allowed_targets(&self, status: OrderStatus) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|target| self.is_valid_transition(status, *target))
            .collect()
    }
}
