//! Order aggregate implementation.

use chrono::{DateTime, SubsecRound, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use super::{
    CreateOrder, Money, OrderError, OrderItem, OrderStatus, PaymentInfo, ShippingInfo,
    TransitionTable,
};

/// Order aggregate root.
///
/// Owns its items, payment record and shipping record; none of them exist
/// outside an order. The user is referenced by ID only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    payment: PaymentInfo,
    shipping: ShippingInfo,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// The raw fields of an [`Order`], used by stores to rebuild one from rows.
#[derive(Debug, Clone)]
pub struct OrderParts {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment: PaymentInfo,
    pub shipping: ShippingInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Places a new order from an already validated command.
    ///
    /// `total` must be `compute_total(&cmd.items)`; it is passed in so the
    /// caller can compute it alongside other work. Timestamps are truncated to
    /// microseconds, the finest precision the stores keep.
    pub fn place(cmd: CreateOrder, total: Money, now: DateTime<Utc>) -> Self {
        debug_assert_eq!(total, super::compute_total(&cmd.items));

        let now = now.trunc_subsecs(6);
        Self {
            id: OrderId::new(),
            user_id: cmd.user_id,
            items: cmd.items,
            total_amount: total,
            status: OrderStatus::Pending,
            payment: PaymentInfo::pending(cmd.payment_method),
            shipping: ShippingInfo::pending(cmd.shipping),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds an order from stored fields. No invariants are re-derived.
    pub fn from_parts(parts: OrderParts) -> Self {
        Self {
            id: parts.id,
            user_id: parts.user_id,
            items: parts.items,
            total_amount: parts.total_amount,
            status: parts.status,
            payment: parts.payment,
            shipping: parts.shipping,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    /// Moves the order to `requested` if `table` allows it.
    ///
    /// The last-update timestamp never goes backwards.
    pub fn transition_to(
        &mut self,
        requested: OrderStatus,
        table: &TransitionTable,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !table.is_valid_transition(self.status, requested) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status,
                to: requested,
            });
        }

        self.status = requested;
        self.updated_at = self.updated_at.max(now.trunc_subsecs(6));
        Ok(())
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Items in the order they were placed.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment(&self) -> &PaymentInfo {
        &self.payment
    }

    pub fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
