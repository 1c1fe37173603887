use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Order, OrderStatus};

use crate::{OrderPage, OrderQuery, Result};

/// Core trait for order store implementations.
///
/// The store is the only writer of order data. Implementations must make a
/// create all-or-nothing: the header, every item, the payment record and the
/// shipping record become visible together or not at all.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes a complete order aggregate as one unit.
    ///
    /// On any failure, every row written by this call is rolled back before
    /// the error is returned.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Loads an order with its items, payment and shipping records.
    ///
    /// Returns None if there is no header for this ID. A header without its
    /// payment or shipping record is reported as `StoreError::Corrupted`.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Returns one page of a user's orders, newest first, each fully assembled.
    async fn list(&self, query: &OrderQuery) -> Result<OrderPage>;

    /// Sets the status and bumps the last-update time (never backwards).
    ///
    /// Fails with `StoreError::OrderNotFound` if no order has this ID.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Checks if an order exists.
    async fn order_exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get(order_id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
