use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderParts, OrderStatus, PaymentInfo, ShippingInfo};
use tokio::sync::RwLock;

use crate::{OrderPage, OrderQuery, OrderStore, Result, StoreError};

#[derive(Debug, Clone)]
struct HeaderRow {
    id: OrderId,
    user_id: UserId,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl HeaderRow {
    fn matches(&self, query: &OrderQuery) -> bool {
        if self.user_id != query.user_id {
            return false;
        }
        if let Some(status) = query.status
            && self.status != status
        {
            return false;
        }
        if let Some(token) = query.after
            && !token.precedes(self.created_at, self.id)
        {
            return false;
        }
        true
    }
}

/// The four record sets, mirroring the relational schema.
#[derive(Debug, Default)]
struct Tables {
    headers: HashMap<OrderId, HeaderRow>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    payments: HashMap<OrderId, PaymentInfo>,
    shipping: HashMap<OrderId, ShippingInfo>,
}

impl Tables {
    fn assemble(&self, header: &HeaderRow) -> Result<Order> {
        let payment = self
            .payments
            .get(&header.id)
            .cloned()
            .ok_or(StoreError::Corrupted {
                order_id: header.id,
                missing: "payment",
            })?;
        let shipping = self
            .shipping
            .get(&header.id)
            .cloned()
            .ok_or(StoreError::Corrupted {
                order_id: header.id,
                missing: "shipping",
            })?;

        Ok(Order::from_parts(OrderParts {
            id: header.id,
            user_id: header.user_id.clone(),
            items: self.items.get(&header.id).cloned().unwrap_or_default(),
            total_amount: header.total_amount,
            status: header.status,
            payment,
            shipping,
            created_at: header.created_at,
            updated_at: header.updated_at,
        }))
    }
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    /// Row writes allowed before the next create fails.
    fail_after_writes: Option<usize>,
}

/// Rows staged by one create call; applied only if every write succeeds.
struct StagedWrite {
    budget: Option<usize>,
    written: usize,
}

impl StagedWrite {
    fn write(&mut self, what: &str) -> Result<()> {
        if let Some(budget) = self.budget
            && self.written >= budget
        {
            return Err(StoreError::WriteFailed(format!(
                "injected failure writing {what} (row {})",
                self.written + 1
            )));
        }
        self.written += 1;
        Ok(())
    }
}

/// In-memory order store implementation for testing.
///
/// This implementation keeps the same four record sets as the PostgreSQL
/// store and provides the same all-or-nothing create.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of order headers stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.tables.headers.len()
    }

    /// Returns the total number of item rows stored across all orders.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.tables.items.values().map(Vec::len).sum()
    }

    /// Makes the next create fail after `writes` rows (header, items,
    /// payment, shipping in that order) have been staged.
    pub async fn fail_after_writes(&self, writes: usize) {
        self.state.write().await.fail_after_writes = Some(writes);
    }

    /// Drops the payment record of an order, leaving the header behind.
    pub async fn remove_payment_record(&self, order_id: OrderId) {
        self.state.write().await.tables.payments.remove(&order_id);
    }

    /// Drops the shipping record of an order, leaving the header behind.
    pub async fn remove_shipping_record(&self, order_id: OrderId) {
        self.state.write().await.tables.shipping.remove(&order_id);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;

        if state.tables.headers.contains_key(&order.id()) {
            return Err(StoreError::WriteFailed(format!(
                "order {} already exists",
                order.id()
            )));
        }

        let mut staged = StagedWrite {
            budget: state.fail_after_writes.take(),
            written: 0,
        };

        staged.write("order header")?;
        for _ in order.items() {
            staged.write("order item")?;
        }
        staged.write("payment info")?;
        staged.write("shipping info")?;

        // Every write succeeded; make them visible together.
        let id = order.id();
        state.tables.headers.insert(
            id,
            HeaderRow {
                id,
                user_id: order.user_id().clone(),
                total_amount: order.total_amount(),
                status: order.status(),
                created_at: order.created_at(),
                updated_at: order.updated_at(),
            },
        );
        state.tables.items.insert(id, order.items().to_vec());
        state.tables.payments.insert(id, order.payment().clone());
        state.tables.shipping.insert(id, order.shipping().clone());

        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        match state.tables.headers.get(&order_id) {
            Some(header) => state.tables.assemble(header).map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self, query: &OrderQuery) -> Result<OrderPage> {
        let state = self.state.read().await;

        let mut headers: Vec<_> = state
            .tables
            .headers
            .values()
            .filter(|h| h.matches(query))
            .collect();

        // Newest first
        headers.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let orders = headers
            .into_iter()
            .take(query.page_size + 1)
            .map(|h| state.tables.assemble(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage::from_overfetch(orders, query.page_size))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let header = state
            .tables
            .headers
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        header.status = status;
        header.updated_at = header.updated_at.max(updated_at);
        Ok(())
    }
}
