//! Order orchestrator.

use std::time::{Duration, Instant};

use chrono::Utc;
use common::{OrderId, UserId};
use domain::{
    CreateOrder, ListOrders, Order, OrderError, TransitionTable, UpdateOrderStatus,
    compute_total, validate_create_order,
};
use order_store::{MAX_PAGE_SIZE, OrderQuery, OrderStore, PageToken};

use crate::directory::{DirectoryError, User, UserDirectory};
use crate::error::{ErrorKind, Result, ServiceError};

/// An order together with a fresh snapshot of its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub user: User,
}

/// Drives the order operations over a store and a user directory.
///
/// The transition table is immutable and shared; the store is the only
/// writer of order data.
pub struct OrderOrchestrator<S, D>
where
    S: OrderStore,
    D: UserDirectory,
{
    store: S,
    directory: D,
    transitions: &'static TransitionTable,
    directory_timeout: Option<Duration>,
}

impl<S, D> OrderOrchestrator<S, D>
where
    S: OrderStore,
    D: UserDirectory,
{
    /// Creates an orchestrator using the standard transition table and no
    /// directory timeout.
    pub fn new(store: S, directory: D) -> Self {
        Self {
            store,
            directory,
            transitions: TransitionTable::standard(),
            directory_timeout: None,
        }
    }

    /// Replaces the transition table.
    pub fn with_transitions(mut self, transitions: &'static TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    /// Bounds every directory lookup; an elapsed lookup is reported as
    /// unavailable.
    pub fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn transitions(&self) -> &'static TransitionTable {
        self.transitions
    }

    /// Creates an order.
    ///
    /// The request is validated first; a rejected request touches neither
    /// the directory nor the store. The user lookup and total computation
    /// are then joined, and the first failure drops the other. The order is
    /// only written once both succeed.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, items = cmd.items.len()))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<OrderDetails> {
        let start = Instant::now();
        let details = observe("create_order", self.try_create_order(cmd).await)?;

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %details.order.id(),
            total_cents = details.order.total_amount().cents(),
            "order created"
        );

        Ok(details)
    }

    /// Loads an order and a fresh snapshot of its user.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails> {
        observe("get_order", self.try_get_order(order_id).await)
    }

    /// Lists one page of a user's orders, newest first.
    ///
    /// Returns the orders and, if more follow, the token for the next page.
    #[tracing::instrument(skip(self, query), fields(user_id = %query.user_id, page_size = query.page_size))]
    pub async fn list_orders(&self, query: ListOrders) -> Result<(Vec<Order>, Option<String>)> {
        observe("list_orders", self.try_list_orders(query).await)
    }

    /// Moves an order to a new status.
    ///
    /// An illegal transition fails with a conflict before storage is touched.
    /// The returned order carries a fresh user snapshot.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id, status = %cmd.status))]
    pub async fn update_order_status(&self, cmd: UpdateOrderStatus) -> Result<OrderDetails> {
        observe("update_order_status", self.try_update_order_status(cmd).await)
    }

    async fn try_create_order(&self, cmd: CreateOrder) -> Result<OrderDetails> {
        validate_create_order(&cmd)?;

        let (user, total) = tokio::try_join!(self.lookup_user(&cmd.user_id), async {
            Ok::<_, ServiceError>(compute_total(&cmd.items))
        })?;

        let order = Order::place(cmd, total, Utc::now());
        self.store.create(&order).await?;
        Ok(OrderDetails { order, user })
    }

    async fn try_get_order(&self, order_id: OrderId) -> Result<OrderDetails> {
        let order = self.load(order_id).await?;
        let user = self.snapshot_user(order.user_id()).await?;
        Ok(OrderDetails { order, user })
    }

    async fn try_list_orders(&self, query: ListOrders) -> Result<(Vec<Order>, Option<String>)> {
        let query = build_query(query)?;
        let page = self.store.list(&query).await?;
        Ok((page.orders, page.next_page_token.map(|t| t.encode())))
    }

    async fn try_update_order_status(&self, cmd: UpdateOrderStatus) -> Result<OrderDetails> {
        let mut order = self.load(cmd.order_id).await?;
        let from = order.status();

        order.transition_to(cmd.status, self.transitions, Utc::now())?;
        self.store
            .update_status(order.id(), order.status(), order.updated_at())
            .await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => from.as_str(),
            "to" => order.status().as_str()
        )
        .increment(1);
        tracing::info!(from = %from, to = %order.status(), "order status changed");

        let user = self.snapshot_user(order.user_id()).await?;
        Ok(OrderDetails { order, user })
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    /// Looks up the user who is placing an order. A missing user rejects it.
    async fn lookup_user(&self, user_id: &UserId) -> Result<User> {
        Ok(self.call_directory(user_id).await?)
    }

    /// Fetches the user of an existing order for display. The order is known
    /// to exist, so a missing user is a dependency failure rather than a
    /// missing order.
    async fn snapshot_user(&self, user_id: &UserId) -> Result<User> {
        self.call_directory(user_id).await.map_err(|e| match e {
            DirectoryError::NotFound(id) => {
                ServiceError::DirectoryUnavailable(format!("user {id} is missing from directory"))
            }
            other => other.into(),
        })
    }

    async fn call_directory(&self, user_id: &UserId) -> std::result::Result<User, DirectoryError> {
        let lookup = self.directory.get_user(user_id);
        match self.directory_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lookup).await.map_err(|_| {
                DirectoryError::Unavailable(format!("lookup timed out after {timeout:?}"))
            })?,
            None => lookup.await,
        }
    }
}

/// Checks list arguments and turns them into a store query.
fn build_query(query: ListOrders) -> Result<OrderQuery> {
    if query.user_id.is_blank() {
        return Err(OrderError::UserIdRequired.into());
    }

    let page_size = query.page_size as usize;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ServiceError::InvalidArgument(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }

    let mut store_query = OrderQuery::for_user(query.user_id)
        .status(query.status)
        .page_size(page_size);

    if !query.page_token.is_empty() {
        let token = PageToken::decode(&query.page_token)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        store_query = store_query.after(token);
    }

    Ok(store_query)
}

/// Logs and counts a failed operation before handing the result back.
fn observe<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        let kind = e.kind();
        metrics::counter!("order_errors_total", "kind" => kind.as_str()).increment(1);

        match kind {
            ErrorKind::DependencyUnavailable | ErrorKind::Corruption => {
                tracing::error!(operation, error = %e, kind = %kind, "order operation failed");
            }
            _ => tracing::warn!(operation, error = %e, kind = %kind, "order operation rejected"),
        }
    }
    result
}
