use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order header exists for this ID.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The header exists but a record that is always written with it does not.
    #[error("Order {order_id} is corrupted: missing {missing} record")]
    Corrupted {
        order_id: OrderId,
        missing: &'static str,
    },

    /// A stored column holds a value the domain does not recognise.
    #[error("Invalid stored value for order {order_id}: {reason}")]
    InvalidRow { order_id: OrderId, reason: String },

    /// A write failed part way through a create; nothing was kept.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
