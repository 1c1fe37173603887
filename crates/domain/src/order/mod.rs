//! Order aggregate and related types.

mod aggregate;
mod commands;
mod payment;
mod shipping;
mod state;
mod validation;
mod value_objects;

pub use aggregate::{Order, OrderParts};
pub use commands::{CreateOrder, ListOrders, UpdateOrderStatus};
pub use payment::{PaymentId, PaymentInfo, PaymentMethod, PaymentStatus};
pub use shipping::{ShippingAddress, ShippingInfo, ShippingStatus};
pub use state::{OrderStatus, TransitionTable};
pub use validation::{
    MAX_ITEMS, MAX_QUANTITY, MAX_UNIT_PRICE_CENTS, MIN_QUANTITY, compute_total,
    validate_create_order, validate_order_fields,
};
pub use value_objects::{ItemId, MAX_PRODUCT_ID_LEN, Money, OrderItem, ProductId};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// Order has no items.
    #[error("Order must contain at least one item")]
    NoItems,

    /// Order has more items than allowed.
    #[error("Order has {count} items (at most 100 allowed)")]
    TooManyItems { count: usize },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be between 1 and 100)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be between 1 and 100000000000 cents)")]
    InvalidPrice { price: i64 },

    /// Product ID is blank or too long.
    #[error("Invalid product ID: {product_id:?} (must be 1 to 64 characters)")]
    InvalidProductId { product_id: String },

    /// Shipping address has no first line.
    #[error("Shipping address line 1 is required")]
    AddressLine1Required,

    /// Requested status change is not in the transition table.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A status name that matches no known status.
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// A payment method name that matches no known method.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
}

impl OrderError {
    /// Returns true for errors caused by malformed client input.
    pub fn is_validation(&self) -> bool {
        !matches!(self, OrderError::InvalidStatusTransition { .. })
    }
}
