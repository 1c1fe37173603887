//! Order commands.

use common::{OrderId, UserId};

use super::{OrderItem, OrderStatus, PaymentMethod, ShippingAddress};

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The user placing the order.
    pub user_id: UserId,

    /// Items in display order.
    pub items: Vec<OrderItem>,

    /// Where to deliver.
    pub shipping: ShippingAddress,

    /// How the order will be paid.
    pub payment_method: PaymentMethod,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(
        user_id: impl Into<UserId>,
        items: Vec<OrderItem>,
        shipping: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            items,
            shipping,
            payment_method,
        }
    }
}

/// Command to move an order to a new status.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl UpdateOrderStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }
}

/// Query for one page of a user's orders.
#[derive(Debug, Clone)]
pub struct ListOrders {
    pub user_id: UserId,

    /// `Unspecified` means every status.
    pub status: OrderStatus,

    pub page_size: u32,

    /// Empty means start from the newest order.
    pub page_token: String,
}

impl ListOrders {
    /// First page of all of a user's orders.
    pub fn for_user(user_id: impl Into<UserId>, page_size: u32) -> Self {
        Self {
            user_id: user_id.into(),
            status: OrderStatus::Unspecified,
            page_size,
            page_token: String::new(),
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_page_token(mut self, page_token: impl Into<String>) -> Self {
        self.page_token = page_token.into();
        self
    }
}
