//! Domain layer for the order service.
//!
//! This crate provides the order aggregate and everything needed to build
//! one without I/O:
//! - Value objects (money, items, payment and shipping records)
//! - Creation-request validation and total computation
//! - The status transition table

pub mod order;

pub use order::{
    MAX_ITEMS, MAX_QUANTITY, MAX_UNIT_PRICE_CENTS, MIN_QUANTITY,
    CreateOrder, ItemId, ListOrders, Money, Order, OrderError, OrderItem, OrderParts, OrderStatus,
    PaymentId, PaymentInfo, PaymentMethod, PaymentStatus, ProductId, ShippingAddress,
    ShippingInfo, ShippingStatus, TransitionTable, UpdateOrderStatus, compute_total,
    validate_create_order, validate_order_fields,
};
