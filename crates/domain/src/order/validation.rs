//! Creation-request validation and total computation.
//!
//! Both are pure: nothing here touches the order store or the user
//! directory, so a rejected request has no side effects.

use common::UserId;

use super::{CreateOrder, Money, OrderError, OrderItem, ShippingAddress};

/// Maximum number of items a single order may carry.
pub const MAX_ITEMS: usize = 100;

/// Smallest accepted quantity per item.
pub const MIN_QUANTITY: u32 = 1;

/// Largest accepted quantity per item.
pub const MAX_QUANTITY: u32 = 100;

/// Largest accepted unit price, in cents.
///
/// `MAX_ITEMS * MAX_QUANTITY * MAX_UNIT_PRICE_CENTS` fits in an `i64`, so the
/// total of any valid request is exact.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;

/// Validates a creation request. Rules are checked in order and the first
/// failure is returned:
///
/// 1. user ID is present
/// 2. between one and [`MAX_ITEMS`] items
/// 3. every item has a quantity in range, a price in range and a usable product ID
/// 4. the shipping address has a first line
pub fn validate_create_order(cmd: &CreateOrder) -> Result<(), OrderError> {
    validate_order_fields(&cmd.user_id, &cmd.items, &cmd.shipping)
}

/// The same rules as [`validate_create_order`], for callers that have not
/// assembled a full command yet.
pub fn validate_order_fields(
    user_id: &UserId,
    items: &[OrderItem],
    shipping: &ShippingAddress,
) -> Result<(), OrderError> {
    if user_id.is_blank() {
        return Err(OrderError::UserIdRequired);
    }

    if items.is_empty() {
        return Err(OrderError::NoItems);
    }
    if items.len() > MAX_ITEMS {
        return Err(OrderError::TooManyItems { count: items.len() });
    }

    for item in items {
        validate_item(item)?;
    }

    if shipping.address_line1.trim().is_empty() {
        return Err(OrderError::AddressLine1Required);
    }

    Ok(())
}

fn validate_item(item: &OrderItem) -> Result<(), OrderError> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&item.quantity) {
        return Err(OrderError::InvalidQuantity {
            quantity: item.quantity,
        });
    }

    if !(1..=MAX_UNIT_PRICE_CENTS).contains(&item.unit_price.cents()) {
        return Err(OrderError::InvalidPrice {
            price: item.unit_price.cents(),
        });
    }

    if !item.product_id.is_well_formed() {
        return Err(OrderError::InvalidProductId {
            product_id: item.product_id.to_string(),
        });
    }

    Ok(())
}

/// Exact sum of `quantity * unit_price` over `items`.
pub fn compute_total(items: &[OrderItem]) -> Money {
    items.iter().map(OrderItem::total_price).sum()
}
