use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Order, OrderStatus};
use thiserror::Error;

/// Largest page a single list call may return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Position after which the next page starts.
///
/// Lists are ordered by `(created_at, id)` descending, so the token holds the
/// last order of the previous page. Encoded as `"<created_at micros>.<uuid>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageToken {
    pub created_at: DateTime<Utc>,
    pub order_id: OrderId,
}

/// A page token that could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid page token: {0}")]
pub struct PageTokenError(String);

impl PageToken {
    /// Token pointing just past `order`.
    pub fn after(order: &Order) -> Self {
        Self {
            created_at: order.created_at(),
            order_id: order.id(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.created_at.timestamp_micros(), self.order_id)
    }

    pub fn decode(token: &str) -> Result<Self, PageTokenError> {
        let (micros, id) = token
            .split_once('.')
            .ok_or_else(|| PageTokenError(token.to_string()))?;

        let created_at = micros
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_micros)
            .ok_or_else(|| PageTokenError(token.to_string()))?;
        let order_id = OrderId::parse(id).map_err(|_| PageTokenError(token.to_string()))?;

        Ok(Self {
            created_at,
            order_id,
        })
    }

    /// Returns true if a row at `(created_at, order_id)` sorts after this
    /// position in newest-first order.
    pub fn precedes(&self, created_at: DateTime<Utc>, order_id: OrderId) -> bool {
        (created_at, order_id) < (self.created_at, self.order_id)
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Builder for a page of one user's orders.
///
/// The page size is trusted; callers validate it against [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone)]
pub struct OrderQuery {
    /// Owner of the orders.
    pub user_id: UserId,

    /// Only orders in this status. `None` means every status.
    pub status: Option<OrderStatus>,

    /// Maximum number of orders to return.
    pub page_size: usize,

    /// Resume after this position.
    pub after: Option<PageToken>,
}

impl OrderQuery {
    /// Creates a first-page query for a user with the largest page size.
    pub fn for_user(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            status: None,
            page_size: MAX_PAGE_SIZE,
            after: None,
        }
    }

    /// Filters by status. `Unspecified` clears the filter.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = match status {
            OrderStatus::Unspecified => None,
            other => Some(other),
        };
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn after(mut self, token: PageToken) -> Self {
        self.after = Some(token);
        self
    }
}

/// One page of orders, newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderPage {
    pub orders: Vec<Order>,

    /// Present when more orders may follow.
    pub next_page_token: Option<PageToken>,
}

impl OrderPage {
    /// Builds a page from up to `page_size + 1` sorted rows; the extra row
    /// only signals that another page exists.
    pub fn from_overfetch(mut orders: Vec<Order>, page_size: usize) -> Self {
        let has_more = orders.len() > page_size;
        orders.truncate(page_size);
        let next_page_token = if has_more {
            orders.last().map(PageToken::after)
        } else {
            None
        };
        Self {
            orders,
            next_page_token,
        }
    }
}
