use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{
    ItemId, Money, Order, OrderItem, OrderParts, OrderStatus, PaymentId, PaymentInfo,
    ShippingAddress, ShippingInfo,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{OrderPage, OrderQuery, OrderStore, Result, StoreError};

const HEADER_COLUMNS: &str = "id, user_id, total_amount_cents, status, created_at, updated_at";

/// PostgreSQL-backed order store implementation.
///
/// An order spans four tables (`orders`, `order_items`, `payment_info`,
/// `shipping_info`). Creates write all four inside one transaction.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

/// A row of the `orders` table.
struct HeaderRow {
    id: OrderId,
    user_id: UserId,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Child records of a set of orders, keyed by order.
#[derive(Default)]
struct Details {
    items: HashMap<OrderId, Vec<OrderItem>>,
    payments: HashMap<OrderId, PaymentInfo>,
    shipping: HashMap<OrderId, ShippingInfo>,
}

impl Details {
    fn assemble(&mut self, header: HeaderRow) -> Result<Order> {
        let order_id = header.id;
        let payment = self.payments.remove(&order_id).ok_or_else(|| {
            tracing::warn!(%order_id, "order header has no payment record");
            StoreError::Corrupted {
                order_id,
                missing: "payment",
            }
        })?;
        let shipping = self.shipping.remove(&order_id).ok_or_else(|| {
            tracing::warn!(%order_id, "order header has no shipping record");
            StoreError::Corrupted {
                order_id,
                missing: "shipping",
            }
        })?;

        Ok(Order::from_parts(OrderParts {
            id: order_id,
            user_id: header.user_id,
            items: self.items.remove(&order_id).unwrap_or_default(),
            total_amount: header.total_amount,
            status: header.status,
            payment,
            shipping,
            created_at: header.created_at,
            updated_at: header.updated_at,
        }))
    }
}

fn invalid(order_id: OrderId, reason: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidRow {
        order_id,
        reason: reason.to_string(),
    }
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_header(row: PgRow) -> Result<HeaderRow> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let status: String = row.try_get("status")?;

        Ok(HeaderRow {
            id,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: status.parse().map_err(|e| invalid(id, e))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<(OrderId, OrderItem)> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
        let quantity: i32 = row.try_get("quantity")?;

        let item = OrderItem {
            id: ItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: row.try_get::<String, _>("product_id")?.into(),
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| invalid(order_id, format!("negative quantity {quantity}")))?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
        };
        Ok((order_id, item))
    }

    fn row_to_payment(row: &PgRow) -> Result<(OrderId, PaymentInfo)> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
        let status: String = row.try_get("status")?;
        let method: String = row.try_get("method")?;

        let payment = PaymentInfo {
            payment_id: PaymentId::from_uuid(row.try_get::<Uuid, _>("payment_id")?),
            status: status.parse().map_err(|e| invalid(order_id, e))?,
            method: method.parse().map_err(|e| invalid(order_id, e))?,
            processed_at: row.try_get("processed_at")?,
        };
        Ok((order_id, payment))
    }

    fn row_to_shipping(row: &PgRow) -> Result<(OrderId, ShippingInfo)> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
        let status: String = row.try_get("status")?;

        let shipping = ShippingInfo {
            address: ShippingAddress {
                address_line1: row.try_get("address_line1")?,
                address_line2: row.try_get("address_line2")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                country: row.try_get("country")?,
                postal_code: row.try_get("postal_code")?,
            },
            status: status.parse().map_err(|e| invalid(order_id, e))?,
            tracking_number: row.try_get("tracking_number")?,
        };
        Ok((order_id, shipping))
    }

    /// Loads items, payment and shipping records for every order in `ids`.
    async fn load_details(&self, ids: &[Uuid]) -> Result<Details> {
        let mut details = Details::default();
        if ids.is_empty() {
            return Ok(details);
        }

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &item_rows {
            let (order_id, item) = Self::row_to_item(row)?;
            details.items.entry(order_id).or_default().push(item);
        }

        let payment_rows = sqlx::query(
            r#"
            SELECT order_id, payment_id, status, method, processed_at
            FROM payment_info
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &payment_rows {
            let (order_id, payment) = Self::row_to_payment(row)?;
            details.payments.insert(order_id, payment);
        }

        let shipping_rows = sqlx::query(
            r#"
            SELECT order_id, address_line1, address_line2, city, state, country,
                   postal_code, status, tracking_number
            FROM shipping_info
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for row in &shipping_rows {
            let (order_id, shipping) = Self::row_to_shipping(row)?;
            details.shipping.insert(order_id, shipping);
        }

        Ok(details)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: &Order) -> Result<()> {
        // Dropping the transaction without commit rolls every insert back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_str())
        .bind(order.total_amount().cents())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| StoreError::WriteFailed(format!("quantity {} out of range", item.quantity)))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, product_name, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id().as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_str())
            .bind(&item.product_name)
            .bind(quantity)
            .bind(item.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        let payment = order.payment();
        sqlx::query(
            r#"
            INSERT INTO payment_info (order_id, payment_id, status, method, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(payment.payment_id.as_uuid())
        .bind(payment.status.as_str())
        .bind(payment.method.as_str())
        .bind(payment.processed_at)
        .execute(&mut *tx)
        .await?;

        let shipping = order.shipping();
        let address = &shipping.address;
        sqlx::query(
            r#"
            INSERT INTO shipping_info (order_id, address_line1, address_line2, city, state, country,
                                       postal_code, status, tracking_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .bind(shipping.status.as_str())
        .bind(&shipping.tracking_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {HEADER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let header = Self::row_to_header(row)?;
        let mut details = self.load_details(&[order_id.as_uuid()]).await?;
        details.assemble(header).map(Some)
    }

    async fn list(&self, query: &OrderQuery) -> Result<OrderPage> {
        let mut sql = format!("SELECT {HEADER_COLUMNS} FROM orders WHERE user_id = $1");
        let mut param_count = 1;

        // Build dynamic query
        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.after.is_some() {
            sql.push_str(&format!(
                " AND (created_at, id) < (${}, ${})",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }

        param_count += 1;
        sql.push_str(&format!(
            " ORDER BY created_at DESC, id DESC LIMIT ${param_count}"
        ));

        let mut sqlx_query = sqlx::query(&sql).bind(query.user_id.as_str());
        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(token) = query.after {
            sqlx_query = sqlx_query
                .bind(token.created_at)
                .bind(token.order_id.as_uuid());
        }
        // One extra row tells whether another page follows
        sqlx_query = sqlx_query.bind(query.page_size as i64 + 1);

        let headers = sqlx_query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>>>()?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id.as_uuid()).collect();
        let mut details = self.load_details(&ids).await?;

        let orders = headers
            .into_iter()
            .map(|h| details.assemble(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage::from_overfetch(orders, query.page_size))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = GREATEST(updated_at, $2)
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(updated_at)
        .bind(order_id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }
}
