//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{
    CreateOrder, ListOrders, Money, Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod,
    ShippingAddress, ShippingInfo, UpdateOrderStatus, validate_order_fields,
};
use orchestrator::{OrderDetails, OrderOrchestrator, User, UserDirectory};
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, D: UserDirectory> {
    pub orchestrator: OrderOrchestrator<S, D>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub shipping: ShippingAddress,
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    #[serde(default)]
    pub user_id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_token: String,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub total: String,
    pub payment: PaymentInfo,
    pub shipping: ShippingInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
    /// Empty when there are no more pages.
    pub next_page_token: String,
}

impl OrderResponse {
    fn from_order(order: Order, user: Option<User>) -> Self {
        let items = order
            .items()
            .iter()
            .map(|item| OrderItemResponse {
                id: item.id.to_string(),
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
            })
            .collect();

        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            status: order.status(),
            items,
            total_cents: order.total_amount().cents(),
            total: order.total_amount().to_string(),
            payment: order.payment().clone(),
            shipping: order.shipping().clone(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            user,
        }
    }
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        Self::from_order(details.order, Some(details.user))
    }
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest("Order ID is required".to_string()));
    }
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))
}

// -- Handlers --

/// POST /orders: Place a new order.
#[tracing::instrument(skip_all, fields(user_id = tracing::field::Empty))]
pub async fn create<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let Json(req) = payload?;
    tracing::Span::current().record("user_id", req.user_id.as_str());

    let items: Vec<OrderItem> = req
        .items
        .into_iter()
        .map(|item| {
            OrderItem::new(
                item.product_id,
                item.product_name,
                item.quantity,
                Money::from_cents(item.unit_price_cents),
            )
        })
        .collect();

    // Field rule failures take precedence over an unknown payment method
    let payment_method: PaymentMethod = match req.payment_method.parse() {
        Ok(method) => method,
        Err(err) => {
            validate_order_fields(&UserId::from(req.user_id.as_str()), &items, &req.shipping)?;
            return Err(err.into());
        }
    };

    let cmd = CreateOrder::new(req.user_id, items, req.shipping, payment_method);
    let details = state.orchestrator.create_order(cmd).await?;

    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET /orders/{id}: Load an order with a fresh user snapshot.
#[tracing::instrument(skip(state))]
pub async fn get<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let order_id = parse_order_id(&id)?;
    let details = state.orchestrator.get_order(order_id).await?;
    Ok(Json(details.into()))
}

/// GET /orders: One page of a user's orders, newest first.
#[tracing::instrument(skip_all, fields(user_id = tracing::field::Empty))]
pub async fn list<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<ListOrdersResponse>, ApiError>
where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let Query(params) = params?;
    tracing::Span::current().record("user_id", params.user_id.as_str());

    let status = match params.status.as_deref() {
        None | Some("") => OrderStatus::Unspecified,
        Some(s) => s.parse()?,
    };

    let query = ListOrders::for_user(params.user_id, params.page_size)
        .with_status(status)
        .with_page_token(params.page_token);
    let (orders, next_page_token) = state.orchestrator.list_orders(query).await?;

    Ok(Json(ListOrdersResponse {
        orders: orders
            .into_iter()
            .map(|o| OrderResponse::from_order(o, None))
            .collect(),
        next_page_token: next_page_token.unwrap_or_default(),
    }))
}

/// POST /orders/{id}/status: Move an order to a new status.
#[tracing::instrument(skip(state, payload))]
pub async fn update_status<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    D: UserDirectory + 'static,
{
    let Json(req) = payload?;
    let order_id = parse_order_id(&id)?;
    let status: OrderStatus = req.status.parse()?;

    let details = state
        .orchestrator
        .update_order_status(UpdateOrderStatus::new(order_id, status))
        .await?;

    Ok(Json(details.into()))
}
