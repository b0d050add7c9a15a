use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use pulpa_order::{number, Order, OrderItem};
use pulpa_shared::{DateRange, PageRequest, Pagination};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::staff_auth_middleware, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub order: OrderMeta,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderMeta {
    pub total_cents: i32,
    pub payment_method: Option<String>,
    pub payment_cents: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    /// Product code as shown on the register
    pub id: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: Uuid,
    pub order_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub order_number: String,
    pub order_date: chrono::DateTime<Utc>,
    pub total_cents: i32,
    pub payment_method: String,
    pub payment_cents: i32,
    pub change_cents: i32,
    pub status: String,
}

impl From<Order> for OrderSummaryResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            order_date: order.order_date,
            total_cents: order.total_cents,
            payment_method: order.payment_method,
            payment_cents: order.payment_cents,
            change_cents: order.change_cents,
            status: order.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderSummaryResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub id: Uuid,
    pub order_number: String,
    pub order_date: chrono::DateTime<Utc>,
    pub total_cents: i32,
    pub payment_method: String,
    pub payment_cents: i32,
    pub change_cents: i32,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
    pub subtotal_cents: i32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            subtotal_cents: item.subtotal_cents,
        }
    }
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            staff_auth_middleware,
        ))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Record a completed sale. The order, its items and the daily/product
/// sales counters are written in one transaction.
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::ValidationError(
            "Order must contain at least one item".to_string(),
        ));
    }

    // 1. Build the order from the request lines, snapshotting product names
    let now = Utc::now();
    let mut order = Order::new(number::generate(now), now);

    for line in &req.items {
        let product = state
            .product_repo
            .get_product(&line.id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| {
                AppError::ValidationError(format!("Unknown product: {}", line.id))
            })?;

        let item =
            OrderItem::from_product(order.id, &product, line.quantity, line.unit_price_cents)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
        order.add_item(item);
    }

    // 2. The register's declared total must agree with the line subtotals
    order
        .verify_declared_total(req.order.total_cents)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    // 3. Record the tender
    order
        .settle(req.order.payment_method.clone(), req.order.payment_cents)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    // 4. Persist; regenerate the receipt number on the rare suffix collision
    let mut attempts = 0;
    loop {
        match state.order_repo.create_order(&order).await {
            Ok(()) => break,
            Err(e) if attempts < 3 && is_unique_violation(e.as_ref()) => {
                attempts += 1;
                order.order_number = number::generate(order.order_date);
            }
            Err(e) => return Err(AppError::internal(e)),
        }
    }

    tracing::info!(
        order_number = %order.order_number,
        total_cents = order.total_cents,
        items = order.items.len(),
        "Sale recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            id: order.id,
            order_number: order.order_number,
        }),
    ))
}

/// GET /v1/orders
/// Paginated order history, newest first, optionally date-bounded
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, AppError> {
    let page = PageRequest::new(query.page, query.limit);
    let range = DateRange::new(query.start_date, query.end_date);

    let result = state
        .order_repo
        .list_orders(page, range)
        .await
        .map_err(AppError::internal)?
        .map(OrderSummaryResponse::from);

    Ok(Json(ListOrdersResponse {
        orders: result.items,
        pagination: result.pagination,
    }))
}

/// GET /v1/orders/:id
/// Order detail including line items
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderDetailResponse>, AppError> {
    let order = state
        .order_repo
        .get_order(order_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFoundError("Order not found".to_string()))?;

    Ok(Json(OrderDetailResponse {
        id: order.id,
        order_number: order.order_number,
        order_date: order.order_date,
        total_cents: order.total_cents,
        payment_method: order.payment_method,
        payment_cents: order.payment_cents,
        change_cents: order.change_cents,
        status: order.status,
        items: order.items.into_iter().map(OrderItemResponse::from).collect(),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn is_unique_violation(err: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
        return db_err.code().as_deref() == Some("23505");
    }
    false
}
