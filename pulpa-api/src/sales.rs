use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use pulpa_order::SalesReport;
use serde::Deserialize;

use crate::{error::AppError, middleware::auth::staff_auth_middleware, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SalesSummaryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/sales/summary", get(sales_summary))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            staff_auth_middleware,
        ))
}

/// GET /v1/sales/summary?start_date=..&end_date=..
/// Range totals, the per-day series, and product totals grouped by type
pub async fn sales_summary(
    State(state): State<AppState>,
    Query(query): Query<SalesSummaryQuery>,
) -> Result<Json<SalesReport>, AppError> {
    let start_date = query
        .start_date
        .ok_or_else(|| AppError::ValidationError("start_date is required".to_string()))?;
    let end_date = query
        .end_date
        .ok_or_else(|| AppError::ValidationError("end_date is required".to_string()))?;

    let daily_sales = state
        .sales_repo
        .daily_summaries(start_date, end_date)
        .await
        .map_err(AppError::internal)?;

    let product_rows = state
        .sales_repo
        .product_sales(start_date, end_date)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(SalesReport::build(
        start_date,
        end_date,
        daily_sales,
        product_rows,
    )))
}
