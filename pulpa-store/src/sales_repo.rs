use async_trait::async_trait;
use chrono::NaiveDate;
use pulpa_core::repository::{BoxError, SalesRepository};
use pulpa_order::{DailySummary, ProductSalesRow};
use sqlx::PgPool;

pub struct StoreSalesRepository {
    pool: PgPool,
}

impl StoreSalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct DailySummaryRow {
    summary_date: NaiveDate,
    total_orders: i32,
    total_items_sold: i32,
    total_revenue_cents: i64,
}

#[derive(sqlx::FromRow)]
struct ProductSalesRowDb {
    product_type: Option<String>,
    product_id: String,
    product_name: String,
    quantity_sold: i64,
    revenue_cents: i64,
}

#[async_trait]
impl SalesRepository for StoreSalesRepository {
    async fn daily_summaries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>, BoxError> {
        let rows: Vec<DailySummaryRow> = sqlx::query_as(
            r#"
            SELECT summary_date, total_orders, total_items_sold, total_revenue_cents
            FROM daily_summaries
            WHERE summary_date BETWEEN $1 AND $2
            ORDER BY summary_date
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailySummary {
                summary_date: row.summary_date,
                total_orders: row.total_orders,
                total_items_sold: row.total_items_sold,
                total_revenue_cents: row.total_revenue_cents,
            })
            .collect())
    }

    async fn product_sales(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProductSalesRow>, BoxError> {
        let rows: Vec<ProductSalesRowDb> = sqlx::query_as(
            r#"
            SELECT p.product_type, p.id AS product_id, p.name AS product_name,
                   SUM(pds.quantity_sold)::BIGINT AS quantity_sold,
                   SUM(pds.revenue_cents)::BIGINT AS revenue_cents
            FROM product_daily_sales pds
            JOIN products p ON p.id = pds.product_id
            WHERE pds.summary_date BETWEEN $1 AND $2
            GROUP BY p.product_type, p.id, p.name
            ORDER BY p.product_type, SUM(pds.revenue_cents) DESC
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSalesRow {
                product_type: row.product_type,
                product_id: row.product_id,
                product_name: row.product_name,
                quantity_sold: row.quantity_sold,
                revenue_cents: row.revenue_cents,
            })
            .collect())
    }
}
