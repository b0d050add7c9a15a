use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket label for products with no type set
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One aggregate row per calendar day, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub summary_date: NaiveDate,
    pub total_orders: i32,
    pub total_items_sold: i32,
    pub total_revenue_cents: i64,
}

/// Per-product totals over a report range, joined to the catalog for
/// the current name and type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSalesRow {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// Range-wide totals echoed at the top of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTotals {
    pub total_orders: i64,
    pub total_items: i64,
    pub total_revenue_cents: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// The sales-summary payload: totals, the per-day series, and product
/// totals grouped by type
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub summary: SalesTotals,
    pub daily_sales: Vec<DailySummary>,
    pub products_by_type: BTreeMap<String, Vec<ProductSalesRow>>,
}

impl SalesReport {
    /// Assemble the report from the two persisted aggregate views.
    /// Types come out alphabetically (nulls bucketed as "Uncategorized"),
    /// products within a type by revenue descending.
    pub fn build(
        start_date: NaiveDate,
        end_date: NaiveDate,
        daily_sales: Vec<DailySummary>,
        product_rows: Vec<ProductSalesRow>,
    ) -> Self {
        let total_orders = daily_sales.iter().map(|d| d.total_orders as i64).sum();
        let total_items = daily_sales.iter().map(|d| d.total_items_sold as i64).sum();
        let total_revenue_cents = daily_sales.iter().map(|d| d.total_revenue_cents).sum();

        let mut products_by_type: BTreeMap<String, Vec<ProductSalesRow>> = BTreeMap::new();
        for row in product_rows {
            let bucket = row
                .product_type
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            products_by_type.entry(bucket).or_default().push(row);
        }
        for rows in products_by_type.values_mut() {
            rows.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
        }

        Self {
            summary: SalesTotals {
                total_orders,
                total_items,
                total_revenue_cents,
                start_date,
                end_date,
            },
            daily_sales,
            products_by_type,
        }
    }
}
