use crate::models::Order;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What one order contributes to a product's row for the day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDelta {
    pub product_id: String,
    pub quantity: i32,
    pub revenue_cents: i64,
}

/// The exact increments an order applies to the sales bookkeeping:
/// one `(date)` row and one `(date, product)` row per distinct product.
/// The store applies a delta inside the same transaction that inserts
/// the order, so the counters never observe a half-recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDelta {
    pub summary_date: NaiveDate,
    pub order_count: i32,
    pub item_count: i32,
    pub revenue_cents: i64,
    pub products: Vec<ProductDelta>,
}

impl SalesDelta {
    /// Fold an order's lines into per-day and per-day-per-product
    /// increments. Duplicate lines for one product merge into a single
    /// delta so the `(date, product)` row is touched once.
    pub fn from_order(order: &Order) -> Self {
        let mut per_product: BTreeMap<&str, ProductDelta> = BTreeMap::new();
        for item in &order.items {
            let entry = per_product
                .entry(item.product_id.as_str())
                .or_insert_with(|| ProductDelta {
                    product_id: item.product_id.clone(),
                    quantity: 0,
                    revenue_cents: 0,
                });
            entry.quantity += item.quantity;
            entry.revenue_cents += item.subtotal_cents as i64;
        }

        Self {
            summary_date: order.order_date.date_naive(),
            order_count: 1,
            item_count: order.item_count(),
            revenue_cents: order.total_cents as i64,
            products: per_product.into_values().collect(),
        }
    }
}
