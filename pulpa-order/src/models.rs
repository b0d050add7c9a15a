use chrono::{DateTime, Utc};
use pulpa_catalog::Product;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PAYMENT_CASH: &str = "Cash";
pub const STATUS_COMPLETED: &str = "Completed";

/// A completed sale as rung up at the register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub total_cents: i32,
    pub payment_method: String,
    pub payment_cents: i32,
    pub change_cents: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(order_number: String, order_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number,
            order_date,
            items: Vec::new(),
            total_cents: 0,
            payment_method: PAYMENT_CASH.to_string(),
            payment_cents: 0,
            change_cents: 0,
            status: STATUS_COMPLETED.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a line item, keeping the running total in step
    pub fn add_item(&mut self, item: OrderItem) {
        self.total_cents += item.subtotal_cents;
        self.items.push(item);
        self.updated_at = Utc::now();
    }

    /// Total units across all lines
    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// The register declares the total it showed the customer; it must
    /// agree with the line subtotals or both sale aggregates would drift.
    pub fn verify_declared_total(&self, declared_cents: i32) -> Result<(), OrderError> {
        if declared_cents != self.total_cents {
            return Err(OrderError::TotalMismatch {
                declared: declared_cents,
                computed: self.total_cents,
            });
        }
        Ok(())
    }

    /// Record the tender and compute change. Payment defaults to exact
    /// cash when not given.
    pub fn settle(
        &mut self,
        payment_method: Option<String>,
        payment_cents: Option<i32>,
    ) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let payment = payment_cents.unwrap_or(self.total_cents);
        if payment < self.total_cents {
            return Err(OrderError::InsufficientPayment {
                payment,
                total: self.total_cents,
            });
        }
        self.payment_method = payment_method.unwrap_or_else(|| PAYMENT_CASH.to_string());
        self.payment_cents = payment;
        self.change_cents = payment - self.total_cents;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A product line within an order. Name and price are snapshots taken at
/// sale time; later catalog edits must not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price_cents: i32,
    pub subtotal_cents: i32,
}

impl OrderItem {
    pub fn new(
        order_id: Uuid,
        product_id: String,
        product_name: String,
        quantity: i32,
        unit_price_cents: i32,
    ) -> Result<Self, OrderError> {
        if quantity < 1 {
            return Err(OrderError::InvalidQuantity(quantity));
        }
        if unit_price_cents < 0 {
            return Err(OrderError::InvalidPrice(unit_price_cents));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            product_name,
            quantity,
            unit_price_cents,
            subtotal_cents: unit_price_cents * quantity,
        })
    }

    /// Line built against a catalog product, at the price the register
    /// charged (which may differ from the current list price).
    pub fn from_product(
        order_id: Uuid,
        product: &Product,
        quantity: i32,
        unit_price_cents: i32,
    ) -> Result<Self, OrderError> {
        Self::new(
            order_id,
            product.id.clone(),
            product.name.clone(),
            quantity,
            unit_price_cents,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Invalid unit price: {0}")]
    InvalidPrice(i32),

    #[error("Declared total {declared} does not match line subtotals {computed}")]
    TotalMismatch { declared: i32, computed: i32 },

    #[error("Payment {payment} does not cover total {total}")]
    InsufficientPayment { payment: i32, total: i32 },

    #[error("Unknown product: {0}")]
    UnknownProduct(String),
}
