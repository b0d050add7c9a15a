use async_trait::async_trait;
use chrono::NaiveDate;
use pulpa_catalog::{Product, ProductChanges, Recipe};
use pulpa_order::{DailySummary, Order, ProductSalesRow};
use pulpa_shared::{DateRange, Page, PageRequest};
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product. Err with a conflict message when the id is taken.
    async fn create_product(&self, product: &Product) -> Result<(), BoxError>;

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BoxError>;

    /// Product plus its recipe document, when one exists
    async fn get_product_detail(&self, id: &str)
        -> Result<Option<(Product, Option<Recipe>)>, BoxError>;

    async fn list_products(&self, product_type: Option<&str>) -> Result<Vec<Product>, BoxError>;

    /// Returns false when the product does not exist
    async fn update_product(&self, id: &str, changes: &ProductChanges) -> Result<bool, BoxError>;

    /// Deletes the product and cascades its recipe content.
    /// Returns false when the product does not exist.
    async fn delete_product(&self, id: &str) -> Result<bool, BoxError>;

    /// Replace the product's recipe document wholesale.
    /// Returns false when the product does not exist.
    async fn upsert_recipe(&self, product_id: &str, recipe: &Recipe) -> Result<bool, BoxError>;
}

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist the order, its items, and the sales-aggregate increments
    /// in one transaction. Either everything lands or nothing does.
    async fn create_order(&self, order: &Order) -> Result<(), BoxError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError>;

    /// Newest first, optionally bounded to a date range
    async fn list_orders(
        &self,
        page: PageRequest,
        range: DateRange,
    ) -> Result<Page<Order>, BoxError>;
}

/// Repository trait for the persisted sales aggregates
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Per-day rows within the inclusive range, ordered by date
    async fn daily_summaries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>, BoxError>;

    /// Per-product totals over the inclusive range, joined to the
    /// catalog for name and type
    async fn product_sales(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProductSalesRow>, BoxError>;
}
