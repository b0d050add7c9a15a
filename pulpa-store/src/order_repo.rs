use async_trait::async_trait;
use pulpa_core::repository::{BoxError, OrderRepository};
use pulpa_order::{Order, OrderItem, SalesDelta};
use pulpa_shared::{DateRange, Page, PageRequest};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    order_date: chrono::DateTime<chrono::Utc>,
    total_cents: i32,
    payment_method: String,
    payment_cents: i32,
    change_cents: i32,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            order_date: self.order_date,
            items,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            payment_cents: self.payment_cents,
            change_cents: self.change_cents,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: String,
    product_name: String,
    quantity: i32,
    unit_price_cents: i32,
    subtotal_cents: i32,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            subtotal_cents: row.subtotal_cents,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, order_date, total_cents, payment_method, \
                             payment_cents, change_cents, status, created_at, updated_at";

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<(), BoxError> {
        let delta = SalesDelta::from_order(order);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, order_date, total_cents, payment_method, payment_cents, change_cents, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(order.order_date)
        .bind(order.total_cents)
        .bind(&order.payment_method)
        .bind(order.payment_cents)
        .bind(order.change_cents)
        .bind(&order.status)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .execute(&mut *tx)
            .await?;
        }

        // Find-or-create-then-increment on the (date) counter
        sqlx::query(
            r#"
            INSERT INTO daily_summaries (summary_date, total_orders, total_items_sold, total_revenue_cents)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (summary_date) DO UPDATE SET
                total_orders = daily_summaries.total_orders + EXCLUDED.total_orders,
                total_items_sold = daily_summaries.total_items_sold + EXCLUDED.total_items_sold,
                total_revenue_cents = daily_summaries.total_revenue_cents + EXCLUDED.total_revenue_cents,
                updated_at = NOW()
            "#,
        )
        .bind(delta.summary_date)
        .bind(delta.order_count)
        .bind(delta.item_count)
        .bind(delta.revenue_cents)
        .execute(&mut *tx)
        .await?;

        // And on each (date, product) counter
        for product in &delta.products {
            sqlx::query(
                r#"
                INSERT INTO product_daily_sales (summary_date, product_id, quantity_sold, revenue_cents)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (summary_date, product_id) DO UPDATE SET
                    quantity_sold = product_daily_sales.quantity_sold + EXCLUDED.quantity_sold,
                    revenue_cents = product_daily_sales.revenue_cents + EXCLUDED.revenue_cents,
                    updated_at = NOW()
                "#,
            )
            .bind(delta.summary_date)
            .bind(&product.product_id)
            .bind(product.quantity)
            .bind(product.revenue_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_cents,
            "Order recorded"
        );

        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.quantity, oi.unit_price_cents, oi.subtotal_cents
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(
            row.into_order(items.into_iter().map(OrderItem::from).collect()),
        ))
    }

    async fn list_orders(
        &self,
        page: PageRequest,
        range: DateRange,
    ) -> Result<Page<Order>, BoxError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::date IS NULL OR order_date::date >= $1)
              AND ($2::date IS NULL OR order_date::date <= $2)
            "#,
        )
        .bind(range.start_date)
        .bind(range.end_date)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM orders
            WHERE ($1::date IS NULL OR order_date::date >= $1)
              AND ($2::date IS NULL OR order_date::date <= $2)
            ORDER BY order_date DESC
            LIMIT $3 OFFSET $4
            "#,
            ORDER_COLUMNS
        ))
        .bind(range.start_date)
        .bind(range.end_date)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        // Listings are shallow; items are only hydrated on get_order
        let orders = rows
            .into_iter()
            .map(|row| row.into_order(Vec::new()))
            .collect();

        Ok(Page::new(orders, total, page))
    }
}
