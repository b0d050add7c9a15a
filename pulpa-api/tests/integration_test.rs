use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use pulpa_api::{
    app,
    state::{AppState, AuthSettings, UploadSettings},
};
use pulpa_catalog::{Product, ProductChanges, Recipe};
use pulpa_core::repository::{
    BoxError, OrderRepository, ProductRepository, SalesRepository,
};
use pulpa_order::{DailySummary, Order, ProductSalesRow, SalesDelta};
use pulpa_shared::{DateRange, Page, PageRequest};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// In-memory store backing all three repository traits
// ============================================================================

#[derive(Default)]
struct InMemoryState {
    products: BTreeMap<String, Product>,
    recipes: BTreeMap<String, Recipe>,
    orders: Vec<Order>,
    daily: BTreeMap<NaiveDate, DailySummary>,
    product_daily: BTreeMap<(NaiveDate, String), (i64, i64)>,
}

#[derive(Default)]
struct InMemoryStore {
    state: Mutex<InMemoryState>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryStore {
    async fn create_product(&self, product: &Product) -> Result<(), BoxError> {
        let mut state = self.state.lock().unwrap();
        state.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BoxError> {
        Ok(self.state.lock().unwrap().products.get(id).cloned())
    }

    async fn get_product_detail(
        &self,
        id: &str,
    ) -> Result<Option<(Product, Option<Recipe>)>, BoxError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .get(id)
            .cloned()
            .map(|p| (p, state.recipes.get(id).cloned())))
    }

    async fn list_products(&self, product_type: Option<&str>) -> Result<Vec<Product>, BoxError> {
        let state = self.state.lock().unwrap();
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| match product_type {
                Some(t) => p.product_type.as_deref() == Some(t),
                None => true,
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update_product(&self, id: &str, changes: &ProductChanges) -> Result<bool, BoxError> {
        let mut state = self.state.lock().unwrap();
        match state.products.get_mut(id) {
            Some(product) => {
                product.name = changes.name.clone();
                product.price_cents = changes.price_cents;
                product.image_path = changes.image_path.clone();
                product.product_type = changes.product_type.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: &str) -> Result<bool, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.recipes.remove(id);
        Ok(state.products.remove(id).is_some())
    }

    async fn upsert_recipe(&self, product_id: &str, recipe: &Recipe) -> Result<bool, BoxError> {
        let mut state = self.state.lock().unwrap();
        if !state.products.contains_key(product_id) {
            return Ok(false);
        }
        state.recipes.insert(product_id.to_string(), recipe.clone());
        Ok(true)
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: &Order) -> Result<(), BoxError> {
        let delta = SalesDelta::from_order(order);
        let mut state = self.state.lock().unwrap();

        state.orders.push(order.clone());

        let summary = state
            .daily
            .entry(delta.summary_date)
            .or_insert_with(|| DailySummary {
                summary_date: delta.summary_date,
                total_orders: 0,
                total_items_sold: 0,
                total_revenue_cents: 0,
            });
        summary.total_orders += delta.order_count;
        summary.total_items_sold += delta.item_count;
        summary.total_revenue_cents += delta.revenue_cents;

        for product in &delta.products {
            let entry = state
                .product_daily
                .entry((delta.summary_date, product.product_id.clone()))
                .or_insert((0, 0));
            entry.0 += product.quantity as i64;
            entry.1 += product.revenue_cents;
        }

        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError> {
        let state = self.state.lock().unwrap();
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(
        &self,
        page: PageRequest,
        range: DateRange,
    ) -> Result<Page<Order>, BoxError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| range.contains(o.order_date.date_naive()))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.order_date.cmp(&a.order_date));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }
}

#[async_trait::async_trait]
impl SalesRepository for InMemoryStore {
    async fn daily_summaries(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailySummary>, BoxError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .daily
            .range(start_date..=end_date)
            .map(|(_, summary)| summary.clone())
            .collect())
    }

    async fn product_sales(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ProductSalesRow>, BoxError> {
        let state = self.state.lock().unwrap();
        let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for ((date, product_id), (quantity, revenue)) in &state.product_daily {
            if *date < start_date || *date > end_date {
                continue;
            }
            let entry = totals.entry(product_id.clone()).or_insert((0, 0));
            entry.0 += quantity;
            entry.1 += revenue;
        }

        Ok(totals
            .into_iter()
            .map(|(product_id, (quantity_sold, revenue_cents))| {
                let product = state.products.get(&product_id);
                ProductSalesRow {
                    product_type: product.and_then(|p| p.product_type.clone()),
                    product_name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| product_id.clone()),
                    product_id,
                    quantity_sold,
                    revenue_cents,
                }
            })
            .collect())
    }
}

// ============================================================================
// Test harness
// ============================================================================

fn test_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::default());
    let state = AppState {
        product_repo: store.clone(),
        order_repo: store.clone(),
        sales_repo: store.clone(),
        auth: AuthSettings {
            secret: "test-secret".to_string(),
            expiration: 3600,
            staff_passcode: "4242".to_string(),
        },
        uploads: UploadSettings {
            dir: std::env::temp_dir()
                .join("pulpa-test-uploads")
                .to_string_lossy()
                .into_owned(),
            base_url: "http://localhost:8080".to_string(),
            max_upload_bytes: 2 * 1024 * 1024,
        },
    };
    (app(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            &json!({ "passcode": "4242" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn seed_product(app: &Router, token: &str, id: &str, name: &str, price: i32, kind: Option<&str>) {
    let (status, _) = send(
        app,
        json_request(
            Method::POST,
            "/v1/products",
            Some(token),
            &json!({ "id": id, "name": name, "price_cents": price, "type": kind }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_login_flow() {
    let (app, _) = test_app();

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            &json!({ "passcode": "4242" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/auth/login",
            None,
            &json!({ "passcode": "9999" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_mutations_require_token() {
    let (app, _) = test_app();

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/products",
            None,
            &json!({ "id": "OJ", "name": "Orange Juice", "price_cents": 550 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_request("/v1/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Catalog reads stay public
    let (status, _) = send(&app, get_request("/v1/products", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_product_crud_flow() {
    let (app, _) = test_app();
    let token = login(&app).await;

    seed_product(&app, &token, "OJ", "Orange Juice", 550, Some("Juice")).await;

    // Duplicate id is a conflict
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/products",
            Some(&token),
            &json!({ "id": "OJ", "name": "Other Juice", "price_cents": 500 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Listing shows it with the client route path
    let (status, body) = send(&app, get_request("/v1/products", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "OJ");
    assert_eq!(body[0]["path"], "/recipe/OJ");

    // Update
    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/v1/products/OJ",
            Some(&token),
            &json!({ "name": "Orange Juice (Large)", "price_cents": 650, "type": "Juice" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Orange Juice (Large)");
    assert_eq!(body["price_cents"], 650);

    // Delete, then the detail read 404s
    let (status, _) = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/v1/products/OJ")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_request("/v1/products/OJ", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_validation() {
    let (app, _) = test_app();
    let token = login(&app).await;

    // Id too long
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/products",
            Some(&token),
            &json!({ "id": "WAY-TOO-LONG-ID", "name": "Orange Juice", "price_cents": 550 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Negative price
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/products",
            Some(&token),
            &json!({ "id": "OJ", "name": "Orange Juice", "price_cents": -1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_recipe_upsert_and_detail() {
    let (app, _) = test_app();
    let token = login(&app).await;
    seed_product(&app, &token, "SMTH", "Berry Smoothie", 700, Some("Smoothie")).await;

    // Plain product detail has no recipe fields
    let (status, body) = send(&app, get_request("/v1/products/SMTH", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("ingredients").is_none());

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/v1/products/SMTH/recipe",
            Some(&token),
            &json!({
                "description": "Blend and serve cold",
                "ingredients": ["1 cup mixed berries", "1 banana"],
                "steps": ["Blend until smooth", "Serve"],
                "tips": ["Frozen berries make it thicker"],
                "nutritionFacts": [
                    { "nutrient_name": "Calories", "nutrient_value": "180 kcal" }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, get_request("/v1/products/SMTH", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["steps"][0], "Blend until smooth");
    assert_eq!(body["nutritionFacts"]["Calories"], "180 kcal");

    // Unknown product 404s
    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/v1/products/NOPE/recipe",
            Some(&token),
            &json!({ "steps": ["Stir"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_creation_updates_sales_aggregates() {
    let (app, _) = test_app();
    let token = login(&app).await;
    seed_product(&app, &token, "OJ", "Orange Juice", 550, Some("Juice")).await;
    seed_product(&app, &token, "SMTH", "Berry Smoothie", 700, Some("Smoothie")).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({
                "order": { "total_cents": 1800, "payment_cents": 2000 },
                "items": [
                    { "id": "OJ", "quantity": 2, "unit_price_cents": 550 },
                    { "id": "SMTH", "quantity": 1, "unit_price_cents": 700 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["id"].as_str().unwrap().to_string();
    let order_number = body["order_number"].as_str().unwrap().to_string();

    // Order detail carries line items and change
    let (status, body) = send(&app, get_request(&format!("/v1/orders/{}", order_id), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_number"], order_number.as_str());
    assert_eq!(body["total_cents"], 1800);
    assert_eq!(body["change_cents"], 200);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["product_name"], "Orange Juice");

    // The daily summary moved by exactly the order's item count and revenue
    let today = chrono::Utc::now().date_naive();
    let uri = format!(
        "/v1/sales/summary?start_date={}&end_date={}",
        today, today
    );
    let (status, body) = send(&app, get_request(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["total_orders"], 1);
    assert_eq!(body["summary"]["total_items"], 3);
    assert_eq!(body["summary"]["total_revenue_cents"], 1800);
    assert_eq!(body["daily_sales"].as_array().unwrap().len(), 1);
    assert_eq!(body["daily_sales"][0]["total_orders"], 1);

    // Per-product rows grouped by type
    assert_eq!(body["products_by_type"]["Juice"][0]["quantity_sold"], 2);
    assert_eq!(body["products_by_type"]["Juice"][0]["revenue_cents"], 1100);
    assert_eq!(body["products_by_type"]["Smoothie"][0]["revenue_cents"], 700);

    // A second sale the same day increments rather than replaces
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({
                "order": { "total_cents": 550 },
                "items": [ { "id": "OJ", "quantity": 1, "unit_price_cents": 550 } ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get_request(&uri, Some(&token))).await;
    assert_eq!(body["summary"]["total_orders"], 2);
    assert_eq!(body["summary"]["total_items"], 4);
    assert_eq!(body["summary"]["total_revenue_cents"], 2350);
    assert_eq!(body["products_by_type"]["Juice"][0]["quantity_sold"], 3);
}

#[tokio::test]
async fn test_order_validation() {
    let (app, _) = test_app();
    let token = login(&app).await;
    seed_product(&app, &token, "OJ", "Orange Juice", 550, Some("Juice")).await;

    // No items
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({ "order": { "total_cents": 0 }, "items": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown product
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({
                "order": { "total_cents": 550 },
                "items": [ { "id": "NOPE", "quantity": 1, "unit_price_cents": 550 } ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Unknown product"));

    // Declared total disagrees with the line subtotals
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({
                "order": { "total_cents": 500 },
                "items": [ { "id": "OJ", "quantity": 1, "unit_price_cents": 550 } ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Payment short of the total
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/v1/orders",
            Some(&token),
            &json!({
                "order": { "total_cents": 550, "payment_cents": 500 },
                "items": [ { "id": "OJ", "quantity": 1, "unit_price_cents": 550 } ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was recorded for today
    let today = chrono::Utc::now().date_naive();
    let uri = format!("/v1/sales/summary?start_date={}&end_date={}", today, today);
    let (_, body) = send(&app, get_request(&uri, Some(&token))).await;
    assert_eq!(body["summary"]["total_orders"], 0);
}

#[tokio::test]
async fn test_order_listing_pagination() {
    let (app, _) = test_app();
    let token = login(&app).await;
    seed_product(&app, &token, "OJ", "Orange Juice", 550, None).await;

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/v1/orders",
                Some(&token),
                &json!({
                    "order": { "total_cents": 550 },
                    "items": [ { "id": "OJ", "quantity": 1, "unit_price_cents": 550 } ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get_request("/v1/orders?limit=2", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["per_page"], 2);
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["last_page"], 2);

    let (_, body) = send(&app, get_request("/v1/orders?limit=2&page=2", Some(&token))).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);

    // A range in the past matches nothing
    let (_, body) = send(
        &app,
        get_request(
            "/v1/orders?start_date=2020-01-01&end_date=2020-01-31",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_missing_resources_return_404() {
    let (app, _) = test_app();
    let token = login(&app).await;

    let (status, _) = send(&app, get_request("/v1/products/NOPE", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/v1/orders/{}", Uuid::new_v4());
    let (status, _) = send(&app, get_request(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sales_summary_requires_range() {
    let (app, _) = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, get_request("/v1/sales/summary", Some(&token))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("start_date"));

    let (status, _) = send(
        &app,
        get_request("/v1/sales/summary?start_date=2025-03-01", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
