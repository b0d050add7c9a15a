use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use pulpa_catalog::{validate_new_product, validate_product_fields, NutritionFact, Product, ProductChanges, Recipe};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::auth::staff_auth_middleware, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub price_cents: i32,
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub price_cents: i32,
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i32,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub path: String,
}

impl ProductResponse {
    fn from_product(product: Product, base_url: &str) -> Self {
        Self {
            path: format!("/recipe/{}", product.id),
            image: product.image_path.map(|p| image_url(base_url, &p)),
            id: product.id,
            name: product.name,
            price_cents: product.price_cents,
            product_type: product.product_type,
        }
    }
}

/// Product detail; recipe fields only appear when a recipe exists
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i32,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
    #[serde(rename = "nutritionFacts", skip_serializing_if = "Option::is_none")]
    pub nutrition_facts: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertRecipeRequest {
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default, rename = "nutritionFacts")]
    pub nutrition_facts: Vec<NutritionFactRequest>,
}

#[derive(Debug, Deserialize)]
pub struct NutritionFactRequest {
    pub nutrient_name: String,
    pub nutrient_value: String,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/v1/products", post(create_product))
        .route("/v1/products/{id}", put(update_product).delete(delete_product))
        .route("/v1/products/{id}/recipe", put(upsert_recipe))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            staff_auth_middleware,
        ));

    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/{id}", get(get_product))
        .merge(staff)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/products
/// List the catalog, optionally filtered by type
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state
        .product_repo
        .list_products(query.product_type.as_deref())
        .await
        .map_err(AppError::internal)?;

    let base_url = state.uploads.base_url.clone();
    let responses = products
        .into_iter()
        .map(|p| ProductResponse::from_product(p, &base_url))
        .collect();

    Ok(Json(responses))
}

/// GET /v1/products/:id
/// Product detail with its recipe content, when present
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let (product, recipe) = state
        .product_repo
        .get_product_detail(&product_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFoundError("Product not found".to_string()))?;

    let mut response = ProductDetailResponse {
        image: product
            .image_path
            .map(|p| image_url(&state.uploads.base_url, &p)),
        id: product.id,
        name: product.name,
        price_cents: product.price_cents,
        product_type: product.product_type,
        ingredients: None,
        steps: None,
        tips: None,
        nutrition_facts: None,
    };

    if let Some(recipe) = recipe {
        response.nutrition_facts = Some(recipe.nutrition_map());
        response.ingredients = Some(recipe.ingredients);
        response.steps = Some(recipe.steps);
        response.tips = Some(recipe.tips);
    }

    Ok(Json(response))
}

/// POST /v1/products
/// Create a catalog entry
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    validate_new_product(
        &req.id,
        &req.name,
        req.price_cents,
        req.product_type.as_deref(),
    )
    .map_err(|e| AppError::ValidationError(e.to_string()))?;

    if state
        .product_repo
        .get_product(&req.id)
        .await
        .map_err(AppError::internal)?
        .is_some()
    {
        return Err(AppError::ConflictError(format!(
            "Product id already in use: {}",
            req.id
        )));
    }

    let product = Product::new(
        req.id,
        req.name,
        req.price_cents,
        req.image_path,
        req.product_type,
    );

    state
        .product_repo
        .create_product(&product)
        .await
        .map_err(AppError::internal)?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::from_product(
            product,
            &state.uploads.base_url,
        )),
    ))
}

/// PUT /v1/products/:id
/// Update name, price, image or type
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    validate_product_fields(&req.name, req.price_cents, req.product_type.as_deref())
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let changes = ProductChanges {
        name: req.name,
        price_cents: req.price_cents,
        image_path: req.image_path,
        product_type: req.product_type,
    };

    let updated = state
        .product_repo
        .update_product(&product_id, &changes)
        .await
        .map_err(AppError::internal)?;
    if !updated {
        return Err(AppError::NotFoundError("Product not found".to_string()));
    }

    let product = state
        .product_repo
        .get_product(&product_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFoundError("Product not found".to_string()))?;

    Ok(Json(ProductResponse::from_product(
        product,
        &state.uploads.base_url,
    )))
}

/// DELETE /v1/products/:id
/// Remove a product and its recipe content. Products that already appear
/// in order history are protected by their foreign keys.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = state
        .product_repo
        .delete_product(&product_id)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(e.as_ref()) {
                AppError::ConflictError(
                    "Product has recorded sales and cannot be deleted".to_string(),
                )
            } else {
                AppError::internal(e)
            }
        })?;

    if !deleted {
        return Err(AppError::NotFoundError("Product not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Product deleted successfully"
    })))
}

/// PUT /v1/products/:id/recipe
/// Replace the product's recipe document
pub async fn upsert_recipe(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(req): Json<UpsertRecipeRequest>,
) -> Result<StatusCode, AppError> {
    let recipe = Recipe {
        description: req.description,
        ingredients: req.ingredients,
        steps: req.steps,
        tips: req.tips,
        nutrition_facts: req
            .nutrition_facts
            .into_iter()
            .map(|f| NutritionFact {
                nutrient_name: f.nutrient_name,
                nutrient_value: f.nutrient_value,
            })
            .collect(),
    };

    let updated = state
        .product_repo
        .upsert_recipe(&product_id, &recipe)
        .await
        .map_err(AppError::internal)?;
    if !updated {
        return Err(AppError::NotFoundError("Product not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helpers
// ============================================================================

/// Absolutize a stored image path against the public origin. Already
/// absolute URLs pass through untouched.
pub fn image_url(base_url: &str, image_path: &str) -> String {
    if image_path.starts_with("http") {
        image_path.to_string()
    } else if image_path.starts_with("/storage/") {
        format!("{}{}", base_url, image_path)
    } else if image_path.starts_with("storage/") {
        format!("{}/{}", base_url, image_path)
    } else {
        format!("{}/storage/{}", base_url, image_path.trim_start_matches('/'))
    }
}

fn is_foreign_key_violation(err: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
        return db_err.code().as_deref() == Some("23503");
    }
    false
}
