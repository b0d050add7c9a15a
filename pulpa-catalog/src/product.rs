use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of an operator-chosen product code
pub const MAX_ID_LEN: usize = 10;
/// Maximum length of a product name
pub const MAX_NAME_LEN: usize = 100;
/// Maximum length of a product type label
pub const MAX_TYPE_LEN: usize = 50;

/// A sellable catalog entry. Product ids are short codes chosen by the
/// operator at the register ("OJ-L", "SMTH1"), not generated keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: i32,
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: String,
        name: String,
        price_cents: i32,
        image_path: Option<String>,
        product_type: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            price_cents,
            image_path,
            product_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Mutable fields for a product update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductChanges {
    pub name: String,
    pub price_cents: i32,
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid product: {0}")]
    Invalid(String),
}

/// Field validation for create/update requests. Uniqueness of the id is
/// the store's job; everything shape-level is checked here.
pub fn validate_new_product(
    id: &str,
    name: &str,
    price_cents: i32,
    product_type: Option<&str>,
) -> Result<(), CatalogError> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(CatalogError::Invalid(format!(
            "product id must be 1-{} characters",
            MAX_ID_LEN
        )));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(CatalogError::Invalid(
            "product id must not contain whitespace".to_string(),
        ));
    }
    validate_product_fields(name, price_cents, product_type)
}

/// Shared checks for the fields an update may touch
pub fn validate_product_fields(
    name: &str,
    price_cents: i32,
    product_type: Option<&str>,
) -> Result<(), CatalogError> {
    if name.trim().is_empty() || name.len() > MAX_NAME_LEN {
        return Err(CatalogError::Invalid(format!(
            "product name must be 1-{} characters",
            MAX_NAME_LEN
        )));
    }
    if price_cents < 0 {
        return Err(CatalogError::Invalid(
            "price must not be negative".to_string(),
        ));
    }
    if let Some(t) = product_type {
        if t.len() > MAX_TYPE_LEN {
            return Err(CatalogError::Invalid(format!(
                "product type must be at most {} characters",
                MAX_TYPE_LEN
            )));
        }
    }
    Ok(())
}
