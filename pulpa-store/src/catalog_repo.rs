use async_trait::async_trait;
use pulpa_catalog::{NutritionFact, Product, ProductChanges, Recipe};
use pulpa_core::repository::{BoxError, ProductRepository};
use sqlx::PgPool;

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i32,
    image_path: Option<String>,
    product_type: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price_cents: row.price_cents,
            image_path: row.image_path,
            product_type: row.product_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i64,
    description: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, image_path, product_type, created_at, updated_at";

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn create_product(&self, product: &Product) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, image_path, product_type)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.image_path)
        .bind(&product.product_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn get_product_detail(
        &self,
        id: &str,
    ) -> Result<Option<(Product, Option<Recipe>)>, BoxError> {
        let product = match self.get_product(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let recipe_row =
            sqlx::query_as::<_, RecipeRow>("SELECT id, description FROM recipes WHERE product_id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let recipe = match recipe_row {
            Some(row) => {
                let ingredients: Vec<String> = sqlx::query_scalar(
                    "SELECT ingredient_text FROM recipe_ingredients WHERE recipe_id = $1 ORDER BY display_order",
                )
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

                let steps: Vec<String> = sqlx::query_scalar(
                    "SELECT step_text FROM recipe_steps WHERE recipe_id = $1 ORDER BY display_order",
                )
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

                let tips: Vec<String> = sqlx::query_scalar(
                    "SELECT tip_text FROM recipe_tips WHERE recipe_id = $1 ORDER BY display_order",
                )
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

                let facts: Vec<(String, String)> = sqlx::query_as(
                    "SELECT nutrient_name, nutrient_value FROM nutrition_facts WHERE recipe_id = $1 ORDER BY id",
                )
                .bind(row.id)
                .fetch_all(&self.pool)
                .await?;

                Some(Recipe {
                    description: row.description,
                    ingredients,
                    steps,
                    tips,
                    nutrition_facts: facts
                        .into_iter()
                        .map(|(nutrient_name, nutrient_value)| NutritionFact {
                            nutrient_name,
                            nutrient_value,
                        })
                        .collect(),
                })
            }
            None => None,
        };

        Ok(Some((product, recipe)))
    }

    async fn list_products(&self, product_type: Option<&str>) -> Result<Vec<Product>, BoxError> {
        let rows: Vec<ProductRow> = if let Some(pt) = product_type {
            sqlx::query_as(&format!(
                "SELECT {} FROM products WHERE product_type = $1 ORDER BY name",
                PRODUCT_COLUMNS
            ))
            .bind(pt)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(&format!(
                "SELECT {} FROM products ORDER BY name",
                PRODUCT_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update_product(&self, id: &str, changes: &ProductChanges) -> Result<bool, BoxError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $1, price_cents = $2, image_path = $3, product_type = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&changes.name)
        .bind(changes.price_cents)
        .bind(&changes.image_path)
        .bind(&changes.product_type)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, BoxError> {
        // Recipe content goes with the product via ON DELETE CASCADE;
        // order history and sales rows keep their FK and block the delete.
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_recipe(&self, product_id: &str, recipe: &Recipe) -> Result<bool, BoxError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let recipe_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (product_id, description)
            VALUES ($1, $2)
            ON CONFLICT (product_id)
            DO UPDATE SET description = EXCLUDED.description, updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(product_id)
        .bind(&recipe.description)
        .fetch_one(&mut *tx)
        .await?;

        // Replace the ordered children wholesale
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_steps WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_tips WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM nutrition_facts WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        for (i, text) in recipe.ingredients.iter().enumerate() {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, ingredient_text, display_order) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(text)
            .bind(i as i32)
            .execute(&mut *tx)
            .await?;
        }
        for (i, text) in recipe.steps.iter().enumerate() {
            sqlx::query(
                "INSERT INTO recipe_steps (recipe_id, step_text, display_order) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(text)
            .bind(i as i32)
            .execute(&mut *tx)
            .await?;
        }
        for (i, text) in recipe.tips.iter().enumerate() {
            sqlx::query(
                "INSERT INTO recipe_tips (recipe_id, tip_text, display_order) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(text)
            .bind(i as i32)
            .execute(&mut *tx)
            .await?;
        }
        for fact in &recipe.nutrition_facts {
            sqlx::query(
                "INSERT INTO nutrition_facts (recipe_id, nutrient_name, nutrient_value) VALUES ($1, $2, $3)",
            )
            .bind(recipe_id)
            .bind(&fact.nutrient_name)
            .bind(&fact.nutrient_value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(true)
    }
}
