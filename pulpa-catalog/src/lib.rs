pub mod product;
pub mod recipe;

pub use product::{
    validate_new_product, validate_product_fields, CatalogError, Product, ProductChanges,
};
pub use recipe::{NutritionFact, Recipe};
