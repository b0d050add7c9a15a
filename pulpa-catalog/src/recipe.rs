use serde::{Deserialize, Serialize};

/// A single named nutrient, both sides free-form ("Calories" -> "110 kcal")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionFact {
    pub nutrient_name: String,
    pub nutrient_value: String,
}

/// Preparation detail attached to a product. Ingredients, steps and tips
/// are kept in display order; the store persists the position explicitly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub tips: Vec<String>,
    pub nutrition_facts: Vec<NutritionFact>,
}

impl Recipe {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.ingredients.is_empty()
            && self.steps.is_empty()
            && self.tips.is_empty()
            && self.nutrition_facts.is_empty()
    }

    /// Nutrition facts as a name -> value object, the shape the API serves
    pub fn nutrition_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.nutrition_facts
            .iter()
            .map(|f| {
                (
                    f.nutrient_name.clone(),
                    serde_json::Value::String(f.nutrient_value.clone()),
                )
            })
            .collect()
    }
}
