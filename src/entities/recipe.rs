// 🍨 Recipe Entity - ingredient lines plus a batch yield
//
// A recipe is costed against the current inventory: every line looks up its
// ingredient's quoted price, and the batch total is spread over the yield.

use crate::costing::{aggregate_recipe_cost, IngredientCostResult, IngredientLine, RecipeCostResult};
use crate::entities::Ingredient;
use crate::error::CostingError;
use crate::pricing::solve_price_from_margin;
use crate::units::ConversionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// RECIPE CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeCategory {
    #[default]
    IceCream,
    Sorbet,
    Gelato,
    FrozenYogurt,
    Popsicle,
    Sundae,
    Milkshake,
    Other,
}

impl RecipeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeCategory::IceCream => "ice_cream",
            RecipeCategory::Sorbet => "sorbet",
            RecipeCategory::Gelato => "gelato",
            RecipeCategory::FrozenYogurt => "frozen_yogurt",
            RecipeCategory::Popsicle => "popsicle",
            RecipeCategory::Sundae => "sundae",
            RecipeCategory::Milkshake => "milkshake",
            RecipeCategory::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "ice_cream" => RecipeCategory::IceCream,
            "sorbet" => RecipeCategory::Sorbet,
            "gelato" => RecipeCategory::Gelato,
            "frozen_yogurt" => RecipeCategory::FrozenYogurt,
            "popsicle" => RecipeCategory::Popsicle,
            "sundae" => RecipeCategory::Sundae,
            "milkshake" => RecipeCategory::Milkshake,
            _ => RecipeCategory::Other,
        }
    }
}

// ============================================================================
// RECIPE LINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: String,
    pub quantity: f64,
    /// Unit the recipe measures this line in
    pub unit: String,
}

impl RecipeIngredient {
    pub fn new(ingredient_id: &str, quantity: f64, unit: &str) -> Self {
        RecipeIngredient {
            ingredient_id: ingredient_id.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    /// Pair this line with its inventory record
    pub fn to_line(&self, ingredient: &Ingredient) -> IngredientLine {
        IngredientLine::new(
            &self.ingredient_id,
            &ingredient.name,
            self.quantity,
            &self.unit,
            ingredient.price_per_unit,
            &ingredient.unit,
        )
    }
}

// ============================================================================
// RECIPE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: RecipeCategory,
    pub preparation_minutes: Option<u32>,
    pub yield_quantity: f64,
    pub yield_unit: String,
    /// Desired margin (% of sale price)
    pub target_margin: Option<f64>,
    pub suggested_price: Option<f64>,
    pub active: bool,
    pub ingredients: Vec<RecipeIngredient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// New active recipe with no lines
    pub fn new(name: &str, yield_quantity: f64, yield_unit: &str) -> Self {
        let now = Utc::now();

        Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            category: RecipeCategory::default(),
            preparation_minutes: None,
            yield_quantity,
            yield_unit: yield_unit.to_string(),
            target_margin: None,
            suggested_price: None,
            active: true,
            ingredients: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_ingredient(&mut self, ingredient_id: &str, quantity: f64, unit: &str) {
        self.ingredients
            .push(RecipeIngredient::new(ingredient_id, quantity, unit));
    }

    /// Remove the line at `index`; out-of-range indexes are ignored
    pub fn remove_ingredient(&mut self, index: usize) {
        if index < self.ingredients.len() {
            self.ingredients.remove(index);
        }
    }

    /// Cost the recipe against `inventory`.
    ///
    /// Lines whose ingredient is not in the inventory cost nothing and are
    /// kept with the name "ingredient not found". When a positive target
    /// margin is set, the suggested price for the whole batch is attached.
    pub fn calculate(
        &self,
        inventory: &[Ingredient],
        policy: ConversionPolicy,
    ) -> Result<RecipeCostResult, CostingError> {
        let by_id: HashMap<&str, &Ingredient> =
            inventory.iter().map(|i| (i.id.as_str(), i)).collect();

        let mut lines = Vec::with_capacity(self.ingredients.len());
        for item in &self.ingredients {
            let line = match by_id.get(item.ingredient_id.as_str()) {
                Some(ingredient) => item.to_line(ingredient).evaluate_with(policy)?,
                None => IngredientCostResult::missing(&item.ingredient_id, item.quantity, &item.unit),
            };
            lines.push(line);
        }

        let mut result =
            aggregate_recipe_cost(lines).with_yield(self.yield_quantity, &self.yield_unit);

        if let Some(margin) = self.target_margin.filter(|m| *m > 0.0) {
            result.suggested_price = Some(solve_price_from_margin(result.total_cost, margin));
            result.target_margin = Some(margin);
        }

        Ok(result)
    }

    /// Lines referencing ingredients absent from `inventory`
    pub fn missing_ingredients(&self, inventory: &[Ingredient]) -> Vec<String> {
        self.ingredients
            .iter()
            .filter(|item| !inventory.iter().any(|i| i.id == item.ingredient_id))
            .map(|item| item.ingredient_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::IngredientCategory;

    fn inventory() -> Vec<Ingredient> {
        vec![
            Ingredient::new("Leche Entera", "litros", 1.50, IngredientCategory::Dairy),
            Ingredient::new("Azúcar", "kg", 0.80, IngredientCategory::Sweeteners),
        ]
    }

    fn vanilla(inventory: &[Ingredient]) -> Recipe {
        let mut recipe = Recipe::new("Helado de Vainilla", 2.0, "litros");
        recipe.add_ingredient(&inventory[0].id, 1.0, "litros");
        recipe.add_ingredient(&inventory[1].id, 0.3, "kg");
        recipe
    }

    #[test]
    fn test_calculate_literal_recipe() {
        let inventory = inventory();
        let recipe = vanilla(&inventory);

        let result = recipe.calculate(&inventory, ConversionPolicy::Lenient).unwrap();

        assert!((result.total_cost - 1.74).abs() <= 0.01);
        assert!((result.cost_per_yield_unit - 0.87).abs() <= 0.01);
        assert_eq!(result.lines[0].name, "Leche Entera");
        assert_eq!(result.suggested_price, None);
    }

    #[test]
    fn test_suggested_price_from_target_margin() {
        let inventory = inventory();
        let mut recipe = vanilla(&inventory);
        recipe.target_margin = Some(60.0);

        let result = recipe.calculate(&inventory, ConversionPolicy::Lenient).unwrap();

        assert!((result.suggested_price.unwrap() - 4.35).abs() <= 0.01);
        assert_eq!(result.target_margin, Some(60.0));

        recipe.target_margin = Some(0.0);
        let result = recipe.calculate(&inventory, ConversionPolicy::Lenient).unwrap();
        assert_eq!(result.suggested_price, None);
    }

    #[test]
    fn test_missing_ingredient_costs_nothing() {
        let inventory = inventory();
        let mut recipe = vanilla(&inventory);
        recipe.add_ingredient("does-not-exist", 2.0, "kg");

        let result = recipe.calculate(&inventory, ConversionPolicy::Lenient).unwrap();

        assert_eq!(result.lines.len(), 3);
        assert_eq!(result.lines[2].name, "ingredient not found");
        assert!((result.total_cost - 1.74).abs() <= 0.01);
        assert_eq!(recipe.missing_ingredients(&inventory), vec!["does-not-exist"]);
    }

    #[test]
    fn test_strict_policy_surfaces_bad_units() {
        let inventory = inventory();
        let mut recipe = Recipe::new("Paleta", 10.0, "unidades");
        recipe.add_ingredient(&inventory[0].id, 1.0, "unidades");

        assert!(recipe.calculate(&inventory, ConversionPolicy::Strict).is_err());
        assert!(recipe.calculate(&inventory, ConversionPolicy::Lenient).is_ok());
    }

    #[test]
    fn test_remove_ingredient() {
        let inventory = inventory();
        let mut recipe = vanilla(&inventory);

        recipe.remove_ingredient(5);
        assert_eq!(recipe.ingredients.len(), 2);

        recipe.remove_ingredient(0);
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].ingredient_id, inventory[1].id);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(RecipeCategory::from_label("gelato"), RecipeCategory::Gelato);
        assert_eq!(RecipeCategory::from_label("cake"), RecipeCategory::Other);
        assert_eq!(RecipeCategory::default().as_str(), "ice_cream");
    }
}
