// 📊 Dashboard statistics
//
// Headline numbers for the home screen, derived from the current
// recipe and ingredient lists.

use crate::entities::{Ingredient, Recipe};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_recipes: usize,
    pub total_ingredients: usize,
    pub low_stock_items: usize,
    /// Mean target margin over all recipes, missing margins count as 0
    pub average_margin: f64,
    /// Money tied up in stock
    pub inventory_value: f64,
}

impl DashboardStats {
    pub fn compute(recipes: &[Recipe], ingredients: &[Ingredient]) -> Self {
        let low_stock_items = ingredients.iter().filter(|i| i.is_low_stock()).count();

        let average_margin = if recipes.is_empty() {
            0.0
        } else {
            recipes
                .iter()
                .map(|r| r.target_margin.unwrap_or(0.0))
                .sum::<f64>()
                / recipes.len() as f64
        };

        DashboardStats {
            total_recipes: recipes.len(),
            total_ingredients: ingredients.len(),
            low_stock_items,
            average_margin,
            inventory_value: ingredients.iter().map(|i| i.stock_value()).sum(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} recipes, {} ingredients ({} low stock), avg margin {:.1}%, stock value {:.2}",
            self.total_recipes,
            self.total_ingredients,
            self.low_stock_items,
            self.average_margin,
            self.inventory_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::IngredientCategory;

    #[test]
    fn test_empty_dashboard() {
        let stats = DashboardStats::compute(&[], &[]);

        assert_eq!(stats.total_recipes, 0);
        assert_eq!(stats.total_ingredients, 0);
        assert_eq!(stats.low_stock_items, 0);
        assert_eq!(stats.average_margin, 0.0);
        assert_eq!(stats.inventory_value, 0.0);
    }

    #[test]
    fn test_dashboard_counts() {
        let ingredients = vec![
            Ingredient::new("Leche", "litros", 1.5, IngredientCategory::Dairy).with_stock(2.0, 5.0),
            Ingredient::new("Azúcar", "kg", 0.8, IngredientCategory::Sweeteners).with_stock(10.0, 2.0),
            Ingredient::new("Vasos", "unidades", 0.05, IngredientCategory::Packaging).with_stock(0.0, 0.0),
        ];

        let mut vanilla = Recipe::new("Vainilla", 2.0, "litros");
        vanilla.target_margin = Some(60.0);
        let mut chocolate = Recipe::new("Chocolate", 2.0, "litros");
        chocolate.target_margin = Some(40.0);
        let sorbet = Recipe::new("Sorbete", 1.0, "litros");

        let stats = DashboardStats::compute(&[vanilla, chocolate, sorbet], &ingredients);

        assert_eq!(stats.total_recipes, 3);
        assert_eq!(stats.total_ingredients, 3);
        assert_eq!(stats.low_stock_items, 2);
        assert!((stats.average_margin - 100.0 / 3.0).abs() < 1e-9);
        assert!((stats.inventory_value - 11.0).abs() < 1e-9);
        assert!(stats.summary().contains("2 low stock"));
    }
}
