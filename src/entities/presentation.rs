// 🥡 Presentation Entity - a sellable portion of a recipe

use crate::costing::RecipeCostResult;
use crate::error::CostingError;
use crate::presentation::{presentation_cost_with, PresentationResult};
use crate::units::ConversionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub id: String,
    pub recipe_id: String,
    /// e.g. "Vaso 150 ml", "Pote 1 kg"
    pub name: String,
    pub description: Option<String>,
    pub portion_size: f64,
    pub portion_unit: String,
    pub sale_price: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Presentation {
    pub fn new(
        recipe_id: &str,
        name: &str,
        portion_size: f64,
        portion_unit: &str,
        sale_price: f64,
    ) -> Self {
        let now = Utc::now();

        Presentation {
            id: uuid::Uuid::new_v4().to_string(),
            recipe_id: recipe_id.to_string(),
            name: name.to_string(),
            description: None,
            portion_size,
            portion_unit: portion_unit.to_string(),
            sale_price,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Cost this portion from a costed recipe
    pub fn evaluate(
        &self,
        recipe: &RecipeCostResult,
        policy: ConversionPolicy,
    ) -> Result<PresentationResult, CostingError> {
        presentation_cost_with(
            policy,
            recipe.total_cost,
            recipe.yield_quantity,
            &recipe.yield_unit,
            self.portion_size,
            &self.portion_unit,
            self.sale_price,
        )
    }

    /// Portions one recipe batch fills, 0 when units don't line up
    pub fn portions_per_batch(&self, recipe: &RecipeCostResult, policy: ConversionPolicy) -> f64 {
        if self.portion_size <= 0.0 {
            return 0.0;
        }
        match policy.factor(&recipe.yield_unit, &self.portion_unit) {
            Ok(factor) => recipe.yield_quantity * factor / self.portion_size,
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{aggregate_recipe_cost, IngredientLine};

    fn batch() -> RecipeCostResult {
        let lines = vec![
            IngredientLine::new("milk", "Leche", 1.0, "litros", 1.50, "litros").evaluate(),
            IngredientLine::new("sugar", "Azúcar", 0.3, "kg", 0.80, "kg").evaluate(),
        ];
        aggregate_recipe_cost(lines).with_yield(2.0, "litros")
    }

    #[test]
    fn test_evaluate_cup() {
        let cup = Presentation::new("recipe-1", "Vaso 150 ml", 150.0, "ml", 2.50);
        let result = cup.evaluate(&batch(), ConversionPolicy::Lenient).unwrap();

        assert!((result.cost_per_portion - 0.13).abs() <= 0.01);
        assert!((result.margin_percent - 94.8).abs() <= 0.1);
    }

    #[test]
    fn test_portions_per_batch() {
        let cup = Presentation::new("recipe-1", "Vaso 150 ml", 150.0, "ml", 2.50);
        let portions = cup.portions_per_batch(&batch(), ConversionPolicy::Lenient);
        assert!((portions - 2000.0 / 150.0).abs() < 1e-9);

        let cone = Presentation::new("recipe-1", "Cono", 1.0, "porciones", 1.80);
        assert_eq!(cone.portions_per_batch(&batch(), ConversionPolicy::Strict), 0.0);
    }
}
