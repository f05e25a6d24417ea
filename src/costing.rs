// 🧮 Ingredient Cost Evaluator + Recipe Cost Aggregator
//
// A recipe line costs `quantity * price_per_unit * convert(native, line_unit)`.
// A recipe costs the sum of its lines, and its yield turns that total into a
// cost per litre (or kg, or unit) of finished product.

use crate::error::CostingError;
use crate::units::{convert, ConversionPolicy};
use serde::{Deserialize, Serialize};

// ============================================================================
// INGREDIENT LINE
// ============================================================================

/// One ingredient as used by a recipe, with the price quoted by the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// Opaque reference to the inventory ingredient
    pub ingredient_id: String,
    pub name: String,
    /// Quantity used, expressed in `unit`
    pub quantity: f64,
    /// Unit the recipe measures this line in
    pub unit: String,
    /// Price per `native_unit`
    pub price_per_unit: f64,
    /// Unit the ingredient is bought and priced in
    pub native_unit: String,
}

impl IngredientLine {
    pub fn new(
        ingredient_id: &str,
        name: &str,
        quantity: f64,
        unit: &str,
        price_per_unit: f64,
        native_unit: &str,
    ) -> Self {
        IngredientLine {
            ingredient_id: ingredient_id.to_string(),
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            price_per_unit,
            native_unit: native_unit.to_string(),
        }
    }

    /// Cost this line with the lenient 1:1 fallback for unknown unit pairs
    pub fn evaluate(&self) -> IngredientCostResult {
        self.cost_with_factor(convert(&self.native_unit, &self.unit))
    }

    /// Cost this line under an explicit conversion policy
    pub fn evaluate_with(
        &self,
        policy: ConversionPolicy,
    ) -> Result<IngredientCostResult, CostingError> {
        let factor = policy.factor(&self.native_unit, &self.unit)?;
        Ok(self.cost_with_factor(factor))
    }

    fn cost_with_factor(&self, factor: f64) -> IngredientCostResult {
        let unit_cost = self.price_per_unit * factor;

        IngredientCostResult {
            ingredient_id: self.ingredient_id.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
            price_per_unit: self.price_per_unit,
            unit_cost,
            total_cost: self.quantity * unit_cost,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCostResult {
    pub ingredient_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    /// Price expressed in the line's unit
    pub unit_cost: f64,
    /// quantity * unit_cost
    pub total_cost: f64,
}

impl IngredientCostResult {
    /// Placeholder for a line whose ingredient is missing from the inventory.
    /// Keeps the quantity so the line still shows up, but contributes nothing.
    pub fn missing(ingredient_id: &str, quantity: f64, unit: &str) -> Self {
        IngredientCostResult {
            ingredient_id: ingredient_id.to_string(),
            name: "ingredient not found".to_string(),
            quantity,
            unit: unit.to_string(),
            price_per_unit: 0.0,
            unit_cost: 0.0,
            total_cost: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostResult {
    pub lines: Vec<IngredientCostResult>,
    pub total_cost: f64,
    pub yield_quantity: f64,
    pub yield_unit: String,
    pub cost_per_yield_unit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_margin: Option<f64>,
}

impl RecipeCostResult {
    /// Attach the recipe yield and derive the cost per yield unit
    pub fn with_yield(mut self, yield_quantity: f64, yield_unit: &str) -> Self {
        self.yield_quantity = yield_quantity;
        self.yield_unit = yield_unit.to_string();
        self.cost_per_yield_unit = cost_per_yield_unit(self.total_cost, yield_quantity);
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Share of the total cost contributed by each line, in percent
    pub fn cost_shares(&self) -> Vec<(String, f64)> {
        self.lines
            .iter()
            .map(|line| {
                let share = if self.total_cost > 0.0 {
                    line.total_cost / self.total_cost * 100.0
                } else {
                    0.0
                };
                (line.name.clone(), share)
            })
            .collect()
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Cost of `quantity` of an ingredient priced per `native_unit`, used in `recipe_unit`
pub fn ingredient_cost(
    quantity: f64,
    price_per_unit: f64,
    native_unit: &str,
    recipe_unit: &str,
) -> f64 {
    let unit_cost = price_per_unit * convert(native_unit, recipe_unit);
    quantity * unit_cost
}

/// Sum line totals. Yield is left unset; see RecipeCostResult::with_yield.
pub fn aggregate_recipe_cost(lines: Vec<IngredientCostResult>) -> RecipeCostResult {
    let total_cost = lines.iter().map(|line| line.total_cost).sum();

    RecipeCostResult {
        lines,
        total_cost,
        yield_quantity: 0.0,
        yield_unit: String::new(),
        cost_per_yield_unit: 0.0,
        suggested_price: None,
        target_margin: None,
    }
}

/// `total_cost / yield_quantity`, or 0 when the yield is not positive
pub fn cost_per_yield_unit(total_cost: f64, yield_quantity: f64) -> f64 {
    if yield_quantity <= 0.0 {
        return 0.0;
    }
    total_cost / yield_quantity
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_money(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 0.01,
            "expected {:.4}, got {:.4}",
            expected,
            actual
        );
    }

    fn milk_and_sugar() -> Vec<IngredientLine> {
        vec![
            IngredientLine::new("milk", "Leche Entera", 1.0, "litros", 1.50, "litros"),
            IngredientLine::new("sugar", "Azúcar", 0.3, "kg", 0.80, "kg"),
        ]
    }

    #[test]
    fn test_ingredient_cost_same_unit() {
        assert_money(ingredient_cost(1.0, 1.50, "litros", "litros"), 1.50);
        assert_money(ingredient_cost(0.3, 0.80, "kg", "kg"), 0.24);
    }

    #[test]
    fn test_ingredient_cost_applies_conversion_factor() {
        // factor = convert(native, recipe) multiplies the quoted price
        assert_money(ingredient_cost(2.0, 0.5, "kg", "g"), 1000.0);
        assert_money(ingredient_cost(2.0, 5.0, "g", "kg"), 0.01);
    }

    #[test]
    fn test_ingredient_cost_is_permissive_with_negatives() {
        assert_money(ingredient_cost(-2.0, 1.0, "kg", "kg"), -2.0);
        assert_money(ingredient_cost(2.0, -1.0, "kg", "kg"), -2.0);
    }

    #[test]
    fn test_line_total_matches_quantity_times_unit_cost() {
        for line in milk_and_sugar() {
            let result = line.evaluate();
            assert_eq!(result.total_cost, result.quantity * result.unit_cost);
            assert!(result.total_cost >= 0.0);
        }
    }

    #[test]
    fn test_recipe_literal_case() {
        let lines: Vec<_> = milk_and_sugar().iter().map(|l| l.evaluate()).collect();
        let recipe = aggregate_recipe_cost(lines).with_yield(2.0, "litros");

        assert_money(recipe.total_cost, 1.74);
        assert_money(recipe.cost_per_yield_unit, 0.87);
        assert_eq!(recipe.line_count(), 2);
        assert_eq!(recipe.yield_unit, "litros");
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let lines: Vec<_> = milk_and_sugar().iter().map(|l| l.evaluate()).collect();
        let expected: f64 = lines.iter().map(|l| l.total_cost).sum();
        let recipe = aggregate_recipe_cost(lines);

        assert!((recipe.total_cost - expected).abs() < 1e-9);
        assert_eq!(recipe.cost_per_yield_unit, 0.0);
    }

    #[test]
    fn test_zero_yield_guard() {
        assert_eq!(cost_per_yield_unit(1.74, 0.0), 0.0);
        assert_eq!(cost_per_yield_unit(1.74, -3.0), 0.0);
        assert_money(cost_per_yield_unit(1.74, 2.0), 0.87);
    }

    #[test]
    fn test_empty_recipe() {
        let recipe = aggregate_recipe_cost(Vec::new()).with_yield(1.0, "litros");
        assert_eq!(recipe.total_cost, 0.0);
        assert_eq!(recipe.cost_per_yield_unit, 0.0);
        assert!(recipe.cost_shares().is_empty());
    }

    #[test]
    fn test_strict_line_evaluation() {
        let line = IngredientLine::new("egg", "Huevos", 4.0, "kg", 0.15, "unidades");

        assert!(line.evaluate_with(ConversionPolicy::Strict).is_err());

        let lenient = line.evaluate_with(ConversionPolicy::Lenient).unwrap();
        assert_money(lenient.total_cost, 0.60);
    }

    #[test]
    fn test_cost_shares() {
        let lines: Vec<_> = milk_and_sugar().iter().map(|l| l.evaluate()).collect();
        let recipe = aggregate_recipe_cost(lines);
        let shares = recipe.cost_shares();

        assert_eq!(shares.len(), 2);
        let total_share: f64 = shares.iter().map(|(_, s)| s).sum();
        assert!((total_share - 100.0).abs() < 1e-6);
        assert!(shares[0].1 > shares[1].1);
    }

    #[test]
    fn test_missing_ingredient_line_is_zero() {
        let line = IngredientCostResult::missing("ghost", 2.0, "kg");
        assert_eq!(line.total_cost, 0.0);
        assert_eq!(line.quantity, 2.0);
        assert_eq!(line.name, "ingredient not found");
    }

    #[test]
    fn test_idempotent_evaluation() {
        let line = &milk_and_sugar()[1];
        assert_eq!(line.evaluate(), line.evaluate());
    }
}
