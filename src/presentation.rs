// 🍦 Presentation Costing
//
// Projects a recipe's cost onto a sellable portion ("150 ml cup",
// "1 kg tub") and reports cost per portion, margin and profit.

use crate::error::CostingError;
use crate::pricing::{absolute_profit, solve_margin_from_price};
use crate::units::{convert, ConversionPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationResult {
    pub portion_size: f64,
    pub portion_unit: String,
    pub cost_per_portion: f64,
    pub sale_price: f64,
    pub margin_percent: f64,
    /// Never negative
    pub absolute_profit: f64,
}

impl PresentationResult {
    /// Well-formed result for a recipe with no cost or no yield
    fn zeroed(portion_size: f64, portion_unit: &str, sale_price: f64) -> Self {
        PresentationResult {
            portion_size,
            portion_unit: portion_unit.to_string(),
            cost_per_portion: 0.0,
            sale_price,
            margin_percent: 0.0,
            absolute_profit: 0.0,
        }
    }

    /// True when the sale price does not cover the portion cost
    pub fn is_loss(&self) -> bool {
        self.sale_price < self.cost_per_portion
    }
}

/// Cost of one portion of `portion_size` `portion_unit` from a recipe batch.
/// 0 when the yield is not positive.
pub fn portion_cost(
    recipe_cost: f64,
    yield_quantity: f64,
    yield_unit: &str,
    portion_size: f64,
    portion_unit: &str,
) -> f64 {
    portion_cost_with_factor(
        recipe_cost,
        yield_quantity,
        portion_size,
        convert(yield_unit, portion_unit),
    )
}

fn portion_cost_with_factor(
    recipe_cost: f64,
    yield_quantity: f64,
    portion_size: f64,
    factor: f64,
) -> f64 {
    if yield_quantity <= 0.0 {
        return 0.0;
    }
    let cost_per_unit = recipe_cost / (yield_quantity * factor);
    cost_per_unit * portion_size
}

/// Cost, margin and profit of selling a portion of a recipe at `sale_price`.
///
/// A recipe with zero (or negative) cost or yield produces a zeroed result
/// rather than an error.
pub fn presentation_cost(
    recipe_cost: f64,
    yield_quantity: f64,
    yield_unit: &str,
    portion_size: f64,
    portion_unit: &str,
    sale_price: f64,
) -> PresentationResult {
    if recipe_cost <= 0.0 || yield_quantity <= 0.0 {
        return PresentationResult::zeroed(portion_size, portion_unit, sale_price);
    }

    let factor = convert(yield_unit, portion_unit);
    build(recipe_cost, yield_quantity, portion_size, portion_unit, sale_price, factor)
}

/// Same as presentation_cost, but the yield-to-portion conversion follows `policy`
pub fn presentation_cost_with(
    policy: ConversionPolicy,
    recipe_cost: f64,
    yield_quantity: f64,
    yield_unit: &str,
    portion_size: f64,
    portion_unit: &str,
    sale_price: f64,
) -> Result<PresentationResult, CostingError> {
    if recipe_cost <= 0.0 || yield_quantity <= 0.0 {
        return Ok(PresentationResult::zeroed(portion_size, portion_unit, sale_price));
    }

    let factor = policy.factor(yield_unit, portion_unit)?;
    Ok(build(recipe_cost, yield_quantity, portion_size, portion_unit, sale_price, factor))
}

fn build(
    recipe_cost: f64,
    yield_quantity: f64,
    portion_size: f64,
    portion_unit: &str,
    sale_price: f64,
    factor: f64,
) -> PresentationResult {
    let cost_per_portion =
        portion_cost_with_factor(recipe_cost, yield_quantity, portion_size, factor);

    PresentationResult {
        portion_size,
        portion_unit: portion_unit.to_string(),
        cost_per_portion,
        sale_price,
        margin_percent: solve_margin_from_price(cost_per_portion, sale_price),
        absolute_profit: absolute_profit(cost_per_portion, sale_price),
    }
}
