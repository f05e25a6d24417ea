// 📈 Scenario & Optimization Utilities
//
// What-if tools built on the pricing solver:
// - price scenarios: the price and profit for each candidate margin
// - price optimizer: grid search over a constant-elasticity demand curve
// - production run: totals for producing and selling a volume
// - ingredient price shock: margin after a % change in ingredient cost

use crate::pricing::{absolute_profit, solve_margin_from_price, solve_price_from_margin};
use serde::{Deserialize, Serialize};

/// Elasticity used when the caller does not supply one
pub const DEFAULT_ELASTICITY: f64 = -1.5;

/// Candidate prices run from 1.1x to 3.0x cost in 0.1x steps
const GRID_FIRST_STEP: u32 = 11;
const GRID_LAST_STEP: u32 = 30;
const GRID_STEP: f64 = 0.1;

// ============================================================================
// PRICE SCENARIOS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceScenario {
    pub margin: f64,
    pub price: f64,
    pub profit: f64,
}

/// One scenario per margin, computed lazily. Calling again restarts from scratch.
pub fn price_scenarios(
    base_cost: f64,
    margins: &[f64],
) -> impl Iterator<Item = PriceScenario> + '_ {
    margins.iter().map(move |&margin| {
        let price = solve_price_from_margin(base_cost, margin);
        PriceScenario {
            margin,
            price,
            profit: absolute_profit(base_cost, price),
        }
    })
}

// ============================================================================
// PRICE OPTIMIZER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOptimization {
    pub optimal_price: f64,
    pub max_profit: f64,
    pub units_sold: f64,
}

/// Units demanded at `price` when `max_demand` units sell at cost
fn demand_at(price: f64, base_cost: f64, max_demand: f64, elasticity: f64) -> f64 {
    max_demand * (price / base_cost).powf(elasticity)
}

/// Best price on the 1.1x..=3.0x cost grid for
/// `units = max_demand * (price / cost)^elasticity`.
///
/// Keeps the first candidate with the highest positive profit. When no
/// candidate makes a profit (or cost is not positive) the answer is the base
/// cost with zero profit and zero units.
pub fn optimize_price(base_cost: f64, max_demand: f64, elasticity: f64) -> PriceOptimization {
    let mut best = PriceOptimization {
        optimal_price: base_cost,
        max_profit: 0.0,
        units_sold: 0.0,
    };

    if base_cost <= 0.0 {
        return best;
    }

    for step in GRID_FIRST_STEP..=GRID_LAST_STEP {
        let price = base_cost * f64::from(step) * GRID_STEP;
        let units = demand_at(price, base_cost, max_demand, elasticity);
        let profit = (price - base_cost) * units;

        if profit > best.max_profit {
            best = PriceOptimization {
                optimal_price: price,
                max_profit: profit,
                units_sold: units,
            };
        }
    }

    best
}

/// Exact optimum of the same demand model.
///
/// Profit peaks at `price = cost * e / (1 + e)`, which only exists for
/// elastic demand (e < -1). Returns None otherwise, or when cost <= 0.
pub fn closed_form_optimal_price(
    base_cost: f64,
    max_demand: f64,
    elasticity: f64,
) -> Option<PriceOptimization> {
    if base_cost <= 0.0 || elasticity >= -1.0 {
        return None;
    }

    let optimal_price = base_cost * elasticity / (1.0 + elasticity);
    let units_sold = demand_at(optimal_price, base_cost, max_demand, elasticity);

    Some(PriceOptimization {
        optimal_price,
        max_profit: (optimal_price - base_cost) * units_sold,
        units_sold,
    })
}

// ============================================================================
// PRODUCTION RUN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionScenario {
    pub volume: f64,
    pub total_cost: f64,
    pub total_revenue: f64,
    /// Negative for a loss
    pub profit: f64,
    pub profit_margin: f64,
    /// Volume whose revenue covers the run's total cost
    pub break_even_volume: f64,
}

impl ProductionScenario {
    pub fn simulate(cost_per_unit: f64, price_per_unit: f64, volume: f64) -> Self {
        let total_cost = cost_per_unit * volume;
        let total_revenue = price_per_unit * volume;
        let profit = total_revenue - total_cost;

        let profit_margin = if total_revenue > 0.0 {
            profit / total_revenue * 100.0
        } else {
            0.0
        };

        let break_even_volume = if price_per_unit > 0.0 {
            total_cost / price_per_unit
        } else {
            0.0
        };

        ProductionScenario {
            volume,
            total_cost,
            total_revenue,
            profit,
            profit_margin,
            break_even_volume,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.profit >= 0.0
    }

    pub fn cost_per_unit(&self) -> f64 {
        if self.volume > 0.0 {
            self.total_cost / self.volume
        } else {
            0.0
        }
    }

    pub fn profit_per_unit(&self) -> f64 {
        if self.volume > 0.0 {
            self.profit / self.volume
        } else {
            0.0
        }
    }
}

// ============================================================================
// INGREDIENT PRICE SHOCK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientPriceShock {
    pub change_percent: f64,
    pub current_cost: f64,
    pub new_cost: f64,
    pub current_margin: f64,
    pub new_margin: f64,
}

impl IngredientPriceShock {
    /// Apply a `change_percent` move in ingredient cost, keeping the sale price
    pub fn simulate(current_cost: f64, current_price: f64, change_percent: f64) -> Self {
        let new_cost = current_cost * (1.0 + change_percent / 100.0);

        IngredientPriceShock {
            change_percent,
            current_cost,
            new_cost,
            current_margin: solve_margin_from_price(current_cost, current_price),
            new_margin: solve_margin_from_price(new_cost, current_price),
        }
    }

    pub fn margin_change(&self) -> f64 {
        self.new_margin - self.current_margin
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_scenarios() {
        let margins = [0.0, 30.0, 50.0, 60.0];
        let scenarios: Vec<_> = price_scenarios(1.74, &margins).collect();

        assert_eq!(scenarios.len(), 4);
        assert_eq!(scenarios[0].price, 1.74);
        assert_eq!(scenarios[0].profit, 0.0);
        assert!((scenarios[2].price - 3.48).abs() <= 0.01);
        assert!((scenarios[2].profit - 1.74).abs() <= 0.01);
        assert!((scenarios[3].price - 4.35).abs() <= 0.01);
    }

    #[test]
    fn test_price_scenarios_restart() {
        let margins = [25.0, 40.0];
        let first: Vec<_> = price_scenarios(2.0, &margins).collect();
        let second: Vec<_> = price_scenarios(2.0, &margins).collect();
        assert_eq!(first, second);
        assert_eq!(price_scenarios(2.0, &[]).count(), 0);
    }

    #[test]
    fn test_optimizer_picks_grid_end_for_default_elasticity() {
        // With e = -1.5 profit keeps rising up to 3x cost
        let result = optimize_price(2.0, 100.0, DEFAULT_ELASTICITY);

        assert!((result.optimal_price - 6.0).abs() < 1e-9);
        let expected_units = 100.0 * 3.0_f64.powf(-1.5);
        assert!((result.units_sold - expected_units).abs() < 1e-9);
        assert!((result.max_profit - 4.0 * expected_units).abs() < 1e-9);
    }

    #[test]
    fn test_optimizer_interior_optimum() {
        // e = -3 peaks at 1.5x cost, which lies on the grid
        let result = optimize_price(4.0, 50.0, -3.0);
        assert!((result.optimal_price - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_optimizer_matches_closed_form_within_grid() {
        for elasticity in [-1.5, -2.0, -2.5, -3.0, -4.0] {
            let grid = optimize_price(3.0, 200.0, elasticity);
            let exact = closed_form_optimal_price(3.0, 200.0, elasticity).unwrap();

            let exact_price = exact.optimal_price.min(3.0 * 3.0);
            assert!(
                (grid.optimal_price - exact_price).abs() <= 0.1 * 3.0,
                "elasticity {}: grid {} vs exact {}",
                elasticity,
                grid.optimal_price,
                exact.optimal_price
            );
            assert!(grid.max_profit <= exact.max_profit + 1e-9);
        }
    }

    #[test]
    fn test_optimizer_degenerate_inputs() {
        let zero_cost = optimize_price(0.0, 100.0, -1.5);
        assert_eq!(zero_cost.optimal_price, 0.0);
        assert_eq!(zero_cost.max_profit, 0.0);
        assert_eq!(zero_cost.units_sold, 0.0);

        let no_demand = optimize_price(2.0, 0.0, -1.5);
        assert_eq!(no_demand.optimal_price, 2.0);
        assert_eq!(no_demand.max_profit, 0.0);
    }

    #[test]
    fn test_closed_form_requires_elastic_demand() {
        assert!(closed_form_optimal_price(2.0, 100.0, -1.0).is_none());
        assert!(closed_form_optimal_price(2.0, 100.0, -0.5).is_none());
        assert!(closed_form_optimal_price(0.0, 100.0, -2.0).is_none());

        let exact = closed_form_optimal_price(2.0, 100.0, -2.0).unwrap();
        assert!((exact.optimal_price - 4.0).abs() < 1e-9);
        assert!((exact.units_sold - 25.0).abs() < 1e-9);
        assert!((exact.max_profit - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_production_scenario() {
        let run = ProductionScenario::simulate(4.50, 8.00, 10.0);

        assert!((run.total_cost - 45.0).abs() < 1e-9);
        assert!((run.total_revenue - 80.0).abs() < 1e-9);
        assert!((run.profit - 35.0).abs() < 1e-9);
        assert!((run.profit_margin - 43.75).abs() < 1e-9);
        assert!((run.break_even_volume - 5.625).abs() < 1e-9);
        assert!(run.is_profitable());
        assert!((run.cost_per_unit() - 4.5).abs() < 1e-9);
        assert!((run.profit_per_unit() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_production_loss_and_zero_volume() {
        let loss = ProductionScenario::simulate(5.0, 4.0, 10.0);
        assert!(loss.profit < 0.0);
        assert!(!loss.is_profitable());

        let empty = ProductionScenario::simulate(5.0, 4.0, 0.0);
        assert_eq!(empty.profit_margin, 0.0);
        assert_eq!(empty.cost_per_unit(), 0.0);
        assert_eq!(empty.profit_per_unit(), 0.0);

        let free = ProductionScenario::simulate(5.0, 0.0, 10.0);
        assert_eq!(free.break_even_volume, 0.0);
        assert_eq!(free.profit_margin, 0.0);
    }

    #[test]
    fn test_ingredient_price_shock() {
        let shock = IngredientPriceShock::simulate(4.50, 8.00, 10.0);

        assert!((shock.new_cost - 4.95).abs() < 1e-9);
        assert!((shock.current_margin - 43.75).abs() < 1e-9);
        assert!((shock.new_margin - 38.125).abs() < 1e-9);
        assert!((shock.margin_change() + 5.625).abs() < 1e-9);

        let cheaper = IngredientPriceShock::simulate(4.50, 8.00, -20.0);
        assert!(cheaper.margin_change() > 0.0);
    }
}
