// 💲 Pricing Solver
//
// One identity ties cost, margin and price together:
//
//   price  = cost / (1 - margin/100)
//   margin = (price - cost) / price * 100
//   cost   = price * (1 - margin/100)
//
// Margin is always a share of the sale price, not a markup on cost.

use crate::error::CostingError;
use serde::{Deserialize, Serialize};

/// Price that yields `margin_percent` on `cost`. A margin <= 0 returns the cost.
pub fn solve_price_from_margin(cost: f64, margin_percent: f64) -> f64 {
    if margin_percent <= 0.0 {
        return cost;
    }
    cost / (1.0 - margin_percent / 100.0)
}

/// Margin of selling at `price` something that costs `cost`. 0 when price <= 0.
pub fn solve_margin_from_price(cost: f64, price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    (price - cost) / price * 100.0
}

/// Cost that leaves `margin_percent` when selling at `price`
pub fn solve_cost_from_price(price: f64, margin_percent: f64) -> f64 {
    price * (1.0 - margin_percent / 100.0)
}

/// `price - cost`, floored at zero. A loss reads as zero profit.
pub fn absolute_profit(cost: f64, price: f64) -> f64 {
    (price - cost).max(0.0)
}

pub fn validate_profit_margin(margin_percent: f64) -> bool {
    (0.0..=100.0).contains(&margin_percent)
}

/// Units to sell before fixed costs are covered.
/// Infinite when each unit contributes nothing (or loses money).
pub fn break_even_point(
    fixed_costs: f64,
    variable_cost_per_unit: f64,
    price_per_unit: f64,
) -> f64 {
    let contribution_margin = price_per_unit - variable_cost_per_unit;
    if contribution_margin <= 0.0 {
        return f64::INFINITY;
    }
    fixed_costs / contribution_margin
}

// ============================================================================
// PRICING RESULT
// ============================================================================

/// Which value of the triple was derived from the other two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvedFor {
    Cost,
    Margin,
    Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub cost: f64,
    pub margin_percent: f64,
    pub price: f64,
    pub solved_for: SolvedFor,
}

impl PricingResult {
    pub fn from_cost_and_margin(cost: f64, margin_percent: f64) -> Self {
        PricingResult {
            cost,
            margin_percent,
            price: solve_price_from_margin(cost, margin_percent),
            solved_for: SolvedFor::Price,
        }
    }

    pub fn from_cost_and_price(cost: f64, price: f64) -> Self {
        PricingResult {
            cost,
            margin_percent: solve_margin_from_price(cost, price),
            price,
            solved_for: SolvedFor::Margin,
        }
    }

    /// Rejects margins outside 0..=100, which have no meaningful cost
    pub fn from_price_and_margin(price: f64, margin_percent: f64) -> Result<Self, CostingError> {
        if !validate_profit_margin(margin_percent) {
            return Err(CostingError::InvalidMargin(margin_percent));
        }

        Ok(PricingResult {
            cost: solve_cost_from_price(price, margin_percent),
            margin_percent,
            price,
            solved_for: SolvedFor::Cost,
        })
    }

    pub fn profit(&self) -> f64 {
        absolute_profit(self.cost, self.price)
    }
}

// ============================================================================
// TESTS
// ============================================================================
