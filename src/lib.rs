// Creamery Costing - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod costing;        // Ingredient cost evaluation + recipe aggregation
pub mod dashboard;
pub mod db;
pub mod entities;       // Ingredient, Recipe, Presentation records
pub mod error;
pub mod format;
pub mod presentation;   // Portion costing
pub mod pricing;        // Cost / margin / price solver
pub mod simulator;      // Scenarios, optimizer, production and price shocks
pub mod units;          // Unit conversion resolver

// Re-export commonly used types
pub use config::Config;
pub use costing::{
    aggregate_recipe_cost, cost_per_yield_unit, ingredient_cost,
    IngredientCostResult, IngredientLine, RecipeCostResult,
};
pub use dashboard::DashboardStats;
pub use db::{
    Event,
    load_csv, setup_database, insert_ingredients, update_ingredient,
    list_ingredients, get_ingredient, get_low_stock_ingredients, adjust_stock,
    save_recipe, load_recipe, find_recipe_by_name, list_recipes, get_recipe_total_cost,
    save_presentation, list_presentations_for_recipe,
    insert_event, get_events_for_entity,
};
pub use entities::{
    Ingredient, IngredientCategory,
    Presentation,
    Recipe, RecipeCategory, RecipeIngredient,
};
pub use error::CostingError;
pub use format::{format_currency, format_percentage};
pub use presentation::{portion_cost, presentation_cost, presentation_cost_with, PresentationResult};
pub use pricing::{
    absolute_profit, break_even_point, solve_cost_from_price, solve_margin_from_price,
    solve_price_from_margin, validate_profit_margin, PricingResult, SolvedFor,
};
pub use simulator::{
    closed_form_optimal_price, optimize_price, price_scenarios,
    IngredientPriceShock, PriceOptimization, PriceScenario, ProductionScenario,
    DEFAULT_ELASTICITY,
};
pub use units::{convert, ConversionPolicy, Dimension, Unit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
