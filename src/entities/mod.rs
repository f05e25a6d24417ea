// Entity Models - inventory records the costing screens work with
//
// Each entity has:
// - Stable identity (UUID) that never changes
// - Plain values the calculation core reads
// - Helpers that feed those values into the costing modules

pub mod ingredient;
pub mod presentation;
pub mod recipe;

pub use ingredient::{Ingredient, IngredientCategory};
pub use presentation::Presentation;
pub use recipe::{Recipe, RecipeCategory, RecipeIngredient};
