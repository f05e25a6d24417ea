// Typed errors for the strict unit policy and the inventory store
//
// The pure calculation functions never fail: degenerate arithmetic is
// answered with a zero or identity value. Only the opt-in strict policy
// and lookups against stored records produce these errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostingError {
    /// No conversion is registered between the two unit labels
    #[error("unsupported unit conversion: {from} -> {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Label is not part of the unit vocabulary
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// Margin outside 0..=100 percent
    #[error("invalid profit margin: {0}%")]
    InvalidMargin(f64),

    /// Conversion policy label other than lenient or strict
    #[error("unknown unit policy: {0}")]
    UnknownPolicy(String),

    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("ingredient not found: {0}")]
    IngredientNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CostingError::UnsupportedConversion {
            from: "kg".to_string(),
            to: "unidades".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported unit conversion: kg -> unidades");

        let err = CostingError::InvalidMargin(120.0);
        assert_eq!(err.to_string(), "invalid profit margin: 120%");
    }
}
