// 📏 Unit Conversion Resolver
//
// Maps a quantity in one unit to the equivalent quantity in another, within
// a small fixed vocabulary: mass (kg, g), volume (litros, ml) and count
// (unidades, porciones).
//
// convert() keeps the lenient contract the costing screens rely on: a pair
// with no registered conversion is treated as 1:1 and logged. Callers that
// want to catch those mistakes use ConversionPolicy::Strict instead.

use crate::error::CostingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

// ============================================================================
// DIMENSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

// ============================================================================
// UNIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Kilogram,
    Gram,
    Liter,
    Milliliter,
    Unit,
    Portion,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::Kilogram,
        Unit::Gram,
        Unit::Liter,
        Unit::Milliliter,
        Unit::Unit,
        Unit::Portion,
    ];

    /// Canonical label, as stored on ingredient and recipe rows
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Liter => "litros",
            Unit::Milliliter => "ml",
            Unit::Unit => "unidades",
            Unit::Portion => "porciones",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Kilogram | Unit::Gram => Dimension::Mass,
            Unit::Liter | Unit::Milliliter => Dimension::Volume,
            Unit::Unit | Unit::Portion => Dimension::Count,
        }
    }

    /// Parse a label, case-insensitive, accepting common aliases
    pub fn parse(label: &str) -> Option<Unit> {
        match label.trim().to_lowercase().as_str() {
            "kg" | "kilo" | "kilos" | "kilogramo" | "kilogramos" | "kilogram" | "kilograms" => {
                Some(Unit::Kilogram)
            }
            "g" | "gr" | "gramo" | "gramos" | "gram" | "grams" => Some(Unit::Gram),
            "l" | "lt" | "litro" | "litros" | "liter" | "liters" | "litre" | "litres" => {
                Some(Unit::Liter)
            }
            "ml" | "mililitro" | "mililitros" | "milliliter" | "milliliters" => {
                Some(Unit::Milliliter)
            }
            "u" | "unidad" | "unidades" | "unit" | "units" => Some(Unit::Unit),
            "porcion" | "porción" | "porciones" | "portion" | "portions" => Some(Unit::Portion),
            _ => None,
        }
    }

    /// Registered factor from self to `to`, if any.
    ///
    /// Only same-dimension mass and volume pairs are registered. Count units
    /// convert to themselves and nothing else.
    pub fn factor_to(&self, to: Unit) -> Option<f64> {
        if *self == to {
            return Some(1.0);
        }

        match (self, to) {
            (Unit::Kilogram, Unit::Gram) => Some(1000.0),
            (Unit::Gram, Unit::Kilogram) => Some(0.001),
            (Unit::Liter, Unit::Milliliter) => Some(1000.0),
            (Unit::Milliliter, Unit::Liter) => Some(0.001),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Unit {
    type Err = CostingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s).ok_or_else(|| CostingError::UnknownUnit(s.to_string()))
    }
}

// ============================================================================
// CONVERSION
// ============================================================================

/// Registered factor between two labels, or None when the pair is unknown
fn registered_factor(from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }

    let from_unit = Unit::parse(from)?;
    let to_unit = Unit::parse(to)?;
    from_unit.factor_to(to_unit)
}

/// Factor such that `quantity_in_to = quantity_in_from * factor`.
///
/// Identical labels give exactly 1. An unregistered pair (unknown label,
/// count units, or a cross-dimension pair such as kg -> litros) also gives 1,
/// silently treating the units as equivalent.
pub fn convert(from: &str, to: &str) -> f64 {
    match registered_factor(from, to) {
        Some(factor) => factor,
        None => {
            warn!(from, to, "no unit conversion available, assuming 1:1");
            1.0
        }
    }
}

/// How unregistered unit pairs are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionPolicy {
    /// Fall back to a 1:1 factor
    #[default]
    Lenient,
    /// Reject with CostingError::UnsupportedConversion
    Strict,
}

impl ConversionPolicy {
    pub fn factor(&self, from: &str, to: &str) -> Result<f64, CostingError> {
        match self {
            ConversionPolicy::Lenient => Ok(convert(from, to)),
            ConversionPolicy::Strict => registered_factor(from, to).ok_or_else(|| {
                CostingError::UnsupportedConversion {
                    from: from.to_string(),
                    to: to.to_string(),
                }
            }),
        }
    }

}

impl FromStr for ConversionPolicy {
    type Err = CostingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(ConversionPolicy::Lenient),
            "strict" => Ok(ConversionPolicy::Strict),
            _ => Err(CostingError::UnknownPolicy(s.to_string())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
