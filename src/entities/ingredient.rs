// 🥛 Ingredient Entity - stock item with a quoted price
//
// "Price per unit" is always quoted in the ingredient's own unit
// (e.g. 1.50 per litro of milk). Recipes convert from there.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// INGREDIENT CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientCategory {
    Dairy,
    Fruits,
    Nuts,
    Sweeteners,
    Flavorings,
    Additives,
    Packaging,
    Other,
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Dairy => "dairy",
            IngredientCategory::Fruits => "fruits",
            IngredientCategory::Nuts => "nuts",
            IngredientCategory::Sweeteners => "sweeteners",
            IngredientCategory::Flavorings => "flavorings",
            IngredientCategory::Additives => "additives",
            IngredientCategory::Packaging => "packaging",
            IngredientCategory::Other => "other",
        }
    }

    /// Unknown labels map to Other
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "dairy" => IngredientCategory::Dairy,
            "fruits" => IngredientCategory::Fruits,
            "nuts" => IngredientCategory::Nuts,
            "sweeteners" => IngredientCategory::Sweeteners,
            "flavorings" => IngredientCategory::Flavorings,
            "additives" => IngredientCategory::Additives,
            "packaging" => IngredientCategory::Packaging,
            _ => IngredientCategory::Other,
        }
    }
}

// ============================================================================
// INGREDIENT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Stable identity (UUID)
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit the ingredient is bought in (kg, litros, unidades, cajas...)
    pub unit: String,
    pub price_per_unit: f64,
    pub stock_current: f64,
    pub stock_minimum: f64,
    pub supplier: Option<String>,
    pub category: IngredientCategory,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Create new ingredient with a fresh UUID and no stock
    pub fn new(name: &str, unit: &str, price_per_unit: f64, category: IngredientCategory) -> Self {
        let now = Utc::now();

        Ingredient {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            unit: unit.to_string(),
            price_per_unit,
            stock_current: 0.0,
            stock_minimum: 0.0,
            supplier: None,
            category,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_stock(mut self, current: f64, minimum: f64) -> Self {
        self.stock_current = current;
        self.stock_minimum = minimum;
        self
    }

    pub fn with_supplier(mut self, supplier: &str) -> Self {
        self.supplier = Some(supplier.to_string());
        self
    }

    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// Hash used to skip re-imports of the same stock item.
    /// Identity is `id`; this only detects duplicates.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}",
            self.name.trim().to_lowercase(),
            self.unit.trim().to_lowercase(),
            self.supplier.as_deref().unwrap_or("").trim().to_lowercase()
        ));
        format!("{:x}", hasher.finalize())
    }

    /// At or below the reorder threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock_current <= self.stock_minimum
    }

    /// Expired when the expiry date is strictly before `on`
    pub fn is_expired(&self, on: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < on)
    }

    /// Money tied up in current stock
    pub fn stock_value(&self) -> f64 {
        self.stock_current * self.price_per_unit
    }

    /// Apply a stock movement (positive = purchase, negative = usage).
    /// Stock never goes below zero.
    pub fn adjust_stock(&mut self, delta: f64) {
        self.stock_current = (self.stock_current + delta).max(0.0);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_threshold() {
        let milk = Ingredient::new("Leche Entera", "litros", 1.50, IngredientCategory::Dairy);

        assert!(milk.clone().with_stock(5.0, 5.0).is_low_stock());
        assert!(milk.clone().with_stock(2.0, 5.0).is_low_stock());
        assert!(!milk.with_stock(10.0, 5.0).is_low_stock());
    }

    #[test]
    fn test_expiry() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let cream = Ingredient::new("Crema", "litros", 3.2, IngredientCategory::Dairy)
            .with_expiry(date);

        assert!(!cream.is_expired(date));
        assert!(cream.is_expired(date.succ_opt().unwrap()));

        let sugar = Ingredient::new("Azúcar", "kg", 0.8, IngredientCategory::Sweeteners);
        assert!(!sugar.is_expired(date));
    }

    #[test]
    fn test_stock_value_and_adjustment() {
        let mut sugar = Ingredient::new("Azúcar", "kg", 0.8, IngredientCategory::Sweeteners)
            .with_stock(10.0, 2.0)
            .with_supplier("Distribuidora Central");

        assert!((sugar.stock_value() - 8.0).abs() < 1e-9);

        sugar.adjust_stock(-3.5);
        assert!((sugar.stock_current - 6.5).abs() < 1e-9);

        sugar.adjust_stock(-100.0);
        assert_eq!(sugar.stock_current, 0.0);
        assert_eq!(sugar.supplier.as_deref(), Some("Distribuidora Central"));
    }

    #[test]
    fn test_idempotency_hash() {
        let a = Ingredient::new("Leche Entera", "litros", 1.50, IngredientCategory::Dairy);
        let b = Ingredient::new(" leche entera ", "Litros", 1.80, IngredientCategory::Dairy);
        let c = a.clone().with_supplier("Lácteos del Valle");

        // Same item regardless of price, casing or UUID
        assert_eq!(a.compute_idempotency_hash(), b.compute_idempotency_hash());
        assert_ne!(a.compute_idempotency_hash(), c.compute_idempotency_hash());
        assert_eq!(a.compute_idempotency_hash().len(), 64);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(IngredientCategory::from_label("Dairy"), IngredientCategory::Dairy);
        assert_eq!(IngredientCategory::from_label("spices"), IngredientCategory::Other);
        assert_eq!(IngredientCategory::Packaging.as_str(), "packaging");
    }
}
