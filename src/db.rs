// 🗄️ Inventory Store - SQLite persistence for ingredients, recipes and presentations
//
// Computed figures (line costs, recipe total, portion cost, margin) are
// stored alongside the inputs that produced them, so list views can show
// them without re-costing. Every write is recorded in the events table.

use crate::costing::RecipeCostResult;
use crate::entities::{
    Ingredient, IngredientCategory, Presentation, Recipe, RecipeCategory, RecipeIngredient,
};
use crate::error::CostingError;
use crate::presentation::PresentationResult;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// EVENTS (audit trail)
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ingredients (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            unit TEXT NOT NULL,
            price_per_unit REAL NOT NULL,
            stock_current REAL NOT NULL DEFAULT 0,
            stock_minimum REAL NOT NULL DEFAULT 0,
            supplier TEXT,
            category TEXT NOT NULL,
            expiry_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL,
            preparation_minutes INTEGER,
            yield_quantity REAL NOT NULL,
            yield_unit TEXT NOT NULL,
            total_cost REAL NOT NULL DEFAULT 0,
            suggested_price REAL,
            target_margin REAL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit TEXT NOT NULL,
            unit_cost REAL NOT NULL,
            total_cost REAL NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS presentations (
            id TEXT PRIMARY KEY,
            recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            portion_size REAL NOT NULL,
            portion_unit TEXT NOT NULL,
            sale_price REAL NOT NULL,
            cost_per_portion REAL NOT NULL,
            margin_percent REAL NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ingredients_name ON ingredients(name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_recipe_lines ON recipe_ingredients(recipe_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_presentations_recipe ON presentations(recipe_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_date(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}

const INGREDIENT_COLUMNS: &str = "id, name, description, unit, price_per_unit,
    stock_current, stock_minimum, supplier, category, expiry_date, created_at, updated_at";

fn ingredient_from_row(row: &Row) -> rusqlite::Result<Ingredient> {
    let category: String = row.get(8)?;

    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        unit: row.get(3)?,
        price_per_unit: row.get(4)?,
        stock_current: row.get(5)?,
        stock_minimum: row.get(6)?,
        supplier: row.get(7)?,
        category: IngredientCategory::from_label(&category),
        expiry_date: parse_date(9, row.get(9)?)?,
        created_at: parse_timestamp(10, row.get(10)?)?,
        updated_at: parse_timestamp(11, row.get(11)?)?,
    })
}

const RECIPE_COLUMNS: &str = "id, name, description, category, preparation_minutes,
    yield_quantity, yield_unit, suggested_price, target_margin, active, created_at, updated_at";

/// Recipe header only; lines are loaded separately
fn recipe_from_row(row: &Row) -> rusqlite::Result<Recipe> {
    let category: String = row.get(3)?;

    Ok(Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: RecipeCategory::from_label(&category),
        preparation_minutes: row.get(4)?,
        yield_quantity: row.get(5)?,
        yield_unit: row.get(6)?,
        suggested_price: row.get(7)?,
        target_margin: row.get(8)?,
        active: row.get(9)?,
        ingredients: Vec::new(),
        created_at: parse_timestamp(10, row.get(10)?)?,
        updated_at: parse_timestamp(11, row.get(11)?)?,
    })
}

const PRESENTATION_COLUMNS: &str = "id, recipe_id, name, description, portion_size,
    portion_unit, sale_price, active, created_at, updated_at";

fn presentation_from_row(row: &Row) -> rusqlite::Result<Presentation> {
    Ok(Presentation {
        id: row.get(0)?,
        recipe_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        portion_size: row.get(4)?,
        portion_unit: row.get(5)?,
        sale_price: row.get(6)?,
        active: row.get(7)?,
        created_at: parse_timestamp(8, row.get(8)?)?,
        updated_at: parse_timestamp(9, row.get(9)?)?,
    })
}

// ============================================================================
// CSV IMPORT
// ============================================================================

/// One inventory row as exported from a spreadsheet
#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    unit: String,
    price_per_unit: f64,
    #[serde(default)]
    stock_current: f64,
    #[serde(default)]
    stock_minimum: f64,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    expiry_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl IngredientRecord {
    fn into_ingredient(self) -> Result<Ingredient> {
        let category = IngredientCategory::from_label(self.category.as_deref().unwrap_or("other"));

        let mut ingredient = Ingredient::new(&self.name, &self.unit, self.price_per_unit, category)
            .with_stock(self.stock_current, self.stock_minimum);
        ingredient.supplier = self.supplier.filter(|s| !s.trim().is_empty());
        ingredient.description = self.description.filter(|s| !s.trim().is_empty());

        if let Some(raw) = self.expiry_date.filter(|s| !s.trim().is_empty()) {
            let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .with_context(|| format!("Invalid expiry date for {}: {}", self.name, raw))?;
            ingredient.expiry_date = Some(date);
        }

        Ok(ingredient)
    }
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<Ingredient>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .context("Failed to open CSV file")?;

    let mut ingredients = Vec::new();

    for result in rdr.deserialize() {
        let record: IngredientRecord = result.context("Failed to deserialize ingredient")?;
        ingredients.push(record.into_ingredient()?);
    }

    debug!(count = ingredients.len(), path = %csv_path.display(), "loaded ingredient rows");
    Ok(ingredients)
}

// ============================================================================
// INGREDIENTS
// ============================================================================

/// Insert ingredients, skipping ones already stored (same idempotency hash).
/// Returns how many were inserted.
pub fn insert_ingredients(conn: &Connection, ingredients: &[Ingredient]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for ingredient in ingredients {
        let hash = ingredient.compute_idempotency_hash();

        let result = conn.execute(
            "INSERT INTO ingredients (
                id, idempotency_hash, name, description, unit, price_per_unit,
                stock_current, stock_minimum, supplier, category, expiry_date,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                ingredient.id,
                hash,
                ingredient.name,
                ingredient.description,
                ingredient.unit,
                ingredient.price_per_unit,
                ingredient.stock_current,
                ingredient.stock_minimum,
                ingredient.supplier,
                ingredient.category.as_str(),
                ingredient.expiry_date.map(|d| d.format(DATE_FORMAT).to_string()),
                ingredient.created_at.to_rfc3339(),
                ingredient.updated_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {
                inserted += 1;

                let event = Event::new(
                    "ingredient_added",
                    "ingredient",
                    &ingredient.id,
                    serde_json::json!({
                        "name": ingredient.name,
                        "unit": ingredient.unit,
                        "price_per_unit": ingredient.price_per_unit,
                    }),
                    "inventory_importer",
                );
                insert_event(conn, &event)?;
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(inserted, duplicates, "ingredient import finished");
    Ok(inserted)
}

/// Overwrite an ingredient's values (identity stays)
pub fn update_ingredient(conn: &Connection, ingredient: &Ingredient) -> Result<()> {
    let changed = conn.execute(
        "UPDATE ingredients SET
            idempotency_hash = ?2, name = ?3, description = ?4, unit = ?5,
            price_per_unit = ?6, stock_current = ?7, stock_minimum = ?8,
            supplier = ?9, category = ?10, expiry_date = ?11, updated_at = ?12
         WHERE id = ?1",
        params![
            ingredient.id,
            ingredient.compute_idempotency_hash(),
            ingredient.name,
            ingredient.description,
            ingredient.unit,
            ingredient.price_per_unit,
            ingredient.stock_current,
            ingredient.stock_minimum,
            ingredient.supplier,
            ingredient.category.as_str(),
            ingredient.expiry_date.map(|d| d.format(DATE_FORMAT).to_string()),
            Utc::now().to_rfc3339(),
        ],
    )?;

    if changed == 0 {
        return Err(CostingError::IngredientNotFound(ingredient.id.clone()).into());
    }

    insert_event(
        conn,
        &Event::new(
            "ingredient_updated",
            "ingredient",
            &ingredient.id,
            serde_json::json!({ "price_per_unit": ingredient.price_per_unit }),
            "inventory",
        ),
    )?;

    Ok(())
}

pub fn list_ingredients(conn: &Connection) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM ingredients ORDER BY name",
        INGREDIENT_COLUMNS
    ))?;

    let ingredients = stmt
        .query_map([], ingredient_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ingredients)
}

pub fn get_ingredient(conn: &Connection, id: &str) -> Result<Option<Ingredient>> {
    let ingredient = conn
        .query_row(
            &format!("SELECT {} FROM ingredients WHERE id = ?1", INGREDIENT_COLUMNS),
            [id],
            ingredient_from_row,
        )
        .optional()?;

    Ok(ingredient)
}

/// Ingredients at or below their minimum stock
pub fn get_low_stock_ingredients(conn: &Connection) -> Result<Vec<Ingredient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM ingredients WHERE stock_current <= stock_minimum ORDER BY name",
        INGREDIENT_COLUMNS
    ))?;

    let ingredients = stmt
        .query_map([], ingredient_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ingredients)
}

/// Apply a stock movement and return the new stock level (never below zero)
pub fn adjust_stock(conn: &Connection, id: &str, delta: f64) -> Result<f64> {
    let mut ingredient =
        get_ingredient(conn, id)?.ok_or_else(|| CostingError::IngredientNotFound(id.to_string()))?;

    ingredient.adjust_stock(delta);

    conn.execute(
        "UPDATE ingredients SET stock_current = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, ingredient.stock_current, ingredient.updated_at.to_rfc3339()],
    )?;

    insert_event(
        conn,
        &Event::new(
            "stock_adjusted",
            "ingredient",
            id,
            serde_json::json!({ "delta": delta, "stock_current": ingredient.stock_current }),
            "inventory",
        ),
    )?;

    Ok(ingredient.stock_current)
}

// ============================================================================
// RECIPES
// ============================================================================

/// Insert or update a recipe together with its costed lines.
///
/// Existing lines are replaced. `costs` must come from `recipe.calculate`,
/// so its lines line up with `recipe.ingredients`. The stored suggested
/// price is the one in `costs`; none is kept from an earlier version.
pub fn save_recipe(conn: &Connection, recipe: &Recipe, costs: &RecipeCostResult) -> Result<()> {
    if recipe.ingredients.len() != costs.lines.len() {
        bail!(
            "Recipe {} has {} lines but its cost breakdown has {}",
            recipe.name,
            recipe.ingredients.len(),
            costs.lines.len()
        );
    }

    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO recipes (
            id, name, description, category, preparation_minutes, yield_quantity,
            yield_unit, total_cost, suggested_price, target_margin, active,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            category = excluded.category,
            preparation_minutes = excluded.preparation_minutes,
            yield_quantity = excluded.yield_quantity,
            yield_unit = excluded.yield_unit,
            total_cost = excluded.total_cost,
            suggested_price = excluded.suggested_price,
            target_margin = excluded.target_margin,
            active = excluded.active,
            updated_at = excluded.updated_at",
        params![
            recipe.id,
            recipe.name,
            recipe.description,
            recipe.category.as_str(),
            recipe.preparation_minutes,
            recipe.yield_quantity,
            recipe.yield_unit,
            costs.total_cost,
            costs.suggested_price,
            recipe.target_margin,
            recipe.active,
            recipe.created_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
        ],
    )?;

    tx.execute(
        "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
        [&recipe.id],
    )?;

    for (item, line) in recipe.ingredients.iter().zip(&costs.lines) {
        tx.execute(
            "INSERT INTO recipe_ingredients (
                recipe_id, ingredient_id, quantity, unit, unit_cost, total_cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                recipe.id,
                item.ingredient_id,
                item.quantity,
                item.unit,
                line.unit_cost,
                line.total_cost,
            ],
        )?;
    }

    insert_event(
        &tx,
        &Event::new(
            "recipe_saved",
            "recipe",
            &recipe.id,
            serde_json::json!({
                "name": recipe.name,
                "total_cost": costs.total_cost,
                "lines": recipe.ingredients.len(),
            }),
            "recipe_editor",
        ),
    )?;

    tx.commit()?;
    info!(recipe = %recipe.name, total_cost = costs.total_cost, "recipe saved");
    Ok(())
}

fn load_recipe_lines(conn: &Connection, recipe_id: &str) -> Result<Vec<RecipeIngredient>> {
    let mut stmt = conn.prepare(
        "SELECT ingredient_id, quantity, unit
         FROM recipe_ingredients
         WHERE recipe_id = ?1
         ORDER BY id",
    )?;

    let lines = stmt
        .query_map([recipe_id], |row| {
            Ok(RecipeIngredient {
                ingredient_id: row.get(0)?,
                quantity: row.get(1)?,
                unit: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines)
}

pub fn load_recipe(conn: &Connection, id: &str) -> Result<Recipe> {
    let mut recipe = conn
        .query_row(
            &format!("SELECT {} FROM recipes WHERE id = ?1", RECIPE_COLUMNS),
            [id],
            recipe_from_row,
        )
        .optional()?
        .ok_or_else(|| CostingError::RecipeNotFound(id.to_string()))?;

    recipe.ingredients = load_recipe_lines(conn, &recipe.id)?;
    Ok(recipe)
}

/// Case-insensitive lookup by name
pub fn find_recipe_by_name(conn: &Connection, name: &str) -> Result<Option<Recipe>> {
    let recipe = conn
        .query_row(
            &format!(
                "SELECT {} FROM recipes WHERE lower(name) = lower(?1) LIMIT 1",
                RECIPE_COLUMNS
            ),
            [name],
            recipe_from_row,
        )
        .optional()?;

    match recipe {
        Some(mut recipe) => {
            recipe.ingredients = load_recipe_lines(conn, &recipe.id)?;
            Ok(Some(recipe))
        }
        None => Ok(None),
    }
}

pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM recipes ORDER BY name",
        RECIPE_COLUMNS
    ))?;

    let mut recipes = stmt
        .query_map([], recipe_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    for recipe in &mut recipes {
        recipe.ingredients = load_recipe_lines(conn, &recipe.id)?;
    }

    Ok(recipes)
}

/// Stored batch cost, as of the last save
pub fn get_recipe_total_cost(conn: &Connection, id: &str) -> Result<f64> {
    let cost: f64 = conn
        .query_row("SELECT total_cost FROM recipes WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or_else(|| CostingError::RecipeNotFound(id.to_string()))?;

    Ok(cost)
}

// ============================================================================
// PRESENTATIONS
// ============================================================================

/// Insert or update a presentation with its computed cost and margin
pub fn save_presentation(
    conn: &Connection,
    presentation: &Presentation,
    result: &PresentationResult,
) -> Result<()> {
    conn.execute(
        "INSERT INTO presentations (
            id, recipe_id, name, description, portion_size, portion_unit,
            sale_price, cost_per_portion, margin_percent, active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            portion_size = excluded.portion_size,
            portion_unit = excluded.portion_unit,
            sale_price = excluded.sale_price,
            cost_per_portion = excluded.cost_per_portion,
            margin_percent = excluded.margin_percent,
            active = excluded.active,
            updated_at = excluded.updated_at",
        params![
            presentation.id,
            presentation.recipe_id,
            presentation.name,
            presentation.description,
            presentation.portion_size,
            presentation.portion_unit,
            presentation.sale_price,
            result.cost_per_portion,
            result.margin_percent,
            presentation.active,
            presentation.created_at.to_rfc3339(),
            Utc::now().to_rfc3339(),
        ],
    )
    .context("Failed to save presentation")?;

    insert_event(
        conn,
        &Event::new(
            "presentation_saved",
            "presentation",
            &presentation.id,
            serde_json::json!({
                "recipe_id": presentation.recipe_id,
                "cost_per_portion": result.cost_per_portion,
                "margin_percent": result.margin_percent,
            }),
            "presentation_editor",
        ),
    )?;

    Ok(())
}

pub fn list_presentations_for_recipe(conn: &Connection, recipe_id: &str) -> Result<Vec<Presentation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM presentations WHERE recipe_id = ?1 ORDER BY name",
        PRESENTATION_COLUMNS
    ))?;

    let presentations = stmt
        .query_map([recipe_id], presentation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(presentations)
}

// ============================================================================
// EVENT LOG
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(1, row.get(1)?)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// TESTS
// ============================================================================
