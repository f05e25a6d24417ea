use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::debug;

use creamery_costing::{
    find_recipe_by_name, format_currency, format_percentage, get_low_stock_ingredients,
    insert_ingredients, list_ingredients, list_presentations_for_recipe, list_recipes, load_csv,
    optimize_price, closed_form_optimal_price, price_scenarios, save_presentation, save_recipe,
    setup_database, Config, CostingError, DashboardStats, IngredientPriceShock, Presentation,
    Ingredient, ProductionScenario, Recipe, Unit,
};

#[derive(Parser)]
#[command(name = "creamery", version, about = "Ice-cream recipe costing and pricing")]
struct Cli {
    /// SQLite database (overrides CREAMERY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import ingredients from a CSV file (re-importing skips known items)
    Import { csv: PathBuf },

    /// List ingredients
    Ingredients {
        #[arg(long)]
        low_stock: bool,
    },

    /// Create or replace a recipe; lines are <ingredient name>:<quantity>:<unit>
    AddRecipe {
        name: String,
        #[arg(long)]
        yield_quantity: f64,
        #[arg(long)]
        yield_unit: String,
        #[arg(long)]
        margin: Option<f64>,
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },

    /// Cost breakdown of a stored recipe
    Recipe { name: String },

    /// Cost one portion of a recipe
    Presentation {
        #[arg(long)]
        recipe: String,
        #[arg(long)]
        size: f64,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        price: f64,
        /// Store the presentation under this name
        #[arg(long)]
        save: Option<String>,
    },

    /// Price and profit for a list of target margins
    Scenarios {
        #[arg(long)]
        cost: f64,
        #[arg(long, value_delimiter = ',', default_values_t = vec![30.0, 40.0, 50.0, 60.0])]
        margins: Vec<f64>,
    },

    /// Profit-maximising price for a constant-elasticity demand curve
    Optimize {
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        demand: f64,
        #[arg(long, allow_negative_numbers = true)]
        elasticity: Option<f64>,
    },

    /// Totals for a production run, optionally with an ingredient price change
    Production {
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        volume: f64,
        /// Ingredient cost change in percent
        #[arg(long, allow_negative_numbers = true)]
        shock: Option<f64>,
    },

    /// Headline statistics
    Dashboard,

    /// Conversion factor between two unit labels
    Convert { from: String, to: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    config.init_logging();
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Import { csv } => run_import(&config, &csv),
        Command::Ingredients { low_stock } => run_ingredients(&config, low_stock),
        Command::AddRecipe {
            name,
            yield_quantity,
            yield_unit,
            margin,
            lines,
        } => run_add_recipe(&config, &name, yield_quantity, &yield_unit, margin, &lines),
        Command::Recipe { name } => run_recipe(&config, &name),
        Command::Presentation {
            recipe,
            size,
            unit,
            price,
            save,
        } => run_presentation(&config, &recipe, size, &unit, price, save.as_deref()),
        Command::Scenarios { cost, margins } => {
            run_scenarios(&config, cost, &margins);
            Ok(())
        }
        Command::Optimize {
            cost,
            demand,
            elasticity,
        } => {
            run_optimize(&config, cost, demand, elasticity.unwrap_or(config.elasticity));
            Ok(())
        }
        Command::Production {
            cost,
            price,
            volume,
            shock,
        } => {
            run_production(&config, cost, price, volume, shock);
            Ok(())
        }
        Command::Dashboard => run_dashboard(&config),
        Command::Convert { from, to } => run_convert(&config, &from, &to),
    }
}

fn open_store(config: &Config) -> Result<Connection> {
    let conn = Connection::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn money(config: &Config, amount: f64) -> String {
    format_currency(amount, &config.currency)
}

fn find_recipe(conn: &Connection, name: &str) -> Result<Recipe> {
    match find_recipe_by_name(conn, name)? {
        Some(recipe) => Ok(recipe),
        None => Err(CostingError::RecipeNotFound(name.to_string()).into()),
    }
}

// ============================================================================
// INVENTORY
// ============================================================================

fn run_import(config: &Config, csv: &std::path::Path) -> Result<()> {
    println!("🗄️  Inventory Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let ingredients = load_csv(csv)?;
    println!("✓ Loaded {} ingredients from CSV", ingredients.len());

    let conn = open_store(config)?;
    println!("✓ Database ready: {}", config.db_path.display());

    println!("\n💾 Inserting ingredients...");
    let inserted = insert_ingredients(&conn, &ingredients)?;

    println!("✓ New ingredients: {}", inserted);
    println!("✓ Already known:   {}", ingredients.len() - inserted);
    Ok(())
}

fn run_ingredients(config: &Config, low_stock: bool) -> Result<()> {
    let conn = open_store(config)?;
    let ingredients = if low_stock {
        get_low_stock_ingredients(&conn)?
    } else {
        list_ingredients(&conn)?
    };

    if ingredients.is_empty() {
        println!("No ingredients.");
        return Ok(());
    }

    println!(
        "{:<28} {:>12} {:>10} {:>10}  {}",
        "Ingredient", "Price", "Stock", "Minimum", "Unit"
    );
    for ingredient in &ingredients {
        let flag = if ingredient.is_low_stock() { " ⚠️" } else { "" };
        println!(
            "{:<28} {:>12} {:>10.2} {:>10.2}  {}{}",
            ingredient.name,
            money(config, ingredient.price_per_unit),
            ingredient.stock_current,
            ingredient.stock_minimum,
            ingredient.unit,
            flag
        );
    }
    Ok(())
}

// ============================================================================
// RECIPES
// ============================================================================

/// Parses "<ingredient name>:<quantity>:<unit>"; the name may contain ':'
fn parse_line(raw: &str) -> Result<(String, f64, String)> {
    let mut parts = raw.rsplitn(3, ':');
    let (unit, quantity, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(unit), Some(quantity), Some(name)) => (unit, quantity, name),
        _ => bail!("Recipe line must be <ingredient>:<quantity>:<unit>, got {:?}", raw),
    };

    let quantity: f64 = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in recipe line {:?}", raw))?;

    Ok((name.trim().to_string(), quantity, unit.trim().to_string()))
}

/// Fresh recipe header. Replacing keeps the stored identity but drops the
/// lines and any previously computed price.
fn rebuild_recipe(
    existing: Option<Recipe>,
    name: &str,
    yield_quantity: f64,
    yield_unit: &str,
    margin: Option<f64>,
) -> Recipe {
    match existing {
        Some(existing) => Recipe {
            ingredients: Vec::new(),
            yield_quantity,
            yield_unit: yield_unit.to_string(),
            target_margin: margin,
            suggested_price: None,
            ..existing
        },
        None => {
            let mut recipe = Recipe::new(name, yield_quantity, yield_unit);
            recipe.target_margin = margin;
            recipe
        }
    }
}

/// Case-insensitive name lookup, accents included
fn find_ingredient<'a>(inventory: &'a [Ingredient], name: &str) -> Option<&'a Ingredient> {
    let wanted = name.trim().to_lowercase();
    inventory.iter().find(|i| i.name.to_lowercase() == wanted)
}

fn run_add_recipe(
    config: &Config,
    name: &str,
    yield_quantity: f64,
    yield_unit: &str,
    margin: Option<f64>,
    lines: &[String],
) -> Result<()> {
    let conn = open_store(config)?;
    let inventory = list_ingredients(&conn)?;

    let existing = find_recipe_by_name(&conn, name)?;
    let mut recipe = rebuild_recipe(existing, name, yield_quantity, yield_unit, margin);

    for raw in lines {
        let (ingredient_name, quantity, unit) = parse_line(raw)?;
        let ingredient = find_ingredient(&inventory, &ingredient_name)
            .ok_or_else(|| CostingError::IngredientNotFound(ingredient_name.clone()))?;
        recipe.add_ingredient(&ingredient.id, quantity, &unit);
    }

    let costs = recipe.calculate(&inventory, config.unit_policy)?;
    save_recipe(&conn, &recipe, &costs)?;

    println!("✓ Saved recipe {} ({} lines)", recipe.name, costs.line_count());
    println!("  Batch cost: {}", money(config, costs.total_cost));
    if let Some(price) = costs.suggested_price {
        println!("  Suggested price: {}", money(config, price));
    }
    Ok(())
}

fn run_recipe(config: &Config, name: &str) -> Result<()> {
    let conn = open_store(config)?;
    let recipe = find_recipe(&conn, name)?;
    let inventory = list_ingredients(&conn)?;
    let costs = recipe.calculate(&inventory, config.unit_policy)?;

    println!("🍦 {} ({} {})", recipe.name, recipe.yield_quantity, recipe.yield_unit);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let shares = costs.cost_shares();
    for (line, (_, share)) in costs.lines.iter().zip(&shares) {
        println!(
            "{:<28} {:>8.3} {:<10} {:>12} {:>8}",
            line.name,
            line.quantity,
            line.unit,
            money(config, line.total_cost),
            format_percentage(*share, 1)
        );
    }

    println!("\nTotal cost:          {}", money(config, costs.total_cost));
    println!(
        "Cost per {:<10}  {}",
        format!("{}:", costs.yield_unit),
        money(config, costs.cost_per_yield_unit)
    );
    if let (Some(price), Some(margin)) = (costs.suggested_price, costs.target_margin) {
        println!(
            "Suggested price:     {} at {}",
            money(config, price),
            format_percentage(margin, 0)
        );
    }

    let missing = recipe.missing_ingredients(&inventory);
    if !missing.is_empty() {
        println!("\n⚠️  {} line(s) reference unknown ingredients", missing.len());
    }

    let presentations = list_presentations_for_recipe(&conn, &recipe.id)?;
    if !presentations.is_empty() {
        println!("\nPresentations:");
        for presentation in &presentations {
            let result = presentation.evaluate(&costs, config.unit_policy)?;
            println!(
                "  {:<20} cost {:>10}  price {:>10}  margin {:>7}",
                presentation.name,
                money(config, result.cost_per_portion),
                money(config, result.sale_price),
                format_percentage(result.margin_percent, 1)
            );
        }
    }
    Ok(())
}

fn run_presentation(
    config: &Config,
    recipe_name: &str,
    size: f64,
    unit: &str,
    price: f64,
    save: Option<&str>,
) -> Result<()> {
    let conn = open_store(config)?;
    let recipe = find_recipe(&conn, recipe_name)?;
    let inventory = list_ingredients(&conn)?;
    let costs = recipe.calculate(&inventory, config.unit_policy)?;

    let presentation = Presentation::new(
        &recipe.id,
        save.unwrap_or("ad hoc"),
        size,
        unit,
        price,
    );
    let result = presentation.evaluate(&costs, config.unit_policy)?;

    println!("{} {} of {}", size, unit, recipe.name);
    println!("  Cost per portion: {}", money(config, result.cost_per_portion));
    println!("  Sale price:       {}", money(config, result.sale_price));
    println!("  Margin:           {}", format_percentage(result.margin_percent, 1));
    println!("  Profit:           {}", money(config, result.absolute_profit));
    if result.is_loss() {
        println!("  ⚠️  Sale price does not cover cost");
    }

    if save.is_some() {
        save_presentation(&conn, &presentation, &result)?;
        println!("✓ Saved presentation {}", presentation.name);
    }
    Ok(())
}

// ============================================================================
// SIMULATORS
// ============================================================================

fn run_scenarios(config: &Config, cost: f64, margins: &[f64]) {
    println!("{:>8} {:>12} {:>12}", "Margin", "Price", "Profit");
    for scenario in price_scenarios(cost, margins) {
        println!(
            "{:>8} {:>12} {:>12}",
            format_percentage(scenario.margin, 0),
            money(config, scenario.price),
            money(config, scenario.profit)
        );
    }
}

fn run_optimize(config: &Config, cost: f64, demand: f64, elasticity: f64) {
    let best = optimize_price(cost, demand, elasticity);

    println!("Elasticity {:.2}", elasticity);
    println!("  Optimal price: {}", money(config, best.optimal_price));
    println!("  Units sold:    {:.1}", best.units_sold);
    println!("  Max profit:    {}", money(config, best.max_profit));

    if let Some(exact) = closed_form_optimal_price(cost, demand, elasticity) {
        println!(
            "  Unconstrained optimum: {} ({})",
            money(config, exact.optimal_price),
            money(config, exact.max_profit)
        );
    }
}

fn run_production(config: &Config, cost: f64, price: f64, volume: f64, shock: Option<f64>) {
    let run = ProductionScenario::simulate(cost, price, volume);

    println!("Production of {} units", run.volume);
    println!("  Total cost:    {}", money(config, run.total_cost));
    println!("  Revenue:       {}", money(config, run.total_revenue));
    println!("  Profit:        {}", money(config, run.profit));
    println!("  Margin:        {}", format_percentage(run.profit_margin, 1));
    println!("  Break-even at: {:.1} units", run.break_even_volume);

    if let Some(change) = shock {
        let shocked = IngredientPriceShock::simulate(cost, price, change);
        println!("\nIngredient cost {:+.1}%", change);
        println!(
            "  Cost {} → {}",
            money(config, shocked.current_cost),
            money(config, shocked.new_cost)
        );
        println!(
            "  Margin {} → {} ({:+.1} pts)",
            format_percentage(shocked.current_margin, 1),
            format_percentage(shocked.new_margin, 1),
            shocked.margin_change()
        );
    }
}

// ============================================================================
// REPORTS
// ============================================================================

fn run_dashboard(config: &Config) -> Result<()> {
    let conn = open_store(config)?;
    let stats = DashboardStats::compute(&list_recipes(&conn)?, &list_ingredients(&conn)?);

    println!("📊 Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Recipes:          {}", stats.total_recipes);
    println!("Ingredients:      {}", stats.total_ingredients);
    println!("Low stock:        {}", stats.low_stock_items);
    println!("Average margin:   {}", format_percentage(stats.average_margin, 1));
    println!("Inventory value:  {}", money(config, stats.inventory_value));
    Ok(())
}

fn run_convert(config: &Config, from: &str, to: &str) -> Result<()> {
    let factor = config.unit_policy.factor(from, to)?;

    println!("1 {} = {} {}", from, factor, to);
    for label in [from, to] {
        if Unit::parse(label).is_none() {
            println!("  ⚠️  {:?} is not a known unit", label);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let (name, quantity, unit) = parse_line("Leche Entera:1.5:litros").unwrap();
        assert_eq!(name, "Leche Entera");
        assert_eq!(quantity, 1.5);
        assert_eq!(unit, "litros");

        let (name, _, unit) = parse_line("Pasta: avellana:200:g").unwrap();
        assert_eq!(name, "Pasta: avellana");
        assert_eq!(unit, "g");

        assert!(parse_line("Leche:litros").is_err());
        assert!(parse_line("Leche:mucho:litros").is_err());
    }

    #[test]
    fn test_find_ingredient_ignores_case_with_accents() {
        use creamery_costing::IngredientCategory;

        let inventory = vec![
            Ingredient::new("Azúcar", "kg", 0.80, IngredientCategory::Sweeteners),
            Ingredient::new("Leche Entera", "litros", 1.50, IngredientCategory::Dairy),
        ];

        assert_eq!(find_ingredient(&inventory, "AZÚCAR").unwrap().name, "Azúcar");
        assert_eq!(find_ingredient(&inventory, "leche entera").unwrap().name, "Leche Entera");
        assert!(find_ingredient(&inventory, "Crema").is_none());
    }

    #[test]
    fn test_rebuild_recipe_drops_old_price() {
        let mut stored = Recipe::new("Vainilla", 2.0, "litros");
        stored.target_margin = Some(60.0);
        stored.suggested_price = Some(4.35);
        stored.add_ingredient("milk", 1.0, "litros");
        let id = stored.id.clone();

        let rebuilt = rebuild_recipe(Some(stored), "Vainilla", 4.0, "litros", None);

        assert_eq!(rebuilt.id, id);
        assert_eq!(rebuilt.yield_quantity, 4.0);
        assert_eq!(rebuilt.target_margin, None);
        assert_eq!(rebuilt.suggested_price, None);
        assert!(rebuilt.ingredients.is_empty());

        let fresh = rebuild_recipe(None, "Chocolate", 2.0, "litros", Some(50.0));
        assert_eq!(fresh.name, "Chocolate");
        assert_eq!(fresh.target_margin, Some(50.0));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "creamery", "--db", "/tmp/x.db", "optimize", "--cost", "1", "--demand", "100",
            "--elasticity", "-2",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(
            cli.command,
            Command::Optimize { elasticity: Some(e), .. } if e == -2.0
        ));

        let cli = Cli::try_parse_from(["creamery", "scenarios", "--cost", "2", "--margins", "20,35"])
            .unwrap();
        match cli.command {
            Command::Scenarios { margins, .. } => assert_eq!(margins, vec![20.0, 35.0]),
            _ => panic!("expected scenarios"),
        }
    }
}
