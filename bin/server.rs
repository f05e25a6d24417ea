// Creamery Costing - Web Server
// JSON API over the inventory store and the costing calculators

use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use creamery_costing::{
    closed_form_optimal_price, find_recipe_by_name, get_low_stock_ingredients, list_ingredients,
    list_presentations_for_recipe, list_recipes, optimize_price, presentation_cost_with,
    price_scenarios, setup_database, Config, CostingError, DashboardStats, PresentationResult,
    PriceOptimization, RecipeCostResult,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<Config>,
}

impl AppState {
    /// Run `f` against the locked connection
    fn with_db<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .db
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        f(&conn)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Status for a failed request: missing records are 404, bad input 400
fn status_for(err: &anyhow::Error) -> StatusCode {
    match err.downcast_ref::<CostingError>() {
        Some(CostingError::RecipeNotFound(_)) | Some(CostingError::IngredientNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        Some(_) => StatusCode::BAD_REQUEST,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("request failed: {:#}", e);
            }
            (status, Json(ApiResponse::<T>::err(e.to_string()))).into_response()
        }
    }
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Serialize)]
struct PresentationCost {
    name: String,
    #[serde(flatten)]
    result: PresentationResult,
}

#[derive(Serialize)]
struct RecipeCostResponse {
    recipe_id: String,
    recipe: String,
    cost: RecipeCostResult,
    presentations: Vec<PresentationCost>,
}

#[derive(Deserialize)]
struct PresentationRequest {
    recipe_cost: f64,
    yield_quantity: f64,
    yield_unit: String,
    portion_size: f64,
    portion_unit: String,
    sale_price: f64,
}

#[derive(Deserialize)]
struct ScenarioRequest {
    base_cost: f64,
    margins: Vec<f64>,
}

#[derive(Deserialize)]
struct OptimizeRequest {
    base_cost: f64,
    max_demand: f64,
    elasticity: Option<f64>,
}

#[derive(Serialize)]
struct OptimizeResponse {
    elasticity: f64,
    #[serde(flatten)]
    best: PriceOptimization,
    /// Exact optimum, only for elastic demand
    closed_form: Option<PriceOptimization>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/ingredients - All ingredients by name
async fn get_ingredients(State(state): State<AppState>) -> Response {
    respond(state.with_db(list_ingredients))
}

/// GET /api/ingredients/low-stock - Ingredients at or below minimum stock
async fn get_low_stock(State(state): State<AppState>) -> Response {
    respond(state.with_db(get_low_stock_ingredients))
}

/// GET /api/recipes - All recipes with their lines
async fn get_recipes(State(state): State<AppState>) -> Response {
    respond(state.with_db(list_recipes))
}

/// GET /api/recipes/:name/cost - Cost breakdown with saved presentations
async fn get_recipe_cost(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let policy = state.config.unit_policy;

    respond(state.with_db(|conn| {
        let recipe = find_recipe_by_name(conn, &name)?
            .ok_or_else(|| CostingError::RecipeNotFound(name.clone()))?;
        let inventory = list_ingredients(conn)?;
        let cost = recipe.calculate(&inventory, policy)?;

        let presentations = list_presentations_for_recipe(conn, &recipe.id)?
            .into_iter()
            .map(|p| -> Result<PresentationCost> {
                Ok(PresentationCost {
                    result: p.evaluate(&cost, policy)?,
                    name: p.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RecipeCostResponse {
            recipe_id: recipe.id,
            recipe: recipe.name,
            cost,
            presentations,
        })
    }))
}

/// GET /api/dashboard - Headline statistics
async fn get_dashboard(State(state): State<AppState>) -> Response {
    respond(state.with_db(|conn| {
        Ok(DashboardStats::compute(
            &list_recipes(conn)?,
            &list_ingredients(conn)?,
        ))
    }))
}

/// POST /api/presentations/calculate - Cost a portion from raw figures
async fn calculate_presentation(
    State(state): State<AppState>,
    Json(req): Json<PresentationRequest>,
) -> Response {
    let result = presentation_cost_with(
        state.config.unit_policy,
        req.recipe_cost,
        req.yield_quantity,
        &req.yield_unit,
        req.portion_size,
        &req.portion_unit,
        req.sale_price,
    );
    respond(result.map_err(anyhow::Error::from))
}

/// POST /api/scenarios - Price and profit per target margin
async fn run_scenarios(Json(req): Json<ScenarioRequest>) -> Response {
    let scenarios: Vec<_> = price_scenarios(req.base_cost, &req.margins).collect();
    respond(Ok(scenarios))
}

/// POST /api/optimize - Grid-search optimal price
async fn run_optimize(
    State(state): State<AppState>,
    Json(req): Json<OptimizeRequest>,
) -> Response {
    let elasticity = req.elasticity.unwrap_or(state.config.elasticity);

    respond(Ok(OptimizeResponse {
        elasticity,
        best: optimize_price(req.base_cost, req.max_demand, elasticity),
        closed_form: closed_form_optimal_price(req.base_cost, req.max_demand, elasticity),
    }))
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ingredients", get(get_ingredients))
        .route("/ingredients/low-stock", get(get_low_stock))
        .route("/recipes", get(get_recipes))
        .route("/recipes/:name/cost", get(get_recipe_cost))
        .route("/dashboard", get(get_dashboard))
        .route("/presentations/calculate", post(calculate_presentation))
        .route("/scenarios", post(run_scenarios))
        .route("/optimize", post(run_optimize))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.init_logging();

    println!("🍦 Creamery Costing - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = Connection::open(&config.db_path)?;
    setup_database(&conn)?;
    info!(path = %config.db_path.display(), "database opened");

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        config: Arc::new(config),
    };

    let app = Router::new().nest("/api", api_routes(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("\n🚀 Server running on http://{}", bind_addr);
    println!("   API: http://{}/api/recipes", bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
