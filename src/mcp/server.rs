//! MyFood MCP Server Implementation
//!
//! Implements the MCP server with all MyFood tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsStore, SqliteEntrySource, SystemClock};
use crate::config::Config;
use crate::db::Database;
use crate::models::{AnalyticsPeriod, ProductCreate, ProductUpdate};
use crate::tools::analytics;
use crate::tools::calculations::{self, BodyMetricsInput};
use crate::tools::meals;
use crate::tools::products;
use crate::tools::status::StatusTracker;
use crate::tools::weight;

/// MyFood MCP Service
#[derive(Clone)]
pub struct MyFoodService {
    status_tracker: Arc<StatusTracker>,
    database: Database,
    analytics: AnalyticsStore,
    /// Timezone recorded with meals logged without an explicit one
    timezone: String,
    tool_router: ToolRouter<MyFoodService>,
}

impl MyFoodService {
    pub fn new(config: &Config, database: Database) -> Self {
        let timezone = config.timezone.name().to_string();
        let analytics = AnalyticsStore::new(
            Arc::new(SqliteEntrySource::new(database.clone())),
            Arc::new(SystemClock::new(config.timezone)),
            config.top_products,
        );
        Self {
            status_tracker: Arc::new(StatusTracker::new(config.database_path.clone(), timezone.clone())),
            database,
            analytics,
            timezone,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Product Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddProductParams {
    pub name: String,
    pub brand: Option<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Reference quantity the nutrients are given for
    #[serde(default = "default_reference_quantity")]
    pub quantity: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    /// Label calories; derived from macros (4/9/4 kcal per gram) when omitted
    pub calories: Option<f64>,
    #[serde(default = "default_true")]
    pub user_created: bool,
}

fn default_unit() -> String { "g".to_string() }
fn default_reference_quantity() -> f64 { 100.0 }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetProductParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub calories: Option<f64>,
}

// ============================================================================
// Calculation Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScalePortionParams {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub calories: f64,
    #[serde(default = "default_reference_quantity")]
    pub base_quantity: f64,
    pub target_quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeriveCaloriesParams {
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub label_calories: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BodyMetricsParams {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: Option<u32>,
    /// Birthday (YYYY-MM-DD), used when age is not given
    pub birthday: Option<String>,
    /// male or female
    pub gender: String,
    /// first..fifth (or 1..5), default first
    pub activity_level: Option<String>,
    /// lose, save or gain, default save
    pub target: Option<String>,
    /// Calories eaten today, for progress against the recommendation
    pub consumed_calories: Option<f64>,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    pub product_id: i64,
    /// breakfast, lunch, dinner, snack or lateSnack
    pub meal_type: String,
    /// Local calendar day (YYYY-MM-DD)
    pub date: String,
    /// Amount eaten, in the product's unit
    pub quantity: f64,
    /// IANA timezone the meal was eaten in; defaults to the server timezone
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMealsParams {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMealEntryParams {
    pub id: i64,
}

// ============================================================================
// Weight Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWeightParams {
    pub weight_kg: f64,
    /// Local calendar day (YYYY-MM-DD); defaults to today
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListWeightsParams {
    #[serde(default = "default_weight_limit")]
    pub limit: i64,
}

fn default_weight_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteWeightEntryParams {
    pub id: i64,
}

// ============================================================================
// Analytics Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetAnalyticsParams {
    /// day, week or month (default week); ignored when from/to are given
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetTrendParams {
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// calories, protein, fat or carbs
    #[serde(default = "default_metric")]
    pub metric: String,
}

fn default_metric() -> String { "calories".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RefreshAnalyticsParams {
    /// Period to refresh; every cached period when omitted
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_period(name: Option<&str>, from: Option<&str>, to: Option<&str>) -> Result<AnalyticsPeriod, McpError> {
    AnalyticsPeriod::parse(name, from, to).map_err(|e| McpError::invalid_params(e, None))
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl MyFoodService {
    // --- Status ---

    #[tool(description = "Get the current status of the MyFood service including build info, database status, analytics state, and process information")]
    async fn myfood_status(&self) -> Result<CallToolResult, McpError> {
        let status = self
            .status_tracker
            .get_status(self.analytics.period().key(), self.analytics.is_loading());
        to_json(&status)
    }

    // --- Products ---

    #[tool(description = "Create a product with nutrients per reference quantity (default 100 g). Calories are derived from macros when not given.")]
    fn add_product(&self, Parameters(p): Parameters<AddProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductCreate {
            name: p.name, brand: p.brand, unit: p.unit, quantity: p.quantity,
            protein: p.protein, fat: p.fat, carbs: p.carbs, calories: p.calories,
            user_created: p.user_created,
        };
        let result = products::add_product(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get full details for a product")]
    fn get_product(&self, Parameters(p): Parameters<GetProductParams>) -> Result<CallToolResult, McpError> {
        let result = products::get_product(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(product) => serde_json::to_string_pretty(&product),
            None => Ok(format!(r#"{{"error": "Product not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search products by name or brand")]
    fn search_products(&self, Parameters(p): Parameters<SearchProductsParams>) -> Result<CallToolResult, McpError> {
        let result = products::search_products(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update a product. Changing macros of a user-created product re-derives its calories.")]
    fn update_product(&self, Parameters(p): Parameters<UpdateProductParams>) -> Result<CallToolResult, McpError> {
        let data = ProductUpdate {
            name: p.name, brand: p.brand, protein: p.protein, fat: p.fat, carbs: p.carbs,
            calories: p.calories,
        };
        let result = products::update_product(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(product) => serde_json::to_string_pretty(&product),
            None => Ok(format!(r#"{{"error": "Product not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Calculations ---

    #[tool(description = "Scale nutrients given for a base quantity to a target quantity (grams to 1 decimal, calories to whole kcal)")]
    fn scale_portion(&self, Parameters(p): Parameters<ScalePortionParams>) -> Result<CallToolResult, McpError> {
        let result = calculations::scale_portion(p.protein, p.fat, p.carbs, p.calories, p.base_quantity, p.target_quantity)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Derive calories from protein, fat and carbs grams (4/9/4 kcal per gram)")]
    fn derive_calories(&self, Parameters(p): Parameters<DeriveCaloriesParams>) -> Result<CallToolResult, McpError> {
        let result = calculations::derive_calories(p.protein, p.fat, p.carbs, p.label_calories)
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Compute BMI, BMR (Mifflin-St Jeor) and recommended daily calories")]
    fn body_metrics(&self, Parameters(p): Parameters<BodyMetricsParams>) -> Result<CallToolResult, McpError> {
        let input = BodyMetricsInput {
            weight_kg: p.weight_kg,
            height_cm: p.height_cm,
            age: p.age,
            birthday: p.birthday.as_deref(),
            gender: &p.gender,
            activity_level: p.activity_level.as_deref(),
            target: p.target.as_deref(),
            consumed_calories: p.consumed_calories,
        };
        let result = calculations::body_metrics(input, self.analytics.today())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    // --- Meals ---

    #[tool(description = "Log a portion of a product as a meal on a local calendar day. Nutrients are scaled from the product's reference values.")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let timezone = p.timezone.as_deref().unwrap_or(&self.timezone);
        let result = meals::log_meal(&self.database, p.product_id, &p.meal_type, &p.date, timezone, p.quantity)
            .map_err(|e| McpError::internal_error(e, None))?;
        self.analytics.invalidate(None);
        to_json(&result)
    }

    #[tool(description = "List meal entries between two dates (YYYY-MM-DD, inclusive)")]
    fn list_meals(&self, Parameters(p): Parameters<ListMealsParams>) -> Result<CallToolResult, McpError> {
        let result = meals::list_meals(&self.database, &p.from, &p.to).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a meal entry")]
    fn delete_meal_entry(&self, Parameters(p): Parameters<DeleteMealEntryParams>) -> Result<CallToolResult, McpError> {
        let result = meals::delete_meal_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        self.analytics.invalidate(None);
        to_json(&result)
    }

    // --- Weight ---

    #[tool(description = "Record a body weight reading in kg (30 to 300) for a local day, today by default")]
    fn log_weight(&self, Parameters(p): Parameters<LogWeightParams>) -> Result<CallToolResult, McpError> {
        let result = weight::log_weight(&self.database, p.weight_kg, p.date.as_deref(), p.notes, self.analytics.today())
            .map_err(|e| McpError::invalid_params(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List recent weight readings, newest first, with the change over the last 7 days")]
    fn list_weights(&self, Parameters(p): Parameters<ListWeightsParams>) -> Result<CallToolResult, McpError> {
        let result = weight::list_weights(&self.database, p.limit, self.analytics.today())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a weight reading")]
    fn delete_weight_entry(&self, Parameters(p): Parameters<DeleteWeightEntryParams>) -> Result<CallToolResult, McpError> {
        let result = weight::delete_weight_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Analytics ---

    #[tool(description = "Get period analytics: totals and daily averages, per-day totals, macro and meal-type distribution, top products. Results are cached per period until refreshed.")]
    async fn get_analytics(&self, Parameters(p): Parameters<GetAnalyticsParams>) -> Result<CallToolResult, McpError> {
        let period = parse_period(p.period.as_deref(), p.from.as_deref(), p.to.as_deref())?;
        let result = analytics::get_analytics(&self.analytics, period, p.force)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the per-day series of one metric (calories, protein, fat, carbs) for a period")]
    async fn get_trend(&self, Parameters(p): Parameters<GetTrendParams>) -> Result<CallToolResult, McpError> {
        let period = parse_period(p.period.as_deref(), p.from.as_deref(), p.to.as_deref())?;
        let result = analytics::get_trend(&self.analytics, period, &p.metric)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Drop cached analytics and reload. With a period, only that period is refreshed.")]
    async fn refresh_analytics(&self, Parameters(p): Parameters<RefreshAnalyticsParams>) -> Result<CallToolResult, McpError> {
        let period = match (&p.period, &p.from, &p.to) {
            (None, None, None) => None,
            _ => Some(parse_period(p.period.as_deref(), p.from.as_deref(), p.to.as_deref())?),
        };
        let result = analytics::refresh_analytics(&self.analytics, period)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for MyFoodService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "myfood".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("MyFood Nutrition Analytics".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MyFood - product nutrients, meal logging and period analytics. \
                 Products: add/get/search/update_product (nutrients per reference quantity, default 100 g). \
                 Calculations: scale_portion, derive_calories, body_metrics. \
                 Meals: log_meal/list_meals/delete_meal_entry (dates are local YYYY-MM-DD). \
                 Weight: log_weight/list_weights/delete_weight_entry; list_weights reports the 7-day change. \
                 Analytics: get_analytics, get_trend for day/week/month or a from/to range; \
                 refresh_analytics drops cached results. Weeks run Monday to Sunday."
                    .into(),
            ),
        }
    }
}
