//! NutriLens MCP Server Implementation
//!
//! Implements the MCP server with all NutriLens tools.

use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::estimator::NutritionEstimator;
use crate::models::{EntrySource, ProfileUpsert};
use crate::nutrition::ReportTimezone;
use crate::tools::orders::{self, OrderQuery};
use crate::tools::status::StatusTracker;
use crate::tools::{history, profile, reports, ToolError, ToolResult};

/// NutriLens MCP Service
#[derive(Clone)]
pub struct NutrilensService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    estimator: Arc<dyn NutritionEstimator>,
    report_timezone: ReportTimezone,
    tool_router: ToolRouter<NutrilensService>,
}

impl NutrilensService {
    pub fn new(
        status_tracker: StatusTracker,
        database: Database,
        estimator: Arc<dyn NutritionEstimator>,
        report_timezone: ReportTimezone,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(status_tracker)),
            database,
            estimator,
            report_timezone,
            tool_router: Self::tool_router(),
        }
    }
}

fn tool_error(e: ToolError) -> McpError {
    match e {
        ToolError::InvalidInput(msg) | ToolError::NotFound(msg) => McpError::invalid_params(msg, None),
        ToolError::Failed(msg) => McpError::internal_error(msg, None),
    }
}

fn json_result<T: Serialize>(result: ToolResult<T>) -> Result<CallToolResult, McpError> {
    let value = result.map_err(tool_error)?;
    let json = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetProfileParams {
    /// User identifier
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Birth month, 1-12
    pub dob_month: u32,
    /// Birth year, 1900 to the current year
    pub dob_year: i32,
    pub gender: String,
    /// Weight in kilograms
    pub weight_kg: f64,
    pub height_feet: u32,
    #[serde(default)]
    pub height_inches: u32,
    /// low, moderate (default), or high
    pub activity_level: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetProfileParams {
    pub user_id: String,
}

// ============================================================================
// Order Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddOrderParams {
    /// Delivery platform key, e.g. "uber-eats"
    pub platform: String,
    pub restaurant: String,
    /// Item names as listed on the receipt
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub total: f64,
    /// Order date (YYYY-MM-DD)
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListOrdersParams {
    pub platform: String,
    /// 1-based page (default 1)
    pub page: Option<usize>,
    /// Orders per page (default 5)
    pub limit: Option<usize>,
    /// Inclusive start date (YYYY-MM-DD)
    pub start: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OrderReportParams {
    pub platform: String,
    /// Inclusive start date (YYYY-MM-DD)
    pub start: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end: Option<String>,
    /// Log the estimated items into this user's history
    pub user_id: Option<String>,
}

// ============================================================================
// Entry Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EstimateFoodParams {
    /// Free-text description, e.g. "two eggs and a slice of toast"
    pub description: String,
    /// Log the estimated items into this user's history
    pub user_id: Option<String>,
    /// When the food was eaten (RFC 3339 or YYYY-MM-DD); defaults to now
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AggregateEntriesParams {
    /// Entries with optional food, calories, protein, carbs, fat, fiber, sugar, vitamins, minerals
    pub entries: Vec<Value>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GroupEntriesByWeekParams {
    /// Entries with a timestamp (RFC 3339, YYYY-MM-DD, or epoch milliseconds)
    pub entries: Vec<Value>,
    /// Last day of the window (YYYY-MM-DD); defaults to today
    pub reference_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogEntriesParams {
    pub user_id: String,
    pub entries: Vec<Value>,
    /// manual (default), image, or order
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeeklyIntakeParams {
    pub user_id: String,
    /// Estimate daily targets from the stored profile and show progress
    #[serde(default)]
    pub include_needs: bool,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutrilensService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriLens service including build info, database status, estimator settings, and process information")]
    async fn nutrilens_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(Ok(tracker.get_status(&self.database)))
    }

    #[tool(description = "Get instructions for using the NutriLens tools. Call this when starting a session or when unsure which tool to use.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Profiles ---

    #[tool(description = "Create or replace a user's profile (names, birth month/year, gender, weight, height)")]
    fn set_profile(&self, Parameters(p): Parameters<SetProfileParams>) -> Result<CallToolResult, McpError> {
        let data = ProfileUpsert {
            user_id: p.user_id, first_name: p.first_name, last_name: p.last_name,
            dob_month: p.dob_month, dob_year: p.dob_year, gender: p.gender,
            weight_kg: p.weight_kg, height_feet: p.height_feet, height_inches: p.height_inches,
            activity_level: p.activity_level,
        };
        json_result(profile::set_profile(&self.database, &data, self.report_timezone.today()))
    }

    #[tool(description = "Get a user's profile with derived age")]
    fn get_profile(&self, Parameters(p): Parameters<GetProfileParams>) -> Result<CallToolResult, McpError> {
        json_result(profile::get_profile(&self.database, &p.user_id, self.report_timezone.today()))
    }

    // --- Orders ---

    #[tool(description = "Store a delivery order (platform, restaurant, item names, total, date)")]
    fn add_order(&self, Parameters(p): Parameters<AddOrderParams>) -> Result<CallToolResult, McpError> {
        json_result(orders::add_order(&self.database, &p.platform, &p.restaurant, p.items, p.total, &p.date))
    }

    #[tool(description = "List a platform's orders newest first, with optional inclusive date range and paging")]
    fn list_orders(&self, Parameters(p): Parameters<ListOrdersParams>) -> Result<CallToolResult, McpError> {
        let query = OrderQuery {
            platform: p.platform, page: p.page, limit: p.limit, start: p.start, end: p.end,
        };
        json_result(orders::list_orders(&self.database, &query))
    }

    #[tool(description = "Estimate and total the nutrition of every item ordered on a platform in a date range")]
    async fn order_report(&self, Parameters(p): Parameters<OrderReportParams>) -> Result<CallToolResult, McpError> {
        json_result(
            orders::order_report(
                &self.database,
                self.estimator.as_ref(),
                &p.platform,
                p.start.as_deref(),
                p.end.as_deref(),
                p.user_id.as_deref(),
            )
            .await,
        )
    }

    // --- Entries ---

    #[tool(description = "Estimate nutrition for a free-text food description, optionally logging it to a user's history")]
    async fn estimate_food(&self, Parameters(p): Parameters<EstimateFoodParams>) -> Result<CallToolResult, McpError> {
        json_result(
            reports::estimate_food(
                &self.database,
                self.estimator.as_ref(),
                &p.description,
                p.user_id.as_deref(),
                p.timestamp.as_deref(),
                Utc::now(),
            )
            .await,
        )
    }

    #[tool(description = "Total the nutrients of the given entries and union their vitamin and mineral labels")]
    fn aggregate_entries(&self, Parameters(p): Parameters<AggregateEntriesParams>) -> Result<CallToolResult, McpError> {
        json_result(Ok(reports::aggregate_entries(&p.entries)))
    }

    #[tool(description = "Group the given timestamped entries into the 7 days ending at reference_date; untracked days read insufficient_data")]
    fn group_entries_by_week(&self, Parameters(p): Parameters<GroupEntriesByWeekParams>) -> Result<CallToolResult, McpError> {
        json_result(reports::group_entries_by_week(
            &p.entries,
            p.reference_date.as_deref(),
            &self.report_timezone,
        ))
    }

    // --- History ---

    #[tool(description = "Store entries in a user's nutrition history; entries without a timestamp are recorded now")]
    fn log_entries(&self, Parameters(p): Parameters<LogEntriesParams>) -> Result<CallToolResult, McpError> {
        let source = p.source.as_deref().map(EntrySource::from_str).unwrap_or_default();
        json_result(history::log_entries(&self.database, &p.user_id, &p.entries, source, Utc::now()))
    }

    #[tool(description = "Show a user's intake for the last 7 days, optionally against estimated daily targets")]
    async fn weekly_intake(&self, Parameters(p): Parameters<WeeklyIntakeParams>) -> Result<CallToolResult, McpError> {
        let estimator = p.include_needs.then(|| self.estimator.as_ref());
        json_result(
            history::weekly_intake(&self.database, estimator, &p.user_id, &self.report_timezone, Utc::now())
                .await,
        )
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutrilensService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrilens".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriLens".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriLens - nutrition estimation and intake tracking. \
                 Call usage_instructions first if unsure. \
                 Profiles: set_profile/get_profile. \
                 Orders: add_order, list_orders, order_report. \
                 Entries: estimate_food, log_entries, aggregate_entries, group_entries_by_week. \
                 Reports: weekly_intake (include_needs=true for daily targets). \
                 Status: nutrilens_status."
                    .into(),
            ),
        }
    }
}
