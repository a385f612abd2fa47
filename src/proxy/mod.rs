//! HTTP proxy
//!
//! Thin JSON routes over the tools layer for clients that cannot speak MCP.
//! Errors come back as `{"success": false, "error": ...}` (or `"message"`
//! for unknown platforms) with a 400, 404, or 500 status.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::Database;
use crate::estimator::NutritionEstimator;
use crate::nutrition::ReportTimezone;
use crate::tools::orders::{self, OrderQuery};
use crate::tools::{reports, ToolError};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct AppState {
    pub database: Database,
    pub estimator: Arc<dyn NutritionEstimator>,
    pub report_timezone: ReportTimezone,
}

/// Tool failure rendered as a JSON error response
#[derive(Debug)]
pub struct ApiError(ToolError);

impl From<ToolError> for ApiError {
    fn from(e: ToolError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ToolError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"success": false, "error": msg}))).into_response()
            }
            ToolError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({"success": false, "message": msg}))).into_response()
            }
            ToolError::Failed(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"success": false, "error": msg})))
                    .into_response()
            }
        }
    }
}

fn bad_request(msg: &str) -> ApiError {
    ApiError(ToolError::InvalidInput(msg.to_string()))
}

/// The array under `key`, if the body has one
fn array_field<'a>(body: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    body.get(key).and_then(Value::as_array)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders/{platform}", get(list_orders))
        .route("/nutrition", post(nutrition))
        .route("/manual-nutrition", post(manual_nutrition))
        .route("/aggregate", post(aggregate))
        .route("/weekly", post(weekly))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Deserialize)]
struct OrderParams {
    page: Option<usize>,
    limit: Option<usize>,
    start: Option<String>,
    end: Option<String>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(params): Query<OrderParams>,
) -> Result<Json<Value>, ApiError> {
    let query = OrderQuery {
        platform,
        page: params.page,
        limit: params.limit,
        start: params.start,
        end: params.end,
    };
    let page = orders::list_orders(&state.database, &query)?;
    Ok(Json(json!({
        "success": true,
        "orders": page.orders,
        "page": page.page,
        "limit": page.limit,
        "total": page.total_matching,
        "has_more": page.has_more,
    })))
}

async fn nutrition(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let items: Vec<String> = array_field(&body, "items")
        .ok_or_else(|| bad_request("Items array required"))?
        .iter()
        .map(|item| match item {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
        .filter(|item| !item.is_empty())
        .collect();

    tracing::info!(count = items.len(), "estimating items");
    let results = reports::estimate_items(state.estimator.as_ref(), &items).await?;
    Ok(Json(json!({"success": true, "results": results})))
}

async fn manual_nutrition(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let prompt = body
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_request("Valid prompt string is required"))?;

    let text = reports::manual_completion(state.estimator.as_ref(), prompt).await?;
    Ok(Json(json!({"success": true, "responseText": text})))
}

async fn aggregate(Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let entries = array_field(&body, "entries").ok_or_else(|| bad_request("Entries array required"))?;
    let response = reports::aggregate_entries(entries);
    Ok(Json(json!({
        "success": true,
        "entry_count": response.entry_count,
        "totals": response.totals,
    })))
}

async fn weekly(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let entries = array_field(&body, "entries").ok_or_else(|| bad_request("Entries array required"))?;
    let reference_date = body.get("reference_date").and_then(Value::as_str);

    let week = reports::group_entries_by_week(entries, reference_date, &state.report_timezone)?;
    Ok(Json(json!({
        "success": true,
        "tracked_days": week.tracked_days(),
        "average_daily": week.average_daily(),
        "reference_date": week.reference_date,
        "start_date": week.start_date(),
        "days": week.days,
    })))
}

/// Bind and serve until ctrl-c
pub async fn serve(addr: std::net::SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "proxy listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await
}
