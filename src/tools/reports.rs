//! Report Tools
//!
//! Nutrition estimates for free text and item lists, and the pure
//! aggregation / weekly grouping over caller-supplied entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{parse_date_arg, ToolError, ToolResult};
use crate::db::Database;
use crate::estimator::NutritionEstimator;
use crate::models::EntrySource;
use crate::nutrition::{
    aggregate, group_by_week_ending, normalize_all, NutrientEntry, NutrientTotals, RecordedAt,
    ReportTimezone, WeeklyIntake,
};

/// Response for estimate_food
#[derive(Debug, Serialize)]
pub struct EstimateFoodResponse {
    pub entries: Vec<NutrientEntry>,
    pub totals: NutrientTotals,
    pub logged: usize,
}

/// Response for aggregate_entries
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub entry_count: usize,
    pub totals: NutrientTotals,
}

// ============================================================================
// Estimation
// ============================================================================

/// Estimate a free-text meal description.
///
/// With a `user_id` the entries are logged as manual history, at
/// `recorded_at` when given and otherwise at `now`.
pub async fn estimate_food(
    db: &Database,
    estimator: &dyn NutritionEstimator,
    description: &str,
    user_id: Option<&str>,
    recorded_at: Option<&str>,
    now: DateTime<Utc>,
) -> ToolResult<EstimateFoodResponse> {
    if description.trim().is_empty() {
        return Err(ToolError::InvalidInput("description is required".to_string()));
    }
    let recorded_at = match recorded_at.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => Some(RecordedAt::parse_str(text).ok_or_else(|| {
            ToolError::InvalidInput(format!("Invalid timestamp: {:?}", text))
        })?),
        None => None,
    };

    let mut entries = estimator.estimate_description(description).await.map_err(|e| {
        tracing::warn!(error = %e, "food estimate failed");
        ToolError::Failed(format!("Failed to estimate nutrition: {}", e))
    })?;
    if let Some(at) = recorded_at {
        for entry in &mut entries {
            entry.recorded_at = Some(at);
        }
    }

    let logged = match user_id {
        Some(user_id) => {
            super::history::store_entries(db, user_id, EntrySource::Manual, &entries, now)?.len()
        }
        None => 0,
    };

    Ok(EstimateFoodResponse {
        totals: aggregate(&entries),
        entries,
        logged,
    })
}

/// One normalized record per item name
pub async fn estimate_items(
    estimator: &dyn NutritionEstimator,
    items: &[String],
) -> ToolResult<Vec<NutrientEntry>> {
    estimator.estimate_items(items).await.map_err(|e| {
        tracing::warn!(error = %e, count = items.len(), "item estimate failed");
        ToolError::Failed(e.to_string())
    })
}

/// Forward a caller-written prompt and return the reply text untouched
pub async fn manual_completion(estimator: &dyn NutritionEstimator, prompt: &str) -> ToolResult<String> {
    if prompt.trim().is_empty() {
        return Err(ToolError::InvalidInput(
            "Valid prompt string is required".to_string(),
        ));
    }
    estimator
        .complete(crate::estimator::prompt::SYSTEM_PROMPT, prompt)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "manual completion failed");
            ToolError::Failed(e.to_string())
        })
}

// ============================================================================
// Pure reports
// ============================================================================

/// Normalize and total caller-supplied entries
pub fn aggregate_entries(raw_entries: &[Value]) -> AggregateResponse {
    let entries = normalize_all(raw_entries);
    AggregateResponse {
        entry_count: entries.len(),
        totals: aggregate(&entries),
    }
}

/// Group caller-supplied entries into the 7 days ending at `reference_date`
/// (today in `timezone` when absent)
pub fn group_entries_by_week(
    raw_entries: &[Value],
    reference_date: Option<&str>,
    timezone: &ReportTimezone,
) -> ToolResult<WeeklyIntake> {
    let reference_date: NaiveDate = parse_date_arg("reference_date", reference_date)?
        .unwrap_or_else(|| timezone.today());
    let entries = normalize_all(raw_entries);
    Ok(group_by_week_ending(&entries, reference_date, timezone))
}
