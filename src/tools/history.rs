//! History Tools
//!
//! Logging normalized entries and the trailing 7-day intake view.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{ToolError, ToolResult};
use crate::db::Database;
use crate::estimator::NutritionEstimator;
use crate::models::{EntrySource, HistoryCreate, HistoryRecord, Nutrition, UserProfile};
use crate::nutrition::{
    aggregate, normalize_all, DailyNeeds, NutrientEntry, NutrientProgress, NutrientTotals,
    RecordedAt, ReportTimezone, WeeklyIntake, WINDOW_DAYS,
};

/// Response for log_entries
#[derive(Debug, Serialize)]
pub struct LogEntriesResponse {
    pub user_id: String,
    pub source: EntrySource,
    pub logged: usize,
    pub ids: Vec<i64>,
    pub totals: NutrientTotals,
}

/// Progress against targets for one tracked day
#[derive(Debug, Serialize)]
pub struct DayProgress {
    pub label: String,
    pub progress: Vec<NutrientProgress>,
}

/// Response for weekly_intake
#[derive(Debug, Serialize)]
pub struct WeeklyIntakeResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub week: WeeklyIntake,
    /// Oldest day in the window
    pub start_date: NaiveDate,
    pub tracked_days: usize,
    pub average_daily: Option<Nutrition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<DailyNeeds>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<DayProgress>,
    /// Why targets are missing when they were asked for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_error: Option<String>,
}

fn require_user(user_id: &str) -> ToolResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ToolError::InvalidInput("user_id is required".to_string()));
    }
    Ok(user_id)
}

/// Write entries in one transaction. Entries without a timestamp are
/// recorded at `default_time`.
pub(crate) fn store_entries(
    db: &Database,
    user_id: &str,
    source: EntrySource,
    entries: &[NutrientEntry],
    default_time: DateTime<Utc>,
) -> ToolResult<Vec<i64>> {
    let user_id = require_user(user_id)?;

    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let data = HistoryCreate {
                user_id: user_id.to_string(),
                source,
                entry: entry.clone(),
                recorded_at: entry
                    .recorded_at
                    .unwrap_or(RecordedAt::Instant(default_time)),
            };
            ids.push(HistoryRecord::create(&tx, &data)?.id);
        }
        tx.commit()?;
        Ok(ids)
    })
    .map_err(|e| ToolError::Failed(format!("Failed to store history: {}", e)))
}

// ============================================================================
// History Tools
// ============================================================================

/// Normalize raw entries and store them for a user
pub fn log_entries(
    db: &Database,
    user_id: &str,
    raw_entries: &[Value],
    source: EntrySource,
    now: DateTime<Utc>,
) -> ToolResult<LogEntriesResponse> {
    let user_id = require_user(user_id)?;
    let entries = normalize_all(raw_entries);
    let ids = store_entries(db, user_id, source, &entries, now)?;
    tracing::info!(user_id, count = ids.len(), source = source.as_str(), "entries logged");

    Ok(LogEntriesResponse {
        user_id: user_id.to_string(),
        source,
        logged: ids.len(),
        ids,
        totals: aggregate(&entries),
    })
}

/// Stored entries grouped into the 7 days ending today in `timezone`.
///
/// With an estimator, daily targets are estimated from the user's profile
/// and each tracked day gets consumed-vs-target progress. A missing profile
/// or a failed estimate leaves the targets out and says why.
pub async fn weekly_intake(
    db: &Database,
    estimator: Option<&dyn NutritionEstimator>,
    user_id: &str,
    timezone: &ReportTimezone,
    now: DateTime<Utc>,
) -> ToolResult<WeeklyIntakeResponse> {
    let user_id = require_user(user_id)?;
    let reference_date = timezone.calendar_date(&now);
    // One spare day covers instants stored under a UTC date behind the local one
    let since = reference_date - Duration::days(WINDOW_DAYS);

    let (records, profile) = db
        .with_conn(|conn| {
            let records = HistoryRecord::list_since(conn, user_id, since)?;
            let profile = UserProfile::get(conn, user_id)?;
            Ok((records, profile))
        })
        .map_err(|e| ToolError::Failed(format!("Failed to read history: {}", e)))?;

    let entries: Vec<NutrientEntry> = records.iter().map(HistoryRecord::to_entry).collect();
    let week = timezone.group_by_week(&entries, now);

    let mut response = WeeklyIntakeResponse {
        user_id: user_id.to_string(),
        start_date: week.start_date(),
        tracked_days: week.tracked_days(),
        average_daily: week.average_daily(),
        week,
        needs: None,
        progress: Vec::new(),
        needs_error: None,
    };

    let Some(estimator) = estimator else {
        return Ok(response);
    };
    let Some(profile) = profile else {
        response.needs_error = Some(format!("No profile stored for user {}", user_id));
        return Ok(response);
    };

    match estimator.estimate_daily_needs(&profile, reference_date).await {
        Ok(needs) => {
            response.progress = response
                .week
                .days
                .iter()
                .filter_map(|day| {
                    day.bucket.totals().map(|totals| DayProgress {
                        label: day.label.clone(),
                        progress: needs.compare(totals),
                    })
                })
                .collect();
            response.needs = Some(needs);
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id, "daily needs estimate failed");
            response.needs_error = Some(e.to_string());
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_migrated(dir.path().join("history.db")).unwrap();
        (dir, db)
    }

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_log_entries_defaults_timestamp() {
        let (_dir, db) = test_db();
        let now = at("2025-03-15T12:00:00Z");
        let response = log_entries(
            &db,
            "u1",
            &[
                json!({"food": "Apple", "calories": 95, "vitamins": "C"}),
                json!({"food": "Toast", "calories": "52", "timestamp": "2025-03-14"}),
            ],
            EntrySource::Manual,
            now,
        )
        .unwrap();

        assert_eq!(response.logged, 2);
        assert_eq!(response.totals.nutrition.calories, 147.0);

        let first = db
            .with_conn(|conn| HistoryRecord::get_by_id(conn, response.ids[0]))
            .unwrap()
            .unwrap();
        assert_eq!(first.recorded_at, "2025-03-15T12:00:00Z");
    }

    #[test]
    fn test_log_entries_requires_user() {
        let (_dir, db) = test_db();
        let err = log_entries(&db, " ", &[], EntrySource::Manual, Utc::now()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_weekly_intake_without_estimator() {
        let (_dir, db) = test_db();
        let now = at("2025-03-15T18:00:00Z");
        log_entries(
            &db,
            "u1",
            &[
                json!({"calories": 500, "timestamp": "2025-03-15T08:00:00Z"}),
                json!({"calories": 0, "timestamp": "2025-03-12"}),
                json!({"calories": 900, "timestamp": "2025-03-01"}),
            ],
            EntrySource::Manual,
            now,
        )
        .unwrap();

        let response = weekly_intake(&db, None, "u1", &ReportTimezone::Utc, now)
            .await
            .unwrap();
        assert_eq!(response.week.days.len(), 7);
        assert_eq!(response.start_date, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(response.tracked_days, 2);
        assert_eq!(response.week.days[0].label, "Sat Mar 15 2025");
        assert_eq!(response.week.days[0].bucket.totals().unwrap().calories, 500.0);
        assert!(response.week.days[3].bucket.has_data());
        assert!(response.needs.is_none());
        assert!(response.needs_error.is_none());
    }
}
