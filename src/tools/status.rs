//! NutriLens Status Tool
//!
//! Provides runtime status information about the NutriLens service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::{migrations, Database};
use crate::models::Order;

/// Short guide returned by the usage tool
pub const USAGE_INSTRUCTIONS: &str = r#"
# NutriLens Usage

## Profiles
Call `set_profile` once per user (names, birth month/year, gender, weight in kg,
height in feet and inches). Daily targets in `weekly_intake` need a profile.

## Logging food
- `estimate_food` with a free-text description. Pass `user_id` to log the
  estimated items into that user's history.
- `log_entries` stores entries you already have. Each entry may carry
  `food`, `calories`, `protein`, `carbs`, `fat`, `fiber`, `sugar`,
  `vitamins`, `minerals`, and a `timestamp` (RFC 3339 or YYYY-MM-DD).
  Entries without a timestamp are recorded now.

## Delivery orders
- `add_order` stores an order; `list_orders` pages a platform's history
  (newest first, inclusive `start`/`end` dates).
- `order_report` estimates every ordered item in the range and totals them.

## Reports
- `weekly_intake` shows the last 7 days. Days with nothing logged read
  `insufficient_data`, which is not the same as a zero-calorie day.
- `aggregate_entries` and `group_entries_by_week` work on entries you pass
  in and touch no stored data.
"#;

/// Runtime status
#[derive(Debug, Serialize)]
pub struct NutrilensStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub order_platforms: Vec<String>,

    /// Estimator information
    pub estimator_model: String,
    pub estimator_api_key_configured: bool,
    pub report_timezone: String,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    estimator_model: String,
    api_key_configured: bool,
    report_timezone: String,
}

impl StatusTracker {
    pub fn new(
        database_path: PathBuf,
        estimator_model: impl Into<String>,
        api_key_configured: bool,
        report_timezone: impl Into<String>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            estimator_model: estimator_model.into(),
            api_key_configured,
            report_timezone: report_timezone.into(),
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutrilensStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let (schema_version, order_platforms) = match db.with_conn(|conn| {
            Ok((
                migrations::get_schema_version(conn)?,
                Order::list_platforms(conn)?,
            ))
        }) {
            Ok((version, platforms)) => (Some(version), platforms),
            Err(e) => {
                tracing::warn!(error = %e, "status could not read the database");
                (None, Vec::new())
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutrilensStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            order_platforms,
            estimator_model: self.estimator_model.clone(),
            estimator_api_key_configured: self.api_key_configured,
            report_timezone: self.report_timezone.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reads_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.db");
        let db = Database::open_migrated(&path).unwrap();

        let tracker = StatusTracker::new(path, "gpt-4o-mini", false, "utc");
        let status = tracker.get_status(&db);
        assert_eq!(status.schema_version, Some(migrations::SCHEMA_VERSION));
        assert!(status.order_platforms.is_empty());
        assert!(!status.estimator_api_key_configured);
        assert_eq!(status.process_id, std::process::id());
    }
}
