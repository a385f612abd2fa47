//! Profile Tools

use chrono::NaiveDate;
use serde::Serialize;

use super::{ToolError, ToolResult};
use crate::db::Database;
use crate::models::{HistoryRecord, ProfileUpsert, UserProfile};

/// Response for set_profile / get_profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub age: i32,
    pub height_cm: f64,
    /// Entries logged for this user so far
    pub history_entries: i64,
}

impl ProfileResponse {
    fn new(profile: UserProfile, history_entries: i64, today: NaiveDate) -> Self {
        Self {
            age: profile.age_on(today),
            height_cm: (profile.height_cm() * 10.0).round() / 10.0,
            history_entries,
            profile,
        }
    }
}

/// Validate and store a profile
pub fn set_profile(db: &Database, data: &ProfileUpsert, today: NaiveDate) -> ToolResult<ProfileResponse> {
    data.validate(today)
        .map_err(|problems| ToolError::InvalidInput(problems.join("; ")))?;

    let (profile, history_entries) = db
        .with_conn(|conn| {
            let profile = UserProfile::set(conn, data)?;
            let count = HistoryRecord::count_for_user(conn, &profile.user_id)?;
            Ok((profile, count))
        })
        .map_err(|e| ToolError::Failed(format!("Failed to save profile: {}", e)))?;
    tracing::info!(user_id = %profile.user_id, "profile saved");

    Ok(ProfileResponse::new(profile, history_entries, today))
}

pub fn get_profile(db: &Database, user_id: &str, today: NaiveDate) -> ToolResult<ProfileResponse> {
    let user_id = user_id.trim();
    let (profile, history_entries) = db
        .with_conn(|conn| {
            Ok((
                UserProfile::get(conn, user_id)?,
                HistoryRecord::count_for_user(conn, user_id)?,
            ))
        })
        .map_err(|e| ToolError::Failed(format!("Failed to get profile: {}", e)))?;

    profile
        .map(|profile| ProfileResponse::new(profile, history_entries, today))
        .ok_or_else(|| ToolError::NotFound(format!("No profile stored for user {}", user_id)))
}
