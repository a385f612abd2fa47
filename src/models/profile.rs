//! User profile model
//!
//! Sign-up details used as inputs for daily-needs estimation.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Earliest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Stored user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob_month: u32,
    pub dob_year: i32,
    pub gender: String,
    pub weight_kg: f64,
    pub height_feet: u32,
    pub height_inches: u32,
    pub activity_level: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating or replacing a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpsert {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob_month: u32,
    pub dob_year: i32,
    pub gender: String,
    pub weight_kg: f64,
    pub height_feet: u32,
    pub height_inches: u32,
    pub activity_level: Option<String>,
}

impl ProfileUpsert {
    /// Check the sign-up rules against the given date. Every failure is reported.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.user_id.trim().is_empty() {
            problems.push("user_id is required".to_string());
        }
        if self.first_name.trim().is_empty() {
            problems.push("first_name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            problems.push("last_name is required".to_string());
        }
        if !(1..=12).contains(&self.dob_month) {
            problems.push(format!("dob_month must be 1-12, got {}", self.dob_month));
        }
        if !(MIN_BIRTH_YEAR..=today.year()).contains(&self.dob_year) {
            problems.push(format!(
                "dob_year must be between {} and {}, got {}",
                MIN_BIRTH_YEAR,
                today.year(),
                self.dob_year
            ));
        }
        if self.gender.trim().is_empty() {
            problems.push("gender is required".to_string());
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            problems.push("weight_kg must be a positive number".to_string());
        }
        if self.height_inches >= 12 {
            problems.push(format!("height_inches must be 0-11, got {}", self.height_inches));
        }
        if self.height_feet == 0 && self.height_inches == 0 {
            problems.push("height must be greater than zero".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

impl UserProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            dob_month: row.get("dob_month")?,
            dob_year: row.get("dob_year")?,
            gender: row.get("gender")?,
            weight_kg: row.get("weight_kg")?,
            height_feet: row.get("height_feet")?,
            height_inches: row.get("height_inches")?,
            activity_level: row.get("activity_level")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM user_profiles WHERE user_id = ?1")?;

        let result = stmt.query_row([user_id], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set or update a profile (upsert)
    pub fn set(conn: &Connection, data: &ProfileUpsert) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO user_profiles (
                user_id, first_name, last_name, dob_month, dob_year,
                gender, weight_kg, height_feet, height_inches, activity_level
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, COALESCE(?10, 'moderate'))
            ON CONFLICT(user_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                dob_month = excluded.dob_month,
                dob_year = excluded.dob_year,
                gender = excluded.gender,
                weight_kg = excluded.weight_kg,
                height_feet = excluded.height_feet,
                height_inches = excluded.height_inches,
                activity_level = excluded.activity_level,
                updated_at = datetime('now')
            "#,
            params![
                data.user_id,
                data.first_name.trim(),
                data.last_name.trim(),
                data.dob_month,
                data.dob_year,
                data.gender.trim(),
                data.weight_kg,
                data.height_feet,
                data.height_inches,
                data.activity_level,
            ],
        )?;

        Self::get(conn, &data.user_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Whole years of age on `date`, counting the birthday from the first of the birth month
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        let mut age = date.year() - self.dob_year;
        if date.month() < self.dob_month {
            age -= 1;
        }
        age.max(0)
    }

    /// Height in centimetres
    pub fn height_cm(&self) -> f64 {
        (self.height_feet as f64 * 12.0 + self.height_inches as f64) * 2.54
    }
}
