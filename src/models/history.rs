//! Nutrition history model
//!
//! Normalized entries stored per user. The weekly view reads these back
//! through a trailing-window query.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::nutrition::{LabelSet, NutrientEntry, RecordedAt};
use super::Nutrition;

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    #[default]
    Manual,
    Image,
    Order,
}

impl EntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Manual => "manual",
            EntrySource::Image => "image",
            EntrySource::Order => "order",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "image" => EntrySource::Image,
            "order" => EntrySource::Order,
            _ => EntrySource::Manual,
        }
    }
}

/// A stored history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub user_id: String,
    pub food: String,
    pub source: EntrySource,
    pub nutrition: Nutrition,
    pub vitamins: String,
    pub minerals: String,
    /// RFC 3339 UTC instant or ISO date
    pub recorded_at: String,
    pub created_at: String,
}

/// Data for storing an entry
#[derive(Debug, Clone)]
pub struct HistoryCreate {
    pub user_id: String,
    pub source: EntrySource,
    pub entry: NutrientEntry,
    pub recorded_at: RecordedAt,
}

impl HistoryRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            food: row.get("food")?,
            source: EntrySource::from_str(row.get::<_, String>("source")?.as_str()),
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
                fiber: row.get("fiber")?,
                sugar: row.get("sugar")?,
            },
            vitamins: row.get("vitamins")?,
            minerals: row.get("minerals")?,
            recorded_at: row.get("recorded_at")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Back to a canonical entry. An unreadable stored timestamp becomes `None`.
    pub fn to_entry(&self) -> NutrientEntry {
        NutrientEntry {
            food: self.food.clone(),
            nutrition: self.nutrition,
            vitamins: LabelSet::parse(&self.vitamins),
            minerals: LabelSet::parse(&self.minerals),
            recorded_at: RecordedAt::parse_str(&self.recorded_at),
        }
    }

    /// Insert a new history entry
    pub fn create(conn: &Connection, data: &HistoryCreate) -> DbResult<Self> {
        let n = &data.entry.nutrition;
        conn.execute(
            r#"
            INSERT INTO nutrition_history (
                user_id, food, source,
                calories, protein, carbs, fat, fiber, sugar,
                vitamins, minerals, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                data.user_id,
                data.entry.food,
                data.source.as_str(),
                n.calories,
                n.protein,
                n.carbs,
                n.fat,
                n.fiber,
                n.sugar,
                data.entry.vitamins.joined(),
                data.entry.minerals.joined(),
                data.recorded_at.to_canonical(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrition_history WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries recorded on or after `since` (by stored date prefix), oldest first
    pub fn list_since(conn: &Connection, user_id: &str, since: NaiveDate) -> DbResult<Vec<Self>> {
        let since = since.format("%Y-%m-%d").to_string();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM nutrition_history
            WHERE user_id = ?1 AND recorded_at >= ?2
            ORDER BY recorded_at ASC, id ASC
            "#,
        )?;

        let records = stmt
            .query_map(params![user_id, since], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Entries stored for a user, over all time
    pub fn count_for_user(conn: &Connection, user_id: &str) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nutrition_history WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::nutrition::normalize;
    use serde_json::json;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn store(conn: &Connection, user: &str, raw: serde_json::Value, at: &str) -> HistoryRecord {
        HistoryRecord::create(
            conn,
            &HistoryCreate {
                user_id: user.to_string(),
                source: EntrySource::Manual,
                entry: normalize(&raw),
                recorded_at: RecordedAt::parse_str(at).unwrap(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_round_trip_entry() {
        let conn = conn();
        let record = store(
            &conn,
            "u1",
            json!({"food": "Toast", "calories": 52, "vitamins": ["Fiber", "B1"]}),
            "2025-03-10T08:00:00Z",
        );
        assert_eq!(record.source, EntrySource::Manual);
        assert_eq!(record.vitamins, "Fiber, B1");

        let entry = record.to_entry();
        assert_eq!(entry.food, "Toast");
        assert_eq!(entry.nutrition.calories, 52.0);
        assert_eq!(entry.vitamins.joined(), "Fiber, B1");
        assert!(matches!(entry.recorded_at, Some(RecordedAt::Instant(_))));
    }

    #[test]
    fn test_list_since_filters_user_and_window() {
        let conn = conn();
        store(&conn, "u1", json!({"calories": 1}), "2025-03-01T10:00:00Z");
        store(&conn, "u1", json!({"calories": 2}), "2025-03-08");
        store(&conn, "u1", json!({"calories": 3}), "2025-03-09T00:30:00Z");
        store(&conn, "u2", json!({"calories": 4}), "2025-03-10T10:00:00Z");

        let since = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let records = HistoryRecord::list_since(&conn, "u1", since).unwrap();
        let calories: Vec<f64> = records.iter().map(|r| r.nutrition.calories).collect();
        assert_eq!(calories, vec![2.0, 3.0]);
        assert_eq!(HistoryRecord::count_for_user(&conn, "u1").unwrap(), 3);
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(EntrySource::from_str("IMAGE"), EntrySource::Image);
        assert_eq!(EntrySource::from_str("order"), EntrySource::Order);
        assert_eq!(EntrySource::from_str("whatever"), EntrySource::Manual);
    }
}
