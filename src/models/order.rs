//! Delivery order model
//!
//! Orders are stored per platform. Listing sorts newest first, applies an
//! inclusive date filter, then pages the result.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const MAX_PAGE_SIZE: usize = 100;

/// A stored delivery order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub platform: String,
    pub restaurant: String,
    pub items: Vec<String>,
    pub total: f64,
    pub date: NaiveDate,
}

/// Data for creating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub platform: String,
    pub restaurant: String,
    pub items: Vec<String>,
    pub total: f64,
    pub date: NaiveDate,
}

/// One page of orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: usize,
    pub limit: usize,
    /// Orders matching the filter across all pages
    pub total_matching: usize,
    pub has_more: bool,
}

impl Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let items: String = row.get("items")?;
        let items = serde_json::from_str(&items)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        let date: String = row.get("order_date")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

        Ok(Self {
            id: row.get("id")?,
            platform: row.get("platform")?,
            restaurant: row.get("restaurant")?,
            items,
            total: row.get("total")?,
            date,
        })
    }

    pub fn create(conn: &Connection, data: &OrderCreate) -> DbResult<Self> {
        let items = serde_json::to_string(&data.items)
            .map_err(|e| crate::db::DbError::InvalidData(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO orders (platform, restaurant, items, total, order_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                normalize_platform(&data.platform),
                data.restaurant,
                items,
                data.total,
                data.date.format("%Y-%m-%d").to_string(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM orders WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All orders for a platform, newest first
    pub fn list_for_platform(conn: &Connection, platform: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM orders WHERE platform = ?1 ORDER BY order_date DESC, id DESC",
        )?;

        let orders = stmt
            .query_map([normalize_platform(platform)], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }

    pub fn platform_exists(conn: &Connection, platform: &str) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE platform = ?1",
            [normalize_platform(platform)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_platforms(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare("SELECT DISTINCT platform FROM orders ORDER BY platform")?;
        let platforms = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(platforms)
    }
}

/// Platform keys are stored lowercase and trimmed
pub fn normalize_platform(platform: &str) -> String {
    platform.trim().to_lowercase()
}

/// Newest first; ties keep the later insert on top
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

/// Keep orders dated within `[start, end]`. Either bound may be open.
pub fn filter_by_date(
    orders: Vec<Order>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|o| start.map_or(true, |s| o.date >= s))
        .filter(|o| end.map_or(true, |e| o.date <= e))
        .collect()
}

/// Slice one 1-based page. Page 0 is read as page 1; limit is clamped to
/// `1..=MAX_PAGE_SIZE`.
pub fn paginate(orders: Vec<Order>, page: usize, limit: usize) -> OrderPage {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let total_matching = orders.len();
    let skip = (page - 1).saturating_mul(limit);

    let page_orders: Vec<Order> = orders.into_iter().skip(skip).take(limit).collect();
    let has_more = skip.saturating_add(page_orders.len()) < total_matching;

    OrderPage {
        orders: page_orders,
        page,
        limit,
        total_matching,
        has_more,
    }
}
