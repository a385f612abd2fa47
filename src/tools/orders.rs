//! Delivery Order Tools
//!
//! Storing orders, paging order history, and order nutrition reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{parse_date_arg, ToolError, ToolResult};
use crate::db::Database;
use crate::estimator::NutritionEstimator;
use crate::models::{
    filter_by_date, paginate, EntrySource, Order, OrderCreate, OrderPage, DEFAULT_PAGE_SIZE,
};
use crate::nutrition::{aggregate, NutrientEntry, NutrientTotals, RecordedAt};

pub const PLATFORM_NOT_FOUND: &str = "Platform not found";

/// Query for listing orders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub platform: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    /// Inclusive `YYYY-MM-DD`
    pub start: Option<String>,
    /// Inclusive `YYYY-MM-DD`
    pub end: Option<String>,
}

/// Response for order_report
#[derive(Debug, Serialize)]
pub struct OrderReport {
    pub platform: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub order_count: usize,
    pub item_count: usize,
    pub items: Vec<NutrientEntry>,
    pub totals: NutrientTotals,
    /// History rows written when a user id was given
    pub logged: usize,
}

// ============================================================================
// Order Tools
// ============================================================================

/// Store a delivery order
pub fn add_order(
    db: &Database,
    platform: &str,
    restaurant: &str,
    items: Vec<String>,
    total: f64,
    date: &str,
) -> ToolResult<Order> {
    if platform.trim().is_empty() {
        return Err(ToolError::InvalidInput("platform is required".to_string()));
    }
    if restaurant.trim().is_empty() {
        return Err(ToolError::InvalidInput("restaurant is required".to_string()));
    }
    if !total.is_finite() || total < 0.0 {
        return Err(ToolError::InvalidInput(
            "total must be a non-negative number".to_string(),
        ));
    }
    let date = parse_date_arg("date", Some(date))?
        .ok_or_else(|| ToolError::InvalidInput("date is required".to_string()))?;

    let items = items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();

    let data = OrderCreate {
        platform: platform.to_string(),
        restaurant: restaurant.trim().to_string(),
        items,
        total,
        date,
    };

    let order = db
        .with_conn(|conn| Order::create(conn, &data))
        .map_err(|e| ToolError::Failed(format!("Failed to create order: {}", e)))?;
    tracing::info!(platform = %order.platform, id = order.id, "order stored");
    Ok(order)
}

/// Orders for a platform within the date range, newest first
fn matching_orders(
    db: &Database,
    platform: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ToolResult<Vec<Order>> {
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ToolError::InvalidInput(
                "start date must not be after end date".to_string(),
            ));
        }
    }

    let orders = db
        .with_conn(|conn| {
            if !Order::platform_exists(conn, platform)? {
                return Ok(None);
            }
            Order::list_for_platform(conn, platform).map(Some)
        })
        .map_err(|e| ToolError::Failed(format!("Failed to list orders: {}", e)))?
        .ok_or_else(|| ToolError::NotFound(PLATFORM_NOT_FOUND.to_string()))?;

    Ok(filter_by_date(orders, start, end))
}

/// One page of a platform's order history
pub fn list_orders(db: &Database, query: &OrderQuery) -> ToolResult<OrderPage> {
    let start = parse_date_arg("start date", query.start.as_deref())?;
    let end = parse_date_arg("end date", query.end.as_deref())?;
    let orders = matching_orders(db, &query.platform, start, end)?;

    Ok(paginate(
        orders,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    ))
}

/// Estimate and total the nutrition of every item ordered in the range.
///
/// With a `user_id`, the estimated items are also written to that user's
/// history, dated by their order.
pub async fn order_report(
    db: &Database,
    estimator: &dyn NutritionEstimator,
    platform: &str,
    start: Option<&str>,
    end: Option<&str>,
    user_id: Option<&str>,
) -> ToolResult<OrderReport> {
    let start = parse_date_arg("start date", start)?;
    let end = parse_date_arg("end date", end)?;
    let orders = matching_orders(db, platform, start, end)?;

    // One estimate per order: every record from a call carries that order's
    // date, however many records the estimator splits the items into.
    let mut items = Vec::new();
    for order in orders.iter().filter(|o| !o.items.is_empty()) {
        let estimated = estimator.estimate_items(&order.items).await.map_err(|e| {
            tracing::warn!(error = %e, platform, order_id = order.id, "order nutrition estimate failed");
            ToolError::Failed(format!("Failed to estimate order nutrition: {}", e))
        })?;
        if estimated.len() != order.items.len() {
            tracing::debug!(
                order_id = order.id,
                requested = order.items.len(),
                returned = estimated.len(),
                "estimator record count differs from item count"
            );
        }
        items.extend(
            estimated
                .into_iter()
                .map(|entry| entry.recorded(RecordedAt::Date(order.date))),
        );
    }

    let logged = match user_id {
        Some(user_id) => {
            super::history::store_entries(db, user_id, EntrySource::Order, &items, chrono::Utc::now())?
                .len()
        }
        None => 0,
    };

    Ok(OrderReport {
        platform: platform.to_string(),
        start,
        end,
        order_count: orders.len(),
        item_count: orders.iter().map(|o| o.items.len()).sum(),
        totals: aggregate(&items),
        items,
        logged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_migrated(dir.path().join("orders.db")).unwrap();
        (dir, db)
    }

    fn seed(db: &Database) {
        for (restaurant, date) in [
            ("McDonald's", "2025-03-01"),
            ("Subway", "2025-03-05"),
            ("Chipotle", "2025-03-10"),
        ] {
            add_order(db, "uber-eats", restaurant, vec!["Meal".into()], 12.0, date).unwrap();
        }
    }

    #[test]
    fn test_add_order_validates() {
        let (_dir, db) = test_db();
        assert!(matches!(
            add_order(&db, "", "X", vec![], 1.0, "2025-03-01"),
            Err(ToolError::InvalidInput(_))
        ));
        assert!(matches!(
            add_order(&db, "uber-eats", "X", vec![], -1.0, "2025-03-01"),
            Err(ToolError::InvalidInput(_))
        ));
        assert!(matches!(
            add_order(&db, "uber-eats", "X", vec![], 1.0, "March 1"),
            Err(ToolError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_orders_pages_newest_first() {
        let (_dir, db) = test_db();
        seed(&db);

        let page = list_orders(
            &db,
            &OrderQuery {
                platform: "uber-eats".into(),
                limit: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(page.orders[0].restaurant, "Chipotle");
        assert_eq!(page.orders.len(), 2);
        assert!(page.has_more);
    }

    #[test]
    fn test_list_orders_date_filter() {
        let (_dir, db) = test_db();
        seed(&db);

        let page = list_orders(
            &db,
            &OrderQuery {
                platform: "uber-eats".into(),
                start: Some("2025-03-05".into()),
                end: Some("2025-03-10".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(page.total_matching, 2);
        assert!(!page.has_more);
    }

    #[test]
    fn test_list_orders_errors() {
        let (_dir, db) = test_db();
        seed(&db);

        let missing = list_orders(
            &db,
            &OrderQuery {
                platform: "doordash".into(),
                ..Default::default()
            },
        );
        assert_eq!(missing, Err(ToolError::NotFound(PLATFORM_NOT_FOUND.into())));

        let reversed = list_orders(
            &db,
            &OrderQuery {
                platform: "uber-eats".into(),
                start: Some("2025-03-10".into()),
                end: Some("2025-03-01".into()),
                ..Default::default()
            },
        );
        assert!(matches!(reversed, Err(ToolError::InvalidInput(_))));
    }
}
