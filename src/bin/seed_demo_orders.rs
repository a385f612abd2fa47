//! Utility to load the demo delivery orders into the database

use chrono::NaiveDate;
use nutrilens::config::Config;
use nutrilens::models::{Order, OrderCreate};

const PLATFORM: &str = "uber-eats";

const DEMO_ORDERS: &[(&str, &[&str], f64, &str)] = &[
    ("McDonald's", &["Big Mac", "Fries", "Coke"], 12.99, "2025-03-01"),
    ("KFC", &["Chicken Bucket", "Biscuits"], 15.49, "2025-03-05"),
    ("Starbucks", &["Caramel Macchiato", "Banana Bread"], 8.99, "2025-03-10"),
    ("Taco Bell", &["Crunchwrap Supreme", "Nachos"], 9.99, "2025-03-12"),
    ("Panda Express", &["Orange Chicken", "Fried Rice"], 10.49, "2025-03-15"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let db_path = config.database_path;
    println!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database = nutrilens::db::Database::open_migrated(&db_path)?;

    database.with_conn_mut(|conn| {
        if Order::platform_exists(conn, PLATFORM)? {
            println!("Platform {} already has orders, nothing to do", PLATFORM);
            return Ok(());
        }

        let tx = conn.transaction()?;
        for (restaurant, items, total, date) in DEMO_ORDERS {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| nutrilens::db::DbError::InvalidData(e.to_string()))?;
            let order = Order::create(
                &tx,
                &OrderCreate {
                    platform: PLATFORM.to_string(),
                    restaurant: restaurant.to_string(),
                    items: items.iter().map(|i| i.to_string()).collect(),
                    total: *total,
                    date,
                },
            )?;
            println!("  #{} {} {} ({} items)", order.id, order.date, order.restaurant, order.items.len());
        }
        tx.commit()?;
        println!("Seeded {} orders for {}", DEMO_ORDERS.len(), PLATFORM);
        Ok(())
    })?;

    Ok(())
}
