#![allow(dead_code)]
pub mod fakes;

use spg_engine::{db_types::Order, SqliteDatabase};

/// Every order in the database, oldest first.
pub async fn all_orders(db: &SqliteDatabase) -> Vec<Order> {
    sqlx::query_as("SELECT * FROM orders ORDER BY id ASC").fetch_all(db.pool()).await.expect("Error fetching orders")
}
