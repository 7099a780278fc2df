use sqlx::SqliteConnection;

use crate::db_types::{NewPaymentLog, PaymentLog};

/// Appends an entry to the payment audit trail. Entries are never updated or deleted.
pub async fn append(log: NewPaymentLog, conn: &mut SqliteConnection) -> Result<PaymentLog, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO payment_logs (order_id, gateway_order_ref, event_type, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(log.order_id)
    .bind(log.gateway_order_ref)
    .bind(log.event_type)
    .bind(log.payload.to_string())
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn fetch_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<PaymentLog>, sqlx::Error> {
    let logs = sqlx::query_as("SELECT * FROM payment_logs WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(logs)
}

pub async fn fetch_for_ref(gateway_order_ref: &str, conn: &mut SqliteConnection) -> Result<Vec<PaymentLog>, sqlx::Error> {
    let logs = sqlx::query_as("SELECT * FROM payment_logs WHERE gateway_order_ref = $1 ORDER BY id ASC")
        .bind(gateway_order_ref)
        .fetch_all(conn)
        .await?;
    Ok(logs)
}
