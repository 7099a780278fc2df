use log::debug;
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    traits::StorefrontDbError,
};

/// Stores a payment record. There can be at most one payment per order, and gateway references are unique.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, StorefrontDbError> {
    let label = payment.gateway_order_ref.clone().unwrap_or_else(|| format!("order #{}", payment.order_id));
    let result = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, payment_method, gateway_order_ref, amount, currency, payment_status, payment_response)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.payment_method)
    .bind(payment.gateway_order_ref)
    .bind(payment.amount.value())
    .bind(payment.currency)
    .bind(payment.payment_status)
    .bind(payment.payment_response)
    .fetch_one(conn)
    .await;
    match result {
        Ok(payment) => Ok(payment),
        Err(e) if is_unique_violation(&e) => Err(StorefrontDbError::PaymentAlreadyExists(label)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_payment_by_ref(
    gateway_order_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE gateway_order_ref = $1")
        .bind(gateway_order_ref)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Moves a `pending` payment to `status`. Returns `None` if the payment was no longer pending.
pub async fn settle_pending_payment(
    gateway_order_ref: &str,
    status: PaymentStatus,
    response: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                payment_status = $1,
                payment_response = COALESCE($2, payment_response),
                updated_at = CURRENT_TIMESTAMP
            WHERE gateway_order_ref = $3 AND payment_status = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(response)
    .bind(gateway_order_ref)
    .bind(PaymentStatus::Pending)
    .fetch_optional(conn)
    .await?;
    if payment.is_some() {
        debug!("🗃️ Payment {gateway_order_ref} is now {status}");
    }
    Ok(payment)
}
