use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::is_unique_violation;
use crate::{
    db_types::{DeliveryStatus, NewOrder, Order, OrderId, OrderStatusType, ORDER_ID_PREFIX},
    traits::StorefrontDbError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// A clash on the human-readable `order_id` is reported as [`StorefrontDbError::OrderAlreadyExists`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StorefrontDbError> {
    let order_id = order.order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                first_name,
                last_name,
                email,
                phone,
                address_line1,
                address_line2,
                city,
                state,
                postal_code,
                country,
                subtotal,
                tax,
                shipping,
                total,
                currency,
                payment_method,
                estimated_delivery
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.customer_id)
    .bind(order.customer.first_name)
    .bind(order.customer.last_name)
    .bind(order.customer.email)
    .bind(order.customer.phone)
    .bind(order.shipping_address.address_line1)
    .bind(order.shipping_address.address_line2)
    .bind(order.shipping_address.city)
    .bind(order.shipping_address.state)
    .bind(order.shipping_address.postal_code)
    .bind(order.shipping_address.country)
    .bind(order.subtotal.value())
    .bind(order.tax.value())
    .bind(order.shipping.value())
    .bind(order.total.value())
    .bind(order.currency)
    .bind(order.payment_method)
    .bind(order.estimated_delivery)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if is_unique_violation(&e) => Err(StorefrontDbError::OrderAlreadyExists(order_id)),
        Err(e) => Err(e.into()),
    }
}

/// The highest sequence number among `ORD###` order ids, or `None` if there are no such orders yet.
pub async fn max_order_sequence(conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let prefix_len = ORDER_ID_PREFIX.len() as i64;
    let seq: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(SUBSTR(order_id, $1) AS INTEGER)) FROM orders WHERE order_id LIKE $2 || '%'",
    )
    .bind(prefix_len + 1)
    .bind(ORDER_ID_PREFIX)
    .fetch_one(conn)
    .await?;
    Ok(seq)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Compare-and-swap on the order status. The update only happens if the current status is one of `from`.
///
/// Returns the updated order if the swap happened, and `None` otherwise.
pub async fn update_order_status(
    id: i64,
    from: &[OrderStatusType],
    to: OrderStatusType,
    delivery: Option<DeliveryStatus>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, order_status = ");
    builder.push_bind(to);
    if let Some(delivery) = delivery {
        builder.push(", delivery_status = ");
        builder.push_bind(delivery);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND order_status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING *");
    let order: Option<Order> = builder.build_query_as().fetch_optional(conn).await?;
    match &order {
        Some(o) => debug!("📝️ Order {} moved to {to}", o.order_id),
        None => trace!("📝️ Order #{id} was not in one of {from:?}. Status left unchanged"),
    }
    Ok(order)
}

/// Sets the dispatch flag and marks the order as shipped, but only if the flag was not already set and the order is
/// still confirmed or completed. A delivered order stays delivered.
pub async fn mark_dispatch_sent(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                dispatch_msg = 1,
                delivery_status = CASE WHEN delivery_status = $1 THEN delivery_status ELSE $2 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND dispatch_msg = 0 AND order_status IN ($4, $5) AND delivery_status IN ($6, $2, $1)
            RETURNING *;
        "#,
    )
    .bind(DeliveryStatus::Delivered)
    .bind(DeliveryStatus::Shipped)
    .bind(id)
    .bind(OrderStatusType::Confirmed)
    .bind(OrderStatusType::Completed)
    .bind(DeliveryStatus::Pending)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Deletes the order (its items go with it) only if no payment row references it.
pub async fn delete_unpaid_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM orders WHERE id = $1 AND NOT EXISTS (SELECT 1 FROM payments WHERE order_id = $1)")
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}
