use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{ProductVariant, VariantKey};

/// Conditionally decrements stock in a single statement. Returns `true` if the stock was decremented.
///
/// Two concurrent callers competing for the last units cannot both succeed, since the availability check and the
/// decrement are the same write.
pub async fn decrement(key: &VariantKey, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    if quantity <= 0 {
        return Ok(false);
    }
    let result = sqlx::query(
        r#"
            UPDATE product_variants SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE product_id = $2 AND size = $3 AND stock >= $1
        "#,
    )
    .bind(quantity)
    .bind(&key.product_id)
    .bind(&key.size)
    .execute(conn)
    .await?;
    trace!("🗃️ Decrement {quantity} x {key}: {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

pub async fn available(key: &VariantKey, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM product_variants WHERE product_id = $1 AND size = $2")
        .bind(&key.product_id)
        .bind(&key.size)
        .fetch_optional(conn)
        .await?;
    Ok(stock.unwrap_or(0))
}

/// Creates the variant or overwrites its price and stock. The catalogue owns variants; this exists for seeding.
pub async fn upsert_variant(
    key: &VariantKey,
    price: i64,
    stock: i64,
    conn: &mut SqliteConnection,
) -> Result<ProductVariant, sqlx::Error> {
    let variant = sqlx::query_as(
        r#"
            INSERT INTO product_variants (product_id, size, price, stock) VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, size) DO UPDATE SET
                price = excluded.price,
                stock = excluded.stock,
                updated_at = CURRENT_TIMESTAMP
            RETURNING id, product_id, size, price, stock;
        "#,
    )
    .bind(&key.product_id)
    .bind(&key.size)
    .bind(price)
    .bind(stock)
    .fetch_one(conn)
    .await?;
    Ok(variant)
}
