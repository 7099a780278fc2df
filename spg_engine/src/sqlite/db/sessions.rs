use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Records an inbound message time. Older timestamps never overwrite newer ones.
pub async fn record_inbound(phone: &str, at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO whatsapp_sessions (phone, last_inbound_at) VALUES ($1, $2)
            ON CONFLICT (phone) DO UPDATE SET
                last_inbound_at = MAX(last_inbound_at, excluded.last_inbound_at),
                updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(phone)
    .bind(at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn last_inbound(phone: &str, conn: &mut SqliteConnection) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let at = sqlx::query_scalar("SELECT last_inbound_at FROM whatsapp_sessions WHERE phone = $1")
        .bind(phone)
        .fetch_optional(conn)
        .await?;
    Ok(at)
}
