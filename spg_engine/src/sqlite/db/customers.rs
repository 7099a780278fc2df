use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Customer, CustomerAddress, CustomerDetails, ShippingAddress};

/// Returns the id of the customer with exactly these (already normalised) details, creating one if necessary.
pub async fn fetch_or_create_customer(
    details: &CustomerDetails,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
            INSERT INTO customers (first_name, last_name, email, phone) VALUES ($1, $2, $3, $4)
            ON CONFLICT (first_name, last_name, email, phone) DO NOTHING
        "#,
    )
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(&details.email)
    .bind(&details.phone)
    .execute(&mut *conn)
    .await?;
    let id: i64 = sqlx::query_scalar(
        "SELECT id FROM customers WHERE first_name = $1 AND last_name = $2 AND email = $3 AND phone = $4",
    )
    .bind(&details.first_name)
    .bind(&details.last_name)
    .bind(&details.email)
    .bind(&details.phone)
    .fetch_one(conn)
    .await?;
    if inserted.rows_affected() > 0 {
        debug!("🗃️ New customer #{id} created for {}", details.email);
    }
    Ok(id)
}

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

/// Clears any existing default address for the customer and stores `address` as the new default.
pub async fn save_default_address(
    customer_id: i64,
    address: &ShippingAddress,
    conn: &mut SqliteConnection,
) -> Result<CustomerAddress, sqlx::Error> {
    sqlx::query("UPDATE customer_addresses SET is_default = 0 WHERE customer_id = $1 AND is_default = 1")
        .bind(customer_id)
        .execute(&mut *conn)
        .await?;
    let saved = sqlx::query_as(
        r#"
            INSERT INTO customer_addresses
                (customer_id, address_line1, address_line2, city, state, postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(&address.address_line1)
    .bind(&address.address_line2)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .fetch_one(conn)
    .await?;
    Ok(saved)
}

pub async fn fetch_default_address(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CustomerAddress>, sqlx::Error> {
    let address = sqlx::query_as(
        "SELECT * FROM customer_addresses WHERE customer_id = $1 AND is_default = 1 ORDER BY id DESC LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(conn)
    .await?;
    Ok(address)
}
