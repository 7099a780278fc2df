//! `SqliteDatabase` is a concrete implementation of a storefront payment gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Composite operations open a transaction and pass it through to the free functions in [`super::db`].
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{customers, db_url, new_pool, order_items, orders, payment_logs, payments, sessions, stock};
use crate::{
    db_types::{
        Customer,
        CustomerAddress,
        CustomerDetails,
        DeliveryStatus,
        NewOrder,
        NewOrderItem,
        NewPayment,
        NewPaymentLog,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentLog,
        PaymentStatus,
        ProductVariant,
        ShippingAddress,
        VariantKey,
    },
    traits::{
        CustomerManagement,
        MessagingSessions,
        PaymentTransition,
        StockDecrement,
        StockLedger,
        StorefrontDatabase,
        StorefrontDbError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn next_order_id(&self) -> Result<OrderId, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let max = orders::max_order_sequence(&mut conn).await?;
        Ok(OrderId::from_sequence(max.unwrap_or(0) + 1))
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<(Order, Vec<OrderItem>), StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            saved.push(order_items::insert_item(order.id, item, &mut tx).await?);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {} and {} items", order.order_id, order.id, saved.len());
        Ok((order, saved))
    }

    async fn delete_unpaid_order(&self, id: i64) -> Result<bool, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_unpaid_order(id, &mut conn).await?;
        if deleted {
            debug!("🗃️ Unpaid order #{id} has been removed");
        }
        Ok(deleted)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_order_items(&self, id: i64) -> Result<Vec<OrderItem>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(order_items::fetch_items_for_order(id, &mut conn).await?)
    }

    async fn confirm_cod_order(&self, payment: NewPayment) -> Result<Option<(Order, Payment)>, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let order_id = payment.order_id;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        let pending = [OrderStatusType::Pending];
        let order = orders::update_order_status(order_id, &pending, OrderStatusType::Confirmed, None, &mut tx).await?;
        match order {
            Some(order) => {
                tx.commit().await?;
                debug!("🗃️ Cash-on-delivery order {} is confirmed", order.order_id);
                Ok(Some((order, payment)))
            },
            None => {
                tx.rollback().await?;
                warn!("🗃️ Order #{order_id} was not pending. Cash-on-delivery confirmation rolled back");
                Ok(None)
            },
        }
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        payments::insert_payment(payment, &mut conn).await
    }

    async fn fetch_payment_by_ref(&self, gateway_order_ref: &str) -> Result<Option<Payment>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_ref(gateway_order_ref, &mut conn).await?)
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_for_order(order_id, &mut conn).await?)
    }

    async fn apply_payment_outcome(
        &self,
        gateway_order_ref: &str,
        payment_status: PaymentStatus,
        order_status: OrderStatusType,
        gateway_response: Option<String>,
    ) -> Result<PaymentTransition, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let settled = match payment_status {
            PaymentStatus::Pending => None,
            status => payments::settle_pending_payment(gateway_order_ref, status, gateway_response, &mut tx).await?,
        };
        let payment_changed = settled.is_some();
        let payment = match settled {
            Some(p) => p,
            None => payments::fetch_payment_by_ref(gateway_order_ref, &mut tx)
                .await?
                .ok_or_else(|| StorefrontDbError::PaymentNotFound(gateway_order_ref.to_string()))?,
        };
        let order = match order_status {
            OrderStatusType::Pending => None,
            to => {
                let pending = [OrderStatusType::Pending];
                orders::update_order_status(payment.order_id, &pending, to, None, &mut tx).await?
            },
        };
        tx.commit().await?;
        trace!(
            "🗃️ Payment outcome for {gateway_order_ref}: payment changed: {payment_changed}, order changed: {}",
            order.is_some()
        );
        Ok(PaymentTransition { payment, payment_changed, order })
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: &[OrderStatusType],
        to: OrderStatusType,
        delivery: Option<DeliveryStatus>,
    ) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::update_order_status(id, from, to, delivery, &mut conn).await?)
    }

    async fn mark_dispatch_sent(&self, id: i64) -> Result<Option<Order>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::mark_dispatch_sent(id, &mut conn).await?)
    }

    async fn append_payment_log(&self, log: NewPaymentLog) -> Result<PaymentLog, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        let entry = payment_logs::append(log, &mut conn).await?;
        trace!("🗃️ Payment log #{} ({}) appended", entry.id, entry.event_type);
        Ok(entry)
    }

    async fn fetch_payment_logs(&self, order_id: i64) -> Result<Vec<PaymentLog>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_logs::fetch_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_payment_logs_for_ref(&self, gateway_order_ref: &str) -> Result<Vec<PaymentLog>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_logs::fetch_for_ref(gateway_order_ref, &mut conn).await?)
    }
}

impl StockLedger for SqliteDatabase {
    async fn decrement_stock(&self, key: &VariantKey, quantity: i64) -> Result<StockDecrement, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        if stock::decrement(key, quantity, &mut conn).await? {
            Ok(StockDecrement::Decremented)
        } else {
            Ok(StockDecrement::Insufficient)
        }
    }

    async fn available_stock(&self, key: &VariantKey) -> Result<i64, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stock::available(key, &mut conn).await?)
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn resolve_customer(&self, details: &CustomerDetails) -> Result<i64, StorefrontDbError> {
        let normalized = crate::helpers::normalize_customer(details);
        let mut conn = self.pool.acquire().await?;
        customers::fetch_or_create_customer(&normalized, &mut conn)
            .await
            .map_err(|e| StorefrontDbError::CustomerError(e.to_string()))
    }

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_customer(id, &mut conn).await?)
    }

    async fn save_default_address(
        &self,
        customer_id: i64,
        address: &ShippingAddress,
    ) -> Result<CustomerAddress, StorefrontDbError> {
        let mut tx = self.pool.begin().await?;
        let saved = customers::save_default_address(customer_id, address, &mut tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn fetch_default_address(&self, customer_id: i64) -> Result<Option<CustomerAddress>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(customers::fetch_default_address(customer_id, &mut conn).await?)
    }
}

impl MessagingSessions for SqliteDatabase {
    async fn record_inbound_message(&self, phone: &str, at: DateTime<Utc>) -> Result<(), StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        sessions::record_inbound(phone, at, &mut conn).await?;
        trace!("🗃️ Inbound message from {phone} recorded at {at}");
        Ok(())
    }

    async fn last_inbound_message(&self, phone: &str) -> Result<Option<DateTime<Utc>>, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sessions::last_inbound(phone, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates or overwrites a product variant. Variants belong to the catalogue, so this is only used for seeding.
    pub async fn upsert_variant(
        &self,
        key: &VariantKey,
        price: i64,
        stock: i64,
    ) -> Result<ProductVariant, StorefrontDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(stock::upsert_variant(key, price, stock, &mut conn).await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
