use crate::{db_types::VariantKey, traits::StorefrontDbError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    Decremented,
    Insufficient,
}

/// Inventory for product variants.
///
/// There is no increment operation. Cancelled and failed orders do not return stock.
#[allow(async_fn_in_trait)]
pub trait StockLedger {
    /// Atomically removes `quantity` units from the variant's stock if, and only if, at least that many are
    /// available. The stock is never partially decremented and never goes negative.
    async fn decrement_stock(&self, key: &VariantKey, quantity: i64) -> Result<StockDecrement, StorefrontDbError>;

    /// The number of units currently in stock. This is advisory: it may be stale by the time a decrement happens.
    /// Unknown variants have zero stock.
    async fn available_stock(&self, key: &VariantKey) -> Result<i64, StorefrontDbError>;
}
