use crate::{
    db_types::{Customer, CustomerAddress, CustomerDetails, ShippingAddress},
    traits::StorefrontDbError,
};

#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    /// Returns the id of the customer whose normalised first name, last name, email and phone all match the given
    /// details, creating the customer if there is no such record. A single differing field yields a new customer.
    async fn resolve_customer(&self, details: &CustomerDetails) -> Result<i64, StorefrontDbError>;

    async fn fetch_customer(&self, id: i64) -> Result<Option<Customer>, StorefrontDbError>;

    /// Stores the address as the customer's default, clearing any previous default.
    async fn save_default_address(
        &self,
        customer_id: i64,
        address: &ShippingAddress,
    ) -> Result<CustomerAddress, StorefrontDbError>;

    async fn fetch_default_address(&self, customer_id: i64) -> Result<Option<CustomerAddress>, StorefrontDbError>;
}
