mod delivery;
mod references;

pub use delivery::{add_business_days, estimate_delivery_date, MAX_DELIVERY_DAYS, MIN_DELIVERY_DAYS};
pub use references::{new_gateway_order_ref, normalize_customer};
