use chrono::Utc;
use rand::Rng;
use spg_common::helpers::normalize_text;

use crate::db_types::CustomerDetails;

/// A reference for the payment gateway that is unique across servers and restarts:
/// `spg_<unix millis>_<16 random hex digits>`.
pub fn new_gateway_order_ref() -> String {
    let nonce: u64 = rand::thread_rng().gen();
    format!("spg_{}_{nonce:016x}", Utc::now().timestamp_millis())
}

/// The canonical form of a customer identity. Names and email are trimmed and lowercased; the phone number is
/// trimmed.
pub fn normalize_customer(details: &CustomerDetails) -> CustomerDetails {
    CustomerDetails {
        first_name: normalize_text(&details.first_name),
        last_name: normalize_text(&details.last_name),
        email: normalize_text(&details.email),
        phone: details.phone.trim().to_string(),
    }
}
