use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const HUB_SIGNATURE_PREFIX: &str = "sha256=";

/// HMAC-SHA256 over the concatenation of `parts`.
fn mac_over(secret: &str, parts: &[&[u8]]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| error!("🔐️ Could not initialise the HMAC. {e}"))
        .ok()?;
    parts.iter().for_each(|p| mac.update(p));
    Some(mac)
}

/// The gateway's webhook signature: base64(HMAC-SHA256(secret, timestamp + body)).
pub fn calculate_webhook_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    mac_over(secret, &[timestamp.as_bytes(), body])
        .map(|mac| base64::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Checks a gateway webhook signature in constant time.
pub fn verify_webhook_signature(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::decode(signature.trim()) else {
        debug!("🔐️ Webhook signature is not valid base64");
        return false;
    };
    mac_over(secret, &[timestamp.as_bytes(), body]).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// The WhatsApp webhook signature, as sent in `X-Hub-Signature-256`: `sha256=` + hex(HMAC-SHA256(secret, body)).
pub fn calculate_hub_signature(secret: &str, body: &[u8]) -> String {
    mac_over(secret, &[body])
        .map(|mac| format!("{HUB_SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes())))
        .unwrap_or_default()
}

/// Checks an `X-Hub-Signature-256` header value in constant time.
pub fn verify_hub_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Some(hex_sig) = signature.trim().strip_prefix(HUB_SIGNATURE_PREFIX) else {
        debug!("🔐️ Hub signature does not start with {HUB_SIGNATURE_PREFIX}");
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        debug!("🔐️ Hub signature is not valid hex");
        return false;
    };
    mac_over(secret, &[body]).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

/// Compares two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
