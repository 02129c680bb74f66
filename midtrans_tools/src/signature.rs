//! Midtrans HTTP notification signatures.
//!
//! `signature_key = hex(sha512(order_id + status_code + gross_amount + server_key))`
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recomputes the signature and compares it with the one Midtrans sent, in constant time.
///
/// An empty server key never verifies. Anyone can compute the digest without a secret.
pub fn verify_notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    signature_key: &str,
) -> bool {
    if server_key.is_empty() {
        return false;
    }
    let expected = notification_signature(order_id, status_code, gross_amount, server_key);
    expected.as_bytes().ct_eq(signature_key.trim().as_bytes()).into()
}
