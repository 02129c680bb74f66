//! Digiflazz request and callback signatures.
//!
//! | call            | digest input                       |
//! |-----------------|------------------------------------|
//! | price list      | `username + api_key + "pricelist"` |
//! | deposit balance | `username + api_key + "depo"`      |
//! | transaction     | `username + api_key + ref_id`      |
//! | callback        | `username + api_key + ref_id`      |
//!
//! All digests are lowercase hex MD5.
use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

pub const PRICE_LIST_SUFFIX: &str = "pricelist";
pub const DEPOSIT_SUFFIX: &str = "depo";

pub fn sign(username: &str, api_key: &str, suffix: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(api_key.as_bytes());
    hasher.update(suffix.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn price_list_signature(username: &str, api_key: &str) -> String {
    sign(username, api_key, PRICE_LIST_SUFFIX)
}

pub fn deposit_signature(username: &str, api_key: &str) -> String {
    sign(username, api_key, DEPOSIT_SUFFIX)
}

pub fn transaction_signature(username: &str, api_key: &str, ref_id: &str) -> String {
    sign(username, api_key, ref_id)
}

/// Checks the `sign` field of a callback against the expected digest for `ref_id`. Comparison is constant-time and
/// case-sensitive: Digiflazz always sends lowercase hex. An empty API key never verifies.
pub fn verify_callback_signature(username: &str, api_key: &str, ref_id: &str, signature: &str) -> bool {
    if api_key.is_empty() {
        return false;
    }
    let expected = transaction_signature(username, api_key, ref_id);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
