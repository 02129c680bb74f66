use chrono::Utc;
use rand::{distributions::Uniform, Rng};

use crate::db_types::OrderId;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_tag(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..ALPHABET.len());
    (0..len).map(|_| ALPHABET[rng.sample(dist)] as char).collect()
}

/// `FP` + 8 random uppercase alphanumerics + unix seconds.
pub fn new_order_id() -> OrderId {
    OrderId(format!("FP{}{}", random_tag(8), Utc::now().timestamp()))
}

/// `PAY` + 5 random uppercase alphanumerics + unix seconds.
pub fn new_payment_id() -> String {
    format!("PAY{}{}", random_tag(5), Utc::now().timestamp())
}

/// `USDT` + 8 random uppercase alphanumerics + unix seconds.
pub fn new_conversion_id() -> String {
    format!("USDT{}{}", random_tag(8), Utc::now().timestamp())
}
