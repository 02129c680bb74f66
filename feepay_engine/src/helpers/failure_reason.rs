use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Customer-facing buckets for upstream failure messages. Purely cosmetic: the raw reason is always kept in the
/// status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    ServiceUnavailable,
    InvalidDestination,
    ProductUnavailable,
    ProviderTimeout,
    Generic,
}

// Checked in order. Indonesian keywords come from the supplier's own messages.
const KEYWORDS: [(FailureCategory, &[&str]); 4] = [
    (FailureCategory::ServiceUnavailable, &["saldo", "balance", "insufficient"]),
    (FailureCategory::InvalidDestination, &["nomor", "number", "destination"]),
    (FailureCategory::ProductUnavailable, &["sku", "produk", "product"]),
    (FailureCategory::ProviderTimeout, &["timeout", "timed out", "server", "connection"]),
];

impl FailureCategory {
    pub fn from_reason(reason: &str) -> Self {
        let reason = reason.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| reason.contains(w)))
            .map(|(category, _)| *category)
            .unwrap_or(FailureCategory::Generic)
    }

    pub fn customer_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "The service is temporarily unavailable. Please try again later.",
            Self::InvalidDestination => {
                "The destination number or customer ID is invalid. Please check it and order again."
            },
            Self::ProductUnavailable => "This product is currently unavailable. Please choose another product.",
            Self::ProviderTimeout => "The provider did not respond in time. Please contact support with your order ID.",
            Self::Generic => "Your order could not be completed. Please contact support with your order ID.",
        }
    }
}

impl Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.customer_message())
    }
}
