use std::fmt::Display;

/// What a Midtrans notification means for the order it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentVerdict {
    /// Funds are captured or settled and the fraud screen passed.
    Settle,
    /// Funds are captured but the fraud screen flagged the transaction.
    PendingReview,
    /// The customer has not paid yet.
    Pending,
    /// The payment will never complete. Carries the Midtrans transaction status.
    Failed(String),
    /// A status this client does not understand. The order must be left alone.
    Unknown(String),
}

impl Display for PaymentVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settle => write!(f, "settle"),
            Self::PendingReview => write!(f, "pending-review"),
            Self::Pending => write!(f, "pending"),
            Self::Failed(s) => write!(f, "failed ({s})"),
            Self::Unknown(s) => write!(f, "unknown ({s})"),
        }
    }
}

/// Collapses `transaction_status` and `fraud_status` into a [`PaymentVerdict`]. A missing fraud status counts as
/// `accept`, which is what Midtrans omits it for.
pub fn map_transaction_status(transaction_status: &str, fraud_status: Option<&str>) -> PaymentVerdict {
    let status = transaction_status.trim().to_ascii_lowercase();
    let fraud = fraud_status.map(|s| s.trim().to_ascii_lowercase()).filter(|s| !s.is_empty());
    let fraud_accepted = fraud.as_deref().map(|f| f == "accept").unwrap_or(true);
    match status.as_str() {
        "capture" | "settlement" if fraud_accepted => PaymentVerdict::Settle,
        "capture" | "settlement" => PaymentVerdict::PendingReview,
        "pending" => PaymentVerdict::Pending,
        "deny" | "expire" | "cancel" | "failure" => PaymentVerdict::Failed(status.clone()),
        _ => PaymentVerdict::Unknown(transaction_status.to_string()),
    }
}
