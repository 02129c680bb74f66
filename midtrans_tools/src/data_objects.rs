use serde::{Deserialize, Serialize};

use crate::status::{map_transaction_status, PaymentVerdict};

//--------------------------------------     Notification     ---------------------------------------------------------
/// The HTTP notification body Midtrans posts after every transaction status change. Only the fields the storefront
/// uses are captured; Midtrans sends many more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notification {
    pub order_id: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub transaction_time: Option<String>,
}

impl Notification {
    pub fn verdict(&self) -> PaymentVerdict {
        map_transaction_status(&self.transaction_status, self.fraud_status.as_deref())
    }
}

//--------------------------------------      SnapRequest     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub item_details: Vec<ItemDetails>,
    pub enabled_payments: Vec<String>,
    pub credit_card: CreditCard,
    pub expiry: Expiry,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Whole rupiah. Midtrans rejects fractional amounts.
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetails {
    pub id: String,
    pub price: i64,
    pub quantity: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreditCard {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Expiry {
    pub unit: String,
    pub duration: u32,
}

pub const ENABLED_PAYMENTS: [&str; 9] =
    ["bca_va", "bni_va", "bri_va", "permata_va", "other_va", "gopay", "qris", "dana", "ovo"];

/// Snap tokens expire after this many hours.
pub const CHECKOUT_EXPIRY_HOURS: u32 = 24;

impl SnapRequest {
    pub fn new(order_id: &str, gross_amount: i64, email: &str, item_id: &str, item_name: &str) -> Self {
        Self {
            transaction_details: TransactionDetails { order_id: order_id.to_string(), gross_amount },
            customer_details: CustomerDetails { first_name: "Customer".to_string(), email: email.to_string() },
            item_details: vec![ItemDetails {
                id: item_id.to_string(),
                price: gross_amount,
                quantity: 1,
                name: item_name.to_string(),
            }],
            enabled_payments: ENABLED_PAYMENTS.iter().map(|s| s.to_string()).collect(),
            credit_card: CreditCard { secure: true },
            expiry: Expiry { unit: "hours".to_string(), duration: CHECKOUT_EXPIRY_HOURS },
        }
    }
}

//--------------------------------------       SnapToken      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapToken {
    pub token: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}
