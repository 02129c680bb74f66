use std::fmt::Display;

use fpg_common::Rupiah;
use serde::{Deserialize, Serialize};

//--------------------------------------   TransactionStatus  ---------------------------------------------------------
/// The `status` field Digiflazz reports on transactions and callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// `Sukses`: the product was delivered.
    Success,
    /// `Gagal`: the supplier gave up on the transaction.
    Failed,
    /// `Pending` or anything else the supplier may invent.
    Pending(String),
}

impl From<&str> for TransactionStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sukses" | "success" => Self::Success,
            "gagal" | "failed" | "failure" => Self::Failed,
            _ => Self::Pending(value.to_string()),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Sukses"),
            Self::Failed => write!(f, "Gagal"),
            Self::Pending(s) => write!(f, "{s}"),
        }
    }
}

//--------------------------------------     PriceListItem    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceListItem {
    pub buyer_sku_code: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// Supplier cost price
    pub price: Rupiah,
    #[serde(default)]
    pub buyer_product_status: bool,
    #[serde(default)]
    pub seller_product_status: bool,
}

impl PriceListItem {
    /// Only products that both sides have enabled can be ordered.
    pub fn is_available(&self) -> bool {
        self.buyer_product_status && self.seller_product_status
    }
}

//--------------------------------------      Transaction     ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_id: String,
    #[serde(default)]
    pub customer_no: Option<String>,
    #[serde(default)]
    pub buyer_sku_code: Option<String>,
    #[serde(default)]
    pub message: String,
    pub status: String,
    /// Response code
    #[serde(default)]
    pub rc: Option<String>,
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub price: Option<Rupiah>,
}

impl Transaction {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from(self.status.as_str())
    }

    /// The serial number, if the supplier sent a non-empty one.
    pub fn serial_number(&self) -> Option<&str> {
        self.sn.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

//--------------------------------------        Balance       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub deposit: Rupiah,
}

//--------------------------------------    CallbackPayload   ---------------------------------------------------------
/// The body Digiflazz posts to the callback URL once a transaction settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub data: CallbackData,
    #[serde(default)]
    pub sign: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackData {
    pub ref_id: String,
    pub status: String,
    #[serde(default)]
    pub sn: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CallbackData {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from(self.status.as_str())
    }
}
