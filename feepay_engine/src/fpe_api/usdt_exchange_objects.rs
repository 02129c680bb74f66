use fpg_common::UsdtAmount;
use serde::{Deserialize, Serialize};

use crate::db_types::{UsdtConversionStatus, UsdtNetwork};

/// A customer's request to sell USDT. Any rupiah figure the client computed for display is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: UsdtAmount,
    pub network: UsdtNetwork,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
    /// Reference to the uploaded on-chain transfer proof
    pub proof_reference: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionQueryFilter {
    pub status: Option<UsdtConversionStatus>,
    pub network: Option<UsdtNetwork>,
    pub customer_email: Option<String>,
}

impl ConversionQueryFilter {
    pub fn with_status(mut self, status: UsdtConversionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_network(mut self, network: UsdtNetwork) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_customer_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.network.is_none() && self.customer_email.is_none()
    }
}

/// An admin's decision on a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResolution {
    pub status: UsdtConversionStatus,
    pub admin_id: i64,
    pub note: Option<String>,
}
