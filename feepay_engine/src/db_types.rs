use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use fpg_common::{Rupiah, UsdtAmount};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle state of an order. The same type is stored in `orders.status` and `order_status_histories.status`.
///
/// The only legal transitions are:
///
/// | From \ To  | pending | processing | success | failed |
/// |------------|---------|------------|---------|--------|
/// | pending    | -       | ok         | -       | ok     |
/// | processing | -       | -          | ok      | ok     |
/// | success    | -       | -          | -       | -      |
/// | failed     | -       | -          | -       | -      |
///
/// `pending -> failed` is the direct-reject path: the payment was denied, expired or rejected before anything was sent
/// to the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Waiting for payment
    Pending,
    /// Paid. The order has been (or is about to be) handed to the supplier.
    Processing,
    /// The supplier confirmed delivery.
    Success,
    /// Payment was rejected, or the supplier failed to deliver.
    Failed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (Pending, Processing) | (Pending, Failed) | (Processing, Success) | (Processing, Failed))
    }

    /// Returns `next` if the move from `self` is legal.
    pub fn transition(self, next: OrderStatusType) -> Result<OrderStatusType, IllegalTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition { from: self, to: next })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("An order cannot move from {from} to {to}")]
pub struct IllegalTransition {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Success => write!(f, "success"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The externally visible order reference, e.g. `FPQ7K2M9XA1717200000`. It doubles as the correlation id for the
/// payment gateway and the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub sku: String,
    pub product_name: String,
    /// Phone number, meter number or game account the product is delivered to
    pub target_number: String,
    pub customer_email: String,
    /// Price snapshot taken at creation. Never changes afterwards.
    pub total_price: Rupiah,
    pub status: OrderStatusType,
    /// Supplier serial number / voucher code, set on success
    pub sn: Option<String>,
    pub payment_id: Option<i64>,
    pub confirmed_by: Option<i64>,
    /// When the supplier accepted the order
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the dispatch to the supplier was claimed. Set before the supplier is called, and never cleared.
    pub dispatch_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub gateway_payment_type: Option<String>,
    pub gateway_transaction_status: Option<String>,
    pub gateway_transaction_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// True once the order has been claimed for, or accepted by, the supplier. A second dispatch must never happen.
    pub fn is_dispatched(&self) -> bool {
        self.confirmed_at.is_some() || self.dispatch_started_at.is_some()
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub sku: String,
    pub product_name: String,
    pub target_number: String,
    pub customer_email: String,
    /// Taken from the catalog, never from the request
    pub total_price: Rupiah,
    /// Client-supplied key that de-duplicates checkout submissions
    pub idempotency_key: Option<String>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, product: &Product, target_number: &str, customer_email: &str) -> Self {
        Self {
            order_id,
            sku: product.sku.clone(),
            product_name: product.name.clone(),
            target_number: target_number.to_string(),
            customer_email: customer_email.to_string(),
            total_price: product.selling_price,
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: Option<String>) -> Self {
        self.idempotency_key = key;
        self
    }
}

//--------------------------------------     StatusHistory     ---------------------------------------------------------
/// One row of the append-only audit trail for an order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusHistory {
    pub id: i64,
    /// The internal id of the order
    pub order_id: i64,
    pub status: OrderStatusType,
    pub note: Option<String>,
    /// Admin id. `None` for system-driven transitions.
    pub changed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       PaymentType      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    BankTransfer,
    Qris,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::BankTransfer => write!(f, "bank_transfer"),
            PaymentType::Qris => write!(f, "qris"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(Self::BankTransfer),
            "qris" => Ok(Self::Qris),
            s => Err(ConversionError(format!("Invalid payment type: {s}"))),
        }
    }
}

//-----------------------------------------   PaymentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Rejected,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Verified => write!(f, "verified"),
            PaymentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Payment       ---------------------------------------------------------
/// A manual (bank transfer / QRIS) payment submitted against an order, waiting for an admin to check the proof.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    /// External payment reference, e.g. `PAYX7K2A1717200000`
    pub payment_id: String,
    /// The internal id of the order this payment is for
    pub order_id: i64,
    pub payment_type: PaymentType,
    /// Copied from the order's total price at submission
    pub amount: Rupiah,
    pub proof_reference: String,
    pub status: PaymentStatus,
    pub admin_note: Option<String>,
    pub verified_by: Option<i64>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: String,
    pub payment_type: PaymentType,
    pub proof_reference: String,
}

impl NewPayment {
    pub fn new(payment_id: String, payment_type: PaymentType, proof_reference: &str) -> Self {
        Self { payment_id, payment_type, proof_reference: proof_reference.to_string() }
    }
}

//--------------------------------------        Product       ---------------------------------------------------------
/// Catalog entry. Owned by the catalog sync, only read by the order flow.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub cost_price: Rupiah,
    pub selling_price: Rupiah,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub cost_price: Rupiah,
    pub selling_price: Rupiah,
    pub is_active: bool,
}

impl NewProduct {
    pub fn new(sku: &str, name: &str, cost_price: Rupiah, selling_price: Rupiah) -> Self {
        Self {
            sku: sku.to_string(),
            name: name.to_string(),
            category: "General".to_string(),
            brand: None,
            cost_price,
            selling_price,
            is_active: true,
        }
    }
}

//--------------------------------------      ProductView      --------------------------------------------------------
/// What notifications need to know about the product an order was for.
///
/// Built from the catalog row when it still exists, otherwise from the fields captured on the order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub price: Rupiah,
}

impl ProductView {
    pub fn for_order(order: &Order, product: Option<&Product>) -> Self {
        match product {
            Some(p) => Self {
                sku: p.sku.clone(),
                name: p.name.clone(),
                category: Some(p.category.clone()),
                price: order.total_price,
            },
            None => Self {
                sku: order.sku.clone(),
                name: order.product_name.clone(),
                category: None,
                price: order.total_price,
            },
        }
    }
}

//--------------------------------------        UsdtRate       --------------------------------------------------------
/// One entry of the append-only USDT price table. The current rate is always the newest row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UsdtRate {
    pub id: i64,
    /// Rupiah per 1 USDT
    pub rate: Rupiah,
    pub note: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsdtRate {
    pub rate: Rupiah,
    pub note: Option<String>,
    pub created_by: Option<i64>,
}

//--------------------------------------      UsdtNetwork      --------------------------------------------------------
/// The chains a customer can send USDT on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UsdtNetwork {
    Trc20,
    Erc20,
    Bep20,
    Aptos,
}

impl Display for UsdtNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsdtNetwork::Trc20 => write!(f, "TRC20"),
            UsdtNetwork::Erc20 => write!(f, "ERC20"),
            UsdtNetwork::Bep20 => write!(f, "BEP20"),
            UsdtNetwork::Aptos => write!(f, "APTOS"),
        }
    }
}

impl FromStr for UsdtNetwork {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRC20" => Ok(Self::Trc20),
            "ERC20" => Ok(Self::Erc20),
            "BEP20" => Ok(Self::Bep20),
            "APTOS" => Ok(Self::Aptos),
            s => Err(ConversionError(format!("Invalid USDT network: {s}"))),
        }
    }
}

//-----------------------------------   UsdtConversionStatus   -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UsdtConversionStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for UsdtConversionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsdtConversionStatus::Pending => write!(f, "pending"),
            UsdtConversionStatus::Approved => write!(f, "approved"),
            UsdtConversionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for UsdtConversionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid USDT conversion status: {s}"))),
        }
    }
}

//--------------------------------------     UsdtConversion    --------------------------------------------------------
/// Where the rupiah for a conversion are paid out.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

/// A customer selling USDT for rupiah. The customer sends USDT on-chain, uploads the proof, and an admin pays out
/// `idr_received` to the bank account once the transfer has been checked.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UsdtConversion {
    pub id: i64,
    /// External reference, e.g. `USDTK2M9XA1B1717200000`
    pub trx_id: String,
    pub amount: UsdtAmount,
    pub network: UsdtNetwork,
    /// The `usdt_rates` row the payout was priced with
    pub rate_id: i64,
    /// Rupiah per USDT at submission
    pub rate: Rupiah,
    /// `amount` at `rate`, fixed at submission
    pub idr_received: Rupiah,
    #[sqlx(flatten)]
    pub bank_details: BankDetails,
    pub proof_reference: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: UsdtConversionStatus,
    pub admin_note: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conversion as submitted. The rate and payout are filled in by the ledger from the current rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUsdtConversion {
    pub trx_id: String,
    pub amount: UsdtAmount,
    pub network: UsdtNetwork,
    pub bank_details: BankDetails,
    pub proof_reference: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
}
