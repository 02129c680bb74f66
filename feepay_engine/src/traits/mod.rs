//! # Backend contracts
//!
//! This module defines the interfaces the FeePay engine needs from the outside world. The engine APIs in
//! [`crate::fpe_api`] are generic over these traits, so that storage, the supplier and the payment gateway can be
//! swapped out (or mocked in tests).
//!
//! * [`LedgerStore`] persists orders, manual payments and the status history. Every state change goes through
//!   [`LedgerStore::update_order_locked`], which reads the order under an exclusive lock, lets the caller decide what
//!   to change, applies the change, appends a history row and commits.
//! * [`Catalog`] is the read side of the product catalog, plus the bulk upsert used by the catalog sync.
//! * [`UsdtRates`] is the append-only USDT price table.
//! * [`UsdtConversions`] records customers selling USDT for rupiah, priced from [`UsdtRates`].
//! * [`FulfillmentProvider`] is the upstream supplier that actually delivers the digital goods.
//! * [`CheckoutProvider`] is the payment gateway that issues checkout tokens.
mod catalog;
mod checkout;
mod data_objects;
mod fulfillment;
mod ledger_store;
mod usdt_conversions;
mod usdt_rates;

pub use catalog::Catalog;
pub use checkout::{CheckoutError, CheckoutProvider, CheckoutRequest, CheckoutToken};
pub use data_objects::{GatewayTransaction, HistoryNote, OrderUpdate, PaymentResolution};
pub use fulfillment::{FulfillmentError, FulfillmentProvider, FulfillmentRequest, SupplierBalance, SupplierProduct, SupplierStatus, SupplierTransaction};
pub use ledger_store::{ErrorKind, LedgerError, LedgerStore};
pub use usdt_conversions::UsdtConversions;
pub use usdt_rates::{UsdtRateError, UsdtRates};
