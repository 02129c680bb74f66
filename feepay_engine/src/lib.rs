//! FeePay Engine
//!
//! The FeePay engine is the core of a digital-goods storefront. Customers buy SKU-based products (mobile credit, game
//! vouchers, electricity tokens), pay through a payment gateway or by manual transfer, and an upstream supplier
//! delivers the goods. This library holds the order/payment reconciliation logic and is provider-agnostic.
//!
//! The library is divided into these sections:
//! 1. The data model ([`mod@db_types`]), shared by every backend and API.
//! 2. The backend contracts ([`mod@traits`]): the ledger store, the catalog, the USDT rate and conversion tables, the
//!    supplier and the payment gateway. [`SqliteDatabase`] implements the storage traits.
//! 3. The public API (`fpe_api`), re-exported at the crate root: [`OrderFlowApi`], [`CheckoutApi`], [`LedgerApi`],
//!    [`UsdtRateApi`], [`UsdtExchangeApi`] and [`SupplierApi`].
//!
//! The engine emits events when orders reach a terminal state. A small actor framework ([`mod@events`]) lets the
//! server hook notifications onto them. Hooks run after the ledger transaction has committed and can never change
//! order state.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod fpe_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use fpe_api::{
    checkout_api::CheckoutApi,
    ledger_api::LedgerApi,
    order_flow_api::{OrderFlowApi, DEFAULT_IDEMPOTENCY_WINDOW},
    order_objects,
    payment_objects,
    supplier_api::{CatalogSyncResult, SupplierApi},
    usdt_exchange_api::UsdtExchangeApi,
    usdt_exchange_objects,
    usdt_rate_api::UsdtRateApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
