//! # FeePay engine public API
//!
//! The `fpe_api` module exposes the programmatic API of the FeePay engine. It is split by concern, so that clients
//! can pick the parts they need.
//!
//! * [`order_flow_api`] is the reconciliation engine: order creation, payment and supplier webhooks, admin
//!   confirmation, manual payments and status sync.
//! * [`checkout_api`] issues payment gateway checkout tokens.
//! * [`ledger_api`] is read-only access to orders, payments and status history.
//! * [`usdt_rate_api`] manages the USDT price table.
//! * [`usdt_exchange_api`] takes customer USDT-to-rupiah conversions and their admin review.
//! * [`supplier_api`] syncs the catalog from the supplier and reports the deposit balance.
//!
//! # API usage
//!
//! Every API is created by handing it the backends it needs.
//!
//! ```rust,ignore
//! use feepay_engine::{events::EventProducers, LedgerApi, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let flow = OrderFlowApi::new(db.clone(), my_supplier, EventProducers::default());
//! let (order, _) = flow.create_order(NewOrderRequest::new("PLN20", "081234567890", "budi@example.com")).await?;
//! let history = LedgerApi::new(db).status_history(&order.order_id).await?;
//! ```

pub mod checkout_api;
pub mod ledger_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod supplier_api;
pub mod usdt_exchange_api;
pub mod usdt_exchange_objects;
pub mod usdt_rate_api;
