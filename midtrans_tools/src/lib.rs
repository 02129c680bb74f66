//! Midtrans Snap client.
//!
//! Covers the three things the storefront needs from the payment gateway: issuing a Snap checkout token, verifying the
//! `signature_key` on HTTP notifications and collapsing Midtrans' transaction/fraud statuses into a [`PaymentVerdict`].
mod api;
mod config;
mod data_objects;
mod error;
pub mod signature;
mod status;

pub use api::MidtransApi;
pub use config::MidtransConfig;
pub use data_objects::{CustomerDetails, ItemDetails, Notification, SnapRequest, SnapToken, TransactionDetails};
pub use error::MidtransApiError;
pub use status::{map_transaction_status, PaymentVerdict};
