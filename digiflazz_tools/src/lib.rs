//! Client for the Digiflazz prepaid supplier API.
//!
//! Every request is signed with an MD5 digest of the account username, the API key and a per-call suffix. See
//! [`signature`] for the exact inputs. Callbacks from Digiflazz are signed the same way over the transaction `ref_id`.
mod api;
mod config;
mod data_objects;
mod error;
pub mod signature;

pub use api::DigiflazzApi;
pub use config::DigiflazzConfig;
pub use data_objects::{Balance, CallbackData, CallbackPayload, PriceListItem, Transaction, TransactionStatus};
pub use error::DigiflazzApiError;
