//! SQLite backend for the FeePay ledger.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
