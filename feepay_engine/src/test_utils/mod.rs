//! Helpers for tests in this crate and downstream crates. Enabled with the `test_utils` feature.
pub mod prepare_env;

pub use prepare_env::{create_database, prepare_test_env, random_db_path, seed_product};
