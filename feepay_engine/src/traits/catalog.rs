use crate::{
    db_types::{NewProduct, Product},
    traits::LedgerError,
};

/// Read access to the product catalog. Prices are only ever read here at order creation time.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// The product for `sku`, if it exists and is active. This is where an order's price snapshot comes from.
    async fn fetch_active_product(&self, sku: &str) -> Result<Option<Product>, LedgerError>;

    /// The product for `sku` regardless of its active flag.
    async fn fetch_product(&self, sku: &str) -> Result<Option<Product>, LedgerError>;

    /// Inserts or updates the given products in one transaction. Returns the number of rows written.
    async fn upsert_products(&self, products: Vec<NewProduct>) -> Result<usize, LedgerError>;

    /// Switches off every active product that is not listed in `keep`. Returns the number of products deactivated.
    async fn deactivate_products_except(&self, keep: Vec<String>) -> Result<u64, LedgerError>;
}
