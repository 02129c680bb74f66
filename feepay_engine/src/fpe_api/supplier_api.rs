use std::fmt::Debug;

use fpg_common::Rupiah;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::NewProduct,
    traits::{Catalog, FulfillmentProvider, LedgerError, SupplierBalance},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSyncResult {
    /// Products in the supplier's price list
    pub fetched: usize,
    /// Products written to the catalog (active or not)
    pub upserted: usize,
    /// Previously active products that are missing from the price list
    pub deactivated: u64,
}

/// Supplier housekeeping: catalog sync and the deposit balance.
pub struct SupplierApi<B, F> {
    db: B,
    supplier: F,
}

impl<B, F> Debug for SupplierApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SupplierApi")
    }
}

impl<B, F> SupplierApi<B, F>
where
    B: Catalog,
    F: FulfillmentProvider,
{
    pub fn new(db: B, supplier: F) -> Self {
        Self { db, supplier }
    }

    /// Pulls the supplier's price list into the catalog with `selling_price = cost_price + margin`.
    ///
    /// Products the supplier has switched off are stored as inactive. When the whole list is synced (no category),
    /// active products that no longer appear in it are deactivated too. Orders already placed are never repriced.
    pub async fn sync_catalog(&self, margin: Rupiah, category: Option<String>) -> Result<CatalogSyncResult, LedgerError> {
        let full_sync = category.is_none();
        let items = self.supplier.price_list(category).await?;
        let fetched = items.len();
        let skus = items.iter().map(|p| p.sku.clone()).collect::<Vec<_>>();
        let products = items
            .into_iter()
            .map(|item| NewProduct {
                sku: item.sku,
                name: item.name,
                category: item.category,
                brand: item.brand,
                cost_price: item.cost_price,
                selling_price: item.cost_price + margin,
                is_active: item.available,
            })
            .collect::<Vec<_>>();
        let upserted = self.db.upsert_products(products).await?;
        let deactivated = if full_sync && fetched > 0 { self.db.deactivate_products_except(skus).await? } else { 0 };
        info!("🛒️ Catalog sync complete. {fetched} fetched, {upserted} upserted, {deactivated} deactivated");
        Ok(CatalogSyncResult { fetched, upserted, deactivated })
    }

    pub async fn balance(&self) -> Result<SupplierBalance, LedgerError> {
        let balance = self.supplier.balance().await?;
        debug!("🛒️ Supplier deposit: {}", balance.deposit);
        Ok(balance)
    }
}
