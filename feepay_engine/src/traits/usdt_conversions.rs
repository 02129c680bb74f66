use crate::{
    db_types::{NewUsdtConversion, UsdtConversion},
    usdt_exchange_objects::{ConversionQueryFilter, ConversionResolution},
    traits::LedgerError,
};

/// The USDT-to-rupiah conversion ledger.
#[allow(async_fn_in_trait)]
pub trait UsdtConversions: Clone {
    /// Stores a new `pending` conversion, priced at the current USDT rate.
    ///
    /// The rate is read in the same transaction as the insert, and the payout is computed from it here. Nothing the
    /// customer sent is used for pricing. Fails with [`LedgerError::NoUsdtRate`] if no rate was ever set.
    async fn insert_conversion(&self, conversion: NewUsdtConversion) -> Result<UsdtConversion, LedgerError>;

    async fn fetch_conversion(&self, trx_id: &str) -> Result<Option<UsdtConversion>, LedgerError>;

    /// Newest first.
    async fn search_conversions(&self, query: ConversionQueryFilter) -> Result<Vec<UsdtConversion>, LedgerError>;

    /// Approves or rejects a `pending` conversion under the conversion's write lock.
    ///
    /// A conversion that is no longer pending fails with [`LedgerError::ConversionAlreadyResolved`].
    async fn resolve_conversion_locked(
        &self,
        trx_id: &str,
        resolution: ConversionResolution,
    ) -> Result<UsdtConversion, LedgerError>;
}
