//! Plugs the Digiflazz client into the engine's [`FulfillmentProvider`] seam.
use digiflazz_tools::{
    CallbackPayload,
    DigiflazzApi,
    DigiflazzApiError,
    PriceListItem,
    Transaction,
    TransactionStatus,
};
use feepay_engine::{
    db_types::OrderId,
    order_objects::SupplierNotification,
    traits::{
        FulfillmentError,
        FulfillmentProvider,
        FulfillmentRequest,
        SupplierBalance,
        SupplierProduct,
        SupplierStatus,
        SupplierTransaction,
    },
};
use log::*;

#[derive(Clone)]
pub struct DigiflazzSupplier {
    api: DigiflazzApi,
}

impl DigiflazzSupplier {
    pub fn new(api: DigiflazzApi) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &DigiflazzApi {
        &self.api
    }
}

impl FulfillmentProvider for DigiflazzSupplier {
    async fn place_order(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError> {
        let tx = self
            .api
            .place_order(&request.sku, &request.target_number, request.ref_id.as_str())
            .await
            .map_err(fulfillment_error)?;
        Ok(supplier_transaction(tx))
    }

    async fn check_status(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError> {
        let tx = self
            .api
            .check_status(&request.sku, &request.target_number, request.ref_id.as_str())
            .await
            .map_err(fulfillment_error)?;
        Ok(supplier_transaction(tx))
    }

    async fn price_list(&self, category: Option<String>) -> Result<Vec<SupplierProduct>, FulfillmentError> {
        let items = self.api.price_list(category.as_deref()).await.map_err(fulfillment_error)?;
        Ok(items.into_iter().map(supplier_product).collect())
    }

    async fn balance(&self) -> Result<SupplierBalance, FulfillmentError> {
        let balance = self.api.balance().await.map_err(fulfillment_error)?;
        Ok(SupplierBalance { deposit: balance.deposit })
    }
}

/// An explicit refusal from Digiflazz is a rejection. Every other failure means we never got a usable answer.
pub fn fulfillment_error(e: DigiflazzApiError) -> FulfillmentError {
    match e {
        DigiflazzApiError::Rejected(msg) => FulfillmentError::Rejected(msg),
        e => {
            warn!("🛒️ Digiflazz call failed. {e}");
            FulfillmentError::Upstream(e.to_string())
        },
    }
}

pub fn supplier_status(status: TransactionStatus) -> SupplierStatus {
    match status {
        TransactionStatus::Success => SupplierStatus::Success,
        TransactionStatus::Failed => SupplierStatus::Failed,
        TransactionStatus::Pending(s) => SupplierStatus::Pending(s),
    }
}

fn supplier_transaction(tx: Transaction) -> SupplierTransaction {
    let status = supplier_status(tx.status());
    let sn = tx.serial_number().map(String::from);
    SupplierTransaction { ref_id: OrderId::from(tx.ref_id), status, sn, message: tx.message }
}

fn supplier_product(item: PriceListItem) -> SupplierProduct {
    let available = item.is_available();
    SupplierProduct {
        sku: item.buyer_sku_code,
        name: item.product_name,
        category: item.category,
        brand: item.brand,
        cost_price: item.price,
        available,
    }
}

/// Converts an (already authenticated) callback body.
pub fn supplier_notification(payload: &CallbackPayload) -> SupplierNotification {
    let data = &payload.data;
    SupplierNotification {
        ref_id: OrderId::from(data.ref_id.as_str()),
        status: supplier_status(data.status()),
        sn: data.sn.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        message: data.message.clone().filter(|m| !m.trim().is_empty()),
    }
}
