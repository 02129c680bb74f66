use feepay_engine::traits::{
    CheckoutError,
    CheckoutProvider,
    CheckoutRequest,
    CheckoutToken,
    FulfillmentError,
    FulfillmentProvider,
    FulfillmentRequest,
    SupplierBalance,
    SupplierProduct,
    SupplierStatus,
    SupplierTransaction,
};
use mockall::mock;

mock! {
    pub Supplier {}
    impl FulfillmentProvider for Supplier {
        async fn place_order(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError>;
        async fn check_status(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError>;
        async fn price_list(&self, category: Option<String>) -> Result<Vec<SupplierProduct>, FulfillmentError>;
        async fn balance(&self) -> Result<SupplierBalance, FulfillmentError>;
    }
}

mock! {
    pub Checkout {}
    impl CheckoutProvider for Checkout {
        async fn create_checkout_token(&self, request: &CheckoutRequest) -> Result<CheckoutToken, CheckoutError>;
    }
}

/// What Digiflazz answers for a transaction it has accepted but not yet delivered.
pub fn pending_transaction(request: &FulfillmentRequest) -> SupplierTransaction {
    SupplierTransaction {
        ref_id: request.ref_id.clone(),
        status: SupplierStatus::Pending("Pending".into()),
        sn: None,
        message: "Transaksi Pending".into(),
    }
}

pub fn successful_transaction(request: &FulfillmentRequest, sn: &str) -> SupplierTransaction {
    SupplierTransaction {
        ref_id: request.ref_id.clone(),
        status: SupplierStatus::Success,
        sn: Some(sn.to_string()),
        message: "Transaksi Sukses".into(),
    }
}
