//! A scripted stand-in for the upstream supplier.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use fpg_common::Rupiah;

use feepay_engine::traits::{
    FulfillmentError,
    FulfillmentProvider,
    FulfillmentRequest,
    SupplierBalance,
    SupplierProduct,
    SupplierStatus,
    SupplierTransaction,
};

/// What the next `place_order` / `check_status` call should do.
#[derive(Debug, Clone)]
pub enum SupplierScript {
    /// Accept the order with the given status and optional serial number
    Respond(SupplierStatus, Option<String>),
    /// Fail as a transport timeout would
    Timeout,
    /// Refuse with the given message
    Reject(String),
}

#[derive(Default)]
struct State {
    place_calls: Vec<FulfillmentRequest>,
    status_calls: Vec<FulfillmentRequest>,
    place_script: VecDeque<SupplierScript>,
    status_script: VecDeque<SupplierScript>,
    price_list: Vec<SupplierProduct>,
}

/// Records every call and answers from a script. With an empty script, orders are accepted as `Pending`.
///
/// Clones share state, so a test can keep one handle and give another to the engine.
#[derive(Clone, Default)]
pub struct FakeSupplier {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl FakeSupplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `place_order`, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script_place_order(&self, script: SupplierScript) {
        self.state.lock().unwrap().place_script.push_back(script);
    }

    pub fn script_check_status(&self, script: SupplierScript) {
        self.state.lock().unwrap().status_script.push_back(script);
    }

    pub fn set_price_list(&self, products: Vec<SupplierProduct>) {
        self.state.lock().unwrap().price_list = products;
    }

    pub fn place_order_calls(&self) -> Vec<FulfillmentRequest> {
        self.state.lock().unwrap().place_calls.clone()
    }

    pub fn check_status_calls(&self) -> Vec<FulfillmentRequest> {
        self.state.lock().unwrap().status_calls.clone()
    }

    fn answer(request: &FulfillmentRequest, script: Option<SupplierScript>) -> Result<SupplierTransaction, FulfillmentError> {
        match script.unwrap_or(SupplierScript::Respond(SupplierStatus::Pending("Pending".into()), None)) {
            SupplierScript::Respond(status, sn) => Ok(SupplierTransaction {
                ref_id: request.ref_id.clone(),
                message: format!("Transaksi {status}"),
                status,
                sn,
            }),
            SupplierScript::Timeout => Err(FulfillmentError::Upstream("operation timed out".into())),
            SupplierScript::Reject(msg) => Err(FulfillmentError::Rejected(msg)),
        }
    }
}

impl FulfillmentProvider for FakeSupplier {
    async fn place_order(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.place_calls.push(request.clone());
            state.place_script.pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Self::answer(request, script)
    }

    async fn check_status(&self, request: &FulfillmentRequest) -> Result<SupplierTransaction, FulfillmentError> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.status_calls.push(request.clone());
            state.status_script.pop_front()
        };
        Self::answer(request, script)
    }

    async fn price_list(&self, category: Option<String>) -> Result<Vec<SupplierProduct>, FulfillmentError> {
        let products = self.state.lock().unwrap().price_list.clone();
        Ok(match category {
            Some(c) => products.into_iter().filter(|p| p.category.eq_ignore_ascii_case(&c)).collect(),
            None => products,
        })
    }

    async fn balance(&self) -> Result<SupplierBalance, FulfillmentError> {
        Ok(SupplierBalance { deposit: Rupiah::from_rupiah(1_000_000) })
    }
}
