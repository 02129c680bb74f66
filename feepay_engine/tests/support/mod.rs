#![allow(dead_code)]
pub mod fake_supplier;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use feepay_engine::{
    db_types::{NewProduct, Order, OrderId},
    events::{EventHandlers, EventHooks, OrderFailedEvent, OrderSucceededEvent},
    order_objects::{GatewayVerdict, NewOrderRequest, PaymentNotification},
    traits::{Catalog, GatewayTransaction},
    OrderFlowApi,
    SqliteDatabase,
};
pub use fake_supplier::{FakeSupplier, SupplierScript};
use fpg_common::Rupiah;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("feepay_it_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn prepare_db(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let _ = Sqlite::drop_database(url).await;
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

/// Collects what the notification hooks would have sent.
#[derive(Clone, Default)]
pub struct EventRecorder {
    pub succeeded: Arc<Mutex<Vec<OrderSucceededEvent>>>,
    pub failed: Arc<Mutex<Vec<OrderFailedEvent>>>,
}

impl EventRecorder {
    pub fn hooks(&self) -> EventHooks {
        let mut hooks = EventHooks::default();
        let succeeded = self.succeeded.clone();
        hooks.on_order_succeeded(move |ev| {
            let succeeded = succeeded.clone();
            Box::pin(async move {
                info!("🪝️ Success email for {}", ev.order.order_id);
                succeeded.lock().unwrap().push(ev);
            })
        });
        let failed = self.failed.clone();
        hooks.on_order_failed(move |ev| {
            let failed = failed.clone();
            Box::pin(async move {
                info!("🪝️ Failure email for {}: {}", ev.order.order_id, ev.reason);
                failed.lock().unwrap().push(ev);
            })
        });
        hooks
    }

    /// Gives the hook tasks a moment to run, then returns what they recorded.
    pub async fn settled(&self) -> (Vec<OrderSucceededEvent>, Vec<OrderFailedEvent>) {
        tokio::time::sleep(Duration::from_millis(150)).await;
        (self.succeeded.lock().unwrap().clone(), self.failed.lock().unwrap().clone())
    }
}

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub supplier: FakeSupplier,
    pub flow: OrderFlowApi<SqliteDatabase, FakeSupplier>,
    pub events: EventRecorder,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_supplier(FakeSupplier::new()).await
    }

    pub async fn with_supplier(supplier: FakeSupplier) -> Self {
        let url = random_db_path();
        let db = prepare_db(&url).await;
        let events = EventRecorder::default();
        let handlers = EventHandlers::new(16, events.hooks());
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let flow = OrderFlowApi::new(db.clone(), supplier.clone(), producers);
        Self { url, db, supplier, flow, events }
    }

    pub async fn seed_product(&self, sku: &str, price: i64) {
        Self::seed_catalog(&self.db, sku, price).await;
    }

    pub async fn seed_catalog(db: &SqliteDatabase, sku: &str, price: i64) {
        let product = NewProduct::new(sku, &format!("Product {sku}"), Rupiah::from_rupiah(price - 1_000), Rupiah::from_rupiah(price));
        db.upsert_products(vec![product]).await.expect("Error seeding product");
    }

    pub async fn new_order(&self, sku: &str) -> Order {
        let (order, created) = self.flow.create_order(order_request(sku)).await.expect("Error creating order");
        assert!(created);
        order
    }

    pub async fn order(&self, order_id: &OrderId) -> Order {
        use feepay_engine::traits::LedgerStore;
        self.db.fetch_order_by_order_id(order_id).await.expect("Error fetching order").expect("Order should exist")
    }

    pub async fn tear_down(self) {
        let url = self.url.clone();
        self.db.pool().close().await;
        let _ = Sqlite::drop_database(&url).await;
    }
}

pub fn payment(order_id: &OrderId, verdict: GatewayVerdict, gross_amount: Option<i64>) -> PaymentNotification {
    let status = match &verdict {
        GatewayVerdict::Settle => "settlement".to_string(),
        GatewayVerdict::PendingReview => "capture".to_string(),
        GatewayVerdict::Pending => "pending".to_string(),
        GatewayVerdict::Failed(s) | GatewayVerdict::Unknown(s) => s.clone(),
    };
    PaymentNotification {
        order_id: order_id.clone(),
        verdict,
        gross_amount: gross_amount.map(Rupiah::from_rupiah),
        gateway: GatewayTransaction {
            transaction_id: Some(format!("tx-{order_id}")),
            payment_type: Some("qris".into()),
            transaction_status: Some(status),
            transaction_time: Some("2024-06-01 10:00:00".into()),
        },
    }
}

pub fn order_request(sku: &str) -> NewOrderRequest {
    NewOrderRequest::new(sku, "081234567890", "budi@example.com")
}
