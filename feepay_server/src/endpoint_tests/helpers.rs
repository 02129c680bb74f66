use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use digiflazz_tools::{DigiflazzApi, DigiflazzConfig};
use feepay_engine::{
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path, seed_product},
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
    SupplierApi,
    UsdtExchangeApi,
    UsdtRateApi,
};
use fpg_common::Secret;
use log::debug;
use midtrans_tools::{MidtransApi, MidtransConfig};

use crate::{
    auth::{AdminAuth, ADMIN_ID_HEADER, ADMIN_TOKEN_HEADER},
    config::ServerOptions,
    endpoint_tests::mocks::{MockCheckout, MockSupplier},
    server::{json_error_handler, query_error_handler},
};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const DIGIFLAZZ_USERNAME: &str = "feepaytest";
pub const DIGIFLAZZ_KEY: &str = "dev-3a7f0c2e";
pub const MIDTRANS_SERVER_KEY: &str = "SB-Mid-server-test";
pub const MIDTRANS_CLIENT_KEY: &str = "SB-Mid-client-test";
pub const CUSTOMER_EMAIL: &str = "budi@example.com";

/// Admin headers for admin #7
pub fn admin_headers() -> Vec<(&'static str, &'static str)> {
    vec![(ADMIN_TOKEN_HEADER, ADMIN_TOKEN), (ADMIN_ID_HEADER, "7")]
}

/// A fresh database with two products in the catalog.
pub async fn seeded_db() -> SqliteDatabase {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    seed_product(&db, "PLN20", "PLN 20.000", 21_000).await;
    seed_product(&db, "TSEL10", "Telkomsel 10.000", 11_500).await;
    db
}

/// Registers every API the routes need, backed by `db` and the given mocks.
pub fn register_apis(cfg: &mut ServiceConfig, db: SqliteDatabase, supplier: MockSupplier, gateway: MockCheckout) {
    register_apis_with_keys(cfg, db, supplier, gateway, DIGIFLAZZ_KEY, MIDTRANS_SERVER_KEY);
}

/// As [`register_apis`], with explicit provider secrets for the webhook verifiers.
pub fn register_apis_with_keys(
    cfg: &mut ServiceConfig,
    db: SqliteDatabase,
    supplier: MockSupplier,
    gateway: MockCheckout,
    digiflazz_key: &str,
    midtrans_server_key: &str,
) {
    let orders_api = OrderFlowApi::new(db.clone(), supplier, EventProducers::default());
    let checkout_api = CheckoutApi::new(db.clone(), gateway);
    let ledger_api = LedgerApi::new(db.clone());
    let rates_api = UsdtRateApi::new(db.clone());
    let exchange_api = UsdtExchangeApi::new(db, EventProducers::default());
    let digiflazz = DigiflazzApi::new(DigiflazzConfig::new(DIGIFLAZZ_USERNAME, digiflazz_key)).unwrap();
    let midtrans = MidtransApi::new(MidtransConfig::new(midtrans_server_key, false).with_client_key(MIDTRANS_CLIENT_KEY)).unwrap();
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(checkout_api))
        .app_data(web::Data::new(ledger_api))
        .app_data(web::Data::new(rates_api))
        .app_data(web::Data::new(exchange_api))
        .app_data(web::Data::new(AdminAuth::new(Secret::new(ADMIN_TOKEN.to_string()))))
        .app_data(web::Data::new(ServerOptions::default()))
        .app_data(web::Data::new(digiflazz))
        .app_data(web::Data::new(midtrans));
}

/// The catalog routes use their own supplier instance.
pub fn register_supplier_api(cfg: &mut ServiceConfig, db: SqliteDatabase, supplier: MockSupplier) {
    cfg.app_data(web::Data::new(SupplierApi::new(db, supplier)));
}

pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = req.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn get_request<F>(headers: &[(&str, &str)], path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let req = headers.iter().fold(TestRequest::get().uri(path), |req, &h| req.insert_header(h));
    send_request(req, configure).await
}

pub async fn post_request<F>(
    headers: &[(&str, &str)],
    path: &str,
    body: serde_json::Value,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let req = headers.iter().fold(TestRequest::post().uri(path).set_json(body), |req, &h| req.insert_header(h));
    send_request(req, configure).await
}
