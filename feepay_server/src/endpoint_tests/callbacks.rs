use actix_web::{http::StatusCode, web, web::ServiceConfig};
use digiflazz_tools::signature::transaction_signature;
use feepay_engine::{
    db_types::{Order, OrderId, OrderStatusType},
    order_objects::NewOrderRequest,
    traits::FulfillmentError,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
};
use midtrans_tools::signature::notification_signature;
use serde_json::json;

use super::{
    helpers::{post_request, register_apis, register_apis_with_keys, seeded_db, CUSTOMER_EMAIL, DIGIFLAZZ_KEY, DIGIFLAZZ_USERNAME, MIDTRANS_SERVER_KEY},
    mocks::{pending_transaction, MockCheckout, MockSupplier},
};
use crate::{
    data_objects::JsonResponse,
    routes::{PaymentGatewayCallbackRoute, SupplierCallbackRoute},
};

type Db = SqliteDatabase;

fn configure(db: SqliteDatabase, supplier: MockSupplier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db, supplier, MockCheckout::new());
        cfg.service(
            web::scope("/callback")
                .service(PaymentGatewayCallbackRoute::<Db, MockSupplier>::new())
                .service(web::scope("/supplier").service(SupplierCallbackRoute::<Db, MockSupplier>::new())),
        );
    }
}

/// A server whose provider secrets were never configured.
fn configure_without_keys(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis_with_keys(cfg, db, MockSupplier::new(), MockCheckout::new(), "", "");
        cfg.service(
            web::scope("/callback")
                .service(PaymentGatewayCallbackRoute::<Db, MockSupplier>::new())
                .service(web::scope("/supplier").service(SupplierCallbackRoute::<Db, MockSupplier>::new())),
        );
    }
}

async fn pending_order(db: &SqliteDatabase) -> Order {
    let api = OrderFlowApi::new(db.clone(), MockSupplier::new(), Default::default());
    let (order, _) = api.create_order(NewOrderRequest::new("PLN20", "14234567890", CUSTOMER_EMAIL)).await.unwrap();
    order
}

async fn fetch_order(db: &SqliteDatabase, order_id: &OrderId) -> Order {
    LedgerApi::new(db.clone()).order(order_id).await.unwrap().unwrap()
}

fn gateway_notification(order_id: &OrderId, transaction_status: &str, status_code: &str) -> serde_json::Value {
    let gross_amount = "21000.00";
    let signature = notification_signature(order_id.as_str(), status_code, gross_amount, MIDTRANS_SERVER_KEY);
    json!({
        "order_id": order_id,
        "status_code": status_code,
        "gross_amount": gross_amount,
        "signature_key": signature,
        "transaction_status": transaction_status,
        "fraud_status": "accept",
        "transaction_id": "9aed5972-5b6a-401e-894b-a32c91ed1a3a",
        "payment_type": "bank_transfer",
        "transaction_time": "2024-06-12 14:05:11"
    })
}

fn supplier_callback(order_id: &OrderId, status: &str, sn: &str, message: &str) -> serde_json::Value {
    let sign = transaction_signature(DIGIFLAZZ_USERNAME, DIGIFLAZZ_KEY, order_id.as_str());
    json!({
        "data": { "ref_id": order_id, "status": status, "sn": sn, "message": message },
        "sign": sign
    })
}

/// Settles `order` through the payment webhook, leaving it dispatched and waiting on the supplier.
async fn settle(db: &SqliteDatabase, order: &Order) {
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|req| Ok(pending_transaction(req)));
    let body = gateway_notification(&order.order_id, "settlement", "200");
    let (status, body) =
        post_request(&[], "/callback/payment-gateway", body, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn settlement_dispatches_the_order_once() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    settle(&db, &order).await;
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Processing);
    assert!(stored.dispatch_started_at.is_some());
    assert_eq!(stored.gateway_transaction_id.as_deref(), Some("9aed5972-5b6a-401e-894b-a32c91ed1a3a"));

    // Midtrans retries the same notification. The supplier must not be called again.
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().never();
    let body = gateway_notification(&order.order_id, "settlement", "200");
    let (status, body) = post_request(&[], "/callback/payment-gateway", body, configure(db, supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let reply: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(reply.success);
}

#[actix_web::test]
async fn payment_notification_with_a_bad_signature() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().never();
    let mut body = gateway_notification(&order.order_id, "settlement", "200");
    // Tampered amount
    body["gross_amount"] = json!("1000.00");
    let (status, _) = post_request(&[], "/callback/payment-gateway", body, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn expired_payment_fails_the_order() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let body = gateway_notification(&order.order_id, "expire", "407");
    let (status, _) =
        post_request(&[], "/callback/payment-gateway", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Failed);

    // A late settlement for a failed order is acknowledged and ignored
    let body = gateway_notification(&order.order_id, "settlement", "200");
    let (status, _) =
        post_request(&[], "/callback/payment-gateway", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn payment_notification_for_an_unknown_order() {
    let db = seeded_db().await;
    let body = gateway_notification(&OrderId::from("FPNOPE"), "settlement", "200");
    let (status, body) = post_request(&[], "/callback/payment-gateway", body, configure(db, MockSupplier::new())).await.unwrap();
    // Still a 200, so that Midtrans stops retrying
    assert_eq!(status, StatusCode::OK);
    let reply: JsonResponse = serde_json::from_str(&body).unwrap();
    assert!(!reply.success);
}

#[actix_web::test]
async fn settlement_with_a_supplier_outage() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|_| Err(FulfillmentError::Upstream("timeout after 60s".into())));
    let body = gateway_notification(&order.order_id, "settlement", "200");
    let (status, _) = post_request(&[], "/callback/payment-gateway", body, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn supplier_success_callback_completes_the_order() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    settle(&db, &order).await;

    let body = supplier_callback(&order.order_id, "Sukses", "0912-3456-7788-1200/BUDI/R1/900VA", "Transaksi Sukses");
    let (status, body) =
        post_request(&[], "/callback/supplier", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Success);
    assert_eq!(stored.sn.as_deref(), Some("0912-3456-7788-1200/BUDI/R1/900VA"));

    // A replayed callback, even with a different outcome, cannot move a finished order
    let body = supplier_callback(&order.order_id, "Gagal", "", "Transaksi Gagal");
    let (status, _) = post_request(&[], "/callback/supplier", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Success);
}

#[actix_web::test]
async fn supplier_failure_and_pending_callbacks() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    settle(&db, &order).await;

    let body = supplier_callback(&order.order_id, "Pending", "", "Transaksi Pending");
    let (status, _) = post_request(&[], "/callback/supplier", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Processing);

    let body = supplier_callback(&order.order_id, "Gagal", "", "Nomor tujuan salah");
    let (status, _) = post_request(&[], "/callback/supplier", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn supplier_callback_with_a_bad_signature() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    settle(&db, &order).await;
    let mut body = supplier_callback(&order.order_id, "Sukses", "1234", "Transaksi Sukses");
    body["sign"] = json!("0cc175b9c0f1b6a831c399e269772661");
    let (status, _) = post_request(&[], "/callback/supplier", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Processing);
}

#[actix_web::test]
async fn supplier_callback_for_an_unknown_order() {
    let db = seeded_db().await;
    let body = supplier_callback(&OrderId::from("FPNOPE"), "Sukses", "1234", "Transaksi Sukses");
    let (status, _) = post_request(&[], "/callback/supplier", body, configure(db, MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn webhooks_are_rejected_when_secrets_are_unset() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    // Anyone can compute these without a secret
    let gross_amount = "21000.00";
    let forged = notification_signature(order.order_id.as_str(), "200", gross_amount, "");
    let mut body = gateway_notification(&order.order_id, "settlement", "200");
    body["signature_key"] = json!(forged);
    let (status, _) = post_request(&[], "/callback/payment-gateway", body, configure_without_keys(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Pending);

    let sign = transaction_signature(DIGIFLAZZ_USERNAME, "", order.order_id.as_str());
    let body = json!({
        "data": { "ref_id": order.order_id, "status": "Sukses", "sn": "1234", "message": "Transaksi Sukses" },
        "sign": sign
    });
    let (status, _) = post_request(&[], "/callback/supplier", body, configure_without_keys(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(fetch_order(&db, &order.order_id).await.status, OrderStatusType::Pending);
}
