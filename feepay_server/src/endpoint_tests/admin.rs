use actix_web::{http::StatusCode, web::ServiceConfig};
use feepay_engine::{
    db_types::{Order, OrderId, OrderStatusType, Payment, PaymentStatus, StatusHistory, UsdtRate},
    order_objects::NewOrderRequest,
    traits::{Catalog, FulfillmentError, SupplierBalance, SupplierProduct},
    CatalogSyncResult,
    LedgerApi,
    SqliteDatabase,
};
use fpg_common::Rupiah;
use serde_json::json;

use super::{
    helpers::{admin_headers, get_request, post_request, register_apis, register_supplier_api, seeded_db, CUSTOMER_EMAIL},
    mocks::{pending_transaction, successful_transaction, MockCheckout, MockSupplier},
};
use crate::{
    auth::{ADMIN_ID_HEADER, ADMIN_TOKEN_HEADER},
    data_objects::{ConfirmationResult, SyncReport},
    routes::{
        ConfirmOrderRoute,
        CurrentUsdtRateRoute,
        OrderHistoryRoute,
        SearchOrdersRoute,
        SearchPaymentsRoute,
        SetUsdtRateRoute,
        SubmitPaymentRoute,
        SupplierBalanceRoute,
        SyncOrderRoute,
        SyncProductsRoute,
        UsdtRateHistoryRoute,
        VerifyPaymentRoute,
    },
};

type Db = SqliteDatabase;

fn configure(db: SqliteDatabase, supplier: MockSupplier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db, supplier, MockCheckout::new());
        cfg.service(ConfirmOrderRoute::<Db, MockSupplier>::new())
            .service(SyncOrderRoute::<Db, MockSupplier>::new())
            .service(OrderHistoryRoute::<Db>::new())
            .service(SearchOrdersRoute::<Db>::new())
            .service(SubmitPaymentRoute::<Db, MockSupplier>::new())
            .service(VerifyPaymentRoute::<Db, MockSupplier>::new())
            .service(SearchPaymentsRoute::<Db>::new())
            .service(CurrentUsdtRateRoute::<Db>::new())
            .service(SetUsdtRateRoute::<Db>::new())
            .service(UsdtRateHistoryRoute::<Db>::new());
    }
}

fn configure_catalog(db: SqliteDatabase, supplier: MockSupplier) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db.clone(), MockSupplier::new(), MockCheckout::new());
        register_supplier_api(cfg, db, supplier);
        cfg.service(SyncProductsRoute::<Db, MockSupplier>::new()).service(SupplierBalanceRoute::<Db, MockSupplier>::new());
    }
}

/// Places an order directly through the engine, skipping the HTTP layer.
async fn pending_order(db: &SqliteDatabase) -> Order {
    let api = feepay_engine::OrderFlowApi::new(db.clone(), MockSupplier::new(), Default::default());
    let (order, _) = api.create_order(NewOrderRequest::new("PLN20", "14234567890", CUSTOMER_EMAIL)).await.unwrap();
    order
}

async fn fetch_order(db: &SqliteDatabase, order_id: &OrderId) -> Order {
    LedgerApi::new(db.clone()).order(order_id).await.unwrap().unwrap()
}

#[actix_web::test]
async fn admin_routes_need_a_valid_token() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let path = format!("/orders/{}/history", order.order_id);

    let (status, _) = get_request(&[], &path, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let headers = [(ADMIN_TOKEN_HEADER, "guess"), (ADMIN_ID_HEADER, "7")];
    let (status, _) = get_request(&headers, &path, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let headers = [(ADMIN_TOKEN_HEADER, super::helpers::ADMIN_TOKEN), (ADMIN_ID_HEADER, "zero")];
    let (status, _) = get_request(&headers, &path, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_request(&admin_headers(), &path, configure(db, MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let history: Vec<StatusHistory> = serde_json::from_str(&body).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirm_order_dispatches_to_the_supplier() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|req| Ok(successful_transaction(req, "5532-1180-7724-0019")));
    let path = format!("/orders/{}/confirm", order.order_id);
    let (status, body) = post_request(&admin_headers(), &path, json!({}), configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let result: ConfirmationResult = serde_json::from_str(&body).unwrap();
    assert_eq!(result.order_id, order.order_id);
    assert_eq!(result.sn.as_deref(), Some("5532-1180-7724-0019"));

    // The order waits for the supplier's callback to settle
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Processing);
    assert_eq!(stored.confirmed_by, Some(7));
    assert!(stored.dispatch_started_at.is_some());

    // A second confirmation is a conflict, and the supplier is not called again
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().never();
    let (status, _) = post_request(&admin_headers(), &path, json!({}), configure(db, supplier)).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn sync_order_pulls_the_supplier_status() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|req| Ok(pending_transaction(req)));
    let api = feepay_engine::OrderFlowApi::new(db.clone(), supplier, Default::default());
    api.confirm_order(&order.order_id, 7).await.unwrap();
    let path = format!("/orders/{}/sync", order.order_id);

    // Still pending upstream: nothing is written
    let mut supplier = MockSupplier::new();
    supplier.expect_check_status().times(1).returning(|req| Ok(pending_transaction(req)));
    let (status, body) = get_request(&admin_headers(), &path, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let report: SyncReport = serde_json::from_str(&body).unwrap();
    assert!(!report.changed);
    assert_eq!(report.order.status, OrderStatusType::Processing);
    assert_eq!(report.supplier_status.as_deref(), Some("pending (Pending)"));

    // Delivered upstream: the order completes with the serial number
    let mut supplier = MockSupplier::new();
    supplier.expect_check_status().times(1).returning(|req| Ok(successful_transaction(req, "0912-3456-7788-1200")));
    let (status, body) = get_request(&admin_headers(), &path, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let report: SyncReport = serde_json::from_str(&body).unwrap();
    assert!(report.changed);
    assert_eq!(report.supplier_status.as_deref(), Some("success"));
    assert_eq!(report.order.status, OrderStatusType::Success);
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Success);
    assert_eq!(stored.sn.as_deref(), Some("0912-3456-7788-1200"));

    // A finished order is not sent upstream again
    let mut supplier = MockSupplier::new();
    supplier.expect_check_status().never();
    let (status, body) = get_request(&admin_headers(), &path, configure(db, supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let report: SyncReport = serde_json::from_str(&body).unwrap();
    assert!(!report.changed);
    assert!(report.supplier_status.is_none());
}

#[actix_web::test]
async fn confirm_order_supplier_rejection() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|_| Err(FulfillmentError::Rejected("Nomor tujuan salah".into())));
    let path = format!("/orders/{}/confirm", order.order_id);
    let (status, body) = post_request(&admin_headers(), &path, json!({}), configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Nomor tujuan salah"), "{body}");
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn confirm_unknown_order() {
    let db = seeded_db().await;
    let (status, _) =
        post_request(&admin_headers(), "/orders/FPNOPE/confirm", json!({}), configure(db, MockSupplier::new()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn manual_payment_verification() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let body = json!({ "order_id": order.order_id, "payment_type": "qris", "proof_reference": "qris-0612.png" });
    let (status, body) = post_request(&[], "/payments", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let payment: Payment = serde_json::from_str(&body).unwrap();

    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().times(1).returning(|req| Ok(pending_transaction(req)));
    let path = format!("/payments/{}/verify", payment.payment_id);
    let body = json!({ "status": "verified", "note": "Matched QRIS mutation" });
    let (status, body) = post_request(&admin_headers(), &path, body, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let review: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(review["payment"]["status"], "verified");
    assert_eq!(review["payment"]["verified_by"], 7);
    assert_eq!(review["order"]["status"], "processing");

    // Reviews are final
    let body = json!({ "status": "rejected" });
    let (status, _) = post_request(&admin_headers(), &path, body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        get_request(&admin_headers(), "/payments?status=verified", configure(db, MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let payments: Vec<Payment> = serde_json::from_str(&body).unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Verified);
}

#[actix_web::test]
async fn manual_payment_rejection_fails_the_order() {
    let db = seeded_db().await;
    let order = pending_order(&db).await;
    let body = json!({ "order_id": order.order_id, "payment_type": "bank_transfer", "proof_reference": "bca.jpg" });
    let (_, body) = post_request(&[], "/payments", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    let payment: Payment = serde_json::from_str(&body).unwrap();

    let mut supplier = MockSupplier::new();
    supplier.expect_place_order().never();
    let path = format!("/payments/{}/verify", payment.payment_id);
    let body = json!({ "status": "rejected", "note": "No matching transfer" });
    let (status, _) = post_request(&admin_headers(), &path, body, configure(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let stored = fetch_order(&db, &order.order_id).await;
    assert_eq!(stored.status, OrderStatusType::Failed);
}

#[actix_web::test]
async fn search_orders() {
    let db = seeded_db().await;
    let first = pending_order(&db).await;
    let _second = pending_order(&db).await;
    let (status, body) =
        get_request(&admin_headers(), "/orders?status=pending", configure(db.clone(), MockSupplier::new()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().any(|o| o.order_id == first.order_id));

    let (status, body) =
        get_request(&admin_headers(), "/orders?status=success", configure(db.clone(), MockSupplier::new()))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<Order> = serde_json::from_str(&body).unwrap();
    assert!(orders.is_empty());

    let (status, _) =
        get_request(&admin_headers(), "/orders?colour=blue", configure(db, MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn usdt_rate_updates() {
    let db = seeded_db().await;
    let (status, _) = get_request(&[], "/usdt/rate", configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Only admins may set the rate
    let body = json!({ "rate": 16_250 });
    let (status, _) = post_request(&[], "/usdt/rate", body.clone(), configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) =
        post_request(&admin_headers(), "/usdt/rate", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let body = json!({ "rate": "16300", "note": "BI mid rate" });
    let (status, _) =
        post_request(&admin_headers(), "/usdt/rate", body, configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get_request(&[], "/usdt/rate", configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let rate: UsdtRate = serde_json::from_str(&body).unwrap();
    assert_eq!(rate.rate, Rupiah::from_rupiah(16_300));
    assert_eq!(rate.note.as_deref(), Some("BI mid rate"));

    let (status, body) =
        get_request(&admin_headers(), "/usdt/rate/history", configure(db.clone(), MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let history: Vec<UsdtRate> = serde_json::from_str(&body).unwrap();
    assert_eq!(history.len(), 2);

    let body = json!({ "rate": 0 });
    let (status, _) = post_request(&admin_headers(), "/usdt/rate", body, configure(db, MockSupplier::new())).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn catalog_sync_applies_the_margin() {
    let db = seeded_db().await;
    let mut supplier = MockSupplier::new();
    supplier.expect_price_list().times(1).returning(|_| {
        Ok(vec![
            SupplierProduct {
                sku: "PLN20".into(),
                name: "PLN 20.000".into(),
                category: "PLN".into(),
                brand: Some("PLN".into()),
                cost_price: Rupiah::from_rupiah(20_150),
                available: true,
            },
            SupplierProduct {
                sku: "XL5".into(),
                name: "XL 5.000".into(),
                category: "Pulsa".into(),
                brand: Some("XL".into()),
                cost_price: Rupiah::from_rupiah(5_600),
                available: false,
            },
        ])
    });
    let (status, body) =
        post_request(&admin_headers(), "/products/sync", json!({}), configure_catalog(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK, "{body}");
    let result: CatalogSyncResult = serde_json::from_str(&body).unwrap();
    assert_eq!(result.fetched, 2);
    assert_eq!(result.upserted, 2);
    // TSEL10 is no longer on the list
    assert_eq!(result.deactivated, 1);

    let pln = db.fetch_active_product("PLN20").await.unwrap().unwrap();
    assert_eq!(pln.selling_price, Rupiah::from_rupiah(21_150));
    assert!(db.fetch_active_product("XL5").await.unwrap().is_none());
    assert!(db.fetch_active_product("TSEL10").await.unwrap().is_none());
}

#[actix_web::test]
async fn supplier_balance() {
    let db = seeded_db().await;
    let mut supplier = MockSupplier::new();
    supplier.expect_balance().times(1).returning(|| Ok(SupplierBalance { deposit: Rupiah::from_rupiah(1_250_000) }));
    let (status, body) =
        get_request(&admin_headers(), "/supplier/balance", configure_catalog(db.clone(), supplier)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let balance: SupplierBalance = serde_json::from_str(&body).unwrap();
    assert_eq!(balance.deposit, Rupiah::from_rupiah(1_250_000));

    let mut supplier = MockSupplier::new();
    supplier.expect_balance().returning(|| Err(FulfillmentError::Upstream("timeout".into())));
    let (status, body) =
        get_request(&admin_headers(), "/supplier/balance", configure_catalog(db, supplier)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!body.contains("timeout"), "{body}");
}
