use actix_web::{http::StatusCode, web::ServiceConfig};
use feepay_engine::{
    db_types::{UsdtConversion, UsdtConversionStatus, UsdtNetwork},
    SqliteDatabase,
    UsdtRateApi,
};
use fpg_common::{Rupiah, UsdtAmount};
use serde_json::json;

use super::{
    helpers::{admin_headers, get_request, post_request, register_apis, seeded_db, CUSTOMER_EMAIL},
    mocks::{MockCheckout, MockSupplier},
};
use crate::routes::{ConversionDetailRoute, ReviewConversionRoute, SearchConversionsRoute, SubmitConversionRoute};

type Db = SqliteDatabase;

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        register_apis(cfg, db, MockSupplier::new(), MockCheckout::new());
        cfg.service(SubmitConversionRoute::<Db>::new())
            .service(SearchConversionsRoute::<Db>::new())
            .service(ConversionDetailRoute::<Db>::new())
            .service(ReviewConversionRoute::<Db>::new());
    }
}

fn conversion_body(amount: &str) -> serde_json::Value {
    json!({
        "amount": amount,
        "network": "TRC20",
        "bank_name": "BCA",
        "account_number": "1234567890",
        "account_name": "Budi Santoso",
        "proof_reference": "proofs/usdt/abc123.jpg",
        "customer_email": CUSTOMER_EMAIL,
        "idr_received": "999999999"
    })
}

async fn submit(db: &SqliteDatabase, amount: &str) -> UsdtConversion {
    let (status, body) = post_request(&[], "/usdt/conversions", conversion_body(amount), configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED, "{body}");
    serde_json::from_str(&body).unwrap()
}

#[actix_web::test]
async fn conversion_needs_a_rate() {
    let db = seeded_db().await;
    let (status, _) = post_request(&[], "/usdt/conversions", conversion_body("25.50"), configure(db)).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn submission_ignores_the_client_payout() {
    let db = seeded_db().await;
    UsdtRateApi::new(db.clone()).set_rate(Rupiah::from_rupiah(16_250), None, Some(7)).await.unwrap();
    let conversion = submit(&db, "25.50").await;
    assert!(conversion.trx_id.starts_with("USDT"));
    assert_eq!(conversion.amount, UsdtAmount::from_cents(2_550));
    assert_eq!(conversion.network, UsdtNetwork::Trc20);
    assert_eq!(conversion.rate, Rupiah::from_rupiah(16_250));
    assert_eq!(conversion.idr_received, Rupiah::from_rupiah(414_375));
    assert_eq!(conversion.status, UsdtConversionStatus::Pending);

    let mut body = conversion_body("0.50");
    let (status, _) = post_request(&[], "/usdt/conversions", body.clone(), configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    body["amount"] = json!("10");
    body["network"] = json!("SOLANA");
    let (status, _) = post_request(&[], "/usdt/conversions", body, configure(db)).await.unwrap();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn customers_need_the_matching_email() {
    let db = seeded_db().await;
    UsdtRateApi::new(db.clone()).set_rate(Rupiah::from_rupiah(16_000), None, Some(7)).await.unwrap();
    let conversion = submit(&db, "100").await;

    let path = format!("/usdt/conversions/{}?email={CUSTOMER_EMAIL}", conversion.trx_id);
    let (status, body) = get_request(&[], &path, configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let found: UsdtConversion = serde_json::from_str(&body).unwrap();
    assert_eq!(found.id, conversion.id);

    let path = format!("/usdt/conversions/{}?email=siti@example.com", conversion.trx_id);
    let (status, _) = get_request(&[], &path, configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let path = format!("/usdt/conversions/{}", conversion.trx_id);
    let (status, _) = get_request(&[], &path, configure(db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn admin_reviews_a_conversion_once() {
    let db = seeded_db().await;
    UsdtRateApi::new(db.clone()).set_rate(Rupiah::from_rupiah(16_000), None, Some(7)).await.unwrap();
    let conversion = submit(&db, "100").await;
    let path = format!("/usdt/conversions/{}/review", conversion.trx_id);

    let body = json!({ "status": "approved", "note": "Paid via BCA" });
    let (status, _) = post_request(&[], &path, body.clone(), configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_request(&admin_headers(), &path, body, configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let approved: UsdtConversion = serde_json::from_str(&body).unwrap();
    assert_eq!(approved.status, UsdtConversionStatus::Approved);
    assert_eq!(approved.approved_by, Some(7));
    assert_eq!(approved.admin_note.as_deref(), Some("Paid via BCA"));
    assert_eq!(approved.idr_received, Rupiah::from_rupiah(1_600_000));

    let body = json!({ "status": "rejected" });
    let (status, _) = post_request(&admin_headers(), &path, body, configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);

    let body = json!({ "status": "approved" });
    let (status, _) =
        post_request(&admin_headers(), "/usdt/conversions/USDTNOPE/review", body, configure(db)).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_searches_conversions() {
    let db = seeded_db().await;
    UsdtRateApi::new(db.clone()).set_rate(Rupiah::from_rupiah(16_000), None, Some(7)).await.unwrap();
    let first = submit(&db, "100").await;
    let second = submit(&db, "20").await;
    let path = format!("/usdt/conversions/{}/review", first.trx_id);
    let body = json!({ "status": "rejected", "note": "No transfer found" });
    let (status, _) = post_request(&admin_headers(), &path, body, configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_request(&[], "/usdt/conversions", configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get_request(&admin_headers(), "/usdt/conversions", configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let all: Vec<UsdtConversion> = serde_json::from_str(&body).unwrap();
    assert_eq!(all.len(), 2);

    let (status, body) =
        get_request(&admin_headers(), "/usdt/conversions?status=pending", configure(db.clone())).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let pending: Vec<UsdtConversion> = serde_json::from_str(&body).unwrap();
    assert_eq!(pending.iter().map(|c| c.id).collect::<Vec<_>>(), vec![second.id]);

    let (status, _) = get_request(&admin_headers(), "/usdt/conversions?colour=blue", configure(db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
