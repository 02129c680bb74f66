use std::time::Duration;

use cucumber::{given, then, when};
use feepay_engine::{
    db_types::OrderStatusType,
    order_objects::{GatewayVerdict, NewOrderRequest, SupplierNotification},
    traits::{LedgerStore, SupplierStatus},
};

use crate::{
    cucumber::FeePayWorld,
    support::{payment, SupplierScript},
};

fn verdict(status: &str) -> GatewayVerdict {
    match status {
        "settlement" => GatewayVerdict::Settle,
        "capture" => GatewayVerdict::PendingReview,
        "pending" => GatewayVerdict::Pending,
        "deny" | "expire" | "cancel" | "failure" => GatewayVerdict::Failed(status.to_string()),
        s => GatewayVerdict::Unknown(s.to_string()),
    }
}

#[given(expr = "the supplier accepts the next order with serial number {word}")]
async fn supplier_accepts(world: &mut FeePayWorld, sn: String) {
    world.system().supplier.script_place_order(SupplierScript::Respond(SupplierStatus::Pending("Pending".into()), Some(sn)));
}

#[given("the supplier times out on the next order")]
async fn supplier_times_out(world: &mut FeePayWorld) {
    world.system().supplier.script_place_order(SupplierScript::Timeout);
}

#[given(expr = "the supplier rejects the next order with {string}")]
async fn supplier_rejects(world: &mut FeePayWorld, message: String) {
    world.system().supplier.script_place_order(SupplierScript::Reject(message));
}

#[when(expr = "a customer orders {word} for {word} as order {word}")]
async fn customer_orders(world: &mut FeePayWorld, sku: String, target: String, alias: String) {
    let req = NewOrderRequest::new(sku, target, "budi@example.com".into());
    let (order, _) = world.system().flow.create_order(req).await.expect("Error creating order");
    world.orders.insert(alias, order.order_id);
}

#[when(expr = "the gateway reports {word} for order {word}")]
async fn gateway_reports(world: &mut FeePayWorld, status: String, alias: String) {
    let id = world.order_id(&alias);
    world
        .system()
        .flow
        .process_payment_notification(payment(&id, verdict(&status), None))
        .await
        .expect("Error processing payment notification");
}

#[when(expr = "the supplier calls back {word} for order {word} with serial number {word}")]
async fn supplier_callback_sn(world: &mut FeePayWorld, status: String, alias: String, sn: String) {
    let notification = SupplierNotification {
        ref_id: world.order_id(&alias),
        status: SupplierStatus::from(status.as_str()),
        sn: Some(sn),
        message: Some(format!("Transaksi {status}")),
    };
    world.system().flow.process_supplier_notification(notification).await.expect("Error processing callback");
}

#[when(expr = "the supplier calls back {word} for order {word} with message {string}")]
async fn supplier_callback_msg(world: &mut FeePayWorld, status: String, alias: String, message: String) {
    let notification = SupplierNotification {
        ref_id: world.order_id(&alias),
        status: SupplierStatus::from(status.as_str()),
        sn: None,
        message: Some(message),
    };
    world.system().flow.process_supplier_notification(notification).await.expect("Error processing callback");
}

#[when(expr = "admin {int} confirms order {word}")]
async fn admin_confirms(world: &mut FeePayWorld, admin_id: i64, alias: String) {
    let id = world.order_id(&alias);
    world.system().flow.confirm_order(&id, admin_id).await.expect("Error confirming order");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut FeePayWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "order {word} is {word}")]
async fn order_status(world: &mut FeePayWorld, alias: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(world.order(&alias).await.status, expected);
}

#[then(expr = "order {word} costs Rp{int}")]
async fn order_price(world: &mut FeePayWorld, alias: String, price: i64) {
    assert_eq!(world.order(&alias).await.total_price.whole_rupiah(), price);
}

#[then(expr = "order {word} has serial number {word}")]
async fn order_sn(world: &mut FeePayWorld, alias: String, sn: String) {
    assert_eq!(world.order(&alias).await.sn, Some(sn));
}

#[then(expr = "the last note for order {word} contains {string}")]
async fn last_note(world: &mut FeePayWorld, alias: String, text: String) {
    let id = world.order_id(&alias);
    let history = world.system().db.fetch_status_history(&id).await.expect("Error fetching history");
    let note = history.last().and_then(|h| h.note.clone()).unwrap_or_default();
    assert!(note.contains(&text), "'{note}' does not contain '{text}'");
}

#[then(expr = "order {word} went through {string}")]
async fn order_history(world: &mut FeePayWorld, alias: String, path: String) {
    let id = world.order_id(&alias);
    let history = world.system().db.fetch_status_history(&id).await.expect("Error fetching history");
    let actual = history.iter().map(|h| h.status.to_string()).collect::<Vec<_>>().join(" > ");
    assert_eq!(actual, path);
}

#[then(expr = "the supplier received {int} order(s)")]
async fn supplier_calls(world: &mut FeePayWorld, count: usize) {
    assert_eq!(world.system().supplier.place_order_calls().len(), count);
}

#[then(expr = "{int} success notification(s) and {int} failure notification(s) were sent")]
async fn notifications_sent(world: &mut FeePayWorld, succeeded: usize, failed: usize) {
    let (s, f) = world.system().events.settled().await;
    assert_eq!(s.len(), succeeded);
    assert_eq!(f.len(), failed);
}
