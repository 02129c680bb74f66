//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
//!
//! Admin routes take an [`AdminIdentity`] argument, which rejects the request before the handler runs unless the
//! admin token checks out.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use digiflazz_tools::{CallbackPayload, DigiflazzApi};
use feepay_engine::{
    db_types::OrderId,
    order_objects::{DispatchOutcome, NewOrderRequest, OrderQueryFilter, PaymentOutcome, SupplierOutcome},
    payment_objects::{ManualPaymentRequest, PaymentQueryFilter},
    traits::{
        Catalog,
        CheckoutProvider,
        ErrorKind,
        FulfillmentProvider,
        LedgerError,
        LedgerStore,
        UsdtConversions,
        UsdtRates,
    },
    usdt_exchange_objects::{ConversionQueryFilter, ConversionRequest},
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    SupplierApi,
    UsdtExchangeApi,
    UsdtRateApi,
};
use log::*;
use midtrans_tools::{MidtransApi, Notification};

use crate::{
    auth::AdminIdentity,
    config::ServerOptions,
    data_objects::{
        CatalogSyncParams,
        CheckoutResponse,
        ConfirmationResult,
        ConversionReview,
        EmailParams,
        HistoryParams,
        JsonResponse,
        OrderSearchParams,
        PaymentVerification,
        SyncReport,
        UsdtRateUpdate,
    },
    errors::ServerError,
    helpers::idempotency_key,
    integrations::{digiflazz::supplier_notification, midtrans::payment_notification},
};

const DEFAULT_RATE_HISTORY_LIMIT: i64 = 50;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each generic parameter of the handler is listed with its trait bounds, e.g.
// `route!(create_order => Post "/orders" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);`
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl [$($param:ident: $bound0:ident $(+ $bound:ident)*),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<$($param,)+>(core::marker::PhantomData<fn() -> ($($param,)+)>);}
        paste::paste! { impl<$($param,)+> [<$name:camel Route>]<$($param,)+> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData)
            }
        }}
        paste::paste! { impl<$($param,)+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$($param,)+>
        where
            $($param: $bound0 $(+ $bound)* + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<$($param,)+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
/// Checkout submission. The price always comes from the catalog.
///
/// An optional `X-Idempotency-Key` header makes the call safe to retry: within the idempotency window, the same key
/// returns the original order with `200 OK` instead of `201 Created`.
pub async fn create_order<B, F>(
    req: HttpRequest,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let request = body.into_inner().with_idempotency_key(idempotency_key(&req));
    debug!("💻️ POST new order for {} -> {}", request.sku, request.target_number);
    let (order, created) = api.create_order(request).await?;
    let mut response = if created { HttpResponse::Created() } else { HttpResponse::Ok() };
    Ok(response.json(order))
}

route!(order_detail => Get "/orders/{order_id}" impl [B: LedgerStore]);
/// Customer view of an order. The email must match the order's, otherwise the order does not exist as far as the
/// caller is concerned.
pub async fn order_detail<B: LedgerStore>(
    path: web::Path<OrderId>,
    query: web::Query<EmailParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let order = api
        .order_for_customer(&order_id, &query.email)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(checkout => Post "/orders/{order_id}/checkout" impl [B: LedgerStore, C: CheckoutProvider]);
pub async fn checkout<B, C>(
    path: web::Path<OrderId>,
    body: web::Json<EmailParams>,
    api: web::Data<CheckoutApi<B, C>>,
    gateway: web::Data<MidtransApi>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore,
    C: CheckoutProvider,
{
    let order_id = path.into_inner();
    debug!("💻️ POST checkout for order {order_id}");
    let token = api.checkout(&order_id, &body.email).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::new(order_id, token, gateway.config())))
}

route!(confirm_order => Post "/orders/{order_id}/confirm" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
/// Admin confirmation of an order paid outside the gateway. The order is sent to the supplier straight away; a
/// supplier rejection is reported as `400 Bad Request` and the order is failed.
pub async fn confirm_order<B, F>(
    admin: AdminIdentity,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let order_id = path.into_inner();
    info!("💻️ Admin #{} is confirming order {order_id}", admin.admin_id);
    let outcome = api.confirm_order(&order_id, admin.admin_id).await?;
    match outcome {
        DispatchOutcome::Rejected { reason, .. } => Err(ServerError::SupplierRejected(reason)),
        outcome => Ok(HttpResponse::Ok().json(ConfirmationResult::from_outcome(&outcome))),
    }
}

route!(sync_order => Get "/orders/{order_id}/sync" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
pub async fn sync_order<B, F>(
    admin: AdminIdentity,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let order_id = path.into_inner();
    debug!("💻️ Admin #{} requested a supplier sync for order {order_id}", admin.admin_id);
    let result = api.sync_order_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(SyncReport::from(result)))
}

route!(order_history => Get "/orders/{order_id}/history" impl [B: LedgerStore]);
pub async fn order_history<B: LedgerStore>(
    _admin: AdminIdentity,
    path: web::Path<OrderId>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET status history for order {order_id}");
    let history = api.status_history(&order_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

route!(search_orders => Get "/orders" impl [B: LedgerStore]);
pub async fn search_orders<B: LedgerStore>(
    _admin: AdminIdentity,
    query: web::Query<OrderSearchParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query: OrderQueryFilter = query.into_inner().into();
    debug!("💻️ GET search orders: {query}");
    let orders = api.search_orders(query).await?;
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(submit_payment => Post "/payments" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
/// A customer's manual transfer. The amount is copied from the order.
pub async fn submit_payment<B, F>(
    body: web::Json<ManualPaymentRequest>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let request = body.into_inner();
    debug!("💻️ POST {} payment for order {}", request.payment_type, request.order_id);
    let payment = api.submit_manual_payment(request).await?;
    Ok(HttpResponse::Created().json(payment))
}

route!(verify_payment => Post "/payments/{payment_id}/verify" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
pub async fn verify_payment<B, F>(
    admin: AdminIdentity,
    path: web::Path<String>,
    body: web::Json<PaymentVerification>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let payment_id = path.into_inner();
    let resolution = body.into_inner().into_resolution(admin.admin_id);
    info!("💻️ Admin #{} marks payment {payment_id} as {}", admin.admin_id, resolution.status);
    let review = api.resolve_manual_payment(&payment_id, resolution).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "payment": review.payment,
        "order": review.order,
    })))
}

route!(search_payments => Get "/payments" impl [B: LedgerStore]);
pub async fn search_payments<B: LedgerStore>(
    _admin: AdminIdentity,
    query: web::Query<PaymentQueryFilter>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payments = api.search_payments(query.into_inner()).await?;
    debug!("💻️ GET payments returned {} results", payments.len());
    Ok(HttpResponse::Ok().json(payments))
}

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(payment_gateway_callback => Post "/payment-gateway" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
/// Midtrans HTTP notification.
///
/// Apart from a bad signature (401) or a backend failure (500), this endpoint always replies `200 OK`. Midtrans
/// retries anything else, and a replayed or nonsensical notification must not turn into a retry storm.
pub async fn payment_gateway_callback<B, F>(
    body: web::Json<Notification>,
    gateway: web::Data<MidtransApi>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let notification = body.into_inner();
    if !gateway.verify_notification(&notification) {
        warn!("💻️🚨️ Payment notification with an invalid signature. Payload: {notification:?}");
        return Err(ServerError::SignatureInvalid);
    }
    trace!("💻️ Payment notification for {}: {}", notification.order_id, notification.transaction_status);
    let result = api.process_payment_notification(payment_notification(&notification)).await;
    let reply = match result {
        Ok(PaymentOutcome::Settled(DispatchOutcome::Rejected { order, reason })) => {
            JsonResponse::success(format!("Order {} paid, but fulfillment failed: {reason}", order.order_id))
        },
        Ok(PaymentOutcome::Settled(outcome)) => {
            JsonResponse::success(format!("Order {} paid and sent to the supplier", outcome.order().order_id))
        },
        Ok(PaymentOutcome::Failed(order)) => JsonResponse::success(format!("Order {} failed", order.order_id)),
        Ok(PaymentOutcome::Recorded(order)) => {
            JsonResponse::success(format!("Order {} updated. Status: {}", order.order_id, order.status))
        },
        Ok(PaymentOutcome::Ignored(order)) => {
            JsonResponse::success(format!("Order {} is {}. Nothing to do.", order.order_id, order.status))
        },
        Err(e) => webhook_error_reply(e)?,
    };
    Ok(HttpResponse::Ok().json(reply))
}

route!(supplier_callback => Post "" impl [B: LedgerStore + Catalog, F: FulfillmentProvider]);
/// Digiflazz transaction callback. Mounted on its own scope so that the optional IP whitelist only guards this route.
///
/// Replies `200 OK` for anything that was processed, including replays. A bad signature is a 401 and an unknown
/// `ref_id` is a 404.
pub async fn supplier_callback<B, F>(
    body: web::Json<CallbackPayload>,
    supplier: web::Data<DigiflazzApi>,
    api: web::Data<OrderFlowApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    let payload = body.into_inner();
    if !supplier.verify_callback(&payload.data.ref_id, &payload.sign) {
        warn!("💻️🚨️ Supplier callback with an invalid signature. Payload: {payload:?}");
        return Err(ServerError::SignatureInvalid);
    }
    trace!("💻️ Supplier callback for {}: {}", payload.data.ref_id, payload.data.status);
    let result = api.process_supplier_notification(supplier_notification(&payload)).await;
    let reply = match result {
        Ok(SupplierOutcome::Succeeded(order)) => JsonResponse::success(format!("Order {} completed", order.order_id)),
        Ok(SupplierOutcome::Failed(order)) => JsonResponse::success(format!("Order {} failed", order.order_id)),
        Ok(SupplierOutcome::StillPending(order)) => {
            JsonResponse::success(format!("Order {} is still being processed", order.order_id))
        },
        Ok(SupplierOutcome::Ignored(order)) => {
            JsonResponse::success(format!("Order {} is {}. Nothing to do.", order.order_id, order.status))
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("💻️ Supplier callback for an unknown order. Payload: {payload:?}");
            return Err(e.into());
        },
        Err(e) => webhook_error_reply(e)?,
    };
    Ok(HttpResponse::Ok().json(reply))
}

/// Webhook senders only get an error status when retrying could help.
fn webhook_error_reply(e: LedgerError) -> Result<JsonResponse, ServerError> {
    match e.kind() {
        ErrorKind::Internal => Err(ServerError::from(e)),
        ErrorKind::SignatureInvalid => Err(ServerError::SignatureInvalid),
        ErrorKind::Conflict => {
            debug!("💻️ Webhook replay or out-of-order delivery. {e}");
            Ok(JsonResponse::success(e.to_string()))
        },
        _ => {
            warn!("💻️ Webhook could not be processed. {e}");
            Ok(JsonResponse::failure(e.to_string()))
        },
    }
}

//----------------------------------------------   USDT rate  ----------------------------------------------------
route!(current_usdt_rate => Get "/usdt/rate" impl [B: UsdtRates]);
pub async fn current_usdt_rate<B: UsdtRates>(api: web::Data<UsdtRateApi<B>>) -> Result<HttpResponse, ServerError> {
    let rate = api.current_rate().await?;
    Ok(HttpResponse::Ok().json(rate))
}

route!(set_usdt_rate => Post "/usdt/rate" impl [B: UsdtRates]);
pub async fn set_usdt_rate<B: UsdtRates>(
    admin: AdminIdentity,
    body: web::Json<UsdtRateUpdate>,
    api: web::Data<UsdtRateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let UsdtRateUpdate { rate, note } = body.into_inner();
    info!("💻️💱️ Admin #{} is setting the USDT rate to {rate}", admin.admin_id);
    let rate = api.set_rate(rate, note, Some(admin.admin_id)).await?;
    Ok(HttpResponse::Created().json(rate))
}

route!(usdt_rate_history => Get "/usdt/rate/history" impl [B: UsdtRates]);
pub async fn usdt_rate_history<B: UsdtRates>(
    _admin: AdminIdentity,
    query: web::Query<HistoryParams>,
    api: web::Data<UsdtRateApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_RATE_HISTORY_LIMIT);
    let history = api.history(limit).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   USDT conversions  ---------------------------------------------
route!(submit_conversion => Post "/usdt/conversions" impl [B: UsdtConversions]);
/// A customer selling USDT. The rupiah payout is priced from the current rate; any figure the client sends is ignored.
pub async fn submit_conversion<B: UsdtConversions>(
    body: web::Json<ConversionRequest>,
    api: web::Data<UsdtExchangeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST USDT conversion of {} on {}", request.amount, request.network);
    let conversion = api.submit_conversion(request).await?;
    Ok(HttpResponse::Created().json(conversion))
}

route!(conversion_detail => Get "/usdt/conversions/{trx_id}" impl [B: UsdtConversions]);
/// Customer view of a conversion. As with orders, the email must match.
pub async fn conversion_detail<B: UsdtConversions>(
    path: web::Path<String>,
    query: web::Query<EmailParams>,
    api: web::Data<UsdtExchangeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let trx_id = path.into_inner();
    debug!("💻️ GET USDT conversion {trx_id}");
    let conversion = api
        .conversion_for_customer(&trx_id, &query.email)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Conversion {trx_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(conversion))
}

route!(search_conversions => Get "/usdt/conversions" impl [B: UsdtConversions]);
pub async fn search_conversions<B: UsdtConversions>(
    _admin: AdminIdentity,
    query: web::Query<ConversionQueryFilter>,
    api: web::Data<UsdtExchangeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let conversions = api.search_conversions(query.into_inner()).await?;
    debug!("💻️ GET USDT conversions returned {} results", conversions.len());
    Ok(HttpResponse::Ok().json(conversions))
}

route!(review_conversion => Post "/usdt/conversions/{trx_id}/review" impl [B: UsdtConversions]);
/// Approves or rejects a pending conversion. A conversion that was already reviewed is a `409 Conflict`.
pub async fn review_conversion<B: UsdtConversions>(
    admin: AdminIdentity,
    path: web::Path<String>,
    body: web::Json<ConversionReview>,
    api: web::Data<UsdtExchangeApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let trx_id = path.into_inner();
    let resolution = body.into_inner().into_resolution(admin.admin_id);
    info!("💻️💱️ Admin #{} marks USDT conversion {trx_id} as {}", admin.admin_id, resolution.status);
    let conversion = api.resolve_conversion(&trx_id, resolution).await?;
    Ok(HttpResponse::Ok().json(conversion))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(sync_products => Post "/products/sync" impl [B: Catalog, F: FulfillmentProvider]);
/// Pulls the supplier's price list into the catalog. Selling prices are the supplier's cost plus the configured
/// margin. Existing orders keep the price they were created with.
pub async fn sync_products<B, F>(
    admin: AdminIdentity,
    body: Option<web::Json<CatalogSyncParams>>,
    options: web::Data<ServerOptions>,
    api: web::Data<SupplierApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: Catalog,
    F: FulfillmentProvider,
{
    let category = body.and_then(|b| b.into_inner().category).filter(|c| !c.trim().is_empty());
    info!("💻️ Admin #{} started a catalog sync (category: {category:?})", admin.admin_id);
    let result = api.sync_catalog(options.price_margin, category).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(supplier_balance => Get "/supplier/balance" impl [B: Catalog, F: FulfillmentProvider]);
pub async fn supplier_balance<B, F>(
    _admin: AdminIdentity,
    api: web::Data<SupplierApi<B, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: Catalog,
    F: FulfillmentProvider,
{
    let balance = api.balance().await?;
    Ok(HttpResponse::Ok().json(balance))
}
