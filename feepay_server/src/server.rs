use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    error::{JsonPayloadError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use digiflazz_tools::DigiflazzApi;
use feepay_engine::{
    events::EventProducers,
    CheckoutApi,
    LedgerApi,
    OrderFlowApi,
    SqliteDatabase,
    SupplierApi,
    UsdtExchangeApi,
    UsdtRateApi,
};
use futures::{future::ok, FutureExt};
use log::*;
use midtrans_tools::MidtransApi;

use crate::{
    auth::AdminAuth,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError, ServerError::AuthenticationError},
    helpers::{get_remote_ip, is_whitelisted},
    integrations::{
        create_notification_handlers,
        mail::MailRelay,
        telegram::TelegramNotifier,
        DigiflazzSupplier,
        MidtransCheckout,
        Notifiers,
    },
    routes::{
        health,
        CheckoutRoute,
        ConfirmOrderRoute,
        ConversionDetailRoute,
        CreateOrderRoute,
        CurrentUsdtRateRoute,
        OrderDetailRoute,
        OrderHistoryRoute,
        PaymentGatewayCallbackRoute,
        ReviewConversionRoute,
        SearchConversionsRoute,
        SearchOrdersRoute,
        SearchPaymentsRoute,
        SetUsdtRateRoute,
        SubmitConversionRoute,
        SubmitPaymentRoute,
        SupplierBalanceRoute,
        SupplierCallbackRoute,
        SyncOrderRoute,
        SyncProductsRoute,
        UsdtRateHistoryRoute,
        VerifyPaymentRoute,
    },
};

type Backend = SqliteDatabase;
type Supplier = DigiflazzSupplier;
type Gateway = MidtransCheckout;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let notifiers = build_notifiers(&config)?;
    let handlers = create_notification_handlers(notifiers);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

fn build_notifiers(config: &ServerConfig) -> Result<Notifiers, ServerError> {
    let mail = config
        .mail
        .clone()
        .map(MailRelay::new)
        .transpose()
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let telegram = config
        .telegram
        .clone()
        .map(TelegramNotifier::new)
        .transpose()
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!(
        "📬️ Notifications: email {}, Telegram {}",
        if mail.is_some() { "enabled" } else { "disabled" },
        if telegram.is_some() { "enabled" } else { "disabled" }
    );
    Ok(Notifiers::new(mail, telegram))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let digiflazz =
        DigiflazzApi::new(config.digiflazz.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let midtrans =
        MidtransApi::new(config.midtrans.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let bind_host = config.host.clone();
    let bind_port = config.port;
    let srv = HttpServer::new(move || {
        let supplier = DigiflazzSupplier::new(digiflazz.clone());
        let orders_api = OrderFlowApi::new(db.clone(), supplier.clone(), producers.clone())
            .with_idempotency_window(config.idempotency_window);
        let checkout_api = CheckoutApi::new(db.clone(), MidtransCheckout::new(midtrans.clone()));
        let ledger_api = LedgerApi::new(db.clone());
        let rates_api = UsdtRateApi::new(db.clone());
        let exchange_api = UsdtExchangeApi::new(db.clone(), producers.clone());
        let supplier_api = SupplierApi::new(db.clone(), supplier);
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fpg::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(rates_api))
            .app_data(web::Data::new(exchange_api))
            .app_data(web::Data::new(supplier_api))
            .app_data(web::Data::new(AdminAuth::new(config.admin_token.clone())))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(midtrans.clone()))
            .app_data(web::Data::new(digiflazz.clone()));
        let whitelist = config.supplier_whitelist.clone();
        let supplier_scope = web::scope("/supplier")
            .wrap_fn(move |req, srv| {
                // Peer IP comes from the proxy headers only if the configuration says to trust them
                let peer_ip = get_remote_ip(req.request(), options.use_x_forwarded_for, options.use_forwarded);
                if is_whitelisted(peer_ip, whitelist.as_deref()) {
                    srv.call(req)
                } else {
                    warn!("💻️🚨️ Supplier callback from {peer_ip:?} is not whitelisted. Denying access.");
                    ok(req.error_response(AuthenticationError(AuthError::ForbiddenPeer))).boxed_local()
                }
            })
            .service(SupplierCallbackRoute::<Backend, Supplier>::new());
        let callback_scope = web::scope("/callback")
            .service(PaymentGatewayCallbackRoute::<Backend, Supplier>::new())
            .service(supplier_scope);
        app.service(health)
            .service(CreateOrderRoute::<Backend, Supplier>::new())
            .service(SearchOrdersRoute::<Backend>::new())
            .service(OrderDetailRoute::<Backend>::new())
            .service(CheckoutRoute::<Backend, Gateway>::new())
            .service(ConfirmOrderRoute::<Backend, Supplier>::new())
            .service(SyncOrderRoute::<Backend, Supplier>::new())
            .service(OrderHistoryRoute::<Backend>::new())
            .service(SubmitPaymentRoute::<Backend, Supplier>::new())
            .service(SearchPaymentsRoute::<Backend>::new())
            .service(VerifyPaymentRoute::<Backend, Supplier>::new())
            .service(CurrentUsdtRateRoute::<Backend>::new())
            .service(SetUsdtRateRoute::<Backend>::new())
            .service(UsdtRateHistoryRoute::<Backend>::new())
            .service(SubmitConversionRoute::<Backend>::new())
            .service(SearchConversionsRoute::<Backend>::new())
            .service(ConversionDetailRoute::<Backend>::new())
            .service(ReviewConversionRoute::<Backend>::new())
            .service(SyncProductsRoute::<Backend, Supplier>::new())
            .service(SupplierBalanceRoute::<Backend, Supplier>::new())
            .service(callback_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_host.as_str(), bind_port))?
    .run();
    Ok(srv)
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not deserialize request body. {err}");
    ServerError::CouldNotDeserializePayload(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Invalid query string. {err}");
    ServerError::InvalidQuery(err.to_string()).into()
}
