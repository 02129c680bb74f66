use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatusType, Payment, PaymentStatus, ProductView},
    events::{EventProducers, OrderFailedEvent, OrderSucceededEvent},
    helpers::{new_order_id, new_payment_id, validate_new_order_request, validate_proof_reference},
    order_objects::{
        DispatchOutcome,
        GatewayVerdict,
        NewOrderRequest,
        OrderChanged,
        PaymentNotification,
        PaymentOutcome,
        SupplierNotification,
        SupplierOutcome,
        SyncResult,
    },
    payment_objects::{ManualPaymentRequest, PaymentReview},
    traits::{
        Catalog,
        FulfillmentProvider,
        FulfillmentRequest,
        LedgerError,
        LedgerStore,
        OrderUpdate,
        PaymentResolution,
        SupplierStatus,
    },
};

/// The default window in which a repeated idempotency key returns the original order.
pub const DEFAULT_IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// `OrderFlowApi` is the reconciliation engine. It drives every order through its lifecycle in response to checkout
/// submissions, payment gateway webhooks, admin actions and supplier callbacks.
///
/// ```text
///            payment settled / admin confirm / manual payment verified
///  pending ───────────────────────────────────────────────────────────▶ processing ──▶ success
///     │                                                                     │
///     └──────────── payment denied / manual payment rejected ──▶ failed ◀───┘ supplier rejected / failed
/// ```
///
/// Every state change happens inside [`LedgerStore::update_order_locked`], so concurrent webhooks and admin actions
/// on the same order are serialised. Events are only published after the change has committed.
///
/// The supplier is called at most once per order. The call is guarded by `dispatch_started_at`, which is claimed under
/// the lock *before* the supplier is contacted, so a replayed webhook or a second admin can never dispatch the same
/// order twice. A failed dispatch fails the order; it is never retried automatically.
pub struct OrderFlowApi<B, F> {
    db: B,
    supplier: F,
    producers: EventProducers,
    idempotency_window: Duration,
}

impl<B, F> Debug for OrderFlowApi<B, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, F> OrderFlowApi<B, F> {
    pub fn new(db: B, supplier: F, producers: EventProducers) -> Self {
        Self { db, supplier, producers, idempotency_window: DEFAULT_IDEMPOTENCY_WINDOW }
    }

    pub fn with_idempotency_window(mut self, window: Duration) -> Self {
        self.idempotency_window = window;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn supplier(&self) -> &F {
        &self.supplier
    }
}

impl<B, F> OrderFlowApi<B, F>
where
    B: LedgerStore + Catalog,
    F: FulfillmentProvider,
{
    /// Creates a `pending` order for the requested SKU at the catalog's current selling price.
    ///
    /// If the request carries an idempotency key that was seen within the window, the original order is returned and
    /// nothing is written. The boolean is `true` when a new order was created.
    pub async fn create_order(&self, request: NewOrderRequest) -> Result<(Order, bool), LedgerError> {
        validate_new_order_request(&request.sku, &request.target_number, &request.customer_email)?;
        let product = self
            .db
            .fetch_active_product(&request.sku)
            .await?
            .filter(|p| p.selling_price.is_positive())
            .ok_or_else(|| LedgerError::InvalidSku(request.sku.clone()))?;
        let order = NewOrder::new(new_order_id(), &product, request.target_number.trim(), request.customer_email.trim())
            .with_idempotency_key(request.idempotency_key);
        let (order, created) = self.db.insert_order(order, self.idempotency_window).await?;
        if created {
            info!("🔄️🛍️ New order {} for {} ({}) -> {}", order.order_id, order.sku, order.total_price, order.target_number);
        } else {
            info!("🔄️🛍️ Duplicate checkout submission. Returning existing order {}", order.order_id);
        }
        Ok((order, created))
    }

    /// Handles an authenticated payment gateway notification. Safe to call any number of times with the same payload.
    ///
    /// | verdict        | order pending                    | order processing         | order terminal |
    /// |----------------|----------------------------------|--------------------------|----------------|
    /// | settle         | -> processing, then dispatch     | dispatch if not yet sent | ignored        |
    /// | pending(review)| gateway fields recorded          | ignored                  | ignored        |
    /// | failed         | -> failed, failure notification  | ignored (logged)         | ignored        |
    /// | unknown        | ignored (logged)                 | ignored (logged)         | ignored        |
    pub async fn process_payment_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<PaymentOutcome, LedgerError> {
        let PaymentNotification { order_id, verdict, gross_amount, gateway } = notification;
        let tx_id = gateway.transaction_id.clone().unwrap_or_else(|| "n/a".into());
        debug!("🔄️💳️ Payment notification for {order_id}: {verdict:?} (transaction {tx_id})");
        let decision_verdict = verdict.clone();
        let changed = self
            .db
            .update_order_locked(&order_id, move |order| {
                if let Some(amount) = gross_amount {
                    if amount != order.total_price {
                        warn!(
                            "🔄️💳️ ANOMALY: gateway reports {amount} for order {} but its price is {}. The stored \
                             price is kept.",
                            order.order_id, order.total_price
                        );
                    }
                }
                if order.status.is_terminal() {
                    debug!("🔄️💳️ Order {} is already {}. Notification ignored.", order.order_id, order.status);
                    return Ok(None);
                }
                let pending = order.status == OrderStatusType::Pending;
                let update = match decision_verdict {
                    GatewayVerdict::Settle if pending => Some(
                        OrderUpdate::status(
                            OrderStatusType::Processing,
                            format!("Payment settlement - Transaction ID: {tx_id}"),
                            None,
                        )
                        .with_gateway(gateway),
                    ),
                    GatewayVerdict::PendingReview | GatewayVerdict::Pending if pending => {
                        Some(OrderUpdate { gateway: Some(gateway), ..Default::default() })
                    },
                    GatewayVerdict::Failed(status) if pending => Some(
                        OrderUpdate::status(OrderStatusType::Failed, format!("Payment {status}"), None)
                            .with_gateway(gateway),
                    ),
                    GatewayVerdict::Failed(status) => {
                        warn!(
                            "🔄️💳️ Gateway reports '{status}' for order {}, which is already {}. Ignoring it.",
                            order.order_id, order.status
                        );
                        None
                    },
                    GatewayVerdict::Unknown(status) => {
                        warn!("🔄️💳️ Unknown gateway status '{status}' for order {}. Leaving it alone.", order.order_id);
                        None
                    },
                    // settle or pending for an order that is already processing
                    _ => None,
                };
                Ok(update)
            })
            .await?;

        let order = changed.new_order.clone();
        match (verdict, changed.new_status()) {
            (GatewayVerdict::Settle, _) if order.status == OrderStatusType::Processing => {
                let outcome = self.dispatch(&order.order_id).await?;
                match (changed.is_changed(), outcome) {
                    (false, DispatchOutcome::Skipped(order)) => Ok(PaymentOutcome::Ignored(order)),
                    (_, outcome) => Ok(PaymentOutcome::Settled(outcome)),
                }
            },
            (GatewayVerdict::Failed(status), Some(OrderStatusType::Failed)) => {
                info!("🔄️💳️ Payment for order {} was {status}. Order failed.", order.order_id);
                self.notify_failure(&order, format!("Payment {status}")).await;
                Ok(PaymentOutcome::Failed(order))
            },
            _ if changed.is_changed() => Ok(PaymentOutcome::Recorded(order)),
            _ => Ok(PaymentOutcome::Ignored(order)),
        }
    }

    /// Sends a `processing` order to the supplier, exactly once.
    ///
    /// The dispatch is claimed under the order lock before the supplier is called. If the claim fails (the order was
    /// already dispatched, or is not `processing`), the supplier is not contacted and [`DispatchOutcome::Skipped`] is
    /// returned.
    ///
    /// A rejection or any transport error fails the order with a "Supplier processing error" note and fires the
    /// failure notification. Acceptance records `confirmed_at` and leaves the order `processing`: the final result
    /// arrives through [`Self::process_supplier_notification`] or [`Self::sync_order_status`].
    pub async fn dispatch(&self, order_id: &OrderId) -> Result<DispatchOutcome, LedgerError> {
        let claim = self
            .db
            .update_order_locked(order_id, |order| {
                if order.status != OrderStatusType::Processing || order.is_dispatched() {
                    return Ok(None);
                }
                Ok(Some(OrderUpdate { dispatch_started_at: Some(Utc::now()), ..Default::default() }))
            })
            .await?;
        if !claim.is_changed() {
            let status = claim.new_order.status;
            debug!("🔄️🛒️ Order {order_id} is {status} and either already dispatched or not paid. Not sending it.");
            return Ok(DispatchOutcome::Skipped(claim.new_order));
        }
        let order = claim.new_order;
        let request = FulfillmentRequest::from(&order);
        info!("🔄️🛒️ Dispatching order {order_id} ({} -> {}) to the supplier", order.sku, order.target_number);
        match self.supplier.place_order(&request).await {
            Ok(tx) if tx.status == SupplierStatus::Failed => {
                let reason = format!("Supplier processing error: rejected by supplier: {}", tx.message);
                self.fail_dispatch(order_id, reason).await
            },
            Ok(tx) => {
                info!("🔄️🛒️ Supplier accepted order {order_id}. Status: {}. Message: {}", tx.status, tx.message);
                let accepted = self
                    .db
                    .update_order_locked(order_id, |order| {
                        // the supplier's callback may already have landed and recorded this
                        if order.status != OrderStatusType::Processing || order.confirmed_at.is_some() {
                            return Ok(None);
                        }
                        Ok(Some(OrderUpdate { confirmed_at: Some(Utc::now()), ..Default::default() }))
                    })
                    .await?;
                Ok(DispatchOutcome::Accepted { order: accepted.new_order, transaction: tx })
            },
            Err(e) => {
                error!("🔄️🛒️ Supplier call for order {order_id} failed: {e}");
                self.fail_dispatch(order_id, format!("Supplier processing error: {e}")).await
            },
        }
    }

    async fn fail_dispatch(&self, order_id: &OrderId, reason: String) -> Result<DispatchOutcome, LedgerError> {
        let note = reason.clone();
        let changed = self
            .db
            .update_order_locked(order_id, move |order| {
                if order.status != OrderStatusType::Processing {
                    return Ok(None);
                }
                Ok(Some(OrderUpdate::status(OrderStatusType::Failed, note, None)))
            })
            .await?;
        if changed.new_status() == Some(OrderStatusType::Failed) {
            warn!("🔄️🛒️ Order {order_id} failed at dispatch: {reason}");
            self.notify_failure(&changed.new_order, reason.clone()).await;
        }
        Ok(DispatchOutcome::Rejected { order: changed.new_order, reason })
    }

    /// Admin confirmation of a `pending` order that was paid outside the gateway. The order moves to `processing`
    /// (recording the admin) and is dispatched immediately.
    ///
    /// Fails with [`LedgerError::OrderNotPending`] if the order is past `pending`, so two admins confirming at the same
    /// time results in one dispatch and one conflict.
    pub async fn confirm_order(&self, order_id: &OrderId, admin_id: i64) -> Result<DispatchOutcome, LedgerError> {
        self.db
            .update_order_locked(order_id, |order| {
                if order.status != OrderStatusType::Pending {
                    return Err(LedgerError::OrderNotPending(order.order_id.clone(), order.status));
                }
                let mut update = OrderUpdate::status(
                    OrderStatusType::Processing,
                    format!("Order manually confirmed by admin #{admin_id}"),
                    Some(admin_id),
                );
                update.confirmed_by = Some(admin_id);
                Ok(Some(update))
            })
            .await?;
        info!("🔄️👤️ Order {order_id} confirmed by admin #{admin_id}");
        self.dispatch(order_id).await
    }

    /// Handles an authenticated supplier callback. Replays are harmless: terminal orders are left alone, so the
    /// success or failure notification fires exactly once.
    pub async fn process_supplier_notification(
        &self,
        notification: SupplierNotification,
    ) -> Result<SupplierOutcome, LedgerError> {
        debug!("🔄️🛒️ Supplier reports {} for order {}", notification.status, notification.ref_id);
        let changed = self.apply_supplier_status(&notification).await?;
        self.supplier_outcome(changed, &notification).await
    }

    /// Pull reconciliation. Asks the supplier for the current status of a dispatched, `processing` order and applies
    /// it exactly as a callback would. Nothing is written if the mapped status equals the current one.
    ///
    /// Orders that were never handed to the supplier are not queried, because a status query for an unknown
    /// reference would place the order upstream.
    pub async fn sync_order_status(&self, order_id: &OrderId) -> Result<SyncResult, LedgerError> {
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Processing || !order.is_dispatched() {
            debug!("🔄️🔃️ Order {order_id} is {} and not awaiting the supplier. Nothing to sync.", order.status);
            return Ok(SyncResult { order, supplier_status: None, changed: false });
        }
        let tx = self.supplier.check_status(&FulfillmentRequest::from(&order)).await?;
        info!("🔄️🔃️ Supplier status for {order_id}: {}", tx.status);
        let supplier_status = tx.status.clone();
        let notification = SupplierNotification::from(tx);
        let changed = self.apply_supplier_status(&notification).await?;
        let status_changed = changed.new_status().is_some();
        let outcome = self.supplier_outcome(changed, &notification).await?;
        Ok(SyncResult { order: outcome.order().clone(), supplier_status: Some(supplier_status), changed: status_changed })
    }

    async fn apply_supplier_status(&self, notification: &SupplierNotification) -> Result<OrderChanged, LedgerError> {
        let status = notification.status.clone();
        let sn = notification.sn.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        let message = notification.message.clone().unwrap_or_default();
        self.db
            .update_order_locked(&notification.ref_id, move |order| {
                if order.status.is_terminal() {
                    debug!("🔄️🛒️ Order {} is already {}. Supplier update ignored.", order.order_id, order.status);
                    return Ok(None);
                }
                if order.status != OrderStatusType::Processing {
                    warn!(
                        "🔄️🛒️ Supplier update for order {} which is still {}. It was never dispatched. Ignoring it.",
                        order.order_id, order.status
                    );
                    return Ok(None);
                }
                // The callback can beat our own bookkeeping of the supplier's acceptance
                let confirmed_at = if order.confirmed_at.is_none() { Some(Utc::now()) } else { None };
                let update = match status {
                    SupplierStatus::Success => {
                        let note = match &sn {
                            Some(sn) => format!("Supplier confirmed delivery. SN: {sn}"),
                            None => "Supplier confirmed delivery".to_string(),
                        };
                        OrderUpdate::status(OrderStatusType::Success, note, None).with_sn(sn)
                    },
                    SupplierStatus::Failed => {
                        OrderUpdate::status(OrderStatusType::Failed, format!("Supplier reported failure: {message}"), None)
                    },
                    SupplierStatus::Pending(s) => {
                        debug!("🔄️🛒️ Order {} is still pending upstream ({s})", order.order_id);
                        if order.confirmed_at.is_some() {
                            return Ok(None);
                        }
                        OrderUpdate::default()
                    },
                };
                Ok(Some(OrderUpdate { confirmed_at, ..update }))
            })
            .await
    }

    async fn supplier_outcome(
        &self,
        changed: OrderChanged,
        notification: &SupplierNotification,
    ) -> Result<SupplierOutcome, LedgerError> {
        let order = changed.new_order.clone();
        match changed.new_status() {
            Some(OrderStatusType::Success) => {
                info!("🔄️✅️ Order {} delivered. SN: {}", order.order_id, order.sn.as_deref().unwrap_or("-"));
                let product = self.db.fetch_product(&order.sku).await.unwrap_or_else(|e| {
                    warn!("🔄️✅️ Could not load product {} for the success notification: {e}", order.sku);
                    None
                });
                let event = OrderSucceededEvent::new(order.clone(), ProductView::for_order(&order, product.as_ref()));
                for emitter in &self.producers.order_succeeded_producer {
                    emitter.publish_event(event.clone()).await;
                }
                Ok(SupplierOutcome::Succeeded(order))
            },
            Some(OrderStatusType::Failed) => {
                let reason = notification.message.clone().unwrap_or_else(|| "Supplier reported failure".into());
                warn!("🔄️❌️ Supplier failed order {}: {reason}", order.order_id);
                self.notify_failure(&order, reason).await;
                Ok(SupplierOutcome::Failed(order))
            },
            _ if order.status == OrderStatusType::Processing => Ok(SupplierOutcome::StillPending(order)),
            _ => Ok(SupplierOutcome::Ignored(order)),
        }
    }

    /// Attaches a manual-transfer payment to a `pending` order. The amount is the order's stored price.
    pub async fn submit_manual_payment(&self, request: ManualPaymentRequest) -> Result<Payment, LedgerError> {
        validate_proof_reference(&request.proof_reference)?;
        let payment = NewPayment::new(new_payment_id(), request.payment_type, request.proof_reference.trim());
        let (payment, order) = self.db.insert_payment_for_order(&request.order_id, payment).await?;
        info!(
            "🔄️🏦️ Manual {} payment {} of {} submitted for order {}",
            payment.payment_type, payment.payment_id, payment.amount, order.order_id
        );
        Ok(payment)
    }

    /// Admin decision on a manual payment. Verifying moves the order to `processing` and dispatches it; rejecting
    /// fails the order. Both happen in the same transaction as the payment update.
    ///
    /// A payment can still be rejected after its order has left `pending` (e.g. the customer also paid through the
    /// gateway). The order is then left alone.
    pub async fn resolve_manual_payment(
        &self,
        payment_id: &str,
        resolution: PaymentResolution,
    ) -> Result<PaymentReview, LedgerError> {
        let status = resolution.status;
        let admin_id = resolution.admin_id;
        let note = resolution.note.clone();
        let (payment, changed) = self
            .db
            .resolve_payment_locked(payment_id, resolution, move |payment, order| {
                if order.status != OrderStatusType::Pending {
                    if status == PaymentStatus::Rejected {
                        // The order was settled some other way. Only the payment is closed.
                        info!(
                            "🔄️🏦️ Payment {} rejected for order {} which is already {}. Order left as is.",
                            payment.payment_id, order.order_id, order.status
                        );
                        return Ok(None);
                    }
                    return Err(LedgerError::OrderNotPending(order.order_id.clone(), order.status));
                }
                let update = match status {
                    PaymentStatus::Verified => {
                        let mut update = OrderUpdate::status(
                            OrderStatusType::Processing,
                            format!("Manual payment {} verified", payment.payment_id),
                            Some(admin_id),
                        );
                        update.confirmed_by = Some(admin_id);
                        update
                    },
                    _ => {
                        let reason = note.as_deref().unwrap_or("no reason given");
                        OrderUpdate::status(
                            OrderStatusType::Failed,
                            format!("Manual payment {} rejected: {reason}", payment.payment_id),
                            Some(admin_id),
                        )
                    },
                };
                Ok(Some(update))
            })
            .await?;
        info!("🔄️🏦️ Payment {payment_id} {} by admin #{admin_id}", payment.status);
        let order = changed.new_order.clone();
        match changed.new_status() {
            Some(OrderStatusType::Processing) => {
                let outcome = self.dispatch(&order.order_id).await?;
                Ok(PaymentReview { payment, order: outcome.order().clone(), dispatch: Some(outcome) })
            },
            Some(OrderStatusType::Failed) => {
                let reason = format!("Payment rejected: {}", payment.admin_note.as_deref().unwrap_or("no reason given"));
                self.notify_failure(&order, reason).await;
                Ok(PaymentReview { payment, order, dispatch: None })
            },
            _ => Ok(PaymentReview { payment, order, dispatch: None }),
        }
    }

    async fn notify_failure(&self, order: &Order, reason: String) {
        let event = OrderFailedEvent::new(order.clone(), reason);
        for emitter in &self.producers.order_failed_producer {
            debug!("🔄️📬️ Notifying order failed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
