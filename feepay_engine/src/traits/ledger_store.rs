use std::time::Duration;

use thiserror::Error;

use crate::{
    db_types::{
        IllegalTransition,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentStatus,
        StatusHistory,
        UsdtConversionStatus,
    },
    order_objects::{OrderChanged, OrderQueryFilter},
    payment_objects::PaymentQueryFilter,
    traits::{data_objects::OrderUpdate, CheckoutError, FulfillmentError, PaymentResolution, UsdtRateError},
};

/// Coarse classification of every engine error. Callers map these onto their own surface (HTTP codes, exit codes...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. The caller can fix the request and try again.
    Validation,
    /// Unknown order, SKU, payment or USDT conversion.
    NotFound,
    /// A webhook or callback could not be authenticated.
    SignatureInvalid,
    /// The supplier or the payment gateway failed.
    Upstream,
    /// The order or payment is already past the point where this request makes sense.
    Conflict,
    /// Anything else. The transaction was rolled back.
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(String),
    #[error("SKU {0} does not resolve to an active product")]
    InvalidSku(String),
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),
    #[error("{0}")]
    IllegalTransition(#[from] IllegalTransition),
    #[error("Order {0} is {1}, so this action is not allowed")]
    OrderNotPending(OrderId, OrderStatusType),
    #[error("Order {0} already has a payment attached")]
    OrderAlreadyHasPayment(OrderId),
    #[error("Payment {0} has already been {1}")]
    PaymentAlreadyResolved(String, PaymentStatus),
    #[error("Upstream error: {0}")]
    UpstreamError(String),
    #[error("The requested USDT conversion {0} does not exist")]
    ConversionNotFound(String),
    #[error("USDT conversion {0} has already been {1}")]
    ConversionAlreadyResolved(String, UsdtConversionStatus),
    #[error("USDT conversions are unavailable until a USDT rate has been set")]
    NoUsdtRate,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Internal,
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::OrderNotFound(_) | Self::PaymentNotFound(_) | Self::InvalidSku(_) | Self::ConversionNotFound(_) => {
                ErrorKind::NotFound
            },
            Self::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            Self::IllegalTransition(_) |
            Self::OrderNotPending(..) |
            Self::OrderAlreadyHasPayment(_) |
            Self::PaymentAlreadyResolved(..) |
            Self::ConversionAlreadyResolved(..) |
            Self::NoUsdtRate => ErrorKind::Conflict,
            Self::UpstreamError(_) => ErrorKind::Upstream,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

impl From<FulfillmentError> for LedgerError {
    fn from(e: FulfillmentError) -> Self {
        LedgerError::UpstreamError(e.to_string())
    }
}

impl From<UsdtRateError> for LedgerError {
    fn from(e: UsdtRateError) -> Self {
        match e {
            UsdtRateError::DatabaseError(s) => LedgerError::DatabaseError(s),
            UsdtRateError::RateDoesNotExist => LedgerError::NoUsdtRate,
            UsdtRateError::InvalidRate(s) => LedgerError::ValidationError(s),
        }
    }
}

impl From<CheckoutError> for LedgerError {
    fn from(e: CheckoutError) -> Self {
        LedgerError::UpstreamError(e.to_string())
    }
}

/// The persisted record of truth for orders, manual payments and their audit trail.
///
/// Reads (`fetch_*`, `search_*`) never lock. Every write that can change an order's state goes through one of the
/// `*_locked` methods, which serialise concurrent writers on the same order.
#[allow(async_fn_in_trait)]
pub trait LedgerStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order together with its initial `pending` history row, in a single atomic transaction.
    ///
    /// If the order carries an idempotency key that was used less than `idempotency_window` ago, nothing is written and
    /// the original order is returned with `false`. Otherwise the new order is returned with `true`. An expired key is
    /// re-bound to the new order.
    async fn insert_order(&self, order: NewOrder, idempotency_window: Duration) -> Result<(Order, bool), LedgerError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError>;

    /// The status history for the order, oldest first.
    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<StatusHistory>, LedgerError>;

    /// The single transaction boundary for order state changes.
    ///
    /// 1. The order row is locked and read.
    /// 2. `decide` is called with the current state. Returning `Ok(None)` means "nothing to do": the transaction is
    ///    rolled back and the unchanged order is returned. Returning an error aborts the transaction.
    /// 3. A status change in the update is checked against the transition table. Illegal moves abort the transaction
    ///    with [`LedgerError::IllegalTransition`].
    /// 4. The update is applied, the history row (if any) is appended and the transaction commits.
    ///
    /// Returns [`LedgerError::OrderNotFound`] if the order does not exist.
    async fn update_order_locked<F>(&self, order_id: &OrderId, decide: F) -> Result<OrderChanged, LedgerError>
    where F: FnOnce(&Order) -> Result<Option<OrderUpdate>, LedgerError> + Send;

    /// Attaches a new manual payment to a `pending` order. The amount is copied from the order's total price.
    ///
    /// Fails with [`LedgerError::OrderAlreadyHasPayment`] if a payment is already linked, and
    /// [`LedgerError::OrderNotPending`] if the order has moved on.
    async fn insert_payment_for_order(
        &self,
        order_id: &OrderId,
        payment: NewPayment,
    ) -> Result<(Payment, Order), LedgerError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, LedgerError>;

    async fn search_payments(&self, query: PaymentQueryFilter) -> Result<Vec<Payment>, LedgerError>;

    /// Verifies or rejects a pending manual payment and applies the resulting order change in the same transaction.
    ///
    /// Both the payment and its order are locked. A payment that is no longer pending fails with
    /// [`LedgerError::PaymentAlreadyResolved`]. `decide` works exactly as in [`Self::update_order_locked`].
    async fn resolve_payment_locked<F>(
        &self,
        payment_id: &str,
        resolution: PaymentResolution,
        decide: F,
    ) -> Result<(Payment, OrderChanged), LedgerError>
    where
        F: FnOnce(&Payment, &Order) -> Result<Option<OrderUpdate>, LedgerError> + Send;
}
