use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, ProductView, UsdtConversion},
    helpers::FailureCategory,
};

/// Fired once, after the commit that moved an order to `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSucceededEvent {
    pub order: Order,
    pub product: ProductView,
}

impl OrderSucceededEvent {
    pub fn new(order: Order, product: ProductView) -> Self {
        Self { order, product }
    }
}

/// Fired once, after the commit that moved an order to `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    /// The raw reason, as recorded in the status history
    pub reason: String,
    /// The customer-facing bucket for `reason`
    pub category: FailureCategory,
}

impl OrderFailedEvent {
    pub fn new(order: Order, reason: String) -> Self {
        let category = FailureCategory::from_reason(&reason);
        Self { order, reason, category }
    }
}

/// Fired once, after the commit that approved or rejected a USDT conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdtConversionResolvedEvent {
    pub conversion: UsdtConversion,
}

impl UsdtConversionResolvedEvent {
    pub fn new(conversion: UsdtConversion) -> Self {
        Self { conversion }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderSucceeded(OrderSucceededEvent),
    OrderFailed(OrderFailedEvent),
    UsdtConversionResolved(UsdtConversionResolvedEvent),
}
