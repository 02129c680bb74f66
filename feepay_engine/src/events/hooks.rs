use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderFailedEvent, OrderSucceededEvent, UsdtConversionResolvedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_succeeded_producer: Vec<EventProducer<OrderSucceededEvent>>,
    pub order_failed_producer: Vec<EventProducer<OrderFailedEvent>>,
    pub conversion_resolved_producer: Vec<EventProducer<UsdtConversionResolvedEvent>>,
}

pub struct EventHandlers {
    pub on_order_succeeded: Option<EventHandler<OrderSucceededEvent>>,
    pub on_order_failed: Option<EventHandler<OrderFailedEvent>>,
    pub on_conversion_resolved: Option<EventHandler<UsdtConversionResolvedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_succeeded = hooks.on_order_succeeded.map(|f| EventHandler::new(buffer_size, f));
        let on_order_failed = hooks.on_order_failed.map(|f| EventHandler::new(buffer_size, f));
        let on_conversion_resolved = hooks.on_conversion_resolved.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_succeeded, on_order_failed, on_conversion_resolved }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_succeeded {
            result.order_succeeded_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_failed {
            result.order_failed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_conversion_resolved {
            result.conversion_resolved_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_succeeded {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_failed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_conversion_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// The notification hooks. Each hook runs on its own task, after the ledger transaction that triggered it has
/// committed, so nothing a hook does (or fails to do) can touch order state.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_succeeded: Option<Handler<OrderSucceededEvent>>,
    pub on_order_failed: Option<Handler<OrderFailedEvent>>,
    pub on_conversion_resolved: Option<Handler<UsdtConversionResolvedEvent>>,
}

impl EventHooks {
    pub fn on_order_succeeded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSucceededEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_succeeded = Some(Arc::new(f));
        self
    }

    pub fn on_order_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_failed = Some(Arc::new(f));
        self
    }

    pub fn on_conversion_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(UsdtConversionResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_conversion_resolved = Some(Arc::new(f));
        self
    }
}
