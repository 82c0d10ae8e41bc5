use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::events::{OrderFinalizedEvent, OrderFinalizedHandler, OrderFinalizedHook, OrderFinalizedProducer};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_finalized_producer: Vec<OrderFinalizedProducer>,
}

pub struct EventHandlers {
    pub on_order_finalized: Option<OrderFinalizedHandler>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_finalized = hooks.on_order_finalized.map(|f| OrderFinalizedHandler::new(buffer_size, f));
        Self { on_order_finalized }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_finalized {
            result.order_finalized_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_finalized {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_finalized: Option<OrderFinalizedHook>,
}

impl EventHooks {
    pub fn on_order_finalized<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderFinalizedEvent) -> BoxFuture<'static, ()> + Send + Sync + 'static {
        self.on_order_finalized = Some(Arc::new(f));
        self
    }
}
