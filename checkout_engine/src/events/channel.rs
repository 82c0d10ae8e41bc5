//! Delivery of [`OrderFinalizedEvent`]s to the registered hook.
//!
//! The hook receives the event and nothing else. It has no access to engine state.
use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::*;
use tokio::sync::mpsc;

use crate::events::OrderFinalizedEvent;

pub type OrderFinalizedHook = Arc<dyn Fn(OrderFinalizedEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Calls the hook for every published event, in the order the events arrive.
pub struct OrderFinalizedHandler {
    listener: mpsc::Receiver<OrderFinalizedEvent>,
    sender: mpsc::Sender<OrderFinalizedEvent>,
    hook: OrderFinalizedHook,
}

impl OrderFinalizedHandler {
    pub fn new(buffer_size: usize, hook: OrderFinalizedHook) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, hook }
    }

    pub fn subscribe(&self) -> OrderFinalizedProducer {
        OrderFinalizedProducer { sender: self.sender.clone() }
    }

    /// Runs until every producer has been dropped and the queue is drained.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting order finalized hook");
        drop(self.sender);
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling finalized order {}", ev.order.id);
            (self.hook)(ev).await;
        }
        debug!("📬️ Order finalized hook has shut down");
    }
}

#[derive(Clone)]
pub struct OrderFinalizedProducer {
    sender: mpsc::Sender<OrderFinalizedEvent>,
}

impl OrderFinalizedProducer {
    pub async fn publish_event(&self, event: OrderFinalizedEvent) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Order {} was not published. The hook has shut down.", e.0.order.id);
        }
    }
}
