mod channel;
mod event_types;
mod hooks;

pub use channel::{OrderFinalizedHandler, OrderFinalizedHook, OrderFinalizedProducer};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
