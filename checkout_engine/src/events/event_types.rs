use serde::Serialize;

use crate::{
    checkout_api::FinalizedOrder,
    db_types::{Order, OrderItem},
};

/// Published once for every order that a finalization committed. Idempotent replays do not publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderFinalizedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderFinalizedEvent {
    pub fn new(order: FinalizedOrder) -> Self {
        Self { order: order.order, items: order.items }
    }
}
