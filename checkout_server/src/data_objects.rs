use std::fmt::Display;

use checkout_engine::{
    checkout_api::{FinalizeResult, MergeResult},
    db_types::{CartEntry, CartLine, Money, Order, OrderId, OrderStatusType, ProductId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//--------------------------------------      Checkout         ---------------------------------------------------------
/// The body returned for a successful finalization. A replayed receipt gets an identical body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    pub success: bool,
    pub verified: bool,
    pub order_id: OrderId,
    pub order: OrderSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

impl From<&FinalizeResult> for FinalizeResponse {
    fn from(result: &FinalizeResult) -> Self {
        let order = &result.order().order;
        Self { success: true, verified: true, order_id: order.id.clone(), order: OrderSummary::from(order) }
    }
}

//--------------------------------------        Cart           ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl From<AddCartItemRequest> for CartLine {
    fn from(req: AddCartItemRequest) -> Self {
        CartLine { product_id: req.product_id, quantity: req.quantity }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// The anonymous, client-held cart that is merged into the user's cart after sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMergeRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartEntry>,
    /// `None` only if the total does not fit in the money type
    pub total: Option<Money>,
}

impl From<Vec<CartEntry>> for CartResponse {
    fn from(items: Vec<CartEntry>) -> Self {
        let total = items.iter().try_fold(Money::zero(), |acc, e| e.line_total().and_then(|t| acc.checked_add(t)));
        Self { items, total }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMergeResponse {
    pub merged: MergeResult,
    pub cart: CartResponse,
}
