use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    checkout_api::errors::FinalizationError,
    db_types::{CartLine, Money, Order, OrderItem, ProductId, UserId},
    traits::CheckoutError,
};

//--------------------------------------   Checkout request    ---------------------------------------------------------
/// The body a client posts after completing payment with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CheckoutRequest {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    #[serde(default)]
    pub order_details: Option<OrderDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// When present, the order is built from these items (guest or direct-buy checkout) instead of the user's cart.
    #[serde(default)]
    pub cart_items: Option<Vec<PricedLine>>,
    #[serde(default)]
    pub shipping_address: Option<Value>,
}

/// A line supplied by the client, carrying its own unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Money,
}

impl PricedLine {
    pub fn new<P: Into<ProductId>>(product_id: P, quantity: i64, price: Money) -> Self {
        Self { product_id: product_id.into(), quantity, price }
    }
}

impl CheckoutRequest {
    pub fn new(gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> Self {
        Self {
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: gateway_payment_id.to_string(),
            signature: signature.to_string(),
            order_details: None,
        }
    }

    pub fn with_items(mut self, items: Vec<PricedLine>) -> Self {
        self.order_details.get_or_insert_with(OrderDetails::default).cart_items = Some(items);
        self
    }

    pub fn with_shipping_address(mut self, address: Value) -> Self {
        self.order_details.get_or_insert_with(OrderDetails::default).shipping_address = Some(address);
        self
    }

    pub fn supplied_items(&self) -> Option<&[PricedLine]> {
        self.order_details.as_ref().and_then(|d| d.cart_items.as_deref())
    }

    pub fn shipping_address(&self) -> Option<&Value> {
        self.order_details.as_ref().and_then(|d| d.shipping_address.as_ref())
    }

    /// Structural checks that run before the signature is looked at.
    pub fn validate(&self) -> Result<(), FinalizationError> {
        if self.gateway_order_id.trim().is_empty() {
            return Err(FinalizationError::Validation("gatewayOrderId is required".into()));
        }
        if self.gateway_payment_id.trim().is_empty() {
            return Err(FinalizationError::Validation("gatewayPaymentId is required".into()));
        }
        if self.signature.trim().is_empty() {
            return Err(FinalizationError::Validation("signature is required".into()));
        }
        if let Some(items) = self.supplied_items() {
            for item in items {
                if item.product_id.as_str().trim().is_empty() {
                    return Err(FinalizationError::Validation("cartItems contains an empty productId".into()));
                }
                if item.quantity <= 0 {
                    return Err(FinalizationError::Validation(format!(
                        "Quantity for product {} must be positive, got {}",
                        item.product_id, item.quantity
                    )));
                }
            }
        }
        if let Some(address) = self.shipping_address() {
            if !(address.is_object() || address.is_null()) {
                return Err(FinalizationError::Validation("shippingAddress must be an object".into()));
            }
        }
        Ok(())
    }
}

//--------------------------------------     Cart source       ---------------------------------------------------------
/// Where the order lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartSource {
    /// The user's persisted cart, priced from the catalog at snapshot time. The cart is cleared on success.
    UserCart(UserId),
    /// Lines supplied with the request. Prices pass through. `user_id` is `None` for guest checkout.
    Supplied { user_id: Option<UserId>, items: Vec<PricedLine> },
}

impl CartSource {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            CartSource::UserCart(user_id) => Some(user_id),
            CartSource::Supplied { user_id, .. } => user_id.as_ref(),
        }
    }

    pub fn clears_cart(&self) -> bool {
        matches!(self, CartSource::UserCart(_))
    }
}

//--------------------------------------    Order snapshot     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<&PricedLine> for SnapshotLine {
    fn from(line: &PricedLine) -> Self {
        Self { product_id: line.product_id.clone(), quantity: line.quantity, unit_price: line.price }
    }
}

/// The immutable list of lines an order is built from, with its exact total.
///
/// Once constructed, neither the lines nor the prices change for the rest of the finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    lines: Vec<SnapshotLine>,
    total: Money,
}

impl OrderSnapshot {
    pub fn try_new(lines: Vec<SnapshotLine>) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let mut total = Money::zero();
        for line in &lines {
            if line.quantity <= 0 {
                return Err(CheckoutError::InvalidLine(format!(
                    "quantity {} for product {}",
                    line.quantity, line.product_id
                )));
            }
            total = line
                .unit_price
                .checked_mul(line.quantity)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| CheckoutError::InvalidLine("order total is too large".into()))?;
        }
        Ok(Self { lines, total })
    }

    pub fn lines(&self) -> &[SnapshotLine] {
        &self.lines
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

//--------------------------------------   Verified checkout   ---------------------------------------------------------
/// A checkout whose payment receipt has passed signature verification.
///
/// Only [`crate::OrderFinalizationApi`] can create one, so a backend never sees an unverified receipt.
#[derive(Debug, Clone)]
pub struct VerifiedCheckout {
    gateway_order_id: String,
    gateway_payment_id: String,
    payment_method: String,
    source: CartSource,
    shipping_address: Option<Value>,
}

impl VerifiedCheckout {
    pub(crate) fn new(request: CheckoutRequest, source: CartSource, payment_method: &str) -> Self {
        let shipping_address = request.shipping_address().cloned().filter(|v| !v.is_null());
        Self {
            gateway_order_id: request.gateway_order_id,
            gateway_payment_id: request.gateway_payment_id,
            payment_method: payment_method.to_string(),
            source,
            shipping_address,
        }
    }

    pub fn gateway_order_id(&self) -> &str {
        &self.gateway_order_id
    }

    pub fn gateway_payment_id(&self) -> &str {
        &self.gateway_payment_id
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn source(&self) -> &CartSource {
        &self.source
    }

    pub fn shipping_address(&self) -> Option<&Value> {
        self.shipping_address.as_ref()
    }
}

//--------------------------------------   Finalized orders    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeResult {
    /// A new order was committed by this call
    Created(FinalizedOrder),
    /// The payment had already been turned into an order; nothing was written
    AlreadyFinalized(FinalizedOrder),
}

impl FinalizeResult {
    pub fn order(&self) -> &FinalizedOrder {
        match self {
            FinalizeResult::Created(o) | FinalizeResult::AlreadyFinalized(o) => o,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, FinalizeResult::Created(_))
    }
}

/// The stages of an order finalization. `RolledBack` is reachable from every stage before `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizationStage {
    Verifying,
    Verified,
    Reserving,
    Persisting,
    ClearingCart,
    Committed,
    RolledBack,
}

impl Display for FinalizationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FinalizationStage::Verifying => "Verifying",
            FinalizationStage::Verified => "Verified",
            FinalizationStage::Reserving => "Reserving",
            FinalizationStage::Persisting => "Persisting",
            FinalizationStage::ClearingCart => "ClearingCart",
            FinalizationStage::Committed => "Committed",
            FinalizationStage::RolledBack => "RolledBack",
        };
        f.write_str(s)
    }
}

//--------------------------------------      Cart merge       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    /// Number of existing cart lines whose quantity was increased
    pub updated: usize,
    /// Number of lines added to the cart
    pub inserted: usize,
    /// Products in the anonymous cart that are not in the catalog
    pub skipped: Vec<ProductId>,
}

/// Sums the quantities of repeated products, keeping the order in which each product was first seen.
pub fn aggregate_lines(lines: &[CartLine]) -> Vec<CartLine> {
    let mut index = HashMap::<&ProductId, usize>::with_capacity(lines.len());
    let mut result: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match index.get(&line.product_id) {
            Some(&i) => result[i].quantity += line.quantity,
            None => {
                index.insert(&line.product_id, result.len());
                result.push(line.clone());
            },
        }
    }
    result
}
