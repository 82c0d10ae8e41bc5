use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    checkout_api::{
        errors::FinalizationError,
        CartSource,
        CheckoutRequest,
        FinalizationStage,
        FinalizeResult,
        FinalizedOrder,
        VerifiedCheckout,
    },
    db_types::{Order, OrderId, UserId},
    events::{EventProducers, OrderFinalizedEvent},
    helpers::PaymentVerifier,
    traits::{CheckoutDatabase, CheckoutError},
};

pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PAYMENT_METHOD: &str = "online";

/// `OrderFinalizationApi` turns a client's claim "I paid" into exactly one durable order.
///
/// The payment receipt is verified before anything else happens. Only then is the backend asked to run the
/// finalization transaction, bounded by a timeout. If the timeout fires, the backend future is dropped, which rolls
/// back its uncommitted transaction.
pub struct OrderFinalizationApi<B> {
    db: B,
    verifier: Option<PaymentVerifier>,
    payment_method: String,
    timeout: Duration,
    producers: EventProducers,
}

impl<B> Debug for OrderFinalizationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFinalizationApi (timeout: {:?}, configured: {})", self.timeout, self.verifier.is_some())
    }
}

impl<B> OrderFinalizationApi<B> {
    /// `verifier` is `None` when no gateway secret is configured. Every finalization then fails with
    /// [`FinalizationError::GatewayNotConfigured`].
    pub fn new(db: B, verifier: Option<PaymentVerifier>) -> Self {
        Self {
            db,
            verifier,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            timeout: DEFAULT_CHECKOUT_TIMEOUT,
            producers: EventProducers::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_payment_method(mut self, payment_method: &str) -> Self {
        self.payment_method = payment_method.to_string();
        self
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFinalizationApi<B>
where B: CheckoutDatabase
{
    /// Finalizes the order for a payment receipt.
    ///
    /// `user_id` is the trusted identity of the caller, if there is one. A request without `cartItems` checks out the
    /// caller's persisted cart and so requires an identity; a request with `cartItems` (guest or direct-buy) does not.
    ///
    /// Replaying a receipt that was already finalized returns the existing order as
    /// [`FinalizeResult::AlreadyFinalized`], provided the caller is the customer the order belongs to. Anyone else gets
    /// [`CheckoutError::DuplicatePayment`] and learns nothing about the order.
    pub async fn finalize(
        &self,
        user_id: Option<UserId>,
        request: CheckoutRequest,
    ) -> Result<FinalizeResult, FinalizationError> {
        let payment_id = request.gateway_payment_id.clone();
        trace!("🧾️ [{payment_id}] {}", FinalizationStage::Verifying);
        let checkout = self.verify(user_id, request)?;
        trace!("🧾️ [{payment_id}] {}", FinalizationStage::Verified);
        let result = match tokio::time::timeout(self.timeout, self.db.finalize_order(&checkout)).await {
            Ok(Ok(result)) => result,
            Ok(Err(CheckoutError::DuplicatePayment(pid))) => {
                // Only the customer the order was created for gets it back
                let order = self
                    .db
                    .fetch_order_by_payment_id(&pid)
                    .await?
                    .filter(|o| o.order.user_id.as_ref() == checkout.source().user_id())
                    .ok_or_else(|| {
                        warn!("🧾️ [{pid}] Payment belongs to an order for a different customer. Refusing the checkout.");
                        CheckoutError::DuplicatePayment(pid.clone())
                    })?;
                info!("🧾️ [{pid}] A concurrent finalization created order {} first. Returning it.", order.order.id);
                FinalizeResult::AlreadyFinalized(order)
            },
            Ok(Err(e)) => {
                warn!("🧾️ [{payment_id}] Order finalization failed. {e}");
                return Err(e.into());
            },
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                error!("🧾️ [{payment_id}] Order finalization timed out after {ms} ms. The transaction was abandoned.");
                return Err(FinalizationError::Timeout(ms));
            },
        };
        if let FinalizeResult::Created(order) = &result {
            self.call_order_finalized_hook(order).await;
        }
        Ok(result)
    }

    /// Everything that happens before a transaction is opened. Nothing here touches the database.
    fn verify(&self, user_id: Option<UserId>, request: CheckoutRequest) -> Result<VerifiedCheckout, FinalizationError> {
        request.validate()?;
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            error!("🧾️ A checkout was attempted, but the payment gateway secret is not configured.");
            FinalizationError::GatewayNotConfigured
        })?;
        if !verifier.verify(&request.gateway_order_id, &request.gateway_payment_id, &request.signature) {
            warn!(
                "🧾️ [{}] Payment signature for gateway order {} did not verify. Rejecting the checkout.",
                request.gateway_payment_id, request.gateway_order_id
            );
            return Err(FinalizationError::SignatureMismatch);
        }
        let source = match request.supplied_items() {
            Some(items) => CartSource::Supplied { user_id, items: items.to_vec() },
            None => {
                let user_id = user_id.ok_or_else(|| {
                    FinalizationError::Authentication("Checking out a saved cart requires a signed-in user".into())
                })?;
                CartSource::UserCart(user_id)
            },
        };
        Ok(VerifiedCheckout::new(request, source, &self.payment_method))
    }

    async fn call_order_finalized_hook(&self, order: &FinalizedOrder) {
        for emitter in &self.producers.order_finalized_producer {
            debug!("🧾️ Notifying order finalized hook subscribers");
            emitter.publish_event(OrderFinalizedEvent::new(order.clone())).await;
        }
    }

    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, CheckoutError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Fetches the order, but only if it belongs to `user_id`.
    pub async fn order_for_user(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
    ) -> Result<Option<FinalizedOrder>, CheckoutError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order.filter(|o| o.order.user_id.as_ref() == Some(user_id)))
    }
}
