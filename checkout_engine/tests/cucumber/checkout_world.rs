use checkout_common::Secret;
use checkout_engine::{
    checkout_api::{CheckoutRequest, FinalizeResult, MergeResult},
    db_types::UserId,
    helpers::{sign_payment, PaymentVerifier},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CartApi,
    CatalogApi,
    FinalizationError,
    OrderFinalizationApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

pub const GATEWAY_SECRET: &str = "cucumber-gateway-secret";

#[derive(Default, Debug, World)]
pub struct CheckoutWorld {
    pub system: Option<CheckoutSystem>,
    pub last_checkout: Option<Result<FinalizeResult, FinalizationError>>,
    pub last_merge: Option<MergeResult>,
}

#[derive(Debug)]
pub struct CheckoutSystem {
    pub db_path: String,
    pub api: OrderFinalizationApi<SqliteDatabase>,
    pub carts: CartApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
}

impl CheckoutWorld {
    pub fn system(&self) -> &CheckoutSystem {
        self.system.as_ref().expect("Checkout system not initialised")
    }

    pub fn api(&self) -> &OrderFinalizationApi<SqliteDatabase> {
        &self.system().api
    }

    pub fn carts(&self) -> &CartApi<SqliteDatabase> {
        &self.system().carts
    }

    pub fn catalog(&self) -> &CatalogApi<SqliteDatabase> {
        &self.system().catalog
    }

    pub fn last_checkout(&self) -> &Result<FinalizeResult, FinalizationError> {
        self.last_checkout.as_ref().expect("No checkout has been attempted")
    }

    pub async fn checkout(&mut self, user: Option<&str>, request: CheckoutRequest) {
        let user = user.map(UserId::from);
        let result = self.api().finalize(user, request).await;
        debug!("Checkout result: {result:?}");
        self.last_checkout = Some(result);
    }
}

impl CheckoutSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        debug!("Created database: {url}");
        let verifier = PaymentVerifier::new(Secret::new(GATEWAY_SECRET.to_string())).expect("Invalid secret");
        let api = OrderFinalizationApi::new(db.clone(), Some(verifier));
        let carts = CartApi::new(db.clone());
        let catalog = CatalogApi::new(db);
        Self { db_path: url, api, carts, catalog }
    }
}

/// A receipt as the gateway would sign it
pub fn signed_request(payment_id: &str) -> CheckoutRequest {
    let gateway_order_id = format!("gw_order_{payment_id}");
    let signature = sign_payment(GATEWAY_SECRET, &gateway_order_id, payment_id);
    CheckoutRequest::new(&gateway_order_id, payment_id, &signature)
}
