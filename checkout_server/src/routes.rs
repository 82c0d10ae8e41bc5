//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database rather than blocking on it,
//! so a slow checkout (e.g. one waiting for the SQLite write lock) does not hold up other requests on the same worker.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use checkout_engine::{
    checkout_api::CheckoutRequest,
    db_types::{CartLine, OrderId, ProductId},
    traits::{CartManagement, CheckoutDatabase, ProductCatalog},
    CartApi,
    CatalogApi,
    FinalizationError,
    OrderFinalizationApi,
};
use log::*;

use crate::{
    auth::{AuthenticatedUser, OptionalUser},
    config::ServerOptions,
    data_objects::{
        AddCartItemRequest,
        CartMergeRequest,
        CartMergeResponse,
        CartResponse,
        FinalizeResponse,
        JsonResponse,
        UpdateQuantityRequest,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(product_by_id => Get "/products/{product_id}" impl ProductCatalog);
pub async fn product_by_id<B: ProductCatalog>(
    path: web::Path<ProductId>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    trace!("💻️ GET product {product_id}");
    let product = api.product(&product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(finalize_checkout => Post "/checkout/finalize" impl CheckoutDatabase);
/// Route handler for order finalization
///
/// The client posts the receipt it received from the payment gateway, optionally with the line items it wants to buy
/// (`orderDetails.cartItems`). Without line items, the signed-in user's persisted cart is checked out, so a bearer
/// token is required.
///
/// Posting the same receipt again is safe. The order created by the first call is returned, with the same body.
pub async fn finalize_checkout<B: CheckoutDatabase>(
    req: HttpRequest,
    user: OptionalUser,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFinalizationApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let user_id = user.into_inner();
    debug!(
        "💻️ POST checkout for payment {} by {}",
        request.gateway_payment_id,
        user_id.as_ref().map(|u| u.as_str()).unwrap_or("a guest")
    );
    let result = api.finalize(user_id, request).await.map_err(|e| {
        if matches!(e, FinalizationError::SignatureMismatch) {
            let ip = get_remote_ip(&req, options.use_x_forwarded_for);
            warn!("💻️ Payment receipt from {ip:?} failed verification");
        }
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(FinalizeResponse::from(&result)))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement);
pub async fn my_cart<B: CartManagement>(
    user: AuthenticatedUser,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", user.user_id());
    let cart = api.cart(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

route!(add_cart_item => Post "/cart/items" impl CartManagement);
pub async fn add_cart_item<B: CartManagement>(
    user: AuthenticatedUser,
    body: web::Json<AddCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let line = CartLine::from(body.into_inner());
    debug!("💻️ Adding {} x {} to the cart of {}", line.quantity, line.product_id, user.user_id());
    let item = api.add_item(user.user_id(), line).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(update_cart_item => Put "/cart/items/{product_id}" impl CartManagement);
pub async fn update_cart_item<B: CartManagement>(
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    body: web::Json<UpdateQuantityRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ Setting quantity of {product_id} to {quantity} in the cart of {}", user.user_id());
    match api.update_quantity(user.user_id(), &product_id, quantity).await? {
        Some(item) => Ok(HttpResponse::Ok().json(item)),
        None => Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{product_id} removed from cart")))),
    }
}

route!(remove_cart_item => Delete "/cart/items/{product_id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ Removing {product_id} from the cart of {}", user.user_id());
    if api.remove_item(user.user_id(), &product_id).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{product_id} removed from cart"))))
    } else {
        Err(ServerError::NoRecordFound(format!("{product_id} is not in the cart")))
    }
}

route!(merge_cart => Post "/cart/merge" impl CartManagement);
/// Merges the anonymous cart the client kept before sign-in into the user's persisted cart and returns the result.
pub async fn merge_cart<B: CartManagement>(
    user: AuthenticatedUser,
    body: web::Json<CartMergeRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ Merging {} anonymous cart lines for {}", request.items.len(), user.user_id());
    let (merged, cart) = api.merge(user.user_id(), &request.items).await?;
    Ok(HttpResponse::Ok().json(CartMergeResponse { merged, cart: CartResponse::from(cart) }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl CheckoutDatabase);
pub async fn my_orders<B: CheckoutDatabase>(
    user: AuthenticatedUser,
    api: web::Data<OrderFinalizationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET orders for {}", user.user_id());
    let orders = api.orders_for_user(user.user_id()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_order_by_id => Get "/orders/{order_id}" impl CheckoutDatabase);
pub async fn my_order_by_id<B: CheckoutDatabase>(
    user: AuthenticatedUser,
    path: web::Path<OrderId>,
    api: web::Data<OrderFinalizationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order {order_id} for {}", user.user_id());
    // Other users' orders are reported as missing, so order ids cannot be guessed
    let order = api
        .order_for_user(user.user_id(), &order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}
