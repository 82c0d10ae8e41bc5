use checkout_engine::{
    checkout_api::{CartSource, FinalizeResult, FinalizedOrder, MergeResult, OrderSnapshot, VerifiedCheckout},
    db_types::{CartEntry, CartItem, CartLine, NewProduct, Order, OrderId, Product, ProductId, UserId},
    traits::{CartError, CartManagement, CatalogError, CheckoutDatabase, CheckoutError, ProductCatalog},
};
use mockall::mock;

mock! {
    pub CheckoutDb {}
    impl Clone for CheckoutDb {
        fn clone(&self) -> Self;
    }
    impl CheckoutDatabase for CheckoutDb {
        fn url(&self) -> &str;
        async fn finalize_order(&self, checkout: &VerifiedCheckout) -> Result<FinalizeResult, CheckoutError>;
        async fn resolve_snapshot(&self, source: &CartSource) -> Result<OrderSnapshot, CheckoutError>;
        async fn fetch_order_by_payment_id(&self, gateway_payment_id: &str) -> Result<Option<FinalizedOrder>, CheckoutError>;
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<FinalizedOrder>, CheckoutError>;
        async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, CheckoutError>;
    }
}

mock! {
    pub CartManager {}
    impl CartManagement for CartManager {
        async fn fetch_cart(&self, user_id: &UserId) -> Result<Vec<CartEntry>, CartError>;
        async fn add_to_cart(&self, user_id: &UserId, line: &CartLine) -> Result<CartItem, CartError>;
        async fn set_cart_quantity(&self, user_id: &UserId, product_id: &ProductId, quantity: i64) -> Result<Option<CartItem>, CartError>;
        async fn remove_from_cart(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, CartError>;
        async fn merge_cart(&self, user_id: &UserId, lines: &[CartLine]) -> Result<MergeResult, CartError>;
    }
}

mock! {
    pub Catalog {}
    impl ProductCatalog for Catalog {
        async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, CatalogError>;
        async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError>;
        async fn upsert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;
    }
}
