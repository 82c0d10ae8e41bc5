use std::fmt::Debug;

use log::*;

use crate::{
    checkout_api::{aggregate_lines, errors::CartApiError, MergeResult},
    db_types::{CartEntry, CartItem, CartLine, ProductId, UserId},
    traits::CartManagement,
};

/// Persisted carts and anonymous cart reconciliation.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn cart(&self, user_id: &UserId) -> Result<Vec<CartEntry>, CartApiError> {
        Ok(self.db.fetch_cart(user_id).await?)
    }

    pub async fn add_item(&self, user_id: &UserId, line: CartLine) -> Result<CartItem, CartApiError> {
        validate_quantity(&line)?;
        Ok(self.db.add_to_cart(user_id, &line).await?)
    }

    /// Sets the quantity of a line. Zero removes it.
    pub async fn update_quantity(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        if quantity < 0 {
            return Err(CartApiError::Validation(format!("Quantity cannot be negative, got {quantity}")));
        }
        Ok(self.db.set_cart_quantity(user_id, product_id, quantity).await?)
    }

    pub async fn remove_item(&self, user_id: &UserId, product_id: &ProductId) -> Result<bool, CartApiError> {
        Ok(self.db.remove_from_cart(user_id, product_id).await?)
    }

    /// Merges the anonymous cart held by the client into the user's persisted cart after sign-in.
    ///
    /// Repeated products in `anonymous` are summed first, so `[{p1,2},{p1,1}]` counts as `{p1,3}`. Every quantity must
    /// be positive; otherwise nothing is written. Returns the merged cart.
    pub async fn merge(
        &self,
        user_id: &UserId,
        anonymous: &[CartLine],
    ) -> Result<(MergeResult, Vec<CartEntry>), CartApiError> {
        anonymous.iter().try_for_each(validate_quantity)?;
        let lines = aggregate_lines(anonymous);
        trace!("🛒️ Merging {} anonymous lines ({} distinct) into the cart of {user_id}", anonymous.len(), lines.len());
        let result = if lines.is_empty() { MergeResult::default() } else { self.db.merge_cart(user_id, &lines).await? };
        let cart = self.db.fetch_cart(user_id).await?;
        Ok((result, cart))
    }
}

fn validate_quantity(line: &CartLine) -> Result<(), CartApiError> {
    if line.quantity <= 0 {
        return Err(CartApiError::Validation(format!(
            "Quantity for product {} must be positive, got {}",
            line.product_id, line.quantity
        )));
    }
    Ok(())
}
