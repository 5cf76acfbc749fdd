use std::sync::Arc;

use crate::domain::aggregates::{Cart, CartItem};
use crate::repositories::CartRepository;
use crate::Result;

/// Server-side copy of each user's cart.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    /// Items of the stored cart; a user without one has an empty cart.
    pub async fn items(&self, user_id: &str) -> Result<Vec<CartItem>> {
        Ok(self.carts.get_cart(user_id).await?.map(Cart::into_items).unwrap_or_default())
    }

    /// Overwrites the stored cart. Repeated product ids are folded into one
    /// row so the stored list never carries duplicates.
    pub async fn replace(&self, user_id: &str, items: Vec<CartItem>) -> Result<()> {
        let cart = Cart::from_items(Some(user_id.to_string()), items);
        self.carts.save_cart(user_id, cart.items()).await?;
        tracing::debug!(user_id, lines = cart.items().len(), "cart saved");
        Ok(())
    }

    /// Merges a device cart into the stored one, keeping the larger quantity
    /// per product. Returns the merged items.
    pub async fn merge(&self, user_id: &str, local: Vec<CartItem>) -> Result<Vec<CartItem>> {
        let mut cart = self.carts.get_cart(user_id).await?.unwrap_or_else(|| Cart::for_user(user_id));
        cart.merge_max(local);
        self.carts.save_cart(user_id, cart.items()).await?;
        tracing::info!(user_id, lines = cart.items().len(), "device cart merged");
        Ok(cart.into_items())
    }
}
