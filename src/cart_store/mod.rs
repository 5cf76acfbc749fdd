//! Client-side cart
//!
//! [`CartStore`] keeps the shopper's cart in memory and writes every change
//! through to a device-local copy and, once signed in, to the server. On load
//! the server copy wins whenever it can be reached; the local copy is the
//! fallback. Signing in merges the anonymous device cart into the server cart
//! by keeping the larger quantity per product.

use thiserror::Error;

use crate::domain::aggregates::{Cart, CartItem, NewCartItem};
use crate::domain::pricing::{FeeSchedule, PriceBreakdown};

pub mod local;
pub mod remote;

pub use local::{FileCartStore, LocalCartStore, MemoryCartStore};
pub use remote::{HttpCartClient, RemoteCartStore};

#[derive(Error, Debug)]
pub enum CartStoreError {
    #[error("cart file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cart encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cart request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cart server answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("cart lock poisoned")]
    Poisoned,
}

pub struct CartStore<L, R> {
    local: L,
    remote: Option<R>,
    cart: Cart,
}

impl<L: LocalCartStore, R: RemoteCartStore> CartStore<L, R> {
    /// Opens the cart. With a remote, its copy replaces the local one; an
    /// unreachable server falls back to the device copy.
    pub async fn load(local: L, remote: Option<R>) -> Result<Self, CartStoreError> {
        let local_items = local.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "local cart unreadable, starting empty");
            vec![]
        });
        let items = match &remote {
            Some(server) => match server.fetch().await {
                Ok(items) => {
                    local.save(&items)?;
                    items
                }
                Err(e) => {
                    tracing::warn!(error = %e, "server cart unavailable, using device copy");
                    local_items
                }
            },
            None => local_items,
        };
        Ok(Self { local, remote, cart: Cart::from_items(None, items) })
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    pub fn price(&self, fees: &FeeSchedule) -> PriceBreakdown {
        self.cart.price(fees)
    }

    pub fn is_signed_in(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn add_item(&mut self, item: NewCartItem) -> Result<(), CartStoreError> {
        self.cart.add_item(item);
        self.persist().await
    }

    pub async fn remove_item(&mut self, id: &str) -> Result<(), CartStoreError> {
        self.cart.remove_item(id);
        self.persist().await
    }

    pub async fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<(), CartStoreError> {
        self.cart.update_quantity(id, quantity);
        self.persist().await
    }

    pub async fn clear(&mut self) -> Result<(), CartStoreError> {
        self.cart.clear();
        self.persist().await
    }

    /// Attaches the signed-in user's server cart, merging the device cart
    /// into it first.
    pub async fn sign_in(&mut self, remote: R) -> Result<(), CartStoreError> {
        let merged = remote.merge(self.cart.items()).await?;
        self.cart.replace_items(merged);
        self.local.save(self.cart.items())?;
        self.remote = Some(remote);
        Ok(())
    }

    /// Drops the server link; the device copy stays.
    pub fn sign_out(&mut self) {
        self.remote = None;
    }

    /// Local write must succeed; the server write is best-effort.
    async fn persist(&self) -> Result<(), CartStoreError> {
        self.local.save(self.cart.items())?;
        if let Some(server) = &self.remote {
            if let Err(e) = server.save(self.cart.items()).await {
                tracing::warn!(error = %e, "server cart not updated");
            }
        }
        Ok(())
    }
}
