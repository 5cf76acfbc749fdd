//! Application services: the workflows the HTTP layer calls into.

use std::sync::Arc;

use crate::repositories::{CartRepository, OrderRepository, UserRepository};

pub mod carts;
pub mod orders;
pub mod profiles;

pub use carts::CartService;
pub use orders::{AddressInput, AdminOrderView, OrderService, PlaceOrderRequest};
pub use profiles::{IdentityEvent, ProfileService, WebhookOutcome};

/// The three collections a service may touch.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn OrderRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Stores {
    /// All collections backed by one repository value.
    pub fn shared<R>(repo: R) -> Self
    where
        R: OrderRepository + CartRepository + UserRepository + 'static,
    {
        let repo = Arc::new(repo);
        Self { orders: repo.clone(), carts: repo.clone(), users: repo }
    }
}
