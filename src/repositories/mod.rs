//! Storage seams for orders, carts and user profiles.
//!
//! Every call is a single-document read or write; nothing here spans two
//! collections, so an order write and the cart clear that follows it are
//! independent.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{Cart, CartItem, Order, ProfileData, UserProfile};
use crate::domain::value_objects::OrderId;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("repository lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order. Fails with [`RepositoryError::Duplicate`] when the
    /// order id is already taken.
    async fn create_order(&self, order: &Order) -> Result<OrderId, RepositoryError>;

    async fn get_order_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError>;

    /// Newest first.
    async fn get_user_orders(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError>;

    /// Newest first.
    async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Persists `status`, `statusAr`, `cancellationReason` and `updatedAt` from
    /// `order`. Returns false when no order carries that id.
    async fn update_order_status(&self, order: &Order) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>, RepositoryError>;

    /// Upserts the whole item list. Last write wins.
    async fn save_cart(&self, user_id: &str, items: &[CartItem]) -> Result<(), RepositoryError>;

    /// Empties an existing cart; a user without a cart is left alone.
    async fn clear_cart(&self, user_id: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError>;

    async fn upsert_profile(&self, user_id: &str, data: ProfileData) -> Result<UserProfile, RepositoryError>;

    /// Soft delete. Returns false when the profile does not exist.
    async fn mark_deleted(&self, user_id: &str) -> Result<bool, RepositoryError>;
}
