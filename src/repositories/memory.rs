use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::{CartRepository, OrderRepository, RepositoryError, UserRepository};
use crate::domain::aggregates::{Cart, CartItem, Order, ProfileData, UserProfile};
use crate::domain::value_objects::OrderId;

/// Process-local storage for all three collections. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    orders: Arc<RwLock<Vec<Order>>>,
    carts: Arc<RwLock<HashMap<String, Cart>>>,
    users: Arc<RwLock<HashMap<String, UserProfile>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self { Self::default() }

    fn newest_first<'a>(orders: impl DoubleEndedIterator<Item = &'a Order>) -> Vec<Order> {
        // later inserts sit at the back; reversing first keeps ties newest-first
        let mut out: Vec<Order> = orders.rev().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn create_order(&self, order: &Order) -> Result<OrderId, RepositoryError> {
        let mut orders = self.orders.write().map_err(|_| RepositoryError::LockPoisoned("orders write"))?;
        if orders.iter().any(|o| o.order_id == order.order_id) {
            return Err(RepositoryError::Duplicate(order.order_id.to_string()));
        }
        let mut stored = order.clone();
        stored.events.clear();
        orders.push(stored);
        Ok(order.order_id.clone())
    }

    async fn get_order_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(|_| RepositoryError::LockPoisoned("orders read"))?;
        Ok(orders.iter().find(|o| o.order_id.as_str() == order_id).cloned())
    }

    async fn get_user_orders(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(|_| RepositoryError::LockPoisoned("orders read"))?;
        Ok(Self::newest_first(orders.iter().filter(|o| o.user_id == user_id)))
    }

    async fn get_all_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(|_| RepositoryError::LockPoisoned("orders read"))?;
        Ok(Self::newest_first(orders.iter()))
    }

    async fn update_order_status(&self, order: &Order) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().map_err(|_| RepositoryError::LockPoisoned("orders write"))?;
        let Some(stored) = orders.iter_mut().find(|o| o.order_id == order.order_id) else { return Ok(false) };
        stored.status = order.status;
        stored.status_ar = order.status_ar.clone();
        stored.cancellation_reason = order.cancellation_reason.clone();
        stored.updated_at = order.updated_at;
        Ok(true)
    }
}

#[async_trait]
impl CartRepository for InMemoryRepository {
    async fn get_cart(&self, user_id: &str) -> Result<Option<Cart>, RepositoryError> {
        let carts = self.carts.read().map_err(|_| RepositoryError::LockPoisoned("carts read"))?;
        Ok(carts.get(user_id).cloned())
    }

    async fn save_cart(&self, user_id: &str, items: &[CartItem]) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().map_err(|_| RepositoryError::LockPoisoned("carts write"))?;
        carts.insert(user_id.to_string(), Cart::from_items(Some(user_id.to_string()), items.to_vec()));
        Ok(())
    }

    async fn clear_cart(&self, user_id: &str) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().map_err(|_| RepositoryError::LockPoisoned("carts write"))?;
        if let Some(cart) = carts.get_mut(user_id) {
            cart.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let users = self.users.read().map_err(|_| RepositoryError::LockPoisoned("users read"))?;
        Ok(users.get(user_id).cloned())
    }

    async fn upsert_profile(&self, user_id: &str, data: ProfileData) -> Result<UserProfile, RepositoryError> {
        let mut users = self.users.write().map_err(|_| RepositoryError::LockPoisoned("users write"))?;
        let profile = UserProfile::upsert(users.remove(user_id), user_id, data, Utc::now());
        users.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    async fn mark_deleted(&self, user_id: &str) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().map_err(|_| RepositoryError::LockPoisoned("users write"))?;
        match users.get_mut(user_id) {
            Some(profile) => {
                profile.deactivate(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
