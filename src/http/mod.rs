//! JSON API under `/api`, plus `/health`.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::ProductCatalog;
use crate::config::Config;
use crate::notifications::NotificationDispatcher;
use crate::publisher::EventPublisher;
use crate::services::{CartService, OrderService, ProfileService, Stores};

mod admin;
pub mod auth;
mod cart;
mod error;
mod orders;
mod products;
mod users;

pub use auth::{AdminUser, AuthenticatedUser};
pub use error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub carts: CartService,
    pub profiles: ProfileService,
    pub catalog: Arc<dyn ProductCatalog>,
}

impl AppState {
    pub fn new(stores: Stores, catalog: Arc<dyn ProductCatalog>, notifier: NotificationDispatcher, events: EventPublisher, config: &Config) -> Self {
        let orders = OrderService::new(stores.clone(), catalog.clone(), notifier, config.fees.clone())
            .with_events(events)
            .with_delivery_days(config.delivery_days);
        Self {
            orders,
            carts: CartService::new(stores.carts.clone()),
            profiles: ProfileService::new(stores.users),
            catalog,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "baby-bazaar"})) }))
        .route("/api/products", get(products::list))
        .route("/api/products/:id", get(products::get))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/:id", get(orders::get).patch(orders::cancel))
        .route("/api/cart", get(cart::get).post(cart::save))
        .route("/api/cart/merge", post(cart::merge))
        .route("/api/admin/orders", get(admin::list))
        .route("/api/admin/orders/:id/status", put(admin::set_status))
        .route("/api/users/sync", post(users::sync))
        .route("/api/webhooks/identity", post(users::webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
