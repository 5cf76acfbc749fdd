//! Baby Bazaar storefront
//!
//! Cash-on-delivery storefront backend for a bilingual (English/Arabic) baby
//! products shop.
//!
//! ## Features
//! - Per-user server carts with a device-local fallback store
//! - Checkout: catalog repricing, flat shipping and cash-collection fees
//! - Order history, customer cancellation and admin status management
//! - Store and customer email notifications through a retrying outbox
//! - Profile mirroring from identity-provider events

use thiserror::Error;

pub mod cart_store;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod domain;
pub mod http;
pub mod notifications;
pub mod publisher;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use http::{router, AppState};

use crate::domain::aggregates::OrderError;
use crate::repositories::RepositoryError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{message}")]
    Validation { field: Option<String>, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl StorefrontError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: Some(field.into()), message: message.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation { field: None, message: message.into() }
    }
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NoItems => Self::validation("items", e.to_string()),
            OrderError::UnknownStatus(_) => Self::validation("status", e.to_string()),
            OrderError::CannotCancel(_) => Self::Conflict(e.to_string()),
            OrderError::DateOutOfRange => Self::invalid(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
