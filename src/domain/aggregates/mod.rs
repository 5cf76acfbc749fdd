//! Aggregates module
pub mod order;
pub mod cart;
pub mod user;

pub use order::{NewOrder, Order, OrderError, OrderStatus};
pub use cart::{Cart, CartItem, NewCartItem};
pub use user::{ProfileData, UserProfile};
