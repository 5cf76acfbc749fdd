//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::{self, FeeSchedule, PriceBreakdown};
use crate::domain::value_objects::Quantity;

/// A product line in a cart, and the snapshot copied into an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: Quantity,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity.value()) }
}

/// What the shopper picks from the catalog; the cart decides the quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    user_id: Option<String>,
    items: Vec<CartItem>,
    updated_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

impl Cart {
    pub fn new() -> Self {
        Self { user_id: None, items: vec![], updated_at: Utc::now() }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        let mut cart = Self::new();
        cart.user_id = Some(user_id.into());
        cart
    }

    /// Builds a cart from raw lines, folding repeated product ids into one row.
    pub fn from_items(user_id: Option<String>, items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self { user_id, items: vec![], updated_at: Utc::now() };
        cart.replace_items(items);
        cart
    }

    /// A stored cart, keeping the time it was last written.
    pub fn restore(user_id: Option<String>, items: Vec<CartItem>, updated_at: DateTime<Utc>) -> Self {
        let mut cart = Self::from_items(user_id, items);
        cart.updated_at = updated_at;
        cart
    }

    pub fn user_id(&self) -> Option<&str> { self.user_id.as_deref() }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn into_items(self) -> Vec<CartItem> { self.items }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn total_items(&self) -> u32 { self.items.iter().map(|i| i.quantity.value()).sum() }
    pub fn subtotal(&self) -> Decimal { pricing::subtotal(&self.items) }
    pub fn price(&self, fees: &FeeSchedule) -> PriceBreakdown { fees.price(&self.items) }

    pub fn add_item(&mut self, item: NewCartItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.increment();
        } else {
            self.items.push(CartItem { id: item.id, name: item.name, price: item.price, image: item.image, quantity: Quantity::ONE });
        }
        self.touch();
    }

    pub fn remove_item(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() != before { self.touch(); }
    }

    /// Zero or negative quantities remove the line.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) {
        let Some(quantity) = u32::try_from(quantity).ok().and_then(Quantity::new) else {
            self.remove_item(id);
            return;
        };
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
            self.touch();
        }
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    pub fn replace_items(&mut self, items: impl IntoIterator<Item = CartItem>) {
        self.items.clear();
        for item in items {
            match self.items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => {
                    let sum = existing.quantity.value().saturating_add(item.quantity.value());
                    existing.quantity = Quantity::new(sum).unwrap_or(existing.quantity);
                }
                None => self.items.push(item),
            }
        }
        self.touch();
    }

    /// Folds another copy of this cart in, keeping the larger quantity per product.
    pub fn merge_max(&mut self, other: impl IntoIterator<Item = CartItem>) {
        for item in other {
            match self.items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) if item.quantity.value() > existing.quantity.value() => existing.quantity = item.quantity,
                Some(_) => {}
                None => self.items.push(item),
            }
        }
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}
