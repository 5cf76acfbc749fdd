//! Order pricing
//!
//! `total = Σ(price × quantity) + shipping fee + cash-collection fee`. The fee
//! schedule is plain data handed in by the caller; nothing here reads config.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::CartItem;
use crate::domain::value_objects::Money;

/// Flat fees charged on every cash-on-delivery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub shipping_fee: Decimal,
    pub cash_collection_fee: Decimal,
    pub currency: String,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { shipping_fee: Decimal::from(57), cash_collection_fee: Decimal::from(10), currency: "EGP".to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub cash_collection_fee: Money,
    pub total: Money,
}

pub fn subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

impl FeeSchedule {
    pub fn price(&self, items: &[CartItem]) -> PriceBreakdown {
        let subtotal = subtotal(items);
        let total = subtotal + self.shipping_fee + self.cash_collection_fee;
        PriceBreakdown {
            subtotal: Money::new(subtotal, &self.currency),
            shipping_fee: Money::new(self.shipping_fee, &self.currency),
            cash_collection_fee: Money::new(self.cash_collection_fee, &self.currency),
            total: Money::new(total, &self.currency),
        }
    }

    pub fn total(&self, items: &[CartItem]) -> Decimal {
        self.price(items).total.amount()
    }
}
