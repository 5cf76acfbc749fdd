//! Read-only product catalog, the price authority at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::CartItem;

const SEED: &str = include_str!("../catalog/products.json");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub name_ar: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub image: String,
    pub category: String,
}

impl Product {
    /// The discount shown next to the price, rounded to a whole percent.
    pub fn discount_percentage(&self) -> Option<u32> {
        let original = self.original_price.filter(|p| *p > self.price && !p.is_zero())?;
        let pct = (Decimal::ONE - self.price / original) * Decimal::from(100);
        pct.round().try_into().ok()
    }
}

pub trait ProductCatalog: Send + Sync {
    fn product(&self, id: &str) -> Option<Product>;
    fn products(&self) -> Vec<Product>;

    /// Puts the catalog price and image on a client line. The line keeps its
    /// name when it is one of the product's names, so Arabic shoppers keep the
    /// Arabic name. `None` when the product is unknown.
    fn reprice(&self, item: &CartItem) -> Option<CartItem> {
        let product = self.product(&item.id)?;
        let name = if item.name == product.name || item.name == product.name_ar { item.name.clone() } else { product.name };
        Some(CartItem { id: product.id, name, price: product.price, image: product.image, quantity: item.quantity })
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog { products: Vec<Product> }

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self { Self { products } }

    /// The catalog shipped with the binary.
    pub fn seeded() -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(SEED)?))
    }
}

impl ProductCatalog for StaticCatalog {
    fn product(&self, id: &str) -> Option<Product> { self.products.iter().find(|p| p.id == id).cloned() }
    fn products(&self) -> Vec<Product> { self.products.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Quantity;

    #[test]
    fn seed_catalog_loads() {
        let catalog = StaticCatalog::seeded().unwrap();
        assert_eq!(catalog.product("p1").map(|p| p.price), Some(Decimal::from(3349)));
        assert_eq!(catalog.product("p2").map(|p| p.price), Some(Decimal::from(1600)));
        assert_eq!(catalog.product("p2").and_then(|p| p.discount_percentage()), Some(20));
        assert_eq!(catalog.product("p1").and_then(|p| p.discount_percentage()), Some(33));
    }

    #[test]
    fn reprice_uses_catalog_values() {
        let catalog = StaticCatalog::seeded().unwrap();
        let tampered = CartItem { id: "p1".into(), name: "x".into(), price: Decimal::ONE, image: String::new(), quantity: Quantity::new(2).unwrap() };
        let fixed = catalog.reprice(&tampered).unwrap();
        assert_eq!(fixed.price, Decimal::from(3349));
        assert_eq!(fixed.name, "Baby Bouncer");
        assert_eq!(fixed.quantity.value(), 2);
        assert!(catalog.reprice(&CartItem { id: "nope".into(), ..tampered.clone() }).is_none());
    }

    #[test]
    fn reprice_keeps_the_arabic_name() {
        let catalog = StaticCatalog::seeded().unwrap();
        let line = CartItem { id: "p1".into(), name: "نطاطة الأطفال".into(), price: Decimal::ONE, image: String::new(), quantity: Quantity::ONE };
        let fixed = catalog.reprice(&line).unwrap();
        assert_eq!(fixed.name, "نطاطة الأطفال");
        assert_eq!(fixed.price, Decimal::from(3349));
    }
}
