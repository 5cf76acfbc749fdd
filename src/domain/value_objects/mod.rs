//! Value objects for the storefront

use rand::Rng;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

/// Human-facing order identifier, `ORD-` followed by five digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub const PREFIX: &'static str = "ORD-";

    /// Draws a fresh id from `[10000, 99999]`. Uniqueness is the repository's job.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n: u32 = rng.gen_range(10_000..=99_999);
        Self(format!("{}{n}", Self::PREFIX))
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, OrderIdError> {
        let value = value.into();
        let digits = value.strip_prefix(Self::PREFIX).ok_or(OrderIdError::MissingPrefix)?;
        if digits.len() != 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderIdError::BadDigits);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderIdError { MissingPrefix, BadDigits }
impl std::error::Error for OrderIdError {}
impl fmt::Display for OrderIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => write!(f, "order id must start with {}", OrderId::PREFIX),
            Self::BadDigits => write!(f, "order id must end with five digits"),
        }
    }
}

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2} {}", self.amount, self.currency) }
}

/// Line quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Option<Self> { (value > 0).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn increment(&self) -> Self { Self(self.0.saturating_add(1)) }
}

impl TryFrom<u32> for Quantity {
    type Error = String;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "quantity must be at least 1".to_string())
    }
}

impl From<Quantity> for u32 { fn from(q: Quantity) -> u32 { q.0 } }

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\x{0600}-\x{06FF}\s]+$").expect("static pattern"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0125][0-9]{8}$").expect("static pattern"));
static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("static pattern"));

/// Delivery address captured at checkout. Embedded verbatim into the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(regex(path = "FULL_NAME_RE", message = "name may only contain letters and spaces"))]
    pub full_name: String,
    #[validate(regex(path = "PHONE_RE", message = "phone must be an Egyptian mobile number"))]
    pub phone: String,
    #[validate(custom(function = "street_address", message = "address must be at least 10 characters"))]
    pub address: String,
    #[validate(regex(path = "POSTAL_CODE_RE", message = "postal code must be 5 digits"))]
    pub postal_code: String,
}

fn street_address(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < 10 {
        return Err(ValidationError::new("address_length"));
    }
    Ok(())
}

impl ShippingAddress {
    /// Struct field names paired with their wire names, in form order.
    pub const FIELDS: [(&'static str, &'static str); 4] = [
        ("full_name", "fullName"),
        ("phone", "phone"),
        ("address", "address"),
        ("postal_code", "postalCode"),
    ];

    /// Returns the first offending field (wire name) and its message.
    pub fn check(&self) -> Result<(), (&'static str, String)> {
        let Err(errors) = self.validate() else { return Ok(()) };
        let by_field = errors.field_errors();
        for (field, wire) in Self::FIELDS {
            if let Some(first) = by_field.get(field).and_then(|errs| errs.first()) {
                let message = first.message.as_ref().map_or_else(|| first.code.to_string(), ToString::to_string);
                return Err((wire, message));
            }
        }
        Ok(())
    }
}
