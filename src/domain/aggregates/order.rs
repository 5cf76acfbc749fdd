//! Order Aggregate

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::aggregates::CartItem;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{OrderId, ShippingAddress};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) order_id: OrderId,
    pub(crate) user_id: String,
    pub(crate) user_email: String,
    pub(crate) items: Vec<CartItem>,
    pub(crate) total: Decimal,
    pub(crate) status: OrderStatus,
    pub(crate) status_ar: String,
    pub(crate) date: NaiveDate,
    pub(crate) expected_delivery: NaiveDate,
    pub(crate) shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cancellation_reason: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Arabic label shown to customers browsing in Arabic.
    pub fn label_ar(&self) -> &'static str {
        match self {
            Self::Processing => "قيد المعالجة",
            Self::Shipped => "تم الشحن",
            Self::Delivered => "تم التوصيل",
            Self::Cancelled => "تم الإلغاء",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// Everything checkout hands over to open an order.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: String,
    pub user_email: String,
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
}

impl Order {
    pub fn place(new: NewOrder, now: DateTime<Utc>, delivery_days: u64) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        let date = now.date_naive();
        let expected_delivery = date.checked_add_days(Days::new(delivery_days)).ok_or(OrderError::DateOutOfRange)?;
        let status = OrderStatus::Processing;
        let mut order = Self {
            order_id: new.order_id, user_id: new.user_id, user_email: new.user_email,
            items: new.items, total: new.total, status, status_ar: status.label_ar().to_string(),
            date, expected_delivery, shipping_address: new.shipping_address, cancellation_reason: None,
            created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_id: order.order_id.to_string(), user_id: order.user_id.clone(), total: order.total,
        }));
        Ok(order)
    }

    pub fn order_id(&self) -> &OrderId { &self.order_id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn user_email(&self) -> &str { &self.user_email }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total(&self) -> Decimal { self.total }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn status_ar(&self) -> &str { &self.status_ar }
    pub fn date(&self) -> NaiveDate { self.date }
    pub fn expected_delivery(&self) -> NaiveDate { self.expected_delivery }
    pub fn shipping_address(&self) -> &ShippingAddress { &self.shipping_address }
    pub fn cancellation_reason(&self) -> Option<&str> { self.cancellation_reason.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn belongs_to(&self, user_id: &str) -> bool { self.user_id == user_id }

    /// Swaps in a fresh id after the store reported a collision.
    pub fn reassign_id(&mut self, order_id: OrderId) {
        for event in &mut self.events {
            if let DomainEvent::Order(OrderEvent::Placed { order_id: id, .. }) = event { *id = order_id.to_string(); }
        }
        self.order_id = order_id;
    }

    /// Admin path: any status may follow any other.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        let from = self.status;
        self.status = status;
        self.status_ar = status.label_ar().to_string();
        self.updated_at = now;
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.order_id.to_string(), from, to: status }));
    }

    /// Customer path: only orders still on their way can be cancelled.
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.status.is_terminal() { return Err(OrderError::CannotCancel(self.status)); }
        self.status = OrderStatus::Cancelled;
        self.status_ar = OrderStatus::Cancelled.label_ar().to_string();
        self.cancellation_reason = reason.filter(|r| !r.trim().is_empty());
        self.updated_at = now;
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled {
            order_id: self.order_id.to_string(), reason: self.cancellation_reason.clone(),
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError { NoItems, CannotCancel(OrderStatus), UnknownStatus(String), DateOutOfRange }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "Items are required"),
            Self::CannotCancel(status) => write!(f, "Order is {status} and can no longer be cancelled"),
            Self::UnknownStatus(s) => write!(f, "Unknown order status: {s}"),
            Self::DateOutOfRange => write!(f, "Delivery date out of range"),
        }
    }
}
