//! Domain events
use crate::domain::aggregates::OrderStatus;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event")]
pub enum DomainEvent {
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, total: Decimal },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
    Cancelled { order_id: String, reason: Option<String> },
}

impl DomainEvent {
    /// Subject the event is published under.
    pub fn subject(&self) -> String {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "baby_bazaar.orders.placed".to_string(),
            Self::Order(OrderEvent::StatusChanged { .. }) => "baby_bazaar.orders.status_changed".to_string(),
            Self::Order(OrderEvent::Cancelled { .. }) => "baby_bazaar.orders.cancelled".to_string(),
        }
    }
}
