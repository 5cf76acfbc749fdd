//! Email bodies. Every value that came from a shopper is HTML-escaped.

use html_escape::encode_text;
use std::fmt::Write as _;

use crate::domain::aggregates::Order;
use crate::domain::pricing::{self, FeeSchedule};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

struct Amounts {
    item_count: u32,
    subtotal: Money,
    shipping: Money,
    cash_collection: Money,
    total: Money,
}

fn amounts(order: &Order, fees: &FeeSchedule) -> Amounts {
    let currency = fees.currency.as_str();
    Amounts {
        item_count: order.items().iter().map(|i| i.quantity.value()).sum(),
        subtotal: Money::new(pricing::subtotal(order.items()), currency),
        shipping: Money::new(fees.shipping_fee, currency),
        cash_collection: Money::new(fees.cash_collection_fee, currency),
        total: Money::new(order.total(), currency),
    }
}

fn text_body(heading: &str, order: &Order, fees: &FeeSchedule, extra: &str) -> String {
    let a = amounts(order, fees);
    let addr = order.shipping_address();
    let mut out = format!(
        "{heading}\n\nOrder ID: {}\nItems: {}\nTotal: {}\n{extra}\nCustomer Information:\nName: {}\nPhone: {}\nAddress: {}\nPostal Code: {}\n\nOrder Details:\n",
        order.order_id(), a.item_count, a.total, addr.full_name, addr.phone, addr.address, addr.postal_code,
    );
    for item in order.items() {
        let price = Money::new(item.price, &fees.currency);
        let line = Money::new(item.line_total(), &fees.currency);
        let _ = writeln!(out, "{} - Quantity: {} - Price: {price} - Subtotal: {line}", item.name, item.quantity.value());
    }
    let _ = write!(
        out,
        "\nSubtotal: {}\nShipping Fee: {}\nCash Collection Fee: {}\nTotal: {}\n",
        a.subtotal, a.shipping, a.cash_collection, a.total,
    );
    out
}

fn html_body(heading: &str, intro: &str, order: &Order, fees: &FeeSchedule, extra: &str) -> String {
    let a = amounts(order, fees);
    let addr = order.shipping_address();
    let mut rows = String::new();
    for item in order.items() {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            encode_text(&item.name), item.quantity.value(),
            Money::new(item.price, &fees.currency), Money::new(item.line_total(), &fees.currency),
        );
    }
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{heading}</title></head>
<body style="font-family: Helvetica, Arial, sans-serif; color: #333333;">
  <h1 style="color: #4a6fb0;">{heading}</h1>
  <p>{intro}</p>
  <p><strong>Order ID:</strong> {order_id}<br><strong>Items:</strong> {count}<br><strong>Total:</strong> {total}</p>
  {extra}
  <h2>Customer Information</h2>
  <p><strong>Name:</strong> {name}<br><strong>Phone:</strong> {phone}<br><strong>Address:</strong> {address}<br><strong>Postal Code:</strong> {postal}</p>
  <h2>Order Details</h2>
  <table width="100%" cellpadding="8">
    <thead><tr><th align="left">Product</th><th align="left">Quantity</th><th align="left">Price</th><th align="left">Subtotal</th></tr></thead>
    <tbody>{rows}</tbody>
  </table>
  <p>Subtotal: {subtotal}<br>Shipping Fee: {shipping}<br>Cash Collection Fee: {cash}<br><strong>Total: {total}</strong></p>
  <p style="color: #999999;">Baby Bazaar - Your Trusted Source for Baby Products</p>
</body>
</html>"#,
        order_id = order.order_id(),
        count = a.item_count,
        total = a.total,
        name = encode_text(&addr.full_name),
        phone = encode_text(&addr.phone),
        address = encode_text(&addr.address),
        postal = encode_text(&addr.postal_code),
        subtotal = a.subtotal,
        shipping = a.shipping,
        cash = a.cash_collection,
    )
}

fn reason_text(order: &Order) -> String {
    order.cancellation_reason().map(|r| format!("Reason: {r}\n")).unwrap_or_default()
}

fn reason_html(order: &Order) -> String {
    order.cancellation_reason().map(|r| format!("<p><strong>Reason:</strong> {}</p>", encode_text(r))).unwrap_or_default()
}

pub fn order_placed_store(order: &Order, fees: &FeeSchedule) -> EmailContent {
    let heading = "New Order Received!";
    EmailContent {
        subject: format!("New Order Received: {}", order.order_id()),
        text: text_body(heading, order, fees, ""),
        html: html_body(heading, "An order has been placed and is ready for processing.", order, fees, ""),
    }
}

pub fn order_placed_customer(order: &Order, fees: &FeeSchedule) -> EmailContent {
    let heading = "Thank you for your order!";
    let delivery = format!("Expected delivery: {}\n", order.expected_delivery());
    EmailContent {
        subject: format!("Order Confirmation: {}", order.order_id()),
        text: text_body(heading, order, fees, &delivery),
        html: html_body(
            heading,
            "We received your order and will contact you before delivery. Payment is cash on delivery.",
            order, fees,
            &format!("<p><strong>Expected delivery:</strong> {}</p>", order.expected_delivery()),
        ),
    }
}

pub fn order_cancelled_store(order: &Order, fees: &FeeSchedule) -> EmailContent {
    let heading = "Order Cancelled";
    EmailContent {
        subject: format!("Order Cancelled: {}", order.order_id()),
        text: text_body(heading, order, fees, &reason_text(order)),
        html: html_body(heading, "A customer cancelled this order. Do not ship it.", order, fees, &reason_html(order)),
    }
}

pub fn order_cancelled_customer(order: &Order, fees: &FeeSchedule) -> EmailContent {
    let heading = "Your order has been cancelled";
    EmailContent {
        subject: format!("Your order {} has been cancelled", order.order_id()),
        text: text_body(heading, order, fees, &reason_text(order)),
        html: html_body(heading, "Your order was cancelled as requested. Nothing will be charged.", order, fees, &reason_html(order)),
    }
}
