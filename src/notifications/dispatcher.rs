use super::templates::{self, EmailContent};
use super::{EmailMessage, OutboxHandle};
use crate::config::MailConfig;
use crate::domain::aggregates::Order;
use crate::domain::pricing::FeeSchedule;

/// Turns order lifecycle changes into queued store and customer emails.
#[derive(Clone, Debug)]
pub struct NotificationDispatcher {
    outbox: OutboxHandle,
    from: String,
    store_email: String,
    fees: FeeSchedule,
}

impl NotificationDispatcher {
    pub fn new(outbox: OutboxHandle, mail: &MailConfig, fees: FeeSchedule) -> Self {
        Self { outbox, from: mail.from.clone(), store_email: mail.store_email.clone(), fees }
    }

    /// Store notification plus customer confirmation. Either may be dropped
    /// without affecting the other.
    pub fn order_placed(&self, order: &Order) {
        self.send("order_placed.store", &self.store_email, templates::order_placed_store(order, &self.fees));
        self.send("order_placed.customer", order.user_email(), templates::order_placed_customer(order, &self.fees));
    }

    pub fn order_cancelled(&self, order: &Order, customer_email: &str) {
        self.send("order_cancelled.store", &self.store_email, templates::order_cancelled_store(order, &self.fees));
        self.send("order_cancelled.customer", customer_email, templates::order_cancelled_customer(order, &self.fees));
    }

    fn send(&self, kind: &'static str, to: &str, content: EmailContent) {
        self.outbox.enqueue(kind, EmailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: content.subject,
            html: content.html,
            text: content.text,
        });
    }
}
