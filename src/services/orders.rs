//! Order workflow
//!
//! Checkout validates the request, reprices it from the catalog, stores the
//! order under a fresh `ORD-` id and then runs the side effects: emails through
//! the outbox, a cart clear and event publishing. None of the side effects can
//! fail the checkout once the order is stored. Cancellation mirrors this.

use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Stores;
use crate::catalog::ProductCatalog;
use crate::clock::{Clock, SystemClock};
use crate::domain::aggregates::{Cart, CartItem, NewOrder, Order, OrderStatus};
use crate::domain::pricing::FeeSchedule;
use crate::domain::value_objects::{OrderId, ShippingAddress};
use crate::notifications::NotificationDispatcher;
use crate::publisher::EventPublisher;
use crate::repositories::RepositoryError;
use crate::{Result, StorefrontError};

/// Attempts at finding an unused order id before giving up.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Checkout body as the client sends it. Everything is optional here so that
/// missing fields produce field-level messages instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: Option<serde_json::Value>,
    #[serde(default)]
    pub shipping_address: Option<AddressInput>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

impl AddressInput {
    /// Presence check in form order, then trimmed values.
    fn into_address(self) -> Result<ShippingAddress> {
        let present = |value: Option<String>, wire: &str| -> Result<String> {
            match value.map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(StorefrontError::validation(wire, format!("Missing required field in shipping address: {wire}"))),
            }
        };
        Ok(ShippingAddress {
            full_name: present(self.full_name, "fullName")?,
            phone: present(self.phone, "phone")?,
            address: present(self.address, "address")?,
            postal_code: present(self.postal_code, "postalCode")?,
        })
    }
}

/// An order as the admin table shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user_name: String,
}

#[derive(Clone)]
pub struct OrderService {
    stores: Stores,
    catalog: Arc<dyn ProductCatalog>,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
    events: EventPublisher,
    fees: FeeSchedule,
    delivery_days: u64,
}

impl OrderService {
    pub fn new(stores: Stores, catalog: Arc<dyn ProductCatalog>, notifier: NotificationDispatcher, fees: FeeSchedule) -> Self {
        Self {
            stores,
            catalog,
            clock: Arc::new(SystemClock),
            notifier,
            events: EventPublisher::disabled(),
            fees,
            delivery_days: 7,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn with_delivery_days(mut self, days: u64) -> Self {
        self.delivery_days = days;
        self
    }

    pub async fn place_order(&self, user_id: &str, req: PlaceOrderRequest) -> Result<OrderId> {
        if req.items.is_empty() {
            return Err(StorefrontError::validation("items", "Items are required"));
        }
        let client_total = req
            .total
            .as_ref()
            .and_then(parse_total)
            .ok_or_else(|| StorefrontError::validation("total", "Valid total amount is required"))?;
        let address = req
            .shipping_address
            .ok_or_else(|| StorefrontError::validation("shippingAddress", "Shipping address is required"))?
            .into_address()?;
        address.check().map_err(|(field, message)| StorefrontError::validation(field, message))?;

        let items = self.reprice(req.items)?;
        let total = self.fees.total(&items);
        if client_total != total {
            tracing::warn!(user_id, %client_total, %total, "client total disagrees with catalog, using catalog total");
        }
        let user_email = self.resolve_email(user_id, req.email).await?;

        let mut order = Order::place(
            NewOrder { order_id: new_order_id(), user_id: user_id.to_string(), user_email, items, total, shipping_address: address },
            self.clock.now(),
            self.delivery_days,
        )?;

        let mut attempt = 1;
        loop {
            match self.stores.orders.create_order(&order).await {
                Ok(_) => break,
                Err(RepositoryError::Duplicate(taken)) if attempt < MAX_ID_ATTEMPTS => {
                    tracing::warn!(order_id = %taken, attempt, "order id taken, drawing another");
                    order.reassign_id(new_order_id());
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "order not stored");
                    return Err(e.into());
                }
            }
        }
        tracing::info!(order_id = %order.order_id(), user_id, %total, "order placed");

        self.notifier.order_placed(&order);
        if let Err(e) = self.stores.carts.clear_cart(user_id).await {
            tracing::error!(order_id = %order.order_id(), user_id, error = %e, "cart not cleared after checkout");
        }
        self.events.publish_all(order.take_events()).await;

        Ok(order.order_id().clone())
    }

    pub async fn list_user_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.stores.orders.get_user_orders(user_id).await?)
    }

    /// The order if the caller owns it. Someone else's order is reported as
    /// unauthorized, a missing one as not found.
    pub async fn get_order_for_user(&self, order_id: &str, user_id: &str) -> Result<Order> {
        let order = self.stores.orders.get_order_by_id(order_id).await?.ok_or(StorefrontError::OrderNotFound)?;
        if !order.belongs_to(user_id) {
            return Err(StorefrontError::Unauthorized);
        }
        Ok(order)
    }

    /// Customer cancellation. `status` must be `Cancelled`.
    pub async fn cancel_order(&self, order_id: &str, actor: &str, status: &str, reason: Option<String>) -> Result<Order> {
        if status.parse::<OrderStatus>()? != OrderStatus::Cancelled {
            return Err(StorefrontError::validation("status", "Only cancellation is allowed"));
        }
        let mut order = self.stores.orders.get_order_by_id(order_id).await?.ok_or(StorefrontError::OrderNotFound)?;
        if !order.belongs_to(actor) {
            return Err(StorefrontError::Unauthorized);
        }
        let profile = self.stores.users.get_profile(actor).await?.ok_or(StorefrontError::ProfileNotFound)?;
        // phone-only identities have no profile email; the order still has one
        let customer_email = match profile.email.trim() {
            "" => order.user_email().to_string(),
            email => email.to_string(),
        };

        order.cancel(reason, self.clock.now())?;
        if !self.stores.orders.update_order_status(&order).await? {
            return Err(StorefrontError::OrderNotFound);
        }
        tracing::info!(order_id, actor, reason = order.cancellation_reason(), "order cancelled");

        self.notifier.order_cancelled(&order, &customer_email);
        self.events.publish_all(order.take_events()).await;
        Ok(order)
    }

    /// Every order, newest first, with the customer's display name.
    pub async fn admin_list(&self) -> Result<Vec<AdminOrderView>> {
        let orders = self.stores.orders.get_all_orders().await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let user_name = match self.stores.users.get_profile(order.user_id()).await? {
                Some(profile) => profile.name,
                None => "Unknown".to_string(),
            };
            views.push(AdminOrderView { order, user_name });
        }
        Ok(views)
    }

    /// Admin status change; any status may follow any other.
    pub async fn admin_set_status(&self, order_id: &str, status: &str) -> Result<Order> {
        let status: OrderStatus = status.parse()?;
        let mut order = self.stores.orders.get_order_by_id(order_id).await?.ok_or(StorefrontError::OrderNotFound)?;
        order.set_status(status, self.clock.now());
        if !self.stores.orders.update_order_status(&order).await? {
            return Err(StorefrontError::OrderNotFound);
        }
        tracing::info!(order_id, %status, "order status set by admin");
        self.events.publish_all(order.take_events()).await;
        Ok(order)
    }

    fn reprice(&self, items: Vec<CartItem>) -> Result<Vec<CartItem>> {
        let priced = items
            .iter()
            .map(|item| self.catalog.reprice(item).ok_or_else(|| StorefrontError::ProductNotFound(item.id.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Cart::from_items(None, priced).into_items())
    }

    async fn resolve_email(&self, user_id: &str, email: Option<String>) -> Result<String> {
        if let Some(email) = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
            return Ok(email);
        }
        match self.stores.users.get_profile(user_id).await? {
            Some(profile) if !profile.email.trim().is_empty() => Ok(profile.email),
            _ => Err(StorefrontError::validation("email", "Email is required")),
        }
    }
}

fn new_order_id() -> OrderId {
    OrderId::generate(&mut rand::thread_rng())
}

/// Accepts a positive JSON number or numeric string.
fn parse_total(value: &serde_json::Value) -> Option<Decimal> {
    let total = match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64)?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (total > Decimal::ZERO).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::clock::FixedClock;
    use crate::config::{MailConfig, OutboxConfig};
    use crate::domain::aggregates::ProfileData;
    use crate::notifications::{EmailMessage, Mailer, NotificationError, Outbox};
    use crate::repositories::{CartRepository, InMemoryRepository, OrderRepository, UserRepository};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording { sent: Mutex<Vec<EmailMessage>> }

    #[async_trait]
    impl Mailer for Recording {
        async fn send(&self, message: &EmailMessage) -> std::result::Result<(), NotificationError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Down;

    #[async_trait]
    impl Mailer for Down {
        async fn send(&self, _: &EmailMessage) -> std::result::Result<(), NotificationError> {
            Err(NotificationError::Rejected { status: 500, body: "down".into() })
        }
    }

    /// Reports the first `collisions` inserts as duplicates, then delegates.
    struct Colliding { inner: InMemoryRepository, collisions: usize, calls: AtomicUsize }

    #[async_trait]
    impl OrderRepository for Colliding {
        async fn create_order(&self, order: &Order) -> std::result::Result<OrderId, RepositoryError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(RepositoryError::Duplicate(order.order_id().to_string()));
            }
            self.inner.create_order(order).await
        }
        async fn get_order_by_id(&self, id: &str) -> std::result::Result<Option<Order>, RepositoryError> { self.inner.get_order_by_id(id).await }
        async fn get_user_orders(&self, user: &str) -> std::result::Result<Vec<Order>, RepositoryError> { self.inner.get_user_orders(user).await }
        async fn get_all_orders(&self) -> std::result::Result<Vec<Order>, RepositoryError> { self.inner.get_all_orders().await }
        async fn update_order_status(&self, order: &Order) -> std::result::Result<bool, RepositoryError> { self.inner.update_order_status(order).await }
    }

    /// Cart store that always fails.
    struct BrokenCarts;

    #[async_trait]
    impl CartRepository for BrokenCarts {
        async fn get_cart(&self, _: &str) -> std::result::Result<Option<Cart>, RepositoryError> { Err(RepositoryError::LockPoisoned("carts read")) }
        async fn save_cart(&self, _: &str, _: &[CartItem]) -> std::result::Result<(), RepositoryError> { Err(RepositoryError::LockPoisoned("carts write")) }
        async fn clear_cart(&self, _: &str) -> std::result::Result<(), RepositoryError> { Err(RepositoryError::LockPoisoned("carts write")) }
    }

    struct Harness {
        service: OrderService,
        repo: InMemoryRepository,
        outbox: Outbox,
    }

    fn outbox_config() -> OutboxConfig {
        OutboxConfig { capacity: 32, max_attempts: 2, initial_backoff: Duration::from_millis(1) }
    }

    fn harness_with(stores: Stores, repo: InMemoryRepository, mailer: Arc<dyn Mailer>) -> Harness {
        let outbox = Outbox::spawn(mailer, &outbox_config());
        let mail = MailConfig { store_email: "store@example.com".into(), ..MailConfig::default() };
        let notifier = NotificationDispatcher::new(outbox.handle(), &mail, FeeSchedule::default());
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let service = OrderService::new(stores, Arc::new(StaticCatalog::seeded().unwrap()), notifier, FeeSchedule::default())
            .with_clock(Arc::new(clock));
        Harness { service, repo, outbox }
    }

    fn harness(mailer: Arc<dyn Mailer>) -> Harness {
        let repo = InMemoryRepository::new();
        harness_with(Stores::shared(repo.clone()), repo, mailer)
    }

    fn request(body: serde_json::Value) -> PlaceOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "items": [{"id": "p1", "name": "Baby Bouncer", "price": 3349, "image": "/images/bouncer.jpeg", "quantity": 1}],
            "total": 3416,
            "shippingAddress": {"fullName": "Ahmed Hassan", "phone": "01012345678", "address": "12 Nile Street, Cairo", "postalCode": "11511"},
            "email": "ahmed@example.com"
        })
    }

    fn field_of(err: StorefrontError) -> (Option<String>, String) {
        match err {
            StorefrontError::Validation { field, message } => (field, message),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn places_order_with_processing_status_and_dates() {
        let h = harness(Arc::new(Recording::default()));
        let id = h.service.place_order("user_1", request(valid_body())).await.unwrap();
        assert!(OrderId::parse(id.as_str()).is_ok());

        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Processing);
        assert_eq!(stored.status_ar(), "قيد المعالجة");
        assert_eq!(stored.total(), Decimal::from(3416));
        assert_eq!(stored.date(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(stored.expected_delivery(), NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        assert_eq!(stored.user_email(), "ahmed@example.com");
    }

    #[tokio::test]
    async fn sends_two_emails_and_clears_cart() {
        let mailer = Arc::new(Recording::default());
        let h = harness(mailer.clone());
        let items: Vec<CartItem> = serde_json::from_value(valid_body()["items"].clone()).unwrap();
        h.repo.save_cart("user_1", &items).await.unwrap();

        h.service.place_order("user_1", request(valid_body())).await.unwrap();
        let cart = h.repo.get_cart("user_1").await.unwrap().unwrap();
        assert!(cart.is_empty());

        h.outbox.shutdown().await;
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|m| m.to == "store@example.com"));
        assert!(sent.iter().any(|m| m.to == "ahmed@example.com"));
    }

    #[tokio::test]
    async fn empty_items_rejected_before_persistence() {
        let h = harness(Arc::new(Recording::default()));
        let mut body = valid_body();
        body["items"] = json!([]);
        let (field, message) = field_of(h.service.place_order("user_1", request(body)).await.unwrap_err());
        assert_eq!(field.as_deref(), Some("items"));
        assert_eq!(message, "Items are required");
        assert!(h.repo.get_all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_names_the_first_problem() {
        let h = harness(Arc::new(Recording::default()));
        let cases = [
            ("/total", json!("abc"), "total", "Valid total amount is required"),
            ("/total", json!(0), "total", "Valid total amount is required"),
            ("/shippingAddress", serde_json::Value::Null, "shippingAddress", "Shipping address is required"),
            ("/shippingAddress/phone", json!("  "), "phone", "Missing required field in shipping address: phone"),
            ("/shippingAddress/postalCode", json!("123"), "postalCode", "postal code must be 5 digits"),
        ];
        for (pointer, value, want_field, want_message) in cases {
            let mut body = valid_body();
            *body.pointer_mut(pointer).unwrap() = value;
            let (field, message) = field_of(h.service.place_order("user_1", request(body)).await.unwrap_err());
            assert_eq!(field.as_deref(), Some(want_field), "{pointer}");
            assert_eq!(message, want_message, "{pointer}");
        }
        assert!(h.repo.get_all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn client_total_is_replaced_by_catalog_total() {
        let h = harness(Arc::new(Recording::default()));
        let mut body = valid_body();
        body["items"][0]["price"] = json!(1);
        body["total"] = json!(68);
        let id = h.service.place_order("user_1", request(body)).await.unwrap();
        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.items()[0].price, Decimal::from(3349));
        assert_eq!(stored.total(), Decimal::from(3416));
    }

    #[tokio::test]
    async fn arabic_line_names_survive_repricing() {
        let mailer = Arc::new(Recording::default());
        let h = harness(mailer.clone());
        let mut body = valid_body();
        body["items"][0]["name"] = json!("نطاطة الأطفال");
        body["items"][0]["price"] = json!(1);
        let id = h.service.place_order("user_1", request(body)).await.unwrap();

        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.items()[0].name, "نطاطة الأطفال");
        assert_eq!(stored.items()[0].price, Decimal::from(3349));

        h.outbox.shutdown().await;
        let sent = mailer.sent.lock().unwrap();
        assert!(sent.iter().all(|m| m.text.contains("نطاطة الأطفال")));
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let h = harness(Arc::new(Recording::default()));
        let mut body = valid_body();
        body["items"][0]["id"] = json!("p404");
        let err = h.service.place_order("user_1", request(body)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::ProductNotFound(ref id) if id == "p404"));
    }

    #[tokio::test]
    async fn email_falls_back_to_profile() {
        let h = harness(Arc::new(Recording::default()));
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("email");
        let (field, _) = field_of(h.service.place_order("user_1", request(body.clone())).await.unwrap_err());
        assert_eq!(field.as_deref(), Some("email"));

        h.repo.upsert_profile("user_1", ProfileData { name: "Ahmed".into(), email: "profile@example.com".into(), ..Default::default() }).await.unwrap();
        let id = h.service.place_order("user_1", request(body)).await.unwrap();
        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.user_email(), "profile@example.com");
    }

    #[tokio::test]
    async fn id_collisions_are_retried() {
        let repo = InMemoryRepository::new();
        let colliding = Arc::new(Colliding { inner: repo.clone(), collisions: 2, calls: AtomicUsize::new(0) });
        let stores = Stores { orders: colliding.clone(), carts: Arc::new(repo.clone()), users: Arc::new(repo.clone()) };
        let h = harness_with(stores, repo, Arc::new(Recording::default()));

        let id = h.service.place_order("user_1", request(valid_body())).await.unwrap();
        assert_eq!(colliding.calls.load(Ordering::SeqCst), 3);
        assert!(h.repo.get_order_by_id(id.as_str()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn persistent_collisions_fail_as_storage_error() {
        let repo = InMemoryRepository::new();
        let colliding = Arc::new(Colliding { inner: repo.clone(), collisions: usize::MAX, calls: AtomicUsize::new(0) });
        let stores = Stores { orders: colliding.clone(), carts: Arc::new(repo.clone()), users: Arc::new(repo.clone()) };
        let h = harness_with(stores, repo, Arc::new(Recording::default()));

        let err = h.service.place_order("user_1", request(valid_body())).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Storage(RepositoryError::Duplicate(_))));
        assert_eq!(colliding.calls.load(Ordering::SeqCst), MAX_ID_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn failing_side_effects_do_not_fail_checkout() {
        let repo = InMemoryRepository::new();
        let stores = Stores { orders: Arc::new(repo.clone()), carts: Arc::new(BrokenCarts), users: Arc::new(repo.clone()) };
        let h = harness_with(stores, repo, Arc::new(Down));

        let id = h.service.place_order("user_1", request(valid_body())).await.unwrap();
        assert!(h.repo.get_order_by_id(id.as_str()).await.unwrap().is_some());
        let stats = h.outbox.shutdown().await;
        assert_eq!(stats.failed, 2);
    }

    async fn placed_with_profile(h: &Harness) -> OrderId {
        h.repo.upsert_profile("user_1", ProfileData { name: "Ahmed Hassan".into(), email: "ahmed@example.com".into(), ..Default::default() }).await.unwrap();
        h.service.place_order("user_1", request(valid_body())).await.unwrap()
    }

    #[tokio::test]
    async fn cancel_flips_status_only() {
        let h = harness(Arc::new(Recording::default()));
        let id = placed_with_profile(&h).await;
        let before = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();

        h.service.cancel_order(id.as_str(), "user_1", "Cancelled", Some("Ordered twice".into())).await.unwrap();
        let after = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(after.status(), OrderStatus::Cancelled);
        assert_eq!(after.status_ar(), "تم الإلغاء");
        assert_eq!(after.cancellation_reason(), Some("Ordered twice"));
        assert_eq!(after.items(), before.items());
        assert_eq!(after.total(), before.total());
        assert_eq!(after.shipping_address(), before.shipping_address());
        assert_eq!(after.updated_at(), Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn status_changes_are_stamped_by_the_clock() {
        let h = harness(Arc::new(Recording::default()));
        let id = placed_with_profile(&h).await;
        let later = Utc.with_ymd_and_hms(2024, 5, 3, 9, 30, 0).unwrap();
        let service = h.service.clone().with_clock(Arc::new(FixedClock(later)));

        let shipped = service.admin_set_status(id.as_str(), "Shipped").await.unwrap();
        assert_eq!(shipped.updated_at(), later);
        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.created_at(), Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert_eq!(stored.updated_at(), later);
    }

    #[tokio::test]
    async fn cancel_mails_order_email_when_profile_has_none() {
        let mailer = Arc::new(Recording::default());
        let h = harness(mailer.clone());
        h.repo.upsert_profile("user_1", ProfileData { phone: Some("+201012345678".into()), ..Default::default() }).await.unwrap();
        let id = h.service.place_order("user_1", request(valid_body())).await.unwrap();

        h.service.cancel_order(id.as_str(), "user_1", "Cancelled", None).await.unwrap();
        h.outbox.shutdown().await;
        let sent = mailer.sent.lock().unwrap();
        assert!(sent.iter().any(|m| m.to == "ahmed@example.com" && m.subject.contains("cancelled")));
    }

    #[tokio::test]
    async fn cancel_rules() {
        let h = harness(Arc::new(Recording::default()));
        let id = placed_with_profile(&h).await;

        assert!(matches!(h.service.cancel_order("ORD-00000", "user_1", "Cancelled", None).await, Err(StorefrontError::OrderNotFound)));
        assert!(matches!(h.service.cancel_order(id.as_str(), "user_2", "Cancelled", None).await, Err(StorefrontError::Unauthorized)));
        assert!(matches!(h.service.cancel_order(id.as_str(), "user_1", "Shipped", None).await, Err(StorefrontError::Validation { .. })));
        assert!(matches!(h.service.cancel_order(id.as_str(), "user_1", "Lost", None).await, Err(StorefrontError::Validation { .. })));

        h.service.cancel_order(id.as_str(), "user_1", "Cancelled", None).await.unwrap();
        assert!(matches!(h.service.cancel_order(id.as_str(), "user_1", "Cancelled", None).await, Err(StorefrontError::Conflict(_))));
    }

    #[tokio::test]
    async fn cancel_without_profile_writes_nothing() {
        let h = harness(Arc::new(Recording::default()));
        let id = h.service.place_order("user_1", request(valid_body())).await.unwrap();
        let err = h.service.cancel_order(id.as_str(), "user_1", "Cancelled", None).await.unwrap_err();
        assert!(matches!(err, StorefrontError::ProfileNotFound));
        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Processing);
    }

    #[tokio::test]
    async fn admin_can_set_any_status_and_sees_names() {
        let h = harness(Arc::new(Recording::default()));
        let id = placed_with_profile(&h).await;
        h.service.place_order("ghost", request(valid_body())).await.unwrap();

        h.service.admin_set_status(id.as_str(), "Delivered").await.unwrap();
        h.service.admin_set_status(id.as_str(), "Processing").await.unwrap();
        let stored = h.repo.get_order_by_id(id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.status(), OrderStatus::Processing);

        let views = h.service.admin_list().await.unwrap();
        let mut names: Vec<_> = views.iter().map(|v| v.user_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Ahmed Hassan", "Unknown"]);
        assert!(matches!(h.service.admin_set_status("ORD-00000", "Shipped").await, Err(StorefrontError::OrderNotFound)));
    }

    #[test]
    fn totals_accept_numbers_and_numeric_strings() {
        assert_eq!(parse_total(&json!(3416)), Some(Decimal::from(3416)));
        assert_eq!(parse_total(&json!("3416.50")), Some(Decimal::new(341650, 2)));
        assert_eq!(parse_total(&json!(-1)), None);
        assert_eq!(parse_total(&json!(0)), None);
        assert_eq!(parse_total(&json!("0.00")), None);
        assert_eq!(parse_total(&json!(null)), None);
        assert_eq!(parse_total(&json!(true)), None);
    }
}
