#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use baby_bazaar::catalog::StaticCatalog;
use baby_bazaar::config::{Config, OutboxConfig};
use baby_bazaar::notifications::{EmailMessage, Mailer, NotificationDispatcher, NotificationError, Outbox};
use baby_bazaar::publisher::EventPublisher;
use baby_bazaar::repositories::InMemoryRepository;
use baby_bazaar::services::Stores;
use baby_bazaar::{router, AppState};

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _: &EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected { status: 500, body: "provider down".into() })
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: InMemoryRepository,
    pub outbox: Outbox,
}

pub fn app() -> TestApp {
    app_with_mailer(Arc::new(RecordingMailer::default()))
}

pub fn app_with_mailer(mailer: Arc<dyn Mailer>) -> TestApp {
    let mut config = Config::default();
    config.mail.store_email = "store@example.com".into();
    config.outbox = OutboxConfig { capacity: 64, max_attempts: 2, initial_backoff: Duration::from_millis(1) };

    let repo = InMemoryRepository::new();
    let outbox = Outbox::spawn(mailer, &config.outbox);
    let notifier = NotificationDispatcher::new(outbox.handle(), &config.mail, config.fees.clone());
    let catalog = Arc::new(StaticCatalog::seeded().unwrap());
    let state = AppState::new(Stores::shared(repo.clone()), catalog, notifier, EventPublisher::disabled(), &config);
    TestApp { router: router(state), repo, outbox }
}

pub struct Call<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    pub user: Option<&'a str>,
    pub role: Option<&'a str>,
    pub body: Option<Value>,
}

impl TestApp {
    pub async fn call(&self, call: Call<'_>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(call.method).uri(call.uri);
        if let Some(user) = call.user {
            req = req.header("x-user-id", user);
        }
        if let Some(role) = call.role {
            req = req.header("x-user-role", role);
        }
        let body = match call.body {
            Some(body) => {
                req = req.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &str) -> (StatusCode, Value) {
        self.call(Call { method: "GET", uri, user: Some(user), role: None, body: None }).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.call(Call { method: "POST", uri, user: Some(user), role: None, body: Some(body) }).await
    }

    pub async fn patch(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.call(Call { method: "PATCH", uri, user: Some(user), role: None, body: Some(body) }).await
    }

    pub async fn place_order(&self, user: &str) -> String {
        let (status, body) = self.post("/api/orders", user, order_body()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["orderId"].as_str().unwrap().to_string()
    }

    pub async fn sync_profile(&self, user: &str, name: &str, email: &str) {
        let (status, body) = self.post("/api/users/sync", user, json!({"name": name, "email": email})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

pub fn bouncer_line() -> Value {
    json!({"id": "p1", "name": "Baby Bouncer", "price": 3349, "image": "/images/bouncer.jpeg", "quantity": 1})
}

pub fn order_body() -> Value {
    json!({
        "items": [bouncer_line()],
        "total": 3416,
        "shippingAddress": {
            "fullName": "Ahmed Hassan",
            "phone": "01012345678",
            "address": "12 Nile Street, Cairo",
            "postalCode": "11511"
        },
        "email": "ahmed@example.com"
    })
}
