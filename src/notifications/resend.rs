//! Resend HTTP API client.

use async_trait::async_trait;
use serde::Serialize;

use super::{EmailMessage, Mailer, NotificationError};
use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct SendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl ResendMailer {
    pub fn new(config: &MailConfig, api_key: impl Into<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", config.resend_base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let body = SendEmail {
            from: &message.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        let response = self.client.post(&self.endpoint).bearer_auth(&self.api_key).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), body });
        }
        tracing::debug!(to = %message.to, subject = %message.subject, "email accepted by provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> EmailMessage {
        EmailMessage {
            from: "Baby Bazaar <orders@example.com>".into(),
            to: "ahmed@example.com".into(),
            subject: "Order Confirmation: ORD-12345".into(),
            html: "<p>hi</p>".into(),
            text: "hi".into(),
        }
    }

    fn mailer(server: &MockServer) -> ResendMailer {
        let config = MailConfig { resend_base_url: server.uri(), ..MailConfig::default() };
        ResendMailer::new(&config, "re_test").unwrap()
    }

    #[tokio::test]
    async fn posts_message_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({"to": ["ahmed@example.com"], "subject": "Order Confirmation: ORD-12345"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "em_1"})))
            .expect(1)
            .mount(&server)
            .await;

        mailer(&server).send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn provider_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let err = mailer(&server).send(&message()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Rejected { status: 422, ref body } if body == "invalid from"));
    }
}
