//! Profile mirror of identity-provider users.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::aggregates::{ProfileData, UserProfile};
use crate::repositories::UserRepository;
use crate::{Result, StorefrontError};

/// Identity-provider webhook payload. Only the fields the profile needs are
/// read; everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: IdentityUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress { pub email_address: String }

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneNumber { pub phone_number: String }

impl IdentityUser {
    fn profile_data(&self) -> ProfileData {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        ProfileData {
            name,
            email: self.email_addresses.first().map(|e| e.email_address.clone()).unwrap_or_default(),
            phone: self.phone_numbers.first().map(|p| p.phone_number.clone()),
            image_url: self.image_url.clone(),
        }
    }
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Upserted(String),
    Deactivated(String),
    Ignored,
}

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Signed-in users push their identity details here. Name and email are
    /// required.
    pub async fn sync(&self, user_id: &str, data: ProfileData) -> Result<UserProfile> {
        if let Some(field) = data.missing_field() {
            return Err(StorefrontError::validation(field, "Missing required fields"));
        }
        let profile = self.users.upsert_profile(user_id, data).await?;
        tracing::info!(user_id, "profile synced");
        Ok(profile)
    }

    pub async fn handle_event(&self, event: IdentityEvent) -> Result<WebhookOutcome> {
        let user_id = event.data.id.as_str();
        match event.kind.as_str() {
            "user.created" | "user.updated" => {
                if user_id.trim().is_empty() {
                    tracing::warn!(kind = %event.kind, "identity event without user id");
                    return Ok(WebhookOutcome::Ignored);
                }
                // the mirror takes whatever the provider has; only direct syncs are strict
                let data = event.data.profile_data();
                if let Some(field) = data.missing_field() {
                    tracing::warn!(user_id, field, "identity user incomplete, mirroring anyway");
                }
                self.users.upsert_profile(user_id, data).await?;
                tracing::info!(user_id, kind = %event.kind, "profile mirrored");
                Ok(WebhookOutcome::Upserted(user_id.to_string()))
            }
            "user.deleted" => {
                if !self.users.mark_deleted(user_id).await? {
                    tracing::warn!(user_id, "delete event for unknown profile");
                }
                Ok(WebhookOutcome::Deactivated(user_id.to_string()))
            }
            other => {
                tracing::debug!(kind = other, "identity event ignored");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}
