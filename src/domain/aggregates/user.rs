//! User profile mirrored from the identity provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields the identity provider is authoritative for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileData {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub image_url: Option<String>,
}

impl ProfileData {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() { return Some("name"); }
        if self.email.trim().is_empty() { return Some("email"); }
        None
    }
}

impl UserProfile {
    /// Applies an identity update, creating the profile when none exists yet.
    /// `created_at` is only ever set on insert.
    pub fn upsert(existing: Option<UserProfile>, user_id: &str, data: ProfileData, now: DateTime<Utc>) -> Self {
        let created_at = existing.as_ref().map_or(now, |p| p.created_at);
        Self {
            user_id: user_id.to_string(), name: data.name, email: data.email,
            phone: data.phone, image_url: data.image_url, is_active: true,
            created_at, updated_at: now,
        }
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }
}
