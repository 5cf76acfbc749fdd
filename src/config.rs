//! Environment configuration. `main` loads `.env` first via `dotenvy`.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::pricing::FeeSchedule;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub capacity: usize,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self { capacity: 256, max_attempts: 3, initial_backoff: Duration::from_millis(500) }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// No key means emails are only logged.
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub from: String,
    pub store_email: String,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            resend_base_url: "https://api.resend.com".to_string(),
            from: "Baby Bazaar <orders@babybazaar.store>".to_string(),
            store_email: "babybazaarofficial@gmail.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub fees: FeeSchedule,
    pub delivery_days: u64,
    pub mail: MailConfig,
    pub outbox: OutboxConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            nats_url: None,
            fees: FeeSchedule::default(),
            delivery_days: 7,
            mail: MailConfig::default(),
            outbox: OutboxConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            port: parse(&get, "PORT", d.port)?,
            database_url: get("DATABASE_URL"),
            nats_url: get("NATS_URL"),
            fees: FeeSchedule {
                shipping_fee: parse(&get, "SHIPPING_FEE", d.fees.shipping_fee)?,
                cash_collection_fee: parse(&get, "CASH_COLLECTION_FEE", d.fees.cash_collection_fee)?,
                currency: get("CURRENCY").unwrap_or(d.fees.currency),
            },
            delivery_days: parse(&get, "DELIVERY_DAYS", d.delivery_days)?,
            mail: MailConfig {
                resend_api_key: get("RESEND_API_KEY"),
                resend_base_url: get("RESEND_BASE_URL").unwrap_or(d.mail.resend_base_url),
                from: get("MAIL_FROM").unwrap_or(d.mail.from),
                store_email: get("STORE_EMAIL").unwrap_or(d.mail.store_email),
                timeout: Duration::from_secs(parse(&get, "EMAIL_TIMEOUT_SECS", d.mail.timeout.as_secs())?),
            },
            outbox: OutboxConfig {
                capacity: parse(&get, "OUTBOX_CAPACITY", d.outbox.capacity)?,
                max_attempts: parse(&get, "OUTBOX_MAX_ATTEMPTS", d.outbox.max_attempts)?.max(1),
                initial_backoff: Duration::from_millis(parse(&get, "OUTBOX_BACKOFF_MS", 500)?),
            },
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match get(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_storefront() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.fees.shipping_fee, Decimal::from(57));
        assert_eq!(config.fees.cash_collection_fee, Decimal::from(10));
        assert_eq!(config.delivery_days, 7);
        assert!(config.database_url.is_none());
        assert!(config.mail.resend_api_key.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"), ("SHIPPING_FEE", "45.5"), ("OUTBOX_MAX_ATTEMPTS", "0"), ("RESEND_API_KEY", "re_123"), ("NATS_URL", " "),
        ])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.fees.shipping_fee, Decimal::new(455, 1));
        assert_eq!(config.outbox.max_attempts, 1);
        assert_eq!(config.mail.resend_api_key.as_deref(), Some("re_123"));
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn bad_numbers_name_the_key() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
    }
}
