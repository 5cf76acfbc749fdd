//! Baby Bazaar storefront API server

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use baby_bazaar::catalog::StaticCatalog;
use baby_bazaar::notifications::{LogMailer, Mailer, NotificationDispatcher, Outbox, ResendMailer};
use baby_bazaar::publisher::EventPublisher;
use baby_bazaar::repositories::{InMemoryRepository, PgRepository};
use baby_bazaar::services::Stores;
use baby_bazaar::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let stores = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await.context("connecting to DATABASE_URL")?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Stores::shared(PgRepository::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders and carts live in memory only");
            Stores::shared(InMemoryRepository::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will not be published");
                None
            }
        },
        None => None,
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(&config.mail, key.clone())?),
        None => {
            tracing::warn!("RESEND_API_KEY not set, emails are logged instead of sent");
            Arc::new(LogMailer)
        }
    };
    let outbox = Outbox::spawn(mailer, &config.outbox);
    let notifier = NotificationDispatcher::new(outbox.handle(), &config.mail, config.fees.clone());

    let catalog = Arc::new(StaticCatalog::seeded()?);
    let state = AppState::new(stores, catalog, notifier, EventPublisher::new(nats), &config);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 Baby Bazaar listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    outbox.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining outbox");
}
