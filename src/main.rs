//! Souq Back-Office - JSON-document store back-office service

use anyhow::Result;
use souq_backoffice::api::{self, AppState};
use souq_backoffice::config::Settings;
use souq_backoffice::domain::events::forward_to_nats;
use souq_backoffice::store::JsonFileStore;
use souq_backoffice::Backoffice;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let settings = Settings::from_env();
    tracing::info!(data_file = %settings.data_file.display(), policy = ?settings.stale_references, "Opening back-office document");
    let backoffice = Arc::new(Backoffice::new(JsonFileStore::new(&settings.data_file), settings.stale_references));

    if let Some(url) = &settings.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => {
                tokio::spawn(forward_to_nats(backoffice.subscribe(), client, settings.nats_subject_prefix.clone()));
                tracing::info!(%url, "Relaying recompute signals to NATS");
            }
            Err(e) => tracing::warn!(%url, error = %e, "NATS unavailable, recompute signals stay in-process"),
        }
    }

    let app = api::router(AppState { backoffice, default_locale: settings.default_locale });
    tracing::info!("🚀 Souq Back-Office listening on 0.0.0.0:{}", settings.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?, app).await?;
    Ok(())
}
