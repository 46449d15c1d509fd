//! # Jant server
//!
//! Assembles the adapters into one axum application and serves it.

use anyhow::Context;
use api_adapters::{create_router, AppState};
use auth_adapters::ApiTokenVerifier;
use configs::{AppConfig, LogFormat};
use services::{IdCodec, MediaPolicy, SiteInfo};
use std::sync::Arc;
use storage_adapters::{LocalMediaStorage, SqliteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jant=info,api_adapters=info,services=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(config.server.log_format);

    // 1. Persistence
    let store = Arc::new(
        SqliteStore::connect(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| format!("opening database {}", config.database.url))?,
    );

    // 2. Media objects on the local filesystem
    let storage = Arc::new(LocalMediaStorage::new(
        config.media.root.clone(),
        &config.media.url_prefix,
    ));

    // 3. Management API credentials
    let auth = Arc::new(ApiTokenVerifier::new(config.auth.api_token_hash));

    let ids = IdCodec::new(config.site.sqid_min_length).context("building sqid codec")?;
    let site = SiteInfo {
        name: config.site.name,
        description: config.site.description,
        language: config.site.language,
        base_url: config.site.base_url.trim_end_matches('/').to_string(),
    };

    let state = AppState::from_store(store, storage, auth, ids, site)
        .with_media_policy(MediaPolicy {
            max_upload_bytes: config.media.max_upload_bytes as u64,
        })
        .with_local_media(config.media.root, &config.media.url_prefix);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "jant listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
