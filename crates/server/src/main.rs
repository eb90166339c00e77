//! Granary server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use granary_core::config::{AppConfig, MetadataConfig};
use granary_metadata::{MetadataStore, SqliteStore};
use granary_server::bootstrap::ensure_admin_token;
use granary_server::{AppState, DbMergeCoordinator, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Granary - a package repository mirror server
#[derive(Parser, Debug)]
#[command(name = "granaryd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "GRANARY_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Granary v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("GRANARY_") && key != "GRANARY_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: granaryd --config /path/to/config.toml\n  \
             2. Environment variables: GRANARY_SERVER__BIND=0.0.0.0:8080 \
             GRANARY_ADMIN__TOKEN_HASH=sha256:YOUR_TOKEN_HASH_HERE granaryd"
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("GRANARY_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize storage backend
    let storage = granary_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;

    // Verify storage connectivity before accepting requests.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend initialized");

    // Initialize metadata store
    let MetadataConfig::Sqlite { path } = &config.metadata;
    let metadata: Arc<dyn MetadataStore> = Arc::new(
        SqliteStore::new(path)
            .await
            .context("failed to initialize metadata store")?,
    );
    tracing::info!("Metadata store initialized");

    // Initialize admin account and token
    ensure_admin_token(metadata.as_ref(), &config.admin).await?;

    let merge = Arc::new(DbMergeCoordinator::new(metadata.clone()));
    let state = AppState::new(config.clone(), storage, metadata, merge);
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
