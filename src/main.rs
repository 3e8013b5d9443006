use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use media_share::config::Config;
use media_share::db::Database;
use media_share::repository::SqliteRepository;
use media_share::storage::{S3Client, StorageGateway};
use media_share::web::{self, AppState};
use media_share::ShareError;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    if let Err(e) = init_tracing() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }

    // Missing configuration means no backend can be reached at all.
    let config = match Config::from_env().and_then(|config| config.validate().map(|()| config)) {
        Ok(config) => config,
        Err(e) => {
            let err = ShareError::Connectivity(format!("configuration: {e}"));
            error!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    info!(
        bucket = %config.s3_bucket,
        database = %config.database_path.display(),
        "Starting media-share"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::with_acquire_timeout(&config.database_path, config.request_timeout)
        .await
        .context("Failed to initialize database")?;
    info!("Database initialized");

    let s3_client = S3Client::new(&config).context("Failed to initialize S3 client")?;
    info!(public = s3_client.is_public(), "S3 client initialized");

    let storage = StorageGateway::new(
        Arc::new(s3_client),
        config.s3_prefix.clone(),
        config.max_upload_bytes,
        config.request_timeout,
    );
    let repo = SqliteRepository::new(db.clone(), config.request_timeout, config.feed_limit);

    let state = AppState::new(db, Arc::new(repo), storage, config);
    web::serve(state, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,media_share=debug"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}
