//! Vanish server
//!
//! Serves uploads and downloads of expiring files and runs the reaper that
//! reclaims them.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vanish_api::{AppState, create_router};
use vanish_core::storage::{StorageConfig, StorageService};
use vanish_core::{
    FileService, FileStore, MemoryFileStore, ObjectGateway, Reaper, ReaperConfig, ReaperScheduler,
};
use vanish_db::FileRepository;
use vanish_shared::{AppConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vanish=debug,tower_http=debug".into());
    match config.log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    // Object storage
    let storage_config = StorageConfig::from_settings(&config.storage, &config.server.public_url)
        .context("invalid storage configuration")?;
    let storage = Arc::new(
        StorageService::from_config(storage_config).context("failed to initialize storage")?,
    );
    info!(
        provider = storage.provider_name(),
        max_file_size = storage.config().max_file_size,
        "Storage configured"
    );
    let gateway: Arc<dyn ObjectGateway> = storage.clone();

    // Metadata store
    let store: Arc<dyn FileStore> = if let Some(database) = &config.database {
        let db = vanish_db::connect(&database.url)
            .await
            .context("failed to connect to database")?;
        info!("Connected to database");
        if database.run_migrations {
            vanish_db::run_migrations(&db)
                .await
                .context("failed to run migrations")?;
        }
        Arc::new(FileRepository::new(db))
    } else {
        warn!("No database configured, file records are kept in memory");
        Arc::new(MemoryFileStore::new())
    };

    let files = Arc::new(FileService::new(
        store.clone(),
        gateway.clone(),
        storage.config().max_file_size,
    ));

    // Reaper
    let reaper = if config.reaper.enabled {
        let reaper_config = ReaperConfig::from(&config.reaper);
        let reaper = Reaper::new(store, gateway, &reaper_config);
        Some(ReaperScheduler::spawn(reaper, &reaper_config))
    } else {
        warn!("Reaper disabled, expired files will not be reclaimed");
        None
    };

    // Create router
    let app = create_router(AppState::new(files));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = reaper {
        handle.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
