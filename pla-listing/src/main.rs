//! pla-listing - Product Listing Accelerator service
//!
//! **Module Identity:**
//! - Name: pla-listing
//! - Port: 5740 (default)
//!
//! Upload product photos, enhance them, submit one for analysis, then
//! review, save and export the generated listing.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pla_common::config::{
    resolve_config_path, RootFolderInitializer, RootFolderResolver, StorageBackend, TomlConfig,
};
use pla_common::events::EventBus;
use pla_listing::db::{self, InMemoryListingStore, ListingStore, SqliteListingStore};
use pla_listing::services::{
    AnalysisLookup, SavedListingCatalog, StubAnalyzer, StubEnhancer, SyntheticCatalog,
};
use pla_listing::{build_router, AppState, Backends};

/// Command-line arguments for pla-listing
#[derive(Parser, Debug)]
#[command(name = "pla-listing")]
#[command(about = "Product Listing Accelerator service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root folder for local state (SQLite database)
    #[arg(short, long, value_name = "DIR")]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "PLA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts: it carries the log level
    let config_path = resolve_config_path(args.config.as_deref(), "pla-listing");
    let config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("pla_listing={0},pla_common={0},tower_http=info", config.logging.level)
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pla-listing (Product Listing Accelerator) v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using compiled defaults"),
    }

    let store: Arc<dyn ListingStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Listing store: in-memory (contents lost on restart)");
            Arc::new(InMemoryListingStore::with_latency(config.latency.save()))
        }
        StorageBackend::Sqlite => {
            let root_folder = RootFolderResolver::new("pla-listing")
                .with_cli_arg(args.root_folder.clone())
                .resolve(&config);
            let initializer = RootFolderInitializer::new(root_folder);
            initializer
                .ensure_directory_exists()
                .context("Failed to initialize root folder")?;

            let db_path = initializer.database_path();
            info!("Listing store: SQLite at {}", db_path.display());
            let pool = db::init_database_pool(&db_path).await?;
            Arc::new(SqliteListingStore::new(pool))
        }
    };

    let lookup: Arc<dyn AnalysisLookup> = if config.review.prefer_saved_listings {
        info!("Review lookup: saved listings first");
        Arc::new(SavedListingCatalog::new(store.clone()))
    } else {
        Arc::new(SyntheticCatalog::new())
    };

    let event_bus = EventBus::new(config.events.capacity);
    let backends = Backends {
        analyzer: Arc::new(StubAnalyzer::new()),
        enhancer: Arc::new(StubEnhancer::new(config.latency.enhancement())),
        lookup,
        store,
    };
    let state = AppState::new(backends, event_bus, &config);
    let sweeper = state.spawn_session_sweeper();
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
