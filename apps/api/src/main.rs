mod config;
mod db;
mod editor;
mod errors;
mod models;
mod persistence;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::db::{create_pool, ensure_schema};
use crate::editor::session::SessionRegistry;
use crate::persistence::snapshots::SnapshotExporter;
use crate::persistence::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::routes::build_router;
use crate::state::AppState;

const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvedit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize document store
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; documents are kept in memory only");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    // Initialize S3 / MinIO snapshot export
    let snapshots = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("S3 client initialized (bucket: {})", s3.bucket);
            Some(SnapshotExporter::new(client, s3.bucket.clone()))
        }
        None => {
            info!("S3 not configured; preview snapshots disabled");
            None
        }
    };

    let settings = config.session_settings();
    info!(
        "Autosave quiet period {:?}, drag activation {}px, session idle timeout {:?}",
        settings.quiet_period, settings.activation_distance, settings.idle_timeout
    );

    let sessions = SessionRegistry::new(store, settings);
    sessions.spawn_eviction(EVICTION_INTERVAL);

    // Build app state
    let state = AppState {
        sessions,
        snapshots,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "cvedit-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
