use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::config::AppConfig;
use api::database::init_db;
use api::state::AppState;
use api::storage::init_blob_store;
use api::store::SeaOrmRecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("loading configuration")?;

    let db = init_db(&config.database)
        .await
        .context("connecting to the record database")?;
    let blobs = init_blob_store(&config.storage).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server.host or server.port")?;

    let state = AppState {
        config,
        records: Arc::new(SeaOrmRecordStore::new(db)),
        blobs,
    };
    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Storage API listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
