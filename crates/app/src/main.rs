mod api;
mod problem;
mod router;
mod service;
mod telemetry;

use std::net::SocketAddr;

use tracing::info;

use claims_desk_storage::Database;
use claims_desk_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let storage = Database::connect(&config.database_url).await?;
    storage.run_migrations().await?;

    let state = router::AppState::new(metrics, storage);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
