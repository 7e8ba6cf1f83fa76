use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use todo_rest::app_env::ServiceConfig;
use todo_rest::{SharedData, build_router, logging, persistence};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if dotenv().is_err() {
        println!("Starting server without .env file.");
    }
    let env_filter = logging::init_env_filter()?;
    let otel_exporters = logging::exporters_from_env()?;
    logging::setup_logging_and_tracing(env_filter, otel_exporters);

    let config = ServiceConfig::from_env()?;
    let db_pool = persistence::connect_sqlx(&config.db_url, config.db_max_connections).await?;
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
    });
    let router = build_router(shared_data);

    info!("Starting server on {}", config.listen_address);
    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("binding to {}", config.listen_address))?;
    axum::serve(listener, router)
        .await
        .context("running the HTTP server")?;

    Ok(())
}
