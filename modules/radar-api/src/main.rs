use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use radar_api::{router, AppState};
use radar_common::Config;
use radar_scout::{default_fetchers, ScriptGenerator};
use radar_store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("radar=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let store = Arc::new(PgStore::connect(&config.database_url).await?);

    let state = Arc::new(AppState {
        stories: store.clone(),
        scrape_log: store.clone(),
        quizzes: store.clone(),
        fetchers: default_fetchers(&config)?,
        scripts: ScriptGenerator::from_config(&config, store.clone(), store),
    });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Radar API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
