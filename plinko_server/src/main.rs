use std::sync::Arc;

use plinko_core::NonceSource;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod routes;

use config::ServerConfig;
use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let config = ServerConfig::from_env()?;
    let params = config.engine_params()?;

    let db = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let nonces = NonceSource::starting_after(db::max_nonce(&db).await?);

    let state = Arc::new(AppState { db, nonces, params });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(rows = config.rows, "listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
