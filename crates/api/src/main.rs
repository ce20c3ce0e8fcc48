use anyhow::{Context, Result};
use tracing::info;

use arisan_api::app::create_app;
use arisan_api::config::Config;
use arisan_api::middleware::{init_metrics, logging::init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    init_logging(&config.logging);
    init_metrics();

    info!("Starting Arisan API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database)
        .await
        .context("failed to connect to database")?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("Migrations completed");

    let jwt = config.jwt.build().context("invalid JWT key material")?;
    let stores = persistence::repositories::pg_stores(pool.clone());

    // socket_addr reads config before it moves into the app
    let addr = config.socket_addr();
    let app = create_app(config, jwt, stores, Some(pool));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
