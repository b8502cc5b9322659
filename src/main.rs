//! Entry point: load config, wire dependencies, and run the server.

use inkwell::config::Config;
use inkwell::db;
use inkwell::services::mailer_from_config;
use inkwell::{create_app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    let mailer = mailer_from_config(&config)?;
    if config.mail_api_url.is_none() {
        tracing::warn!("MAIL_API_URL not set; account emails will only be logged");
    }
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = AppState::from_config(&config, db_pool, mailer);
    let app = create_app(state);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
