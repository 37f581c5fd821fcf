use crate::error::AppResult;
use crate::model::{DbConnection, ModelManager};

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod error;
pub mod model;

static APPLICATION_NAME: &str = "kalog";

/// Opens the configured database, applies migrations and hands back a ready `ModelManager`.
#[tracing::instrument]
pub async fn build_model_manager(use_local: bool) -> AppResult<ModelManager> {
    let config = Config::get_or_init(use_local).await;
    let db = DbConnection::connect(
        config.database().uri(),
        config.database().max_connections(),
    )?;

    db.migrate().await?;
    Ok(ModelManager::new(db))
}

pub fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}
