//! Tharwa Backend Service
//!
//! Ops entrypoint: loads configuration, initializes logging, connects
//! the database pool, and applies pending migrations. The HTTP/admin
//! surface lives in a separate deployment and consumes this crate as a
//! library.

use tharwa_backend::config::AppConfig;
use tharwa_backend::database::{create_pool, run_migrations};
use tharwa_backend::error::{AppError, AppResult};
use tharwa_backend::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(AppError::Config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(environment = %config.environment, "starting tharwa-backend");

    let pool = create_pool(&config.database).await?;
    info!("database pool created");

    run_migrations(&pool, None).await?;
    info!("migrations applied");

    let _state = AppState::new(pool);
    info!("application state initialized, ready");

    Ok(())
}
