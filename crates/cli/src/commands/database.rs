use autoverse_core::{AppConfig, CoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Open the single-connection pool the migration commands run on and make
/// sure the server answers before any migration work starts.
pub async fn connect(config: &AppConfig) -> Result<PgPool, CoreError> {
    let database_url = config.database.connection_url()?;
    info!(database = %config.masked_database_url(), "connecting to database");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .map_err(|e| CoreError::database(format!("failed to connect to database: {}", e)))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| CoreError::database(format!("database ping failed: {}", e)))?;

    Ok(pool)
}
