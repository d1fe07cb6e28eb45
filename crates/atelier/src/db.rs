use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

use migration::{Migrator, MigratorTrait};

use crate::config::Config;
use crate::error::{store, Result};

pub async fn connect(config: &Config) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(config.max_connections);
    options.min_connections(1);
    options.connect_timeout(config.connect_timeout);
    options.acquire_timeout(config.connect_timeout);
    options.sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .map_err(store("Failed to open database connection"))?;
    info!(backend = ?db.get_database_backend(), "Database connected");

    Ok(db)
}

/// Names of migrations that have not been applied yet.
pub async fn pending_migrations(db: &DatabaseConnection) -> Result<Vec<String>> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .map_err(store("Failed to read pending migrations"))?;

    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

/// Apply up to `steps` pending migrations (all of them when `None`).
/// Returns how many were applied by this call.
pub async fn migrate(db: &DatabaseConnection, steps: Option<u32>) -> Result<usize> {
    let pending_before = pending_migrations(db).await?;
    if pending_before.is_empty() {
        info!("Schema is up to date");
        return Ok(0);
    }

    Migrator::up(db, steps)
        .await
        .map_err(store("Failed to apply migrations"))?;

    let pending_after = pending_migrations(db).await?;
    let applied = pending_before.len().saturating_sub(pending_after.len());
    info!(
        applied,
        pending = pending_after.len(),
        next = pending_after.first().map(String::as_str),
        "Migrations applied"
    );

    Ok(applied)
}
