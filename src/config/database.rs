//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::config::settings::Settings;
use crate::entities::{Payment, Subscription};
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Default database location used when neither `config.toml` nor `DATABASE_URL` set one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/subscriptions.sqlite?mode=rwc";

/// Establishes a connection to the database configured in `settings`.
///
/// Connect and acquire attempts are bounded by the configured persistence
/// timeout so a stuck database surfaces as an error instead of hanging the bot.
#[instrument(skip(settings), fields(url = %settings.database_url))]
pub async fn create_connection(settings: &Settings) -> Result<DatabaseConnection> {
    ensure_database_dir(&settings.database_url)?;

    let timeout = Duration::from_secs(settings.persistence_timeout_secs);
    let mut options = ConnectOptions::new(settings.database_url.clone());
    options
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("Database connection established");
    Ok(db)
}

/// Creates the parent directory of a file-backed `SQLite` database.
///
/// `mode=rwc` lets `SQLite` create the file but not missing directories.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Creates the `subscriptions` and `payments` tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut subscription_table = schema.create_table_from_entity(Subscription);
    subscription_table.if_not_exists();
    let mut payment_table = schema.create_table_from_entity(Payment);
    payment_table.if_not_exists();

    db.execute(builder.build(&subscription_table)).await?;
    db.execute(builder.build(&payment_table)).await?;

    Ok(())
}
