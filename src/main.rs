use dotenvy::dotenv;
use std::env;
use subscription_tracker::{
    bot::{self, BotData},
    config::{database, settings},
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. Load .env file; env vars may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Settings from config.toml and the environment
    let settings = settings::load_settings().inspect_err(|e| error!("Failed to load settings: {e}"))?;

    // 4. Database
    let db = database::create_connection(&settings)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Run the bot
    // DISCORD_BOT_TOKEN is loaded here, directly before use, not stored in Settings
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(db, settings)).await
}
