//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the conversation engine to Discord: slash commands start
//! or show screens, button presses and text messages are fed to the engine by
//! the event handler, and a background task drops abandoned sessions.

/// Discord command implementations (subscriptions, general)
pub mod commands;
/// Discord interaction handlers (buttons, messages, rendering)
pub mod handlers;

use crate::{
    config::settings::Settings,
    core::conversation::ConversationEngine,
    errors::{Error, Result},
};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Prefix for text commands. Only messages naming a registered command are skipped as conversation input.
pub const PREFIX: &str = "!";

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Per-user conversation state machine
    pub engine: Arc<ConversationEngine>,
    /// Runtime settings
    pub settings: Settings,
}

impl BotData {
    /// Creates the shared context from a database connection and settings.
    #[must_use]
    pub fn new(database: DatabaseConnection, settings: Settings) -> Self {
        let engine = Arc::new(ConversationEngine::from_settings(&settings));
        Self {
            database,
            engine,
            settings,
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error:?}", ctx.command().name);
            if let Err(e) = ctx.say(format!("❌ An error occurred: {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, .. } => {
            debug!("User {} is not allowed to use the bot", ctx.author().id);
            if let Err(e) = ctx.say("⛔ This bot is private.").await {
                error!("Failed to send refusal: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Periodically drops sessions that have been idle for longer than the TTL.
fn spawn_session_sweeper(engine: Arc<ConversationEngine>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = engine.sessions().evict_expired(Utc::now());
            if removed > 0 {
                debug!("Evicted {removed} expired sessions");
            }
        }
    });
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::start(),
                commands::add(),
                commands::subscriptions(),
                commands::expenses(),
                commands::analytics(),
                commands::history(),
                commands::ping(),
                commands::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(PREFIX.to_string()),
                ..Default::default()
            },
            command_check: Some(|ctx| {
                Box::pin(async move { Ok(ctx.data().settings.is_allowed(ctx.author().id.get())) })
            }),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                spawn_session_sweeper(Arc::clone(&data.engine));
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}
