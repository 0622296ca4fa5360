//! Subscription commands - entry points into the conversation engine.
//!
//! Each command maps to a menu action; the engine produces the screen and the
//! buttons, and later button presses on that message are handled by the event
//! handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::components},
        core::{
            conversation::Event,
            menu::Action,
        },
        errors::{Error, Result},
    };
    use tracing::debug;

    type Context<'a> = poise::Context<'a, BotData, Error>;

    async fn run_action(ctx: Context<'_>, action: Action) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.get();
        debug!("User {user_id} ran command for {action}");

        let reply = data
            .engine
            .handle(&data.database, user_id, Event::Command(action))
            .await;

        ctx.send(
            poise::CreateReply::default()
                .content(components::content(&reply.text))
                .components(components::action_rows(&reply.keyboard)),
        )
        .await?;
        Ok(())
    }

    /// Shows the main menu.
    #[poise::command(slash_command, prefix_command)]
    pub async fn start(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::MainMenu).await
    }

    /// Starts adding a new subscription.
    #[poise::command(slash_command, prefix_command)]
    pub async fn add(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::AddSubscription).await
    }

    /// Lists active subscriptions with pay and delete buttons.
    #[poise::command(slash_command, prefix_command)]
    pub async fn subscriptions(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::MySubscriptions).await
    }

    /// Shows this month's payments and the recurring monthly cost.
    #[poise::command(slash_command, prefix_command)]
    pub async fn expenses(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::MonthlyExpense).await
    }

    /// Shows this month's spending by category.
    #[poise::command(slash_command, prefix_command)]
    pub async fn analytics(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::Analytics).await
    }

    /// Shows the most recent payments.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(ctx: Context<'_>) -> Result<()> {
        run_action(ctx, Action::History).await
    }
}

// Re-export all commands
pub use inner::*;
