//! General Discord commands - ping and help.
//! These commands don't touch the database or the conversation state.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Subscription Tracker Help**\n\
        Track recurring payments, mark them as paid and see where the money goes.\n\n\
        **Commands**\n\
        • `/start` - Shows the main menu.\n\
        • `/add` - Adds a subscription step by step (category, currency, period, auto-renewal, name, cost).\n\
        • `/subscriptions` - Lists active subscriptions with pay and delete buttons.\n\
        • `/expenses` - Shows this month's payments and the recurring monthly cost.\n\
        • `/analytics` - Shows this month's spending by category.\n\
        • `/history` - Shows the most recent payments.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        While adding a subscription, answer the name, cost and custom period by sending a normal message. \
        Press **Back** at any time to cancel.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
