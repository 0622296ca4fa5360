//! Gateway events that are not slash commands.
//!
//! Button presses and plain text messages are turned into conversation
//! [`Event`]s and answered with the engine's [`Reply`]. Text in guild channels
//! is only picked up while the author is in a typed step, so the bot does not
//! answer every message in a shared channel. Button presses are acknowledged
//! before the engine runs, because Discord drops interactions that are not
//! answered within three seconds.

use crate::{
    bot::{BotData, handlers::components},
    core::conversation::{Delivery, Event, Reply},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, info, instrument};

const PRIVATE_NOTICE: &str = "⛔ This bot is private.";

/// Entry point registered as the framework's event handler.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("{} is connected", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => handle_component(ctx, component, data).await?,
        serenity::FullEvent::Message { new_message } => {
            if is_command_text(&new_message.content, crate::bot::PREFIX, command_names(framework)) {
                return Ok(());
            }
            handle_message(ctx, new_message, data).await?;
        }
        _ => {}
    }
    Ok(())
}

#[instrument(skip_all, fields(user_id = %component.user.id, custom_id = %component.data.custom_id))]
async fn handle_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let user_id = component.user.id.get();
    if !data.settings.is_allowed(user_id) {
        debug!("Refusing button press from user {user_id}");
        let message = serenity::CreateInteractionResponseMessage::new()
            .content(PRIVATE_NOTICE)
            .ephemeral(true);
        component
            .create_response(ctx, serenity::CreateInteractionResponse::Message(message))
            .await?;
        return Ok(());
    }

    component
        .create_response(ctx, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    let event = Event::Button(component.data.custom_id.clone());
    let reply = data.engine.handle(&data.database, user_id, event).await;
    match followup(&reply) {
        Followup::EditOriginal(edit) => {
            component.edit_response(ctx, edit).await?;
        }
        Followup::NewMessage(message) => {
            component.create_followup(ctx, message).await?;
        }
    }
    Ok(())
}

#[instrument(skip_all, fields(user_id = %message.author.id))]
async fn handle_message(ctx: &serenity::Context, message: &serenity::Message, data: &BotData) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }

    let user_id = message.author.id.get();
    let direct = message.guild_id.is_none();
    if !direct && !data.engine.expects_text(user_id).await {
        return Ok(());
    }
    if !data.settings.is_allowed(user_id) {
        if direct {
            message.channel_id.say(ctx, PRIVATE_NOTICE).await?;
        }
        return Ok(());
    }

    let event = Event::Text(message.content.clone());
    let reply = data.engine.handle(&data.database, user_id, event).await;
    let builder = serenity::CreateMessage::new()
        .content(components::content(&reply.text))
        .components(components::action_rows(&reply.keyboard));
    message.channel_id.send_message(ctx, builder).await?;
    Ok(())
}

/// Names and aliases of every registered command.
fn command_names<'a>(framework: poise::FrameworkContext<'a, BotData, Error>) -> impl Iterator<Item = &'a str> {
    framework
        .options
        .commands
        .iter()
        .flat_map(|command| std::iter::once(&command.name).chain(&command.aliases))
        .map(String::as_str)
}

/// True if `content` invokes one of `names` with `prefix`, e.g. `!help`.
/// Other text that happens to start with the prefix is conversation input.
fn is_command_text<'a>(content: &str, prefix: &str, mut names: impl Iterator<Item = &'a str>) -> bool {
    let Some(invocation) = content.strip_prefix(prefix) else {
        return false;
    };
    let Some(word) = invocation.split_whitespace().next() else {
        return false;
    };
    if !invocation.starts_with(word) {
        return false;
    }
    names.any(|name| name.eq_ignore_ascii_case(word))
}

/// How the reply reaches the user once the press has been acknowledged.
enum Followup {
    EditOriginal(serenity::EditInteractionResponse),
    NewMessage(serenity::CreateInteractionResponseFollowup),
}

fn followup(reply: &Reply) -> Followup {
    let content = components::content(&reply.text);
    let rows = components::action_rows(&reply.keyboard);
    match reply.delivery {
        Delivery::Edit => Followup::EditOriginal(
            serenity::EditInteractionResponse::new()
                .content(content)
                .components(rows),
        ),
        Delivery::Send => Followup::NewMessage(
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .components(rows),
        ),
    }
}
