//! Handlers the framework installs unless disabled in the configuration.

use std::sync::Arc;

use serenity::async_trait;

use super::{Event, Handler, HandlerOptions};
use crate::{context::Context, dispatch};

/// Logs the start-up time and registers the application commands.
#[derive(Default)]
pub struct ReadyHandler;

#[async_trait]
impl Handler for ReadyHandler {
    fn options(&self) -> HandlerOptions {
        HandlerOptions::new().once()
    }

    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()> {
        let Event::Ready(ready) = event else {
            return Ok(());
        };

        info!(
            "{} is connected after {:.2?}",
            ready.user_tag,
            ctx.instantiated_at.elapsed()
        );

        if ctx.config.register_commands {
            let report = ctx.register_commands().await?;
            info!(
                registered = report.registered.len(),
                "Application commands are up to date"
            );
        }

        Ok(())
    }
}

/// Emits `messageCommandRun` for messages that trigger commands.
#[derive(Default)]
pub struct MessageCreateHandler;

#[async_trait]
impl Handler for MessageCreateHandler {
    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()> {
        let Event::MessageCreate(message) = event else {
            return Ok(());
        };

        let commands = dispatch::commands_triggered_by_message(ctx, message.as_ref()).await;
        if commands.is_empty() {
            return Ok(());
        }

        ctx.emit(Event::MessageCommandRun {
            message: Arc::clone(message),
            commands,
        })
        .await;

        Ok(())
    }
}

#[derive(Default)]
pub struct MessageCommandRunHandler;

#[async_trait]
impl Handler for MessageCommandRunHandler {
    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()> {
        let Event::MessageCommandRun { message, commands } = event else {
            return Ok(());
        };

        dispatch::run_message_commands(ctx, message.as_ref(), commands).await
    }
}

#[derive(Default)]
pub struct InteractionCreateHandler;

#[async_trait]
impl Handler for InteractionCreateHandler {
    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()> {
        let Event::InteractionCreate(interaction) = event else {
            return Ok(());
        };

        dispatch::run_interaction(ctx, interaction.as_ref()).await
    }
}
