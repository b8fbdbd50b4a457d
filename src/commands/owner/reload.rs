use cordwork::{
    Command, CommandData, CommandOptions, Context, Export, PreconditionRef,
    platform::{InteractionContext, MessageContext},
    util,
};
use serenity::async_trait;

/// Reloads the commands from disk and registers the ones that changed.
#[derive(Default)]
pub struct ReloadCommand;

impl ReloadCommand {
    async fn reload(&self, ctx: &Context) -> anyhow::Result<String> {
        let loaded = ctx.commands.sync_all().await?;
        let report = ctx.register_commands().await?;

        Ok(format!(
            "Reloaded {loaded} command(s), registered {} application command(s).",
            report.registered.len()
        ))
    }
}

#[async_trait]
impl Command for ReloadCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new()
            .chat_input(CommandData::chat_input(
                "reload",
                "Reloads every command from disk.",
            ))
            .message_trigger()
            .precondition(
                PreconditionRef::named("owner-only").add_to_message("Ask the bot owner instead."),
            )
            .global()
    }

    async fn message_trigger(
        &self,
        _ctx: &Context,
        message: &dyn MessageContext,
    ) -> anyhow::Result<bool> {
        Ok(util::variants_message_trigger(message.content(), &["reload"]))
    }

    async fn message_run(&self, ctx: &Context, message: &dyn MessageContext) -> anyhow::Result<()> {
        let content = self.reload(ctx).await?;
        message.reply(&content).await
    }

    async fn chat_input_run(
        &self,
        ctx: &Context,
        interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        let content = self.reload(ctx).await?;
        interaction.reply(&content, true).await
    }
}

pub fn export() -> Export<dyn Command> {
    cordwork::export!(dyn Command => ReloadCommand)
}
