use cordwork::{
    Command, CommandData, CommandOptions, Context, Export,
    platform::{InteractionContext, MessageContext},
    util,
};
use serenity::async_trait;

#[derive(Default)]
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new()
            .description("Checks that the bot is alive.")
            .chat_input(CommandData::chat_input(
                "ping",
                "Checks that the bot is alive.",
            ))
            .message_trigger()
            .global()
    }

    async fn message_trigger(
        &self,
        _ctx: &Context,
        message: &dyn MessageContext,
    ) -> anyhow::Result<bool> {
        Ok(util::variants_message_trigger(message.content(), &["ping"]))
    }

    async fn message_run(&self, ctx: &Context, message: &dyn MessageContext) -> anyhow::Result<()> {
        message.reply(&pong(ctx)).await
    }

    async fn chat_input_run(
        &self,
        ctx: &Context,
        interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        interaction.reply(&pong(ctx), false).await
    }
}

fn pong(ctx: &Context) -> String {
    format!("Pong! Up for {:.0?}.", ctx.instantiated_at.elapsed())
}

pub fn export() -> Export<dyn Command> {
    cordwork::export!(dyn Command => PingCommand)
}
