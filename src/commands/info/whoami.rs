use cordwork::{
    Command, CommandData, CommandOptions, Context, Export, platform::InteractionContext,
};
use serenity::async_trait;

/// Available as a slash command and from the user context menu.
#[derive(Default)]
pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn options(&self) -> CommandOptions {
        CommandOptions::new()
            .description("Tells you who you are.")
            .chat_input(CommandData::chat_input("whoami", "Tells you who you are."))
            .user_context_menu(CommandData::user("Who am I?"))
            .global()
    }

    async fn chat_input_run(
        &self,
        _ctx: &Context,
        interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        reply(interaction).await
    }

    async fn context_menu_run(
        &self,
        _ctx: &Context,
        interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        reply(interaction).await
    }
}

async fn reply(interaction: &dyn InteractionContext) -> anyhow::Result<()> {
    let content = format!(
        "You are **{}** (`{}`).",
        interaction.user_tag(),
        interaction.user_id()
    );
    interaction.reply(&content, true).await
}

pub fn export() -> Export<dyn Command> {
    cordwork::export!(dyn Command => WhoamiCommand)
}
