//! serenity implementations of the platform traits.

use std::sync::Arc;

use serenity::{
    all::{
        Command, CommandId, CommandInteraction, CommandType, Context as SerenityContext,
        CreateInteractionResponse, CreateInteractionResponseMessage, EventHandler, Http,
        Interaction, Message, Ready, UserId,
    },
    async_trait,
};

use crate::{
    command::CommandData,
    context::Context,
    error::RegistrationError,
    handler::{Event, ReadyInfo},
    platform::{CommandApi, InteractionContext, MessageContext, RemoteCommand, Scope},
};

pub struct SerenityMessage {
    http: Arc<Http>,
    message: Message,
}

impl SerenityMessage {
    pub fn new(http: Arc<Http>, message: Message) -> Self {
        Self { http, message }
    }
}

#[async_trait]
impl MessageContext for SerenityMessage {
    fn author_id(&self) -> UserId {
        self.message.author.id
    }

    fn author_tag(&self) -> String {
        self.message.author.tag()
    }

    fn author_is_bot(&self) -> bool {
        self.message.author.bot || self.message.webhook_id.is_some()
    }

    fn content(&self) -> &str {
        &self.message.content
    }

    fn is_reply(&self) -> bool {
        self.message.message_reference.is_some()
    }

    fn location(&self) -> String {
        match self.message.guild_id {
            Some(_) => format!("in <#{}>", self.message.channel_id),
            None => "through DMs".to_owned(),
        }
    }

    async fn reply(&self, content: &str) -> anyhow::Result<()> {
        self.message.reply(&*self.http, content).await?;
        Ok(())
    }
}

pub struct SerenityInteraction {
    http: Arc<Http>,
    interaction: CommandInteraction,
}

impl SerenityInteraction {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self { http, interaction }
    }

    /// The raw interaction, for commands that read their options.
    pub fn interaction(&self) -> &CommandInteraction {
        &self.interaction
    }
}

#[async_trait]
impl InteractionContext for SerenityInteraction {
    fn command_name(&self) -> &str {
        &self.interaction.data.name
    }

    fn command_type(&self) -> CommandType {
        self.interaction.data.kind
    }

    fn user_id(&self) -> UserId {
        self.interaction.user.id
    }

    fn user_tag(&self) -> String {
        self.interaction.user.tag()
    }

    async fn reply(&self, content: &str, ephemeral: bool) -> anyhow::Result<()> {
        Ok(self
            .interaction
            .create_response(
                &*self.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(content)
                        .ephemeral(ephemeral),
                ),
            )
            .await?)
    }
}

/// Application command management through the HTTP client.
pub struct SerenityApi {
    http: Arc<Http>,
}

impl SerenityApi {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CommandApi for SerenityApi {
    fn ensure_ready(&self) -> Result<(), RegistrationError> {
        match self.http.application_id() {
            Some(_) => Ok(()),
            None => Err(RegistrationError::NotLoggedIn),
        }
    }

    async fn fetch_commands(&self, scope: Scope) -> anyhow::Result<Vec<RemoteCommand>> {
        let http = &*self.http;
        let commands = match scope {
            Scope::Global => Command::get_global_commands(http).await?,
            Scope::Guild(guild_id) => guild_id.get_commands(http).await?,
        };

        Ok(commands
            .into_iter()
            .map(|command| RemoteCommand {
                id: command.id,
                name: command.name,
                kind: command.kind,
            })
            .collect())
    }

    async fn create_command(&self, scope: Scope, data: &CommandData) -> anyhow::Result<()> {
        let http = &*self.http;
        let builder = data.builder().clone();
        match scope {
            Scope::Global => Command::create_global_command(http, builder).await?,
            Scope::Guild(guild_id) => guild_id.create_command(http, builder).await?,
        };

        Ok(())
    }

    async fn update_command(
        &self,
        scope: Scope,
        id: CommandId,
        data: &CommandData,
    ) -> anyhow::Result<()> {
        let http = &*self.http;
        let builder = data.builder().clone();
        match scope {
            Scope::Global => Command::edit_global_command(http, id, builder).await?,
            Scope::Guild(guild_id) => guild_id.edit_command(http, id, builder).await?,
        };

        Ok(())
    }
}

/// Forwards gateway events into the framework's emitter.
pub struct Bridge {
    ctx: Arc<Context>,
    http: Arc<Http>,
}

impl Bridge {
    /// `http` must be the client the [`SerenityApi`] of `ctx` was built with.
    pub fn new(ctx: Arc<Context>, http: Arc<Http>) -> Self {
        Self { ctx, http }
    }
}

#[async_trait]
impl EventHandler for Bridge {
    async fn ready(&self, _: SerenityContext, ready: Ready) {
        self.http.set_application_id(ready.application.id);

        self.ctx
            .emit(Event::Ready(ReadyInfo {
                user_tag: ready.user.tag(),
            }))
            .await;
    }

    async fn message(&self, ctx: SerenityContext, message: Message) {
        let message = SerenityMessage::new(Arc::clone(&ctx.http), message);
        self.ctx.emit(Event::MessageCreate(Arc::new(message))).await;
    }

    async fn interaction_create(&self, ctx: SerenityContext, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let interaction = SerenityInteraction::new(Arc::clone(&ctx.http), command);
        self.ctx
            .emit(Event::InteractionCreate(Arc::new(interaction)))
            .await;
    }
}
