//! What the framework needs from the chat platform.
//!
//! The dispatch and registration code only talks to these traits; the serenity
//! implementations live in [`crate::discord`].

use std::fmt;

use serenity::{
    all::{CommandId, CommandType, GuildId, UserId},
    async_trait,
};

use crate::{command::CommandData, error::RegistrationError};

#[async_trait]
pub trait MessageContext: Send + Sync {
    fn author_id(&self) -> UserId;
    fn author_tag(&self) -> String;
    /// Messages from bots and webhooks never trigger commands.
    fn author_is_bot(&self) -> bool;
    fn content(&self) -> &str;
    /// Whether the message references another message.
    fn is_reply(&self) -> bool;
    /// Human readable description of where the message was sent, for logs.
    fn location(&self) -> String;

    async fn reply(&self, content: &str) -> anyhow::Result<()>;
}

/// Command interactions the dispatcher knows how to route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionKind {
    ChatInput,
    ContextMenu,
}

#[async_trait]
pub trait InteractionContext: Send + Sync {
    fn command_name(&self) -> &str;
    fn command_type(&self) -> CommandType;
    fn user_id(&self) -> UserId;
    fn user_tag(&self) -> String;

    async fn reply(&self, content: &str, ephemeral: bool) -> anyhow::Result<()>;

    fn kind(&self) -> Option<InteractionKind> {
        match self.command_type() {
            CommandType::ChatInput => Some(InteractionKind::ChatInput),
            CommandType::User | CommandType::Message => Some(InteractionKind::ContextMenu),
            _ => None,
        }
    }
}

/// Where an application command is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(GuildId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild(guild_id) => write!(f, "guild {guild_id}"),
        }
    }
}

/// An application command as the platform currently knows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteCommand {
    pub id: CommandId,
    pub name: String,
    pub kind: CommandType,
}

/// The application command management surface of the platform.
#[async_trait]
pub trait CommandApi: Send + Sync {
    /// Fails if the client cannot issue registration calls yet.
    fn ensure_ready(&self) -> Result<(), RegistrationError> {
        Ok(())
    }

    async fn fetch_commands(&self, scope: Scope) -> anyhow::Result<Vec<RemoteCommand>>;
    async fn create_command(&self, scope: Scope, data: &CommandData) -> anyhow::Result<()>;
    async fn update_command(
        &self,
        scope: Scope,
        id: CommandId,
        data: &CommandData,
    ) -> anyhow::Result<()>;
}
