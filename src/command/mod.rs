//! Commands and the data they register with the platform.

use serenity::{
    all::{CommandType, CreateCommand, GuildId},
    async_trait,
};

use crate::{
    constant,
    context::Context,
    platform::{InteractionContext, MessageContext},
    precondition::PreconditionRef,
    record::{Component, Entry},
    util,
};

/// One application command surface: its name, type and the builder sent to the platform.
#[derive(Clone, Debug)]
pub struct CommandData {
    name: String,
    kind: CommandType,
    builder: CreateCommand,
}
impl CommandData {
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let builder = CreateCommand::new(name.as_str())
            .kind(CommandType::ChatInput)
            .description(description);

        Self {
            name,
            kind: CommandType::ChatInput,
            builder,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::context_menu(name.into(), CommandType::User)
    }

    pub fn message(name: impl Into<String>) -> Self {
        Self::context_menu(name.into(), CommandType::Message)
    }

    fn context_menu(name: String, kind: CommandType) -> Self {
        let builder = CreateCommand::new(name.as_str()).kind(kind);
        Self {
            name,
            kind,
            builder,
        }
    }

    /// Adjusts the builder, e.g. to add options.
    pub fn map(mut self, f: impl FnOnce(CreateCommand) -> CreateCommand) -> Self {
        self.builder = f(self.builder);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CommandType {
        self.kind
    }

    pub fn builder(&self) -> &CreateCommand {
        &self.builder
    }
}

/// Where a command gets registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Targets {
    pub global: bool,
    pub guilds: Vec<GuildId>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        !self.global && self.guilds.is_empty()
    }
}

/// Everything static about a command.
///
/// The surfaces a command exposes are exactly the ones set here; the matching
/// `*_run` methods of [`Command`] are only called for those.
#[derive(Clone, Default)]
pub struct CommandOptions {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub targets: Targets,
    pub chat_input: Option<CommandData>,
    pub user_context_menu: Option<CommandData>,
    pub message_context_menu: Option<CommandData>,
    /// Whether [`Command::message_trigger`] is consulted for every message.
    pub message_trigger: bool,
    pub preconditions: Vec<PreconditionRef>,
}
impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn global(mut self) -> Self {
        self.targets.global = true;
        self
    }

    pub fn guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.targets.guilds.push(guild_id.into());
        self
    }

    pub fn guilds(mut self, guild_ids: impl IntoIterator<Item = GuildId>) -> Self {
        self.targets.guilds.extend(guild_ids);
        self
    }

    pub fn chat_input(mut self, data: CommandData) -> Self {
        self.chat_input = Some(data);
        self
    }

    pub fn user_context_menu(mut self, data: CommandData) -> Self {
        self.user_context_menu = Some(data);
        self
    }

    pub fn message_context_menu(mut self, data: CommandData) -> Self {
        self.message_context_menu = Some(data);
        self
    }

    pub fn message_trigger(mut self) -> Self {
        self.message_trigger = true;
        self
    }

    pub fn precondition(mut self, precondition: PreconditionRef) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Every surface that is registered with the platform.
    pub fn application_commands(&self) -> impl Iterator<Item = &CommandData> {
        [
            self.chat_input.as_ref(),
            self.user_context_menu.as_ref(),
            self.message_context_menu.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_registrable(&self) -> bool {
        self.application_commands().next().is_some()
    }
}

#[async_trait]
pub trait Command: Send + Sync + 'static {
    fn options(&self) -> CommandOptions;

    /// Whether `message` should run this command.
    async fn message_trigger(
        &self,
        _ctx: &Context,
        _message: &dyn MessageContext,
    ) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn message_run(
        &self,
        _ctx: &Context,
        _message: &dyn MessageContext,
    ) -> anyhow::Result<()> {
        anyhow::bail!("this command cannot be run from a message")
    }

    async fn chat_input_run(
        &self,
        _ctx: &Context,
        _interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        anyhow::bail!("this command cannot be run as a chat input command")
    }

    async fn context_menu_run(
        &self,
        _ctx: &Context,
        _interaction: &dyn InteractionContext,
    ) -> anyhow::Result<()> {
        anyhow::bail!("this command cannot be run from a context menu")
    }
}

pub struct CommandDescriptor {
    pub name: String,
    pub options: CommandOptions,
}

impl<'a> Component for dyn Command + 'a {
    const DISCRIMINATOR: &'static str = constant::discriminator::COMMAND;
    type Descriptor = CommandDescriptor;

    fn describe(&self, symbol: &str) -> CommandDescriptor {
        let options = self.options();
        let name = options.name.clone().unwrap_or_else(|| {
            util::kebab_case(util::strip_discriminator(symbol, Self::DISCRIMINATOR))
        });

        CommandDescriptor { name, options }
    }

    fn key(descriptor: &CommandDescriptor) -> &str {
        &descriptor.name
    }

    fn category(descriptor: &CommandDescriptor) -> Option<&str> {
        descriptor.options.category.as_deref()
    }
}

impl Entry<dyn Command> {
    pub fn options(&self) -> &CommandOptions {
        &self.descriptor.options
    }

    /// Whether an interaction for `name` of type `kind` belongs to this command.
    pub fn handles_interaction(&self, name: &str, kind: CommandType) -> bool {
        let options = self.options();
        let data = match kind {
            CommandType::ChatInput => options.chat_input.as_ref(),
            CommandType::User => options.user_context_menu.as_ref(),
            CommandType::Message => options.message_context_menu.as_ref(),
            _ => return false,
        };

        data.is_some_and(|data| data.name() == name) || self.name == name
    }
}
