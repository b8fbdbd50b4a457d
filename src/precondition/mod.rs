//! Checks that gate command execution.
//!
//! A failing precondition does not abort the pipeline: every applicable check
//! runs and the user is told about all of the failures at once.

use std::{any, fmt::Write, sync::Arc};

use serenity::{all::UserId, async_trait};

use crate::{
    constant,
    context::Context,
    platform::{InteractionContext, InteractionKind, MessageContext},
    record::Component,
    util,
};

mod builtin;

pub use builtin::{MustBeReplyPrecondition, OwnerOnlyPrecondition};

/// The ways a command can be invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    ChatInput,
    ContextMenu,
    Message,
}

impl From<InteractionKind> for InvocationKind {
    fn from(kind: InteractionKind) -> Self {
        match kind {
            InteractionKind::ChatInput => Self::ChatInput,
            InteractionKind::ContextMenu => Self::ContextMenu,
        }
    }
}

/// The invocation a precondition is checked against.
#[derive(Clone, Copy)]
pub enum Invocation<'a> {
    Message(&'a dyn MessageContext),
    ChatInput(&'a dyn InteractionContext),
    ContextMenu(&'a dyn InteractionContext),
}

impl<'a> Invocation<'a> {
    pub fn interaction(kind: InteractionKind, interaction: &'a dyn InteractionContext) -> Self {
        match kind {
            InteractionKind::ChatInput => Self::ChatInput(interaction),
            InteractionKind::ContextMenu => Self::ContextMenu(interaction),
        }
    }

    pub fn kind(&self) -> InvocationKind {
        match self {
            Self::Message(_) => InvocationKind::Message,
            Self::ChatInput(_) => InvocationKind::ChatInput,
            Self::ContextMenu(_) => InvocationKind::ContextMenu,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Message(message) => message.author_id(),
            Self::ChatInput(interaction) | Self::ContextMenu(interaction) => interaction.user_id(),
        }
    }
}

/// A value per invocation kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextMapping<T> {
    pub chat_input: Option<T>,
    pub context_menu: Option<T>,
    pub message: Option<T>,
}

impl<T: Clone> ContextMapping<T> {
    /// The same value for every kind.
    pub fn all(value: T) -> Self {
        Self {
            chat_input: Some(value.clone()),
            context_menu: Some(value.clone()),
            message: Some(value),
        }
    }

    pub fn get(&self, kind: InvocationKind) -> Option<&T> {
        match kind {
            InvocationKind::ChatInput => self.chat_input.as_ref(),
            InvocationKind::ContextMenu => self.context_menu.as_ref(),
            InvocationKind::Message => self.message.as_ref(),
        }
    }

    /// Values of `other` take precedence over ours.
    fn merged(&self, other: Self) -> Self {
        Self {
            chat_input: other.chat_input.or_else(|| self.chat_input.clone()),
            context_menu: other.context_menu.or_else(|| self.context_menu.clone()),
            message: other.message.or_else(|| self.message.clone()),
        }
    }

    fn map<U>(self, mut f: impl FnMut(T) -> U) -> ContextMapping<U> {
        ContextMapping {
            chat_input: self.chat_input.map(&mut f),
            context_menu: self.context_menu.map(&mut f),
            message: self.message.map(&mut f),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

impl Outcome {
    pub fn ok() -> Self {
        Self::Passed
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreconditionResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

#[async_trait]
pub trait Precondition: Send + Sync + 'static {
    /// Display name shown to users; derived from the type name if absent.
    fn name(&self) -> Option<&str> {
        None
    }

    fn supports(&self, kind: InvocationKind) -> bool;

    async fn check(&self, ctx: &Context, invocation: Invocation<'_>) -> anyhow::Result<Outcome>;
}

pub struct PreconditionDescriptor {
    pub key: String,
    pub name: String,
}

impl<'a> Component for dyn Precondition + 'a {
    const DISCRIMINATOR: &'static str = constant::discriminator::PRECONDITION;
    type Descriptor = PreconditionDescriptor;

    fn describe(&self, symbol: &str) -> PreconditionDescriptor {
        let stem = util::strip_discriminator(symbol, Self::DISCRIMINATOR);

        PreconditionDescriptor {
            key: util::kebab_case(stem),
            name: self
                .name()
                .map_or_else(|| util::display_name(stem), str::to_owned),
        }
    }

    fn key(descriptor: &PreconditionDescriptor) -> &str {
        &descriptor.key
    }
}

#[derive(Clone)]
enum Source {
    Instance {
        precondition: Arc<dyn Precondition>,
        name: String,
    },
    /// Resolved through the precondition record when run.
    Named(String),
}

/// A precondition as declared by a command, with its message adjustments.
#[derive(Clone)]
pub struct PreconditionRef {
    source: Source,
    overrides: ContextMapping<String>,
    additions: ContextMapping<String>,
}

impl PreconditionRef {
    pub fn new<P: Precondition>(precondition: P) -> Self {
        let name = precondition.name().map_or_else(
            || {
                let symbol = any::type_name::<P>().rsplit("::").next().unwrap_or_default();
                util::display_name(util::strip_discriminator(
                    symbol,
                    constant::discriminator::PRECONDITION,
                ))
            },
            str::to_owned,
        );

        Self::from_source(Source::Instance {
            precondition: Arc::new(precondition),
            name,
        })
    }

    /// Refers to the precondition registered under `key`, e.g. `owner-only`.
    pub fn named(key: impl Into<String>) -> Self {
        Self::from_source(Source::Named(key.into()))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source,
            overrides: ContextMapping::default(),
            additions: ContextMapping::default(),
        }
    }

    /// Replaces the failure message for every kind.
    pub fn override_message(&self, message: impl Into<String>) -> Self {
        Self {
            overrides: ContextMapping::all(message.into()),
            ..self.clone()
        }
    }

    pub fn override_message_for(&self, messages: ContextMapping<String>) -> Self {
        Self {
            overrides: self.overrides.merged(messages),
            ..self.clone()
        }
    }

    /// Appends `addition` to the failure message for every kind.
    pub fn add_to_message(&self, addition: impl Into<String>) -> Self {
        Self {
            additions: ContextMapping::all(adjust_addition(addition.into())),
            ..self.clone()
        }
    }

    pub fn add_to_message_for(&self, additions: ContextMapping<String>) -> Self {
        Self {
            additions: self.additions.merged(additions.map(adjust_addition)),
            ..self.clone()
        }
    }

    /// The message shown for a failure of kind `kind`.
    pub fn compose(&self, kind: InvocationKind, message: &str) -> String {
        let mut composed = self
            .overrides
            .get(kind)
            .map_or_else(|| message.to_owned(), Clone::clone);

        if let Some(addition) = self.additions.get(kind) {
            composed.push_str(addition);
        }

        composed
    }

    fn resolve(&self, ctx: &Context) -> anyhow::Result<(Arc<dyn Precondition>, String)> {
        match &self.source {
            Source::Instance { precondition, name } => Ok((Arc::clone(precondition), name.clone())),
            Source::Named(key) => {
                let entry = ctx
                    .preconditions
                    .get(key)
                    .ok_or_else(|| anyhow::anyhow!("unknown precondition `{key}`"))?;

                Ok((Arc::clone(&entry.component), entry.descriptor.name.clone()))
            }
        }
    }

    /// Checks the precondition, or `None` if it does not apply to this invocation.
    pub async fn run(
        &self,
        ctx: &Context,
        invocation: Invocation<'_>,
    ) -> anyhow::Result<Option<PreconditionResult>> {
        let (precondition, name) = self.resolve(ctx)?;
        let kind = invocation.kind();

        if !precondition.supports(kind) {
            return Ok(None);
        }

        let result = match precondition.check(ctx, invocation).await? {
            Outcome::Passed => PreconditionResult {
                name,
                passed: true,
                message: String::new(),
            },
            Outcome::Failed(message) => PreconditionResult {
                name,
                passed: false,
                message: self.compose(kind, &message),
            },
        };

        Ok(Some(result))
    }
}

fn adjust_addition(addition: String) -> String {
    if addition.starts_with('\n') {
        addition
    } else {
        format!(" {addition}")
    }
}

/// Runs every precondition in order, without stopping at the first failure.
pub async fn run_all(
    ctx: &Context,
    preconditions: &[PreconditionRef],
    invocation: Invocation<'_>,
) -> anyhow::Result<Vec<PreconditionResult>> {
    let mut results = Vec::with_capacity(preconditions.len());

    for precondition in preconditions {
        if let Some(result) = precondition.run(ctx, invocation).await? {
            results.push(result);
        }
    }

    Ok(results)
}

/// The reply sent to a user who failed `failures` while invoking `command`.
pub fn format_failures(command: &str, failures: &[PreconditionResult]) -> String {
    let mut content = if failures.len() == 1 {
        format!(
            "Sorry, but you didn't meet a precondition for this command (*{command}*). It is as follows:\n\n"
        )
    } else {
        format!(
            "Sorry, but you didn't meet some preconditions for this command (*{command}*). They are as follows:\n\n"
        )
    };

    for failure in failures {
        let _ = write!(content, "**{}**\n{}\n\n", failure.name, failure.message);
    }

    content
}
