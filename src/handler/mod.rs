//! Event handlers and the emitter that fans events out to them.

use std::sync::Arc;

use parking_lot::RwLock;
use serenity::{async_trait, futures::future::join_all};

use crate::{
    command::Command,
    constant::{self, event},
    context::Context,
    platform::{InteractionContext, MessageContext},
    record::{Component, Entry, Hooks},
    util,
};

mod defaults;

pub use defaults::{
    InteractionCreateHandler, MessageCommandRunHandler, MessageCreateHandler, ReadyHandler,
};

#[derive(Clone, Debug)]
pub struct ReadyInfo {
    /// Name of the account the client logged in as.
    pub user_tag: String,
}

#[derive(Clone)]
pub enum Event {
    Ready(ReadyInfo),
    MessageCreate(Arc<dyn MessageContext>),
    InteractionCreate(Arc<dyn InteractionContext>),
    /// Emitted when a message triggered at least one command.
    MessageCommandRun {
        message: Arc<dyn MessageContext>,
        commands: Vec<Arc<Entry<dyn Command>>>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => event::READY,
            Self::MessageCreate(_) => event::MESSAGE_CREATE,
            Self::InteractionCreate(_) => event::INTERACTION_CREATE,
            Self::MessageCommandRun { .. } => event::MESSAGE_COMMAND_RUN,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HandlerOptions {
    pub name: Option<String>,
    /// Event to listen to; derived from the type name if absent.
    pub event: Option<String>,
    /// Remove the handler after its first run.
    pub once: bool,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    fn options(&self) -> HandlerOptions {
        HandlerOptions::default()
    }

    async fn run(&self, ctx: &Context, event: &Event) -> anyhow::Result<()>;
}

pub struct HandlerDescriptor {
    pub name: String,
    pub event: String,
    pub once: bool,
}

impl<'a> Component for dyn Handler + 'a {
    const DISCRIMINATOR: &'static str = constant::discriminator::HANDLER;
    type Descriptor = HandlerDescriptor;

    fn describe(&self, symbol: &str) -> HandlerDescriptor {
        let options = self.options();
        let event = options.event.unwrap_or_else(|| {
            util::camel_case(util::strip_discriminator(symbol, Self::DISCRIMINATOR))
        });

        HandlerDescriptor {
            name: options.name.unwrap_or_else(|| symbol.to_owned()),
            event,
            once: options.once,
        }
    }

    fn key(descriptor: &HandlerDescriptor) -> &str {
        &descriptor.name
    }
}

struct Listener {
    key: String,
    event: String,
    once: bool,
    handler: Arc<dyn Handler>,
}

/// Named-event fan-out to the loaded handlers.
#[derive(Clone, Default)]
pub struct Emitter {
    listeners: Arc<RwLock<Vec<Listener>>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &self,
        key: impl Into<String>,
        event: impl Into<String>,
        once: bool,
        handler: Arc<dyn Handler>,
    ) {
        self.listeners.write().push(Listener {
            key: key.into(),
            event: event.into(),
            once,
            handler,
        });
    }

    /// Removes every listener registered under `key`, returning how many there were.
    pub fn off(&self, key: &str) -> usize {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|listener| listener.key != key);

        before - listeners.len()
    }

    /// Removes the listeners under `key` that run this exact `handler`.
    pub fn off_handler(&self, key: &str, handler: &Arc<dyn Handler>) -> usize {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners
            .retain(|listener| listener.key != key || !Arc::ptr_eq(&listener.handler, handler));

        before - listeners.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|listener| listener.event == event)
            .count()
    }

    /// Runs every listener of `event` concurrently and waits for all of them.
    pub async fn emit(&self, ctx: &Context, event: &Event) {
        let name = event.name();

        let handlers: Vec<_> = {
            let mut listeners = self.listeners.write();
            let handlers: Vec<_> = listeners
                .iter()
                .filter(|listener| listener.event == name)
                .map(|listener| (listener.key.clone(), Arc::clone(&listener.handler)))
                .collect();
            listeners.retain(|listener| !(listener.once && listener.event == name));

            handlers
        };

        trace!(event = name, listeners = handlers.len(), "Emitting event");

        join_all(handlers.into_iter().map(|(key, handler)| async move {
            if let Err(err) = handler.run(ctx, event).await {
                error!(handler = %key, event = name, "Error while handling event: {err:?}");
            }
        }))
        .await;
    }
}

/// Keeps the emitter's listeners in step with the handler record.
pub struct EmitterHooks {
    emitter: Emitter,
}

impl EmitterHooks {
    pub fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }
}

#[async_trait]
impl Hooks<dyn Handler> for EmitterHooks {
    async fn synced(&self, entry: &Arc<Entry<dyn Handler>>) -> anyhow::Result<()> {
        let descriptor = &entry.descriptor;
        if !event::ALL.contains(&descriptor.event.as_str()) {
            warn!(
                handler = %entry.name,
                event = %descriptor.event,
                "Handler listens to an event that is never emitted"
            );
        }

        self.emitter.on(
            entry.name.as_str(),
            descriptor.event.as_str(),
            descriptor.once,
            Arc::clone(&entry.component),
        );

        Ok(())
    }

    async fn unsynced(&self, entry: &Arc<Entry<dyn Handler>>) -> anyhow::Result<()> {
        // a reload syncs the replacement before unsyncing this entry
        self.emitter.off_handler(&entry.name, &entry.component);

        Ok(())
    }
}
