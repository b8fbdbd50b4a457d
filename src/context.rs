use std::{path::Path, sync::Arc, time::Instant};

use anyhow::Context as _;

use crate::{
    command::Command,
    config::FrameworkConfig,
    handler::{
        EmitterHooks, Emitter, Event, Handler, InteractionCreateHandler, MessageCommandRunHandler,
        MessageCreateHandler, ReadyHandler,
    },
    platform::CommandApi,
    precondition::{MustBeReplyPrecondition, OwnerOnlyPrecondition, Precondition},
    record::{Component, Manifest, Record},
    reference::ReferenceStore,
    register::{self, DigestSelector, RegistrationReport, Selector},
    util,
};

/// Everything components need at runtime.
pub struct Context {
    pub config: FrameworkConfig,
    pub commands: Record<dyn Command>,
    pub handlers: Record<dyn Handler>,
    pub preconditions: Record<dyn Precondition>,
    pub emitter: Emitter,
    pub references: ReferenceStore,
    pub api: Arc<dyn CommandApi>,
    pub selector: Arc<dyn Selector>,
    pub instantiated_at: Instant,
}

impl Context {
    pub fn builder(config: FrameworkConfig, api: Arc<dyn CommandApi>) -> ContextBuilder {
        ContextBuilder {
            config,
            api,
            commands: Manifest::new(),
            handlers: Manifest::new(),
            preconditions: Manifest::new(),
            selector: None,
        }
    }

    /// Loads the built-in components and syncs every record from disk.
    pub async fn setup(&self) -> anyhow::Result<()> {
        self.preconditions
            .load("OwnerOnlyPrecondition", Arc::new(OwnerOnlyPrecondition), None)
            .await?;
        self.preconditions
            .load("MustBeReplyPrecondition", Arc::new(MustBeReplyPrecondition), None)
            .await?;

        let base = &self.config.base_directory;
        add_root(&self.commands, base, Some(&self.config.commands_directory)).await?;
        add_root(&self.handlers, base, self.config.handlers_directory.as_deref()).await?;
        add_root(&self.preconditions, base, self.config.preconditions_directory.as_deref()).await?;

        // commands resolve their preconditions by name when run
        self.preconditions.sync_all().await?;
        self.commands.sync_all().await?;

        let defaults = self.config.default_handlers;
        let default_handlers: [(bool, &str, Arc<dyn Handler>); 4] = [
            (defaults.ready, "ReadyHandler", Arc::new(ReadyHandler)),
            (defaults.message_create, "MessageCreateHandler", Arc::new(MessageCreateHandler)),
            (
                defaults.message_command_run,
                "MessageCommandRunHandler",
                Arc::new(MessageCommandRunHandler),
            ),
            (
                defaults.interaction_create,
                "InteractionCreateHandler",
                Arc::new(InteractionCreateHandler),
            ),
        ];
        for (enabled, symbol, handler) in default_handlers {
            if enabled {
                self.handlers.load(symbol, handler, None).await?;
            }
        }

        self.handlers.sync_all().await?;

        info!(
            commands = self.commands.len(),
            handlers = self.handlers.len(),
            preconditions = self.preconditions.len(),
            "Framework is set up"
        );

        Ok(())
    }

    pub async fn emit(&self, event: Event) {
        self.emitter.emit(self, &event).await;
    }

    /// Registers the commands picked by the selector.
    pub async fn register_commands(&self) -> anyhow::Result<RegistrationReport> {
        let commands = self.selector.select(self).await?;
        if commands.is_empty() {
            debug!("No application command changed");
        }

        Ok(register::register(self.api.as_ref(), &commands).await?)
    }
}

async fn add_root<T: Component + ?Sized>(
    record: &Record<T>,
    base: &Path,
    directory: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(directory) = directory else {
        return Ok(());
    };

    let path = base.join(directory);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        warn!(record = record.name(), path = %path.display(), "Directory does not exist, skipping");
        return Ok(());
    }

    record
        .add_path(&path)
        .with_context(|| format!("failed to add `{}`", path.display()))
}

pub struct ContextBuilder {
    config: FrameworkConfig,
    api: Arc<dyn CommandApi>,
    commands: Manifest<dyn Command>,
    handlers: Manifest<dyn Handler>,
    preconditions: Manifest<dyn Precondition>,
    selector: Option<Arc<dyn Selector>>,
}

impl ContextBuilder {
    pub fn commands(mut self, manifest: Manifest<dyn Command>) -> Self {
        self.commands = manifest;
        self
    }

    pub fn handlers(mut self, manifest: Manifest<dyn Handler>) -> Self {
        self.handlers = manifest;
        self
    }

    pub fn preconditions(mut self, manifest: Manifest<dyn Precondition>) -> Self {
        self.preconditions = manifest;
        self
    }

    pub fn selector(mut self, selector: Arc<dyn Selector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn build(self) -> anyhow::Result<Arc<Context>> {
        let mut config = self.config;
        config.base_directory = util::normalize(&config.base_directory)
            .context("failed to resolve the base directory")?;

        let base = config.base_directory.as_path();
        let category = config.default_category_name.as_str();
        let emitter = Emitter::new();

        let commands = Record::new("commands", base, category, self.commands)?;
        let handlers = Record::new("handlers", base, category, self.handlers)?
            .with_hooks(Arc::new(EmitterHooks::new(emitter.clone())));
        let preconditions = Record::new("preconditions", base, category, self.preconditions)?;
        let references = ReferenceStore::new(base.join(&config.reference_directory));

        Ok(Arc::new(Context {
            commands,
            handlers,
            preconditions,
            emitter,
            references,
            api: self.api,
            selector: self
                .selector
                .unwrap_or_else(|| Arc::new(DigestSelector)),
            instantiated_at: Instant::now(),
            config,
        }))
    }
}
