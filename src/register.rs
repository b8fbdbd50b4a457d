//! Differential registration of application commands.
//!
//! Only commands whose source changed since the last run are selected, then
//! each selected surface is created or updated in every scope it targets.

use std::sync::Arc;

use anyhow::Context as _;
use serenity::{all::CommandType, async_trait, futures::future::join_all};

use crate::{
    command::{Command, CommandData},
    context::Context,
    error::RegistrationError,
    hash,
    platform::{CommandApi, Scope},
    record::{Entry, Record},
    reference::ReferenceStore,
};

type CommandEntry = Arc<Entry<dyn Command>>;

/// Chooses which loaded commands get registered.
#[async_trait]
pub trait Selector: Send + Sync {
    async fn select(&self, ctx: &Context) -> anyhow::Result<Vec<CommandEntry>>;
}

/// Selects the commands whose source digest changed.
#[derive(Default)]
pub struct DigestSelector;

#[async_trait]
impl Selector for DigestSelector {
    async fn select(&self, ctx: &Context) -> anyhow::Result<Vec<CommandEntry>> {
        select_commands_to_register(&ctx.commands, &ctx.references).await
    }
}

/// Commands that are new or changed since their reference was written.
///
/// References are updated as a side effect, and references to deleted
/// sources are pruned. Commands without a source file are always selected.
pub async fn select_commands_to_register(
    commands: &Record<dyn Command>,
    references: &ReferenceStore,
) -> anyhow::Result<Vec<CommandEntry>> {
    references.ensure_directory().await?;

    let mut selected = vec![];
    for command in commands.entries() {
        let Some(path) = command.path.as_deref() else {
            selected.push(command);
            continue;
        };

        let hash = hash::digest_file(path)
            .await
            .with_context(|| format!("failed to hash `{}`", path.display()))?;
        let previous = references.lookup(&hash).await?;
        let current = references.upsert(path, &hash).await?;

        if previous.is_some_and(|previous| previous.hash == current.hash) {
            trace!(command = %command.name, "Command is unchanged");
            continue;
        }

        selected.push(command);
    }

    for reference in references.prune_stale().await? {
        debug!(path = %reference.path.display(), "Pruned stale command reference");
    }

    Ok(selected)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registered {
    pub scope: Scope,
    pub name: String,
    pub kind: CommandType,
    pub action: Action,
}

#[derive(Clone, Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<Registered>,
}

/// Creates or updates every surface of `commands` in the scopes they target.
///
/// Every call is attempted; if any failed, the first failure is returned
/// after all of them have settled.
pub async fn register(
    api: &dyn CommandApi,
    commands: &[CommandEntry],
) -> Result<RegistrationReport, RegistrationError> {
    api.ensure_ready()?;

    let commands: Vec<_> = commands
        .iter()
        .filter(|command| command.options().is_registrable())
        .collect();

    if let Some(command) = commands
        .iter()
        .find(|command| command.options().targets.is_empty())
    {
        return Err(RegistrationError::NoTarget(command.name.clone()));
    }

    let mut scopes = vec![];
    for command in &commands {
        for &guild_id in &command.options().targets.guilds {
            let scope = Scope::Guild(guild_id);
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
    }
    if commands.iter().any(|command| command.options().targets.global) {
        scopes.push(Scope::Global);
    }

    let results = join_all(scopes.into_iter().map(|scope| {
        let data: Vec<_> = commands
            .iter()
            .filter(|command| targets(command, scope))
            .flat_map(|command| command.options().application_commands())
            .collect();

        register_scope(api, scope, data)
    }))
    .await;

    let mut report = RegistrationReport::default();
    let mut failed = 0;
    let mut first = None;

    for result in results.into_iter().flatten() {
        match result {
            Ok(registered) => report.registered.push(registered),
            Err(err) => {
                error!("{err:?}");
                failed += 1;
                first.get_or_insert(err);
            }
        }
    }

    match first {
        Some(source) => Err(RegistrationError::Remote { failed, source }),
        None => Ok(report),
    }
}

fn targets(command: &Entry<dyn Command>, scope: Scope) -> bool {
    let targets = &command.options().targets;
    match scope {
        Scope::Global => targets.global,
        Scope::Guild(guild_id) => targets.guilds.contains(&guild_id),
    }
}

async fn register_scope(
    api: &dyn CommandApi,
    scope: Scope,
    data: Vec<&CommandData>,
) -> Vec<anyhow::Result<Registered>> {
    let remote = match api.fetch_commands(scope).await {
        Ok(remote) => remote,
        Err(err) => return vec![Err(err.context(format!("failed to fetch {scope} commands")))],
    };

    join_all(data.into_iter().map(|data| {
        let existing = remote
            .iter()
            .find(|remote| remote.name == data.name() && remote.kind == data.kind())
            .map(|remote| remote.id);

        async move {
            let action = match existing {
                Some(id) => {
                    api.update_command(scope, id, data)
                        .await
                        .with_context(|| format!("failed to update `{}` in {scope}", data.name()))?;
                    Action::Updated
                }
                None => {
                    api.create_command(scope, data)
                        .await
                        .with_context(|| format!("failed to create `{}` in {scope}", data.name()))?;
                    Action::Created
                }
            };

            debug!(name = data.name(), %scope, ?action, "Registered application command");

            Ok::<_, anyhow::Error>(Registered {
                scope,
                name: data.name().to_owned(),
                kind: data.kind(),
                action,
            })
        }
    }))
    .await
}
