//! Routing of messages and interactions to commands.

use std::sync::Arc;

use serenity::futures::future::join_all;

use crate::{
    command::Command,
    context::Context,
    platform::{InteractionContext, InteractionKind, MessageContext},
    precondition::{self, Invocation, PreconditionResult},
    record::Entry,
    util,
};

type CommandEntry = Arc<Entry<dyn Command>>;

/// Commands whose message trigger accepts `message`, in registry order.
pub async fn commands_triggered_by_message(
    ctx: &Context,
    message: &dyn MessageContext,
) -> Vec<CommandEntry> {
    if message.author_is_bot() {
        return vec![];
    }

    let candidates: Vec<_> = ctx
        .commands
        .entries()
        .into_iter()
        .filter(|command| command.options().message_trigger)
        .collect();

    let triggered = join_all(candidates.iter().map(|command| async move {
        match command.component.message_trigger(ctx, message).await {
            Ok(triggered) => triggered,
            Err(err) => {
                warn!(command = %command.name, "Message trigger failed: {err:?}");
                false
            }
        }
    }))
    .await;

    candidates
        .into_iter()
        .zip(triggered)
        .filter_map(|(command, triggered)| triggered.then_some(command))
        .collect()
}

/// Runs `commands` for `message`.
///
/// Each command is handled on its own: one whose preconditions fail is
/// answered with the failures and skipped, the others run concurrently.
/// Every error is logged and the first is returned once every run has
/// finished.
pub async fn run_message_commands(
    ctx: &Context,
    message: &dyn MessageContext,
    commands: &[CommandEntry],
) -> anyhow::Result<()> {
    let mut errors = vec![];
    let mut queued = vec![];

    for command in commands {
        info!(
            "{} ran message command {} {}",
            message.author_tag(),
            command.name,
            message.location()
        );

        match failed_preconditions(ctx, command, Invocation::Message(message)).await {
            Ok(failures) if failures.is_empty() => queued.push(async move {
                (command, command.component.message_run(ctx, message).await)
            }),
            Ok(failures) => {
                let content = precondition::format_failures(&command.name, &failures);
                if let Err(err) = message.reply(&content).await {
                    errors.push((command, err));
                }
            }
            Err(err) => errors.push((command, err)),
        }
    }

    let ran = join_all(queued).await;
    errors.extend(
        ran.into_iter()
            .filter_map(|(command, result)| result.err().map(|err| (command, err))),
    );

    let mut first = None;
    for (command, err) in errors {
        error!(command = %command.name, "Error while running message command: {err:?}");
        first.get_or_insert(err);
    }

    first.map_or(Ok(()), Err)
}

/// The command an interaction was issued for, if it is loaded.
pub fn find_interaction_command(
    ctx: &Context,
    interaction: &dyn InteractionContext,
) -> Option<CommandEntry> {
    let name = interaction.command_name();
    let kind = interaction.command_type();

    ctx.commands
        .entries()
        .into_iter()
        .find(|command| command.handles_interaction(name, kind))
}

/// Runs the command `interaction` was issued for.
///
/// Errors, including failures to check preconditions, are logged and
/// answered with a generic ephemeral reply.
pub async fn run_interaction(
    ctx: &Context,
    interaction: &dyn InteractionContext,
) -> anyhow::Result<()> {
    let Some(kind) = interaction.kind() else {
        return Ok(());
    };

    let Some(command) = find_interaction_command(ctx, interaction) else {
        debug!(name = interaction.command_name(), "No command for interaction");
        return Ok(());
    };

    info!(
        "{} ran {kind:?} command {}",
        interaction.user_tag(),
        command.name
    );

    let component = &command.component;
    let run = async {
        let invocation = Invocation::interaction(kind, interaction);
        let failures = failed_preconditions(ctx, &command, invocation).await?;
        if !failures.is_empty() {
            let content = precondition::format_failures(&command.name, &failures);
            return interaction.reply(&content, false).await;
        }

        match kind {
            InteractionKind::ChatInput => component.chat_input_run(ctx, interaction).await,
            InteractionKind::ContextMenu => component.context_menu_run(ctx, interaction).await,
        }
    };
    util::run_and_report_error(interaction, &command.name, run).await;

    Ok(())
}

async fn failed_preconditions(
    ctx: &Context,
    command: &CommandEntry,
    invocation: Invocation<'_>,
) -> anyhow::Result<Vec<PreconditionResult>> {
    let results = precondition::run_all(ctx, &command.options().preconditions, invocation).await?;

    Ok(results.into_iter().filter(|result| !result.passed).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serenity::{all::CommandType, async_trait};

    use super::*;
    use crate::{
        command::{CommandData, CommandOptions},
        constant,
        precondition::{InvocationKind, Outcome, Precondition, PreconditionRef},
        testing::{self, FakeInteraction, FakeMessage},
    };

    /// Triggers on `.{word}` and counts its runs.
    struct WordCommand {
        word: &'static str,
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Command for WordCommand {
        fn options(&self) -> CommandOptions {
            CommandOptions::new()
                .message_trigger()
                .chat_input(CommandData::chat_input(self.word, "Counts"))
                .message_context_menu(CommandData::message(format!("Count {}", self.word)))
                .global()
        }

        async fn message_trigger(
            &self,
            _: &Context,
            message: &dyn MessageContext,
        ) -> anyhow::Result<bool> {
            Ok(util::variants_message_trigger(message.content(), &[self.word]))
        }

        async fn message_run(&self, _: &Context, _: &dyn MessageContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("run failed");
            }
            Ok(())
        }

        async fn chat_input_run(
            &self,
            _: &Context,
            _: &dyn InteractionContext,
        ) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("run failed");
            }
            Ok(())
        }

        async fn context_menu_run(
            &self,
            _: &Context,
            _: &dyn InteractionContext,
        ) -> anyhow::Result<()> {
            self.runs.fetch_add(10, Ordering::SeqCst);
            Ok(())
        }
    }

    struct GatedCommand {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Command for GatedCommand {
        fn options(&self) -> CommandOptions {
            CommandOptions::new()
                .message_trigger()
                .chat_input(CommandData::chat_input("gated", "Never runs"))
                .precondition(PreconditionRef::new(DenyPrecondition))
                .global()
        }

        async fn message_trigger(
            &self,
            _: &Context,
            message: &dyn MessageContext,
        ) -> anyhow::Result<bool> {
            Ok(message.content() == ".gated")
        }

        async fn message_run(&self, _: &Context, _: &dyn MessageContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn chat_input_run(
            &self,
            _: &Context,
            _: &dyn InteractionContext,
        ) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Requires a precondition that is never loaded.
    struct MisconfiguredCommand {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Command for MisconfiguredCommand {
        fn options(&self) -> CommandOptions {
            CommandOptions::new()
                .message_trigger()
                .chat_input(CommandData::chat_input("misconfigured", "Never runs"))
                .precondition(PreconditionRef::named("missing"))
                .global()
        }

        async fn message_trigger(
            &self,
            _: &Context,
            message: &dyn MessageContext,
        ) -> anyhow::Result<bool> {
            Ok(util::variants_message_trigger(message.content(), &["ping"]))
        }

        async fn message_run(&self, _: &Context, _: &dyn MessageContext) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn chat_input_run(
            &self,
            _: &Context,
            _: &dyn InteractionContext,
        ) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn load_misconfigured(ctx: &Context) -> Arc<AtomicUsize> {
        let runs = Arc::new(AtomicUsize::new(0));
        ctx.commands
            .load(
                "MisconfiguredCommand",
                Arc::new(MisconfiguredCommand {
                    runs: Arc::clone(&runs),
                }),
                None,
            )
            .await
            .unwrap();

        runs
    }

    struct DenyPrecondition;

    #[async_trait]
    impl Precondition for DenyPrecondition {
        fn supports(&self, _: InvocationKind) -> bool {
            true
        }

        async fn check(&self, _: &Context, _: Invocation<'_>) -> anyhow::Result<Outcome> {
            Ok(Outcome::error("no"))
        }
    }

    async fn load_word(
        ctx: &Context,
        symbol: &str,
        word: &'static str,
        fail: bool,
    ) -> Arc<AtomicUsize> {
        let runs = Arc::new(AtomicUsize::new(0));
        ctx.commands
            .load(
                symbol,
                Arc::new(WordCommand {
                    word,
                    runs: Arc::clone(&runs),
                    fail,
                }),
                None,
            )
            .await
            .unwrap();

        runs
    }

    #[tokio::test]
    async fn triggered_commands_keep_registry_order() {
        let (ctx, _dir) = testing::context().await;
        let first = load_word(&ctx, "FirstCommand", "ping", false).await;
        load_word(&ctx, "SecondCommand", "pong", false).await;
        let third = load_word(&ctx, "ThirdCommand", "pin", false).await;

        let message = FakeMessage::new(7, ".ping");
        let triggered = commands_triggered_by_message(&ctx, &message).await;
        let names: Vec<_> = triggered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["first", "third"]);

        run_message_commands(&ctx, &message, &triggered).await.unwrap();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 1);
        assert!(message.replies().is_empty());
    }

    #[tokio::test]
    async fn bots_never_trigger_commands() {
        let (ctx, _dir) = testing::context().await;
        load_word(&ctx, "PingCommand", "ping", false).await;

        let message = FakeMessage::new(7, ".ping").from_bot();
        assert!(commands_triggered_by_message(&ctx, &message).await.is_empty());
    }

    #[tokio::test]
    async fn failed_preconditions_reply_and_skip() {
        let (ctx, _dir) = testing::context().await;
        let runs = Arc::new(AtomicUsize::new(0));
        ctx.commands
            .load(
                "GatedCommand",
                Arc::new(GatedCommand {
                    runs: Arc::clone(&runs),
                }),
                None,
            )
            .await
            .unwrap();
        let ping = load_word(&ctx, "PingCommand", "gated", false).await;

        let message = FakeMessage::new(7, ".gated");
        let triggered = commands_triggered_by_message(&ctx, &message).await;
        assert_eq!(triggered.len(), 2);

        run_message_commands(&ctx, &message, &triggered).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(ping.load(Ordering::SeqCst), 1);
        let replies = message.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("(*gated*)"));
        assert!(replies[0].contains("**Deny**\nno"));
    }

    #[tokio::test]
    async fn first_run_error_is_returned_after_all_runs() {
        let (ctx, _dir) = testing::context().await;
        let failing = load_word(&ctx, "FailingCommand", "ping", true).await;
        let working = load_word(&ctx, "WorkingCommand", "ping", false).await;

        let message = FakeMessage::new(7, ".ping");
        let triggered = commands_triggered_by_message(&ctx, &message).await;

        assert!(run_message_commands(&ctx, &message, &triggered).await.is_err());
        assert_eq!(failing.load(Ordering::SeqCst), 1);
        assert_eq!(working.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn precondition_errors_do_not_stop_other_commands() {
        let (ctx, _dir) = testing::context().await;
        let working = load_word(&ctx, "WorkingCommand", "ping", false).await;
        let misconfigured = load_misconfigured(&ctx).await;

        let message = FakeMessage::new(7, ".ping");
        let triggered = commands_triggered_by_message(&ctx, &message).await;
        assert_eq!(triggered.len(), 2);

        let err = run_message_commands(&ctx, &message, &triggered).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert_eq!(working.load(Ordering::SeqCst), 1);
        assert_eq!(misconfigured.load(Ordering::SeqCst), 0);
        assert!(message.replies().is_empty());
    }

    #[tokio::test]
    async fn interactions_route_by_name_and_type() {
        let (ctx, _dir) = testing::context().await;
        let runs = load_word(&ctx, "PingCommand", "ping", false).await;

        let chat_input = FakeInteraction::chat_input(7, "ping");
        run_interaction(&ctx, &chat_input).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let menu = FakeInteraction::context_menu(7, "Count ping", CommandType::Message);
        run_interaction(&ctx, &menu).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 11);

        let wrong_type = FakeInteraction::context_menu(7, "Count ping", CommandType::User);
        assert!(find_interaction_command(&ctx, &wrong_type).is_none());

        let unknown = FakeInteraction::chat_input(7, "unknown");
        run_interaction(&ctx, &unknown).await.unwrap();
        assert!(unknown.replies().is_empty());
    }

    #[tokio::test]
    async fn interaction_errors_are_reported_ephemerally() {
        let (ctx, _dir) = testing::context().await;
        load_word(&ctx, "PingCommand", "ping", true).await;

        let interaction = FakeInteraction::chat_input(7, "ping");
        run_interaction(&ctx, &interaction).await.unwrap();

        assert_eq!(
            interaction.replies(),
            vec![(constant::message::EXECUTION_ERROR.to_owned(), true)]
        );
    }

    #[tokio::test]
    async fn interaction_precondition_failures_are_public() {
        let (ctx, _dir) = testing::context().await;
        let runs = Arc::new(AtomicUsize::new(0));
        ctx.commands
            .load(
                "GatedCommand",
                Arc::new(GatedCommand {
                    runs: Arc::clone(&runs),
                }),
                None,
            )
            .await
            .unwrap();

        let interaction = FakeInteraction::chat_input(7, "gated");
        run_interaction(&ctx, &interaction).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        let replies = interaction.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].0.contains("no"));
        assert!(!replies[0].1);
    }

    #[tokio::test]
    async fn interaction_precondition_errors_get_the_generic_reply() {
        let (ctx, _dir) = testing::context().await;
        let runs = load_misconfigured(&ctx).await;

        let interaction = FakeInteraction::chat_input(7, "misconfigured");
        run_interaction(&ctx, &interaction).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            interaction.replies(),
            vec![(constant::message::EXECUTION_ERROR.to_owned(), true)]
        );
    }
}
