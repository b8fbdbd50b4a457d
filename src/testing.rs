//! In-memory implementations of the platform traits for tests.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serenity::{
    all::{CommandId, CommandType, UserId},
    async_trait,
};
use tempfile::TempDir;

use crate::{
    command::CommandData,
    config::FrameworkConfig,
    context::Context,
    error::RegistrationError,
    platform::{CommandApi, InteractionContext, MessageContext, RemoteCommand, Scope},
};

pub const OWNER_ID: u64 = 42;

/// A set up context backed by a temporary directory with an empty
/// `src/commands` directory.
pub async fn context() -> (Arc<Context>, TempDir) {
    let (ctx, _, dir) = context_with_api().await;
    (ctx, dir)
}

pub async fn context_with_api() -> (Arc<Context>, Arc<FakeApi>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/commands")).unwrap();

    let config = FrameworkConfig {
        base_directory: dir.path().to_path_buf(),
        owner_ids: vec![UserId::new(OWNER_ID)],
        ..Default::default()
    };
    let api = Arc::new(FakeApi::new());
    let ctx = Context::builder(config, api.clone()).build().unwrap();
    ctx.setup().await.unwrap();

    (ctx, api, dir)
}

pub struct FakeMessage {
    author_id: UserId,
    bot: bool,
    reply: bool,
    content: String,
    replies: Mutex<Vec<String>>,
}

impl FakeMessage {
    pub fn new(author_id: u64, content: &str) -> Self {
        Self {
            author_id: UserId::new(author_id),
            bot: false,
            reply: false,
            content: content.to_owned(),
            replies: Mutex::new(vec![]),
        }
    }

    pub fn from_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    pub fn replying(mut self) -> Self {
        self.reply = true;
        self
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }
}

#[async_trait]
impl MessageContext for FakeMessage {
    fn author_id(&self) -> UserId {
        self.author_id
    }

    fn author_tag(&self) -> String {
        format!("user#{}", self.author_id)
    }

    fn author_is_bot(&self) -> bool {
        self.bot
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn is_reply(&self) -> bool {
        self.reply
    }

    fn location(&self) -> String {
        "through DMs".to_owned()
    }

    async fn reply(&self, content: &str) -> anyhow::Result<()> {
        self.replies.lock().push(content.to_owned());
        Ok(())
    }
}

pub struct FakeInteraction {
    user_id: UserId,
    name: String,
    kind: CommandType,
    replies: Mutex<Vec<(String, bool)>>,
}

impl FakeInteraction {
    pub fn chat_input(user_id: u64, name: &str) -> Self {
        Self::context_menu(user_id, name, CommandType::ChatInput)
    }

    pub fn context_menu(user_id: u64, name: &str, kind: CommandType) -> Self {
        Self {
            user_id: UserId::new(user_id),
            name: name.to_owned(),
            kind,
            replies: Mutex::new(vec![]),
        }
    }

    /// Content and ephemeral flag of every reply.
    pub fn replies(&self) -> Vec<(String, bool)> {
        self.replies.lock().clone()
    }
}

#[async_trait]
impl InteractionContext for FakeInteraction {
    fn command_name(&self) -> &str {
        &self.name
    }

    fn command_type(&self) -> CommandType {
        self.kind
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn user_tag(&self) -> String {
        format!("user#{}", self.user_id)
    }

    async fn reply(&self, content: &str, ephemeral: bool) -> anyhow::Result<()> {
        self.replies.lock().push((content.to_owned(), ephemeral));
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    Fetch(Scope),
    Create(Scope, String),
    Update(Scope, String),
}

#[derive(Default)]
struct ApiState {
    remote: HashMap<Scope, Vec<RemoteCommand>>,
    calls: Vec<ApiCall>,
    next_id: u64,
}

/// Application command API that keeps the remote commands in memory.
#[derive(Default)]
pub struct FakeApi {
    not_ready: bool,
    failing_on: Option<String>,
    state: Mutex<ApiState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_ready(mut self) -> Self {
        self.not_ready = true;
        self
    }

    /// Every create or update of `name` fails without being recorded.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing_on = Some(name.to_owned());
        self
    }

    pub fn with_remote(self, scope: Scope, name: &str, kind: CommandType) -> Self {
        self.state.lock().insert(scope, name, kind);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    pub fn fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::Fetch(_)))
            .count()
    }

    pub fn created(&self, scope: Scope) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Create(s, name) if s == scope => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn updated(&self, scope: Scope) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Update(s, name) if s == scope => Some(name),
                _ => None,
            })
            .collect()
    }

    fn check_failure(&self, data: &CommandData) -> anyhow::Result<()> {
        if self.failing_on.as_deref() == Some(data.name()) {
            anyhow::bail!("rejected `{}`", data.name());
        }
        Ok(())
    }
}

impl ApiState {
    fn insert(&mut self, scope: Scope, name: &str, kind: CommandType) {
        self.next_id += 1;
        self.remote.entry(scope).or_default().push(RemoteCommand {
            id: CommandId::new(self.next_id),
            name: name.to_owned(),
            kind,
        });
    }
}

#[async_trait]
impl CommandApi for FakeApi {
    fn ensure_ready(&self) -> Result<(), RegistrationError> {
        if self.not_ready {
            return Err(RegistrationError::NotLoggedIn);
        }
        Ok(())
    }

    async fn fetch_commands(&self, scope: Scope) -> anyhow::Result<Vec<RemoteCommand>> {
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Fetch(scope));

        Ok(state.remote.get(&scope).cloned().unwrap_or_default())
    }

    async fn create_command(&self, scope: Scope, data: &CommandData) -> anyhow::Result<()> {
        self.check_failure(data)?;
        let mut state = self.state.lock();
        state.calls.push(ApiCall::Create(scope, data.name().to_owned()));
        state.insert(scope, data.name(), data.kind());

        Ok(())
    }

    async fn update_command(
        &self,
        scope: Scope,
        _id: CommandId,
        data: &CommandData,
    ) -> anyhow::Result<()> {
        self.check_failure(data)?;
        self.state
            .lock()
            .calls
            .push(ApiCall::Update(scope, data.name().to_owned()));

        Ok(())
    }
}
