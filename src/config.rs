use anyhow::Context;
use serde::{Deserialize, Serialize};
use serenity::all::UserId;
use std::path::PathBuf;

use crate::constant;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Configuration {
    pub authentication: Authentication,
    pub framework: FrameworkConfig,
    pub logging: Logging,
}
impl Configuration {
    const FILENAME: &str = "config.toml";

    pub fn load() -> anyhow::Result<Self> {
        let config = if let Ok(file) = std::fs::read_to_string(Self::FILENAME) {
            toml::from_str(&file).context("failed to load config")?
        } else {
            Self::default()
        };
        config.save()?;

        Ok(config)
    }

    fn save(&self) -> anyhow::Result<()> {
        Ok(std::fs::write(
            Self::FILENAME,
            toml::to_string_pretty(self)?,
        )?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Authentication {
    pub discord_token: Option<String>,
}

/// Options consumed by the framework itself.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Directory every other relative path is resolved against.
    pub base_directory: PathBuf,
    pub commands_directory: PathBuf,
    pub handlers_directory: Option<PathBuf>,
    pub preconditions_directory: Option<PathBuf>,
    /// Where the digests of registered commands are kept between runs.
    pub reference_directory: PathBuf,
    pub owner_ids: Vec<UserId>,
    /// Category of components placed directly under a root directory.
    pub default_category_name: String,
    /// If false, commands are not registered when the client becomes ready.
    pub register_commands: bool,
    pub default_handlers: DefaultHandlers,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("."),
            commands_directory: PathBuf::from("src/commands"),
            handlers_directory: Some(PathBuf::from("src/handlers")),
            preconditions_directory: None,
            reference_directory: PathBuf::from(constant::fs::REFERENCE_DIRECTORY),
            owner_ids: vec![],
            default_category_name: "general".into(),
            register_commands: true,
            default_handlers: DefaultHandlers::default(),
        }
    }
}

/// Toggles for the handlers the framework installs on its own.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct DefaultHandlers {
    pub ready: bool,
    pub message_create: bool,
    pub message_command_run: bool,
    pub interaction_create: bool,
}

impl Default for DefaultHandlers {
    fn default() -> Self {
        Self {
            ready: true,
            message_create: true,
            message_command_run: true,
            interaction_create: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Logging {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set
    pub filter: String,
    /// If set, logs are additionally written to daily rotated files in here
    pub directory: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: "cordwork=debug,serenity=warn,info".into(),
            directory: None,
        }
    }
}
