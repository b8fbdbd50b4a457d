/// discriminator words that loadable symbols must end with
pub mod discriminator {
    pub const COMMAND: &str = "command";
    pub const HANDLER: &str = "handler";
    pub const PRECONDITION: &str = "precondition";
}

/// names of events passed through the emitter
pub mod event {
    pub const READY: &str = "ready";
    pub const MESSAGE_CREATE: &str = "messageCreate";
    pub const INTERACTION_CREATE: &str = "interactionCreate";
    pub const MESSAGE_COMMAND_RUN: &str = "messageCommandRun";

    pub const ALL: [&str; 4] = [READY, MESSAGE_CREATE, INTERACTION_CREATE, MESSAGE_COMMAND_RUN];
}

/// filesystem conventions
pub mod fs {
    /// Extension of files the records will try to load.
    pub const SOURCE_EXTENSION: &str = "rs";
    /// Module roots never declare components.
    pub const MODULE_FILE: &str = "mod.rs";
    pub const REFERENCE_DIRECTORY: &str = ".cordwork/commands";
}

/// user-facing replies
pub mod message {
    pub const EXECUTION_ERROR: &str = "There was an error while executing this command.";
    pub const NOT_OWNER: &str = "You need owner permission to run this.";
    pub const NOT_A_REPLY: &str = "Your message must be a reply to another message.";
}

/// prefix used by [`crate::util::variants_message_trigger`]
pub const MESSAGE_PREFIX: char = '.';
