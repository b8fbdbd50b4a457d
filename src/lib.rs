//! A command and event framework for Discord bots, built on top of serenity.
//!
//! Commands, handlers and preconditions live in their own source files and are
//! loaded from the directories configured in [`config::FrameworkConfig`].
//! Application commands are only re-registered when their source changed.

#[macro_use]
extern crate tracing;

pub mod command;
pub mod config;
pub mod constant;
pub mod context;
pub mod discord;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod hash;
pub mod logging;
pub mod platform;
pub mod precondition;
pub mod record;
pub mod reference;
pub mod register;
pub mod util;

#[cfg(test)]
mod testing;

pub use self::{
    command::{Command, CommandData, CommandOptions},
    context::Context,
    handler::{Event, Handler, HandlerOptions},
    precondition::{Invocation, InvocationKind, Outcome, Precondition, PreconditionRef},
    record::{Export, Manifest},
};
