use cordwork::{Command, Manifest};

mod info;
mod owner;
mod ping;

/// Every command the bot can load from `src/commands`.
pub fn manifest() -> Manifest<dyn Command> {
    Manifest::new()
        .with(ping::export())
        .with(info::whoami::export())
        .with(owner::reload::export())
}
