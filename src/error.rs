use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure to turn one source file into a registry entry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{}` is not a file", path.display())]
    NotAFile { path: PathBuf },
    #[error("expected exactly one exported {discriminator} in `{}`, found {found}", path.display())]
    AmbiguousComponent {
        path: PathBuf,
        discriminator: &'static str,
        found: usize,
    },
    #[error("sync hook of `{name}` failed")]
    Hook {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Every file that failed during one sync pass.
#[derive(Debug, Error)]
#[error("failed to sync {} file(s) into the {record} record", errors.len())]
pub struct SyncError {
    pub record: &'static str,
    pub errors: Vec<LoadError>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no entry named `{name}` in the {record} record")]
    NotFound { record: &'static str, name: String },
}

/// Raised while registering application commands remotely.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("command `{0}` has neither a guild nor a global target")]
    NoTarget(String),
    #[error("the client is not logged in (missing application id)")]
    NotLoggedIn,
    #[error("{failed} command registration(s) failed")]
    Remote {
        failed: usize,
        #[source]
        source: anyhow::Error,
    },
}
