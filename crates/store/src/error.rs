//! Error types for store operations.

use std::path::PathBuf;

use steamconf_steam::{DecodeError, FileKind, ParseError, SteamError};

/// Errors produced while loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Steam(#[from] SteamError),

    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("{0} is read-only")]
    Unsupported(FileKind),

    #[error("no user selected and none could be detected")]
    NoUserSelected,

    #[error("user '{0}' not found in loginusers")]
    UserNotFound(String),

    #[error("{0} has not been loaded")]
    NotLoaded(FileKind),

    #[error("no registry is available on this host")]
    RegistryUnavailable,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    /// Maps an I/O error on `path`, turning a missing file into [`StoreError::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound { path }
        } else {
            StoreError::Io { path, source }
        }
    }
}
