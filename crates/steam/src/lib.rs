//! Steam client configuration primitives.
//!
//! Codecs for the text and binary VDF formats, the tree they both decode
//! into, and the helpers needed to find the files on disk (or in the
//! Windows registry) for a given install root and user.

pub mod allowlist;
pub mod dotpath;
pub mod kind;
pub mod node;
pub mod paths;
#[cfg(target_os = "linux")]
mod paths_linux;
#[cfg(target_os = "macos")]
mod paths_macos;
#[cfg(target_os = "windows")]
mod paths_windows;
pub mod registry;
#[cfg(target_os = "windows")]
mod registry_windows;
pub mod text_vdf;
pub mod users;
pub mod vdf;

// Re-export primary types.
pub use allowlist::{WILDCARD, strip_to_allowlist};
pub use dotpath::{dot_get, dot_set};
pub use kind::{Codec, FileKind, Scope};
pub use node::{Node, Table};
pub use paths::{Location, Paths, Platform, detect_root, validate_root};
pub use registry::{MemoryRegistry, RegistryStore, system_registry};
pub use text_vdf::ParseError;
pub use users::{derive_short_id, list_userdata_ids};
pub use vdf::{AppInfoRecord, DecodeError};

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "unknown entry kind '{kind}'{}",
        .path.as_ref().map(|p| format!(" from {}", p.display())).unwrap_or_default()
    )]
    UnknownKind {
        kind: String,
        path: Option<std::path::PathBuf>,
    },

    #[error("{0} requires a user")]
    UserRequired(FileKind),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(String),
}
