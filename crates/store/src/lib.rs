//! Steam configuration store.
//!
//! Holds the parsed trees for one Steam install and moves them between
//! disk (or the Windows registry) and memory.
//!
//! # Operations
//!
//! - **Load**: parse the requested kinds, prerequisites first, and attach
//!   per-user files to their login-user records
//! - **Save**: re-read each file, overlay the in-memory tree per top-level
//!   key and write the result back
//! - **Apps**: read, merge and save application manifests per library
//! - **Settings**: validated edits of known client settings

pub mod apps;
pub mod clean;
pub mod config;
pub mod error;
pub mod manager;
pub mod settings;
pub mod store;

// Re-export primary types for convenience.
pub use config::ToolConfig;
pub use error::StoreError;
pub use manager::{ConfigManager, LoadOptions, merge_shallow, read_kind_file};
pub use settings::{SETTINGS, Setting, SettingType, apply_setting, find_setting};
pub use store::{AppManifest, ConfigStore, LoginUser};
