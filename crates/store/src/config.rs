//! Tool settings.
//!
//! Reads/writes JSON at `<config dir>/steamconf/config.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manager::LoadOptions;

/// Settings for the command-line tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Install root to use instead of the detected one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// User to select instead of the detected one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub strip_on_load: bool,
    pub append_apps: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    pub cache_enabled: bool,
}

impl ToolConfig {
    /// Loads the settings file, falling back to defaults.
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads settings from `path`. A missing or unreadable file gives defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Writes the settings to `path`, creating its folder.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strip_on_load: self.strip_on_load,
            append_apps: self.append_apps,
        }
    }
}

/// Returns `<config dir>/steamconf/config.json`.
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("steamconf").join("config.json"))
}

/// Returns the platform config directory.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ToolConfig::load_from(&dir.path().join("none.json")), ToolConfig::default());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steamconf").join("config.json");
        let config = ToolConfig {
            root: Some(PathBuf::from("/home/u/.steam/steam")),
            user: Some("gabe".into()),
            strip_on_load: true,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(ToolConfig::load_from(&path), config);
        assert!(ToolConfig::load_from(&path).load_options().strip_on_load);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"append_apps": true}"#).unwrap();
        let config = ToolConfig::load_from(&path);
        assert!(config.append_apps);
        assert!(config.root.is_none());
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(ToolConfig::load_from(&path), ToolConfig::default());
    }
}
