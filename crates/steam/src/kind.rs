use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::SteamError;

/// A configuration file (or registry blob) managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// `registry.vdf`, or `HKCU\Software\Valve\Steam` on Windows.
    Registry,
    /// `config/loginusers.vdf`.
    LoginUsers,
    /// `config/config.vdf`.
    Config,
    /// `steamapps/libraryfolders.vdf`.
    LibraryFolders,
    /// `appcache/appinfo.vdf`.
    AppInfo,
    /// Names of the installed skin folders.
    Skins,
    /// Every `appmanifest_<appid>.acf` in a library's `steamapps` folder.
    AppManifests,
    /// `userdata/<id>/config/localconfig.vdf`.
    LocalConfig,
    /// `userdata/<id>/7/remote/sharedconfig.vdf`.
    SharedConfig,
    /// `userdata/<id>/config/shortcuts.vdf`.
    Shortcuts,
}

/// How a kind is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Text,
    Binary,
    /// A directory listing rather than a file.
    Directory,
}

/// How many instances of a kind exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One per install.
    Global,
    /// One per user, attached to that user's login record.
    User,
    /// One per installed app per library.
    PerApp,
}

impl FileKind {
    /// Returns every kind, in load order.
    pub fn all() -> &'static [FileKind] {
        &[
            FileKind::Registry,
            FileKind::LoginUsers,
            FileKind::Config,
            FileKind::LibraryFolders,
            FileKind::AppInfo,
            FileKind::Skins,
            FileKind::AppManifests,
            FileKind::LocalConfig,
            FileKind::SharedConfig,
            FileKind::Shortcuts,
        ]
    }

    /// The canonical name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            FileKind::Registry => "registry",
            FileKind::LoginUsers => "loginusers",
            FileKind::Config => "config",
            FileKind::LibraryFolders => "libraryfolders",
            FileKind::AppInfo => "appinfo",
            FileKind::Skins => "skins",
            FileKind::AppManifests => "app-manifest",
            FileKind::LocalConfig => "localconfig",
            FileKind::SharedConfig => "sharedconfig",
            FileKind::Shortcuts => "shortcuts",
        }
    }

    pub fn codec(&self) -> Codec {
        match self {
            FileKind::AppInfo | FileKind::Shortcuts => Codec::Binary,
            FileKind::Skins => Codec::Directory,
            _ => Codec::Text,
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            FileKind::LocalConfig | FileKind::SharedConfig | FileKind::Shortcuts => Scope::User,
            FileKind::AppManifests => Scope::PerApp,
            _ => Scope::Global,
        }
    }

    /// Kinds that other kinds depend on and must load first.
    pub fn is_prerequisite(&self) -> bool {
        matches!(self, FileKind::LoginUsers | FileKind::Registry)
    }

    /// Identifies the kind of a file from its name.
    ///
    /// `appmanifest_<id>.acf` maps to [`FileKind::AppManifests`]; other files
    /// map by stem (`shortcuts.vdf` → [`FileKind::Shortcuts`]).
    pub fn identify(path: &Path) -> Result<FileKind, SteamError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if stem.starts_with("appmanifest_") {
            return Ok(FileKind::AppManifests);
        }

        stem.parse().map_err(|_| SteamError::UnknownKind {
            kind: stem.clone(),
            path: Some(path.to_path_buf()),
        })
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileKind {
    type Err = SteamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app-manifest" | "appmanifest" | "steamapps" => Ok(FileKind::AppManifests),
            _ => FileKind::all()
                .iter()
                .copied()
                .find(|k| k.name() == s)
                .ok_or_else(|| SteamError::UnknownKind {
                    kind: s.to_string(),
                    path: None,
                }),
        }
    }
}
