use std::fmt;
use std::path::{Path, PathBuf};

use crate::SteamError;
use crate::kind::FileKind;

/// Operating system whose directory layout is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Returns the platform this binary was built for.
    pub fn current() -> Result<Self, SteamError> {
        if cfg!(target_os = "windows") {
            Ok(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Ok(Platform::MacOs)
        } else if cfg!(any(target_os = "linux", target_os = "android")) {
            Ok(Platform::Linux)
        } else {
            Err(SteamError::InvalidArgument(format!(
                "the OS {} is not supported",
                std::env::consts::OS
            )))
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// Where a file kind lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Dir(PathBuf),
    /// Stored in the Windows registry rather than on disk.
    Registry,
}

/// Resolves Steam file locations below an install root.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
    platform: Platform,
}

impl Paths {
    /// Paths for the detected installation on this platform.
    pub fn new() -> Result<Self, SteamError> {
        Ok(Self {
            base_dir: detect_root()?,
            platform: Platform::current()?,
        })
    }

    /// Paths rooted at `base_dir`, laid out for the running platform.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Result<Self, SteamError> {
        Ok(Self::with_platform(base_dir, Platform::current()?))
    }

    /// Creates a `Paths` instance for an explicit platform layout.
    pub fn with_platform(base_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            base_dir: base_dir.into(),
            platform,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// `<root>/userdata`
    pub fn user_data_dir(&self) -> PathBuf {
        self.base_dir.join("userdata")
    }

    /// `userdata/<short id>`
    pub fn user_dir(&self, user_id: &str) -> PathBuf {
        self.user_data_dir().join(user_id)
    }

    pub fn config_dir(&self, short_id: &str) -> PathBuf {
        self.user_dir(short_id).join("config")
    }

    /// Returns the default library's `steamapps` directory.
    pub fn steamapps_dir(&self) -> PathBuf {
        self.base_dir.join("steamapps")
    }

    /// Returns the manifest path for an app in a library's `steamapps` folder.
    pub fn app_manifest_path(library: &Path, app_id: &str) -> PathBuf {
        library.join(format!("appmanifest_{app_id}.acf"))
    }

    /// Resolves where `kind` is stored.
    ///
    /// User-scoped kinds need the user's short ID.
    pub fn resolve(&self, kind: FileKind, user_id: Option<&str>) -> Result<Location, SteamError> {
        let user = || user_id.ok_or(SteamError::UserRequired(kind));

        let location = match kind {
            FileKind::Registry => match self.platform {
                Platform::Windows => Location::Registry,
                Platform::MacOs => Location::File(self.base_dir.join("registry.vdf")),
                // ~/.steam/steam/../registry.vdf
                Platform::Linux => Location::File(
                    self.base_dir
                        .parent()
                        .unwrap_or(&self.base_dir)
                        .join("registry.vdf"),
                ),
            },
            FileKind::LoginUsers => Location::File(self.base_dir.join("config").join("loginusers.vdf")),
            FileKind::Config => Location::File(self.base_dir.join("config").join("config.vdf")),
            FileKind::LibraryFolders => Location::File(self.steamapps_dir().join("libraryfolders.vdf")),
            FileKind::AppInfo => Location::File(self.base_dir.join("appcache").join("appinfo.vdf")),
            FileKind::Skins => match self.platform {
                Platform::MacOs => Location::Dir(
                    self.base_dir
                        .join("Steam.AppBundle")
                        .join("Steam")
                        .join("Contents")
                        .join("MacOS")
                        .join("skins"),
                ),
                _ => Location::Dir(self.base_dir.join("skins")),
            },
            FileKind::AppManifests => Location::Dir(self.steamapps_dir()),
            FileKind::LocalConfig => Location::File(self.config_dir(user()?).join("localconfig.vdf")),
            FileKind::SharedConfig => Location::File(
                self.user_dir(user()?)
                    .join("7")
                    .join("remote")
                    .join("sharedconfig.vdf"),
            ),
            FileKind::Shortcuts => Location::File(self.config_dir(user()?).join("shortcuts.vdf")),
        };

        Ok(location)
    }
}

/// Returns the first existing Steam install directory for this OS.
pub fn detect_root() -> Result<PathBuf, SteamError> {
    get_base_dir()
}

/// Checks that `path` looks like a Steam install.
///
/// It must exist and contain `config/config.vdf` and `userdata/`.
pub fn validate_root(path: &Path) -> Result<(), SteamError> {
    if path.as_os_str().is_empty() {
        return Err(SteamError::InvalidArgument("empty root path".into()));
    }
    if !path.exists() {
        return Err(SteamError::InvalidArgument(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if !path.join("config").join("config.vdf").exists() || !path.join("userdata").is_dir() {
        return Err(SteamError::InvalidArgument(format!(
            "{} does not seem to be a valid Steam installation; log in to the client once and try again",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_linux::get_base_dir()
}

#[cfg(target_os = "macos")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_macos::get_base_dir()
}

#[cfg(target_os = "windows")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_windows::get_base_dir()
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    Err(SteamError::NotFound)
}
