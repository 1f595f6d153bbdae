//! The in-memory configuration: one tree per loaded file kind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use steamconf_steam::{AppInfoRecord, FileKind, Node, Table, derive_short_id, dot_get};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Path of the auto-login account name inside the registry tree.
const AUTO_LOGIN_PATH: &str = "Registry.HKCU.Software.Valve.Steam.AutoLoginUser";

/// One entry of `loginusers.vdf`, with the per-user files loaded for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginUser {
    /// 64-bit SteamID, the key in `loginusers.vdf`.
    pub id64: String,
    /// Short account ID, the `userdata/<id>` folder name.
    pub account_id: String,
    /// The fields stored for this user in `loginusers.vdf`.
    pub profile: Table,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localconfig: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharedconfig: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcuts: Option<Table>,
}

impl LoginUser {
    /// Builds a user record from its `loginusers.vdf` entry.
    pub fn new(id64: &str, profile: Table) -> Result<Self, StoreError> {
        Ok(Self {
            id64: id64.to_string(),
            account_id: derive_short_id(id64)?,
            profile,
            localconfig: None,
            sharedconfig: None,
            shortcuts: None,
        })
    }

    /// Returns a profile field such as `AccountName`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.profile.get(name).and_then(Node::as_str)
    }

    /// Whether `identifier` names this user by ID, account name or persona name.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id64 == identifier
            || self.account_id == identifier
            || self.field("AccountName") == Some(identifier)
            || self.field("PersonaName") == Some(identifier)
    }

    fn most_recent(&self) -> bool {
        self.profile
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("mostrecent") && v.scalar_text().as_deref() == Some("1"))
    }

    /// The tree loaded for a per-user kind.
    pub fn tree(&self, kind: FileKind) -> Option<&Table> {
        match kind {
            FileKind::LocalConfig => self.localconfig.as_ref(),
            FileKind::SharedConfig => self.sharedconfig.as_ref(),
            FileKind::Shortcuts => self.shortcuts.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: FileKind) -> Option<&mut Option<Table>> {
        match kind {
            FileKind::LocalConfig => Some(&mut self.localconfig),
            FileKind::SharedConfig => Some(&mut self.sharedconfig),
            FileKind::Shortcuts => Some(&mut self.shortcuts),
            _ => None,
        }
    }
}

/// A parsed `appmanifest_<id>.acf`, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppManifest {
    /// The library's `steamapps` folder.
    pub library: PathBuf,
    /// The manifest file.
    pub path: PathBuf,
    pub data: Table,
}

impl AppManifest {
    /// The app ID recorded inside the manifest (`AppState.appid`).
    pub fn app_id(&self) -> Option<String> {
        self.data
            .get("AppState")
            .and_then(|state| state.get("appid"))
            .and_then(Node::scalar_text)
    }
}

/// Everything loaded from one Steam install.
///
/// Each load only touches the kinds it was asked for; callers mutate the
/// trees in place and hand the store back to the manager to save.
#[derive(Debug, Default, Serialize)]
pub struct ConfigStore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libraryfolders: Option<Table>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub appinfo: Vec<AppInfoRecord>,
    /// Login users keyed by 64-bit SteamID, in file order.
    pub users: IndexMap<String, LoginUser>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<AppManifest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skins: Vec<String>,

    #[serde(skip)]
    loaded: BTreeSet<FileKind>,
    #[serde(skip)]
    selected: Option<String>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `kind` has been loaded at least once.
    pub fn is_loaded(&self, kind: FileKind) -> bool {
        self.loaded.contains(&kind)
    }

    pub(crate) fn mark_loaded(&mut self, kind: FileKind) {
        self.loaded.insert(kind);
    }

    /// The tree held for a global text kind.
    pub fn global(&self, kind: FileKind) -> Option<&Table> {
        match kind {
            FileKind::Registry => self.registry.as_ref(),
            FileKind::Config => self.config.as_ref(),
            FileKind::LibraryFolders => self.libraryfolders.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn global_slot(&mut self, kind: FileKind) -> Option<&mut Option<Table>> {
        match kind {
            FileKind::Registry => Some(&mut self.registry),
            FileKind::Config => Some(&mut self.config),
            FileKind::LibraryFolders => Some(&mut self.libraryfolders),
            _ => None,
        }
    }

    /// Replaces the user list from a parsed `loginusers.vdf`.
    ///
    /// Per-user trees already loaded for a user that is still listed are kept.
    pub fn set_login_users(&mut self, tree: &Table) -> Result<(), StoreError> {
        let mut users = IndexMap::new();
        if let Some(entries) = tree.get("users").and_then(Node::as_table) {
            for (id64, entry) in entries {
                let Some(profile) = entry.as_table() else {
                    warn!(user = %id64, "loginusers entry is not a table, skipping");
                    continue;
                };
                let mut user = LoginUser::new(id64, profile.clone())?;
                if let Some(previous) = self.users.shift_remove(id64) {
                    user.localconfig = previous.localconfig;
                    user.sharedconfig = previous.sharedconfig;
                    user.shortcuts = previous.shortcuts;
                }
                users.insert(id64.clone(), user);
            }
        }
        debug!(count = users.len(), "login users loaded");
        self.users = users;
        Ok(())
    }

    /// Returns the login-user table as it is stored on disk, without the
    /// per-user trees nested under each user.
    pub fn strip_users(&self) -> Table {
        let users: Table = self
            .users
            .iter()
            .map(|(id, user)| (id.clone(), Node::Table(user.profile.clone())))
            .collect();
        let mut root = Table::new();
        root.insert("users".into(), Node::Table(users));
        root
    }

    /// Returns the manifests without their `library`/`path` tags.
    pub fn strip_apps(&self) -> Vec<Table> {
        self.apps.iter().map(|app| app.data.clone()).collect()
    }

    /// Finds a user by 64-bit ID, short ID, account name or persona name.
    pub fn find_user(&self, identifier: &str) -> Option<&LoginUser> {
        self.users.values().find(|u| u.matches(identifier))
    }

    /// Picks the user Steam would log in as.
    ///
    /// Tries the registry's `AutoLoginUser`, then the most recent login, then
    /// the only user if there is exactly one.
    pub fn detect_user(&self) -> Result<&LoginUser, StoreError> {
        let auto_login = self
            .registry
            .as_ref()
            .and_then(|tree| dot_get_table(tree, AUTO_LOGIN_PATH))
            .and_then(Node::as_str)
            .filter(|name| !name.is_empty());

        if let Some(user) = auto_login.and_then(|name| self.find_user(name)) {
            return Ok(user);
        }
        if let Some(user) = self.users.values().find(|u| u.most_recent()) {
            return Ok(user);
        }
        if self.users.len() == 1
            && let Some(user) = self.users.values().next()
        {
            return Ok(user);
        }
        Err(StoreError::NoUserSelected)
    }

    /// Sets the user per-user kinds are loaded for and saved from.
    ///
    /// When the user list is loaded the identifier must name a listed user.
    pub fn select_user(&mut self, identifier: &str) -> Result<(), StoreError> {
        if identifier.is_empty() {
            return Err(StoreError::InvalidArgument("empty user identifier".into()));
        }
        if self.is_loaded(FileKind::LoginUsers) && self.find_user(identifier).is_none() {
            return Err(StoreError::UserNotFound(identifier.to_string()));
        }
        self.selected = Some(identifier.to_string());
        Ok(())
    }

    /// The identifier passed to [`select_user`](Self::select_user), if any.
    pub fn selected_user(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected user, or the detected one when none was selected.
    pub fn current_user(&self) -> Result<&LoginUser, StoreError> {
        match &self.selected {
            Some(identifier) => self
                .find_user(identifier)
                .ok_or_else(|| StoreError::UserNotFound(identifier.clone())),
            None => self.detect_user(),
        }
    }

    pub(crate) fn user_mut(&mut self, id64: &str) -> Option<&mut LoginUser> {
        self.users.get_mut(id64)
    }

    /// Returns every library's `steamapps` folder, starting with the one
    /// under `root`.
    ///
    /// Reads both the old `LibraryFolders { "1" "<path>" }` layout and the
    /// current `libraryfolders { "0" { "path" "<path>" } }` layout.
    pub fn library_paths(&self, root: &Path) -> Vec<PathBuf> {
        let mut paths = vec![root.join("steamapps")];

        let folders = self.libraryfolders.as_ref().and_then(|tree| {
            tree.get("libraryfolders")
                .or_else(|| tree.get("LibraryFolders"))
                .and_then(Node::as_table)
        });

        for (key, entry) in folders.into_iter().flatten() {
            if key.parse::<u32>().is_err() {
                continue;
            }
            let library = match entry {
                Node::Table(t) => t.get("path").and_then(Node::as_str),
                other => other.as_str(),
            };
            if let Some(library) = library {
                let steamapps = PathBuf::from(library).join("steamapps");
                if !paths.contains(&steamapps) {
                    paths.push(steamapps);
                }
            }
        }

        paths
    }
}

fn dot_get_table<'a>(tree: &'a Table, path: &str) -> Option<&'a Node> {
    let (head, rest) = path.split_once('.')?;
    dot_get(tree.get(head)?, rest)
}
