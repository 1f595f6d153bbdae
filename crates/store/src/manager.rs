//! Load/save orchestration.
//!
//! Kinds are processed strictly one after another: per-user kinds attach to
//! the login-user records, so `loginusers` (and the registry, which names
//! the auto-login user) always go first whatever order the caller used.

use std::path::{Path, PathBuf};

use steamconf_steam::registry::{read_registry, write_registry};
use steamconf_steam::{
    Codec, FileKind, Location, Paths, RegistryStore, Scope, SteamError, Table, system_registry, text_vdf,
    vdf,
};
use tracing::{debug, info};

use crate::apps::{merge_apps, read_manifests};
use crate::clean::{clean_library_folders, strip};
use crate::error::StoreError;
use crate::store::ConfigStore;

/// Behaviour switches for loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Prune config, localconfig, registry and sharedconfig to their allow-lists.
    pub strip_on_load: bool,
    /// Merge loaded manifests into the existing list instead of replacing it.
    pub append_apps: bool,
}

/// Loads files from one Steam install into a [`ConfigStore`] and writes them back.
pub struct ConfigManager {
    paths: Paths,
    options: LoadOptions,
    registry: Option<Box<dyn RegistryStore>>,
}

impl ConfigManager {
    /// Creates a manager using the host registry where there is one.
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            options: LoadOptions::default(),
            registry: system_registry(),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the registry used for the registry kind on Windows layouts.
    pub fn with_registry(mut self, registry: Box<dyn RegistryStore>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Orders kinds for loading: prerequisites, then global kinds, then
    /// per-user kinds. Relative order within each group is kept and
    /// duplicates are dropped.
    pub fn order_kinds(kinds: &[FileKind]) -> Vec<FileKind> {
        let rank = |kind: &FileKind| {
            if kind.is_prerequisite() {
                0
            } else if kind.scope() == Scope::User {
                2
            } else {
                1
            }
        };

        let mut ordered: Vec<FileKind> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }
        ordered.sort_by_key(rank);
        ordered
    }

    /// Loads `kinds` into `store`. The first failure aborts the rest.
    pub async fn load(&self, store: &mut ConfigStore, kinds: &[FileKind]) -> Result<(), StoreError> {
        for kind in Self::order_kinds(kinds) {
            self.load_kind(store, kind).await?;
            store.mark_loaded(kind);
        }
        Ok(())
    }

    /// Loads kinds given by name, failing on the first unknown name.
    ///
    /// The error names the bad kind and the installation it was asked of.
    pub async fn load_names(&self, store: &mut ConfigStore, names: &[&str]) -> Result<(), StoreError> {
        let kinds = names
            .iter()
            .map(|name| {
                name.parse::<FileKind>().map_err(|_| SteamError::UnknownKind {
                    kind: (*name).to_string(),
                    path: Some(self.paths.base_dir().to_path_buf()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.load(store, &kinds).await
    }

    async fn load_kind(&self, store: &mut ConfigStore, kind: FileKind) -> Result<(), StoreError> {
        match kind {
            FileKind::Registry => {
                let tree = match self.paths.resolve(kind, None)? {
                    Location::Registry => {
                        let registry = self.registry.as_deref().ok_or(StoreError::RegistryUnavailable)?;
                        read_registry(registry)?
                    }
                    Location::File(path) | Location::Dir(path) => read_text(&path).await?,
                };
                store.registry = Some(self.post_load(kind, tree));
            }
            FileKind::LoginUsers => {
                let tree = read_text(&self.file_path(kind, None)?).await?;
                store.set_login_users(&tree)?;
            }
            FileKind::Config => {
                let tree = read_text(&self.file_path(kind, None)?).await?;
                store.config = Some(self.post_load(kind, tree));
            }
            FileKind::LibraryFolders => {
                let mut tree = read_text(&self.file_path(kind, None)?).await?;
                clean_library_folders(&mut tree);
                store.libraryfolders = Some(tree);
            }
            FileKind::AppInfo => {
                let path = self.file_path(kind, None)?;
                let data = read_bytes(&path).await?;
                store.appinfo =
                    vdf::parse_app_info(&data).map_err(|source| StoreError::Decode { path, source })?;
                debug!(count = store.appinfo.len(), "appinfo records decoded");
            }
            FileKind::Skins => {
                let dir = match self.paths.resolve(kind, None)? {
                    Location::File(path) | Location::Dir(path) => path,
                    Location::Registry => return Err(StoreError::Unsupported(kind)),
                };
                store.skins = list_skins(&dir).await?;
            }
            FileKind::AppManifests => {
                let folder = self.paths.steamapps_dir();
                self.load_apps(store, &folder, self.options.append_apps).await?;
            }
            FileKind::LocalConfig | FileKind::SharedConfig | FileKind::Shortcuts => {
                if !store.is_loaded(FileKind::LoginUsers) {
                    return Err(StoreError::NotLoaded(FileKind::LoginUsers));
                }
                let user = store.current_user()?;
                let (id64, account_id) = (user.id64.clone(), user.account_id.clone());
                let path = self.file_path(kind, Some(&account_id))?;

                let tree = if kind.codec() == Codec::Binary {
                    let data = read_bytes(&path).await?;
                    vdf::parse_shortcuts(&data).map_err(|source| StoreError::Decode {
                        path: path.clone(),
                        source,
                    })?
                } else {
                    self.post_load(kind, read_text(&path).await?)
                };

                if let Some(slot) = store.user_mut(&id64).and_then(|u| u.slot_mut(kind)) {
                    *slot = Some(tree);
                }
                debug!(%kind, user = %account_id, "per-user file attached");
            }
        }

        info!(%kind, "loaded");
        Ok(())
    }

    fn post_load(&self, kind: FileKind, tree: Table) -> Table {
        if self.options.strip_on_load {
            strip(kind, tree)
        } else {
            tree
        }
    }

    /// Writes `kinds` back, each merged over its current on-disk copy.
    pub async fn save(&self, store: &mut ConfigStore, kinds: &[FileKind]) -> Result<(), StoreError> {
        let mut seen = Vec::new();
        for kind in kinds {
            if seen.contains(kind) {
                continue;
            }
            seen.push(*kind);
            self.save_kind(store, *kind).await?;
            info!(%kind, "saved");
        }
        Ok(())
    }

    async fn save_kind(&self, store: &mut ConfigStore, kind: FileKind) -> Result<(), StoreError> {
        match kind {
            FileKind::AppInfo | FileKind::Skins => Err(StoreError::Unsupported(kind)),
            FileKind::AppManifests => self.save_apps(store).await,
            FileKind::Registry | FileKind::Config | FileKind::LibraryFolders => {
                let memory = store.global(kind).ok_or(StoreError::NotLoaded(kind))?;

                let merged = match self.paths.resolve(kind, None)? {
                    Location::Registry => {
                        let registry = self.registry.as_deref().ok_or(StoreError::RegistryUnavailable)?;
                        let merged = merge_shallow(read_registry(registry)?, memory);
                        let written = write_registry(registry, &merged)?;
                        debug!(count = written, "registry values written");
                        merged
                    }
                    Location::File(path) | Location::Dir(path) => {
                        let merged = merge_shallow(read_text(&path).await?, memory);
                        write_text(&path, &merged).await?;
                        merged
                    }
                };

                if let Some(slot) = store.global_slot(kind) {
                    *slot = Some(merged);
                }
                Ok(())
            }
            FileKind::LoginUsers => {
                if !store.is_loaded(kind) {
                    return Err(StoreError::NotLoaded(kind));
                }
                let path = self.file_path(kind, None)?;
                let merged = merge_shallow(read_text(&path).await?, &store.strip_users());
                write_text(&path, &merged).await?;
                store.set_login_users(&merged)
            }
            FileKind::LocalConfig | FileKind::SharedConfig | FileKind::Shortcuts => {
                let user = store.current_user()?;
                let memory = user.tree(kind).ok_or(StoreError::NotLoaded(kind))?;
                let (id64, account_id) = (user.id64.clone(), user.account_id.clone());
                let path = self.file_path(kind, Some(&account_id))?;

                let merged = if kind.codec() == Codec::Binary {
                    let disk = read_bytes(&path).await?;
                    let disk = vdf::parse_shortcuts(&disk).map_err(|source| StoreError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                    let merged = merge_shallow(disk, memory);
                    let bytes = vdf::encode_shortcuts(&merged).map_err(|source| StoreError::Decode {
                        path: path.clone(),
                        source,
                    })?;
                    write_bytes(&path, &bytes).await?;
                    merged
                } else {
                    let merged = merge_shallow(read_text(&path).await?, memory);
                    write_text(&path, &merged).await?;
                    merged
                };

                if let Some(slot) = store.user_mut(&id64).and_then(|u| u.slot_mut(kind)) {
                    *slot = Some(merged);
                }
                Ok(())
            }
        }
    }

    /// Loads the manifests in one library's `steamapps` folder.
    ///
    /// Returns the number of manifests read.
    pub async fn load_apps(
        &self,
        store: &mut ConfigStore,
        folder: &Path,
        append: bool,
    ) -> Result<usize, StoreError> {
        let fresh = read_manifests(folder).await?;
        let count = fresh.len();
        merge_apps(&mut store.apps, fresh, append);
        store.mark_loaded(FileKind::AppManifests);
        Ok(count)
    }

    /// Loads the manifests of every library listed in `libraryfolders.vdf`,
    /// loading that file first if needed.
    pub async fn load_all_apps(&self, store: &mut ConfigStore) -> Result<usize, StoreError> {
        if !store.is_loaded(FileKind::LibraryFolders) {
            self.load(store, &[FileKind::LibraryFolders]).await?;
        }

        let mut total = 0;
        for (i, folder) in store.library_paths(self.paths.base_dir()).into_iter().enumerate() {
            let append = i > 0 || self.options.append_apps;
            total += self.load_apps(store, &folder, append).await?;
        }
        Ok(total)
    }

    /// Writes every loaded manifest back over its file.
    pub async fn save_apps(&self, store: &mut ConfigStore) -> Result<(), StoreError> {
        for app in &mut store.apps {
            let disk = read_text(&app.path).await?;
            let merged = merge_shallow(disk, &app.data);
            write_text(&app.path, &merged).await?;
            app.data = merged;
        }
        debug!(count = store.apps.len(), "app manifests saved");
        Ok(())
    }

    fn file_path(&self, kind: FileKind, user: Option<&str>) -> Result<PathBuf, StoreError> {
        match self.paths.resolve(kind, user)? {
            Location::File(path) | Location::Dir(path) => Ok(path),
            Location::Registry => Err(StoreError::Unsupported(kind)),
        }
    }
}

/// Overlays `memory` on `disk` one top-level key at a time.
///
/// Keys present in both take the in-memory value at the on-disk position;
/// keys only in memory are appended.
pub fn merge_shallow(mut disk: Table, memory: &Table) -> Table {
    for (key, value) in memory {
        disk.insert(key.clone(), value.clone());
    }
    disk
}

/// Reads and decodes one file by kind, without a store.
pub async fn read_kind_file(kind: FileKind, path: &Path) -> Result<serde_json::Value, StoreError> {
    let json = match kind {
        FileKind::AppInfo => {
            let data = read_bytes(path).await?;
            let records = vdf::parse_app_info(&data).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_value(records)
        }
        FileKind::Shortcuts => {
            let data = read_bytes(path).await?;
            let tree = vdf::parse_shortcuts(&data).map_err(|source| StoreError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::to_value(tree)
        }
        FileKind::Skins => serde_json::to_value(list_skins(path).await?),
        _ => serde_json::to_value(read_text(path).await?),
    };
    json.map_err(|e| StoreError::InvalidArgument(format!("cannot render {kind} as JSON: {e}")))
}

async fn read_text(path: &Path) -> Result<Table, StoreError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    text_vdf::parse(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, StoreError> {
    tokio::fs::read(path).await.map_err(|e| StoreError::io(path, e))
}

async fn write_text(path: &Path, tree: &Table) -> Result<(), StoreError> {
    write_bytes(path, text_vdf::serialize(tree, true).as_bytes()).await
}

async fn write_bytes(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    tokio::fs::write(path, data).await.map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), bytes = data.len(), "written");
    Ok(())
}

/// Skin folder names, skipping `.txt` files and hidden entries.
async fn list_skins(dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))?;

    let mut skins = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(".txt") && !name.starts_with('.') {
            skins.push(name);
        }
    }
    skins.sort();
    Ok(skins)
}
