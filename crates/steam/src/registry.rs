//! The Windows registry values Steam keeps under `HKCU\Software\Valve\Steam`,
//! presented as the same tree that `registry.vdf` holds on other platforms.

use std::sync::Mutex;

use indexmap::IndexMap;
use tracing::debug;

use crate::SteamError;
use crate::node::{Node, Table};

/// The values read from and written to the registry.
pub const REGISTRY_VALUES: [&str; 9] = [
    "language",
    "RunningAppID",
    "Apps",
    "AutoLoginUser",
    "RememberPassword",
    "SourceModInstallPath",
    "AlreadyRetriedOfflineMode",
    "StartupMode",
    "SkinV4",
];

/// Keys leading from the tree root to the table of values.
pub const REGISTRY_TREE_PATH: [&str; 5] = ["Registry", "HKCU", "Software", "Valve", "Steam"];

/// A flat key/value store holding Steam's registry values.
pub trait RegistryStore: Send + Sync {
    /// Returns the value, or `None` if it is not set.
    fn get_value(&self, name: &str) -> Result<Option<Node>, SteamError>;

    fn set_value(&self, name: &str, value: &Node) -> Result<(), SteamError>;
}

/// An in-process registry, used by tests and on hosts without one.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    values: Mutex<IndexMap<String, Node>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry holding `values`.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Self {
            values: Mutex::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl RegistryStore for MemoryRegistry {
    fn get_value(&self, name: &str) -> Result<Option<Node>, SteamError> {
        let values = self
            .values
            .lock()
            .map_err(|e| SteamError::Registry(e.to_string()))?;
        Ok(values.get(name).cloned())
    }

    fn set_value(&self, name: &str, value: &Node) -> Result<(), SteamError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| SteamError::Registry(e.to_string()))?;
        values.insert(name.to_string(), value.clone());
        Ok(())
    }
}

/// Returns the host registry, on platforms that have one.
pub fn system_registry() -> Option<Box<dyn RegistryStore>> {
    #[cfg(target_os = "windows")]
    {
        Some(Box::new(crate::registry_windows::WindowsRegistry::new()))
    }
    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}

/// Reads every known value into a `Registry/HKCU/Software/Valve/Steam` tree.
///
/// Values that are not set are left out.
pub fn read_registry(store: &dyn RegistryStore) -> Result<Table, SteamError> {
    let mut steam = Table::new();
    for name in REGISTRY_VALUES {
        match store.get_value(name)? {
            Some(value) => {
                steam.insert(name.to_string(), value);
            }
            None => debug!(name, "registry value not set"),
        }
    }

    let tree = REGISTRY_TREE_PATH
        .iter()
        .rev()
        .fold(Node::Table(steam), |inner, key| {
            let mut table = Table::new();
            table.insert((*key).to_string(), inner);
            Node::Table(table)
        });

    match tree {
        Node::Table(table) => Ok(table),
        _ => Ok(Table::new()),
    }
}

/// Writes every known value present in `tree` back to `store`.
///
/// Returns the number of values written.
pub fn write_registry(store: &dyn RegistryStore, tree: &Table) -> Result<usize, SteamError> {
    let Some(steam) = steam_table(tree) else {
        return Ok(0);
    };

    let mut written = 0;
    for name in REGISTRY_VALUES {
        if let Some(value) = steam.get(name) {
            store.set_value(name, value)?;
            written += 1;
        }
    }
    Ok(written)
}

fn steam_table(tree: &Table) -> Option<&Table> {
    let (first, rest) = REGISTRY_TREE_PATH.split_first()?;
    rest.iter()
        .try_fold(tree.get(*first)?, |node, key| node.get(key))?
        .as_table()
}
