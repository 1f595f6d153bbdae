use std::io;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

use crate::SteamError;
use crate::node::Node;
use crate::registry::RegistryStore;

const STEAM_KEY: &str = r"Software\Valve\Steam";

/// `HKCU\Software\Valve\Steam`.
pub(crate) struct WindowsRegistry {
    hkcu: RegKey,
}

impl WindowsRegistry {
    pub(crate) fn new() -> Self {
        Self {
            hkcu: RegKey::predef(HKEY_CURRENT_USER),
        }
    }
}

fn registry_err(e: io::Error) -> SteamError {
    SteamError::Registry(e.to_string())
}

impl RegistryStore for WindowsRegistry {
    fn get_value(&self, name: &str) -> Result<Option<Node>, SteamError> {
        let key = match self.hkcu.open_subkey_with_flags(STEAM_KEY, KEY_READ) {
            Ok(key) => key,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(registry_err(e)),
        };

        // REG_SZ first, then REG_DWORD
        match key.get_value::<String, _>(name) {
            Ok(s) => return Ok(Some(Node::String(s))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(_) => {}
        }
        match key.get_value::<u32, _>(name) {
            Ok(n) => Ok(Some(Node::Int32(n as i32))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(registry_err(e)),
        }
    }

    fn set_value(&self, name: &str, value: &Node) -> Result<(), SteamError> {
        let (key, _) = self
            .hkcu
            .create_subkey_with_flags(STEAM_KEY, KEY_WRITE)
            .map_err(registry_err)?;

        match value {
            Node::String(s) => key.set_value(name, s),
            Node::Int32(n) => key.set_value(name, &(*n as u32)),
            Node::Bool(b) => key.set_value(name, &u32::from(*b)),
            Node::UInt64(n) => key.set_value(name, n),
            other => {
                return Err(SteamError::InvalidArgument(format!(
                    "registry value '{name}' cannot hold {other:?}"
                )));
            }
        }
        .map_err(registry_err)
    }
}
