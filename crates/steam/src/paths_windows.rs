use std::path::PathBuf;

use winreg::RegKey;
use winreg::enums::HKEY_LOCAL_MACHINE;

use crate::SteamError;

/// Reads the install path Steam's installer leaves under HKLM.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    [r"SOFTWARE\Wow6432Node\Valve\Steam", r"SOFTWARE\Valve\Steam"]
        .into_iter()
        .find_map(install_path)
        .ok_or(SteamError::NotFound)
}

fn install_path(subkey: &str) -> Option<PathBuf> {
    let key = RegKey::predef(HKEY_LOCAL_MACHINE).open_subkey(subkey).ok()?;
    let path: String = key.get_value("InstallPath").ok()?;
    Some(PathBuf::from(path))
}
