use std::path::PathBuf;

use crate::SteamError;

pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;

    let steam_dir = home
        .join("Library")
        .join("Application Support")
        .join("Steam");
    if steam_dir.exists() {
        return Ok(steam_dir);
    }

    Err(SteamError::NotFound)
}
