use std::path::PathBuf;

use crate::SteamError;

/// Returns the first Steam install found under the user's home.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;

    let candidates = [
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
        // Flatpak
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join(".steam")
            .join("steam"),
    ];

    candidates
        .into_iter()
        .find(|dir| dir.exists())
        .ok_or(SteamError::NotFound)
}
