use std::fs;

use crate::SteamError;
use crate::paths::Paths;

/// Derives the short account ID (the `userdata/<id>` folder name) from a
/// 64-bit SteamID.
///
/// The short ID is the low 32 bits of the 64-bit ID, rendered in decimal.
pub fn derive_short_id(id64: &str) -> Result<String, SteamError> {
    if id64.is_empty() || !id64.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SteamError::InvalidArgument(format!(
            "'{id64}' is not a 64-bit Steam ID"
        )));
    }
    let id: u64 = id64
        .parse()
        .map_err(|_| SteamError::InvalidArgument(format!("'{id64}' does not fit in 64 bits")))?;
    Ok((id & 0xFFFF_FFFF).to_string())
}

/// Returns the numeric user folders under `userdata`, sorted.
pub fn list_userdata_ids(paths: &Paths) -> Result<Vec<String>, SteamError> {
    let user_data_dir = paths.user_data_dir();

    let entries = fs::read_dir(&user_data_dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SteamError::NotFound
        } else {
            SteamError::Io(e.to_string())
        }
    })?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SteamError::Io(e.to_string()))?;

        if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();

        // "0" is a scratch folder, not an account
        if name == "0" || name.parse::<u64>().is_err() {
            continue;
        }

        ids.push(name.into_owned());
    }

    ids.sort();
    Ok(ids)
}
