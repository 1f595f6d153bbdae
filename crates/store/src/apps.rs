//! Application manifests (`appmanifest_<id>.acf`) in a library folder.

use std::path::{Path, PathBuf};

use steamconf_steam::text_vdf;
use tracing::debug;

use crate::error::StoreError;
use crate::store::AppManifest;

/// Lists the manifest files in `folder`, sorted by name.
pub async fn list_manifests(folder: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| StoreError::io(folder, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(folder, e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("appmanifest_") && name.ends_with(".acf") {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Parses one manifest file, tagging it with its library folder.
pub async fn read_manifest(path: &Path) -> Result<AppManifest, StoreError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    let data = text_vdf::parse(&text).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(AppManifest {
        library: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        path: path.to_path_buf(),
        data,
    })
}

/// Parses every manifest in `folder`.
pub async fn read_manifests(folder: &Path) -> Result<Vec<AppManifest>, StoreError> {
    let mut apps = Vec::new();
    for file in list_manifests(folder).await? {
        apps.push(read_manifest(&file).await?);
    }
    debug!(folder = %folder.display(), count = apps.len(), "app manifests read");
    Ok(apps)
}

/// Merges freshly read manifests into `apps`.
///
/// Without `append` the list is replaced. With it, a fresh manifest whose app
/// ID is already present replaces that entry in place and the rest are
/// appended in order.
pub fn merge_apps(apps: &mut Vec<AppManifest>, fresh: Vec<AppManifest>, append: bool) {
    if !append {
        *apps = fresh;
        return;
    }

    for app in fresh {
        let id = app.app_id();
        let existing = id
            .as_ref()
            .and_then(|id| apps.iter().position(|a| a.app_id().as_ref() == Some(id)));
        match existing {
            Some(index) => apps[index] = app,
            None => apps.push(app),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(library: &str, id: &str, name: &str) -> AppManifest {
        let lib = PathBuf::from(library);
        AppManifest {
            path: lib.join(format!("appmanifest_{id}.acf")),
            library: lib,
            data: text_vdf::parse(&format!(
                r#""AppState" {{ "appid" "{id}" "name" "{name}" }}"#
            ))
            .unwrap(),
        }
    }

    fn ids(apps: &[AppManifest]) -> Vec<String> {
        apps.iter().filter_map(AppManifest::app_id).collect()
    }

    #[test]
    fn append_dedupes_by_app_id() {
        let mut apps = vec![manifest("/a", "100", "x"), manifest("/a", "200", "old")];
        merge_apps(
            &mut apps,
            vec![manifest("/b", "200", "new"), manifest("/b", "300", "y")],
            true,
        );

        assert_eq!(ids(&apps), vec!["100", "200", "300"]);
        assert_eq!(apps[1].library, PathBuf::from("/b"));
        assert_eq!(
            apps[1].data["AppState"].get("name").and_then(|n| n.as_str()),
            Some("new")
        );
    }

    #[test]
    fn replace_without_append() {
        let mut apps = vec![manifest("/a", "100", "x")];
        merge_apps(&mut apps, vec![manifest("/b", "300", "y")], false);
        assert_eq!(ids(&apps), vec!["300"]);
    }

    #[tokio::test]
    async fn reads_only_manifest_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("appmanifest_440.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"440\"\n}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("appmanifest_10.acf"),
            "\"AppState\"\n{\n\t\"appid\"\t\t\"10\"\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("libraryfolders.vdf"), "\"libraryfolders\" {}").unwrap();
        std::fs::create_dir(dir.path().join("common")).unwrap();

        let apps = read_manifests(dir.path()).await.unwrap();
        assert_eq!(ids(&apps), vec!["10", "440"]);
        assert!(apps.iter().all(|a| a.library == dir.path()));
    }

    #[tokio::test]
    async fn missing_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifests(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
