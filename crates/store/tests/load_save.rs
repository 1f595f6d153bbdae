//! End-to-end load → mutate → save against a fake Steam install.

use std::fs;
use std::path::PathBuf;

use steamconf_steam::vdf::{decode_table, encode_table};
use steamconf_steam::{FileKind, MemoryRegistry, Node, Paths, Platform, RegistryStore, Table, text_vdf};
use steamconf_store::{ConfigManager, ConfigStore, LoadOptions, StoreError, apply_setting};

const ID64: &str = "76561198067577712";
const SHORT_ID: &str = "107311984";

const LOGIN_USERS: &str = "\"users\"
{
\t\"76561198067577712\"
\t{
\t\t\"AccountName\"\t\t\"gabe\"
\t\t\"PersonaName\"\t\t\"Gabe\"
\t\t\"MostRecent\"\t\t\"1\"
\t}
}
";

struct Install {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Install {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("steam");
        let install = Self { _dir: dir, root };

        install.write("config/config.vdf", "\"InstallConfigStore\"\n{\n\t\"x\"\t\t\"1\"\n}\n");
        install.write("config/loginusers.vdf", LOGIN_USERS);
        install.write(
            "../registry.vdf",
            "\"Registry\" { \"HKCU\" { \"Software\" { \"Valve\" { \"Steam\" { \"language\" \"english\" } } } } }",
        );
        install.write(
            &format!("userdata/{SHORT_ID}/7/remote/sharedconfig.vdf"),
            "\"UserRoamingConfigStore\" { \"Web\" { \"a\" \"1\" } }",
        );
        install.write(
            &format!("userdata/{SHORT_ID}/config/localconfig.vdf"),
            "\"UserLocalConfigStore\" { \"friends\" { \"PersonaStateDesired\" \"1\" } \"LastInstallFolderIndex\" \"0\" }",
        );
        install.write_bytes(&format!("userdata/{SHORT_ID}/config/shortcuts.vdf"), &shortcuts_bytes());
        install.write(
            "steamapps/libraryfolders.vdf",
            "\"libraryfolders\" { \"TimeNextStatsReport\" \"1\" \"ContentStatsID\" \"2\" }",
        );
        install
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn write(&self, rel: &str, text: &str) {
        self.write_bytes(rel, text.as_bytes());
    }

    fn write_bytes(&self, rel: &str, data: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    fn manager(&self) -> ConfigManager {
        ConfigManager::new(Paths::with_platform(&self.root, Platform::Linux))
    }

    fn read_tree(&self, rel: &str) -> Table {
        text_vdf::parse(&fs::read_to_string(self.path(rel)).unwrap()).unwrap()
    }
}

fn shortcuts_bytes() -> Vec<u8> {
    let mut tags = Table::new();
    tags.insert("0".into(), Node::from("favorite"));

    let mut entry = Table::new();
    entry.insert("appid".into(), Node::Int32(-1_234_567));
    entry.insert("AppName".into(), Node::from("Emulator"));
    entry.insert("IsHidden".into(), Node::Int32(0));
    entry.insert("LastPlayTime".into(), Node::Int32(0));
    entry.insert("tags".into(), Node::Table(tags));

    let mut shortcuts = Table::new();
    shortcuts.insert("0".into(), Node::Table(entry));
    let mut root = Table::new();
    root.insert("shortcuts".into(), Node::Table(shortcuts));
    encode_table(&root)
}

fn manifest(id: &str, name: &str) -> String {
    format!("\"AppState\"\n{{\n\t\"appid\"\t\t\"{id}\"\n\t\"name\"\t\t\"{name}\"\n}}\n")
}

fn app_ids(store: &ConfigStore) -> Vec<String> {
    store.apps.iter().filter_map(|a| a.app_id()).collect()
}

#[tokio::test]
async fn user_kinds_load_regardless_of_requested_order() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();

    manager
        .load(&mut store, &[FileKind::SharedConfig, FileKind::LoginUsers])
        .await
        .unwrap();

    let user = &store.users[ID64];
    assert_eq!(user.account_id, SHORT_ID);
    let shared = user.sharedconfig.as_ref().unwrap();
    assert!(shared["UserRoamingConfigStore"].get("Web").is_some());
}

#[tokio::test]
async fn save_merges_over_disk_copy() {
    let install = Install::new();
    install.write("config/config.vdf", "\"x\" \"1\"\n\"y\" \"2\"\n");
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::Config]).await.unwrap();

    store.config = Some(text_vdf::parse("\"y\" \"3\" \"z\" \"4\"").unwrap());
    manager.save(&mut store, &[FileKind::Config]).await.unwrap();

    let expected = text_vdf::parse("\"x\" \"1\" \"y\" \"3\" \"z\" \"4\"").unwrap();
    assert_eq!(install.read_tree("config/config.vdf"), expected);
    assert_eq!(store.config, Some(expected));
}

#[tokio::test]
async fn app_folders_append_with_latest_copy_winning() {
    let install = Install::new();
    let a = install.path("libA/steamapps");
    let b = install.path("libB/steamapps");
    install.write("libA/steamapps/appmanifest_100.acf", &manifest("100", "Hundred"));
    install.write("libA/steamapps/appmanifest_200.acf", &manifest("200", "Old"));
    install.write("libB/steamapps/appmanifest_200.acf", &manifest("200", "New"));
    install.write("libB/steamapps/appmanifest_300.acf", &manifest("300", "Three"));

    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load_apps(&mut store, &a, false).await.unwrap();
    manager.load_apps(&mut store, &b, true).await.unwrap();

    assert_eq!(app_ids(&store), vec!["100", "200", "300"]);
    assert_eq!(store.apps[1].library, b);
}

#[tokio::test]
async fn load_all_apps_walks_every_library() {
    let install = Install::new();
    let extra = install.path("../games");
    install.write(
        "steamapps/libraryfolders.vdf",
        &format!(
            "\"libraryfolders\" {{ \"0\" {{ \"path\" \"{}\" }} \"1\" {{ \"path\" \"{}\" }} }}",
            install.root.display(),
            extra.display()
        ),
    );
    install.write("steamapps/appmanifest_10.acf", &manifest("10", "Ten"));
    install.write("../games/steamapps/appmanifest_20.acf", &manifest("20", "Twenty"));

    let manager = install.manager();
    let mut store = ConfigStore::new();
    assert_eq!(manager.load_all_apps(&mut store).await.unwrap(), 2);
    assert_eq!(app_ids(&store), vec!["10", "20"]);
}

#[tokio::test]
async fn save_apps_writes_each_manifest() {
    let install = Install::new();
    install.write("steamapps/appmanifest_10.acf", &manifest("10", "Ten"));
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::AppManifests]).await.unwrap();

    if let Some(Node::Table(state)) = store.apps[0].data.get_mut("AppState") {
        state.insert("name".into(), Node::from("Renamed"));
    }
    manager.save_apps(&mut store).await.unwrap();

    let tree = install.read_tree("steamapps/appmanifest_10.acf");
    assert_eq!(tree["AppState"].get("name"), Some(&Node::from("Renamed")));

    fs::remove_file(install.path("steamapps/appmanifest_10.acf")).unwrap();
    let err = manager.save_apps(&mut store).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn library_folders_lose_stats_noise() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::LibraryFolders]).await.unwrap();
    let folders = store.libraryfolders.as_ref().unwrap()["libraryfolders"]
        .as_table()
        .unwrap();
    assert!(folders.is_empty());
}

#[tokio::test]
async fn shortcuts_round_trip_through_save() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager
        .load(&mut store, &[FileKind::Shortcuts, FileKind::LoginUsers])
        .await
        .unwrap();

    let shortcuts = store.users[ID64].shortcuts.as_ref().unwrap();
    let entry = shortcuts["shortcuts"].get("0").unwrap();
    assert_eq!(entry.get("IsHidden"), Some(&Node::Bool(false)));
    assert_eq!(entry.get("LastPlayTime"), Some(&Node::from("Never")));
    assert_eq!(entry.get("tags"), Some(&Node::List(vec![Node::from("favorite")])));

    manager.save(&mut store, &[FileKind::Shortcuts]).await.unwrap();
    let on_disk = fs::read(install.path(&format!("userdata/{SHORT_ID}/config/shortcuts.vdf"))).unwrap();
    assert_eq!(on_disk, shortcuts_bytes());
    assert!(decode_table(&on_disk).is_ok());
}

#[tokio::test]
async fn setting_edit_persists() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager
        .load(&mut store, &[FileKind::LocalConfig, FileKind::LoginUsers])
        .await
        .unwrap();

    let user = store.users.get_mut(ID64).unwrap();
    let mut tree = Node::Table(user.localconfig.take().unwrap());
    apply_setting(&mut tree, "PersonaStateDesired", "3").unwrap();
    if let Node::Table(t) = tree {
        user.localconfig = Some(t);
    }
    manager.save(&mut store, &[FileKind::LocalConfig]).await.unwrap();

    let tree = install.read_tree(&format!("userdata/{SHORT_ID}/config/localconfig.vdf"));
    assert_eq!(
        tree["UserLocalConfigStore"].get("friends").and_then(|f| f.get("PersonaStateDesired")),
        Some(&Node::from("3"))
    );
}

#[tokio::test]
async fn registry_file_on_linux_layout() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::Registry]).await.unwrap();
    let tree = Node::Table(store.registry.unwrap());
    assert_eq!(
        steamconf_steam::dot_get(&tree, "Registry.HKCU.Software.Valve.Steam.language"),
        Some(&Node::from("english"))
    );
}

#[tokio::test]
async fn registry_save_goes_through_registry_store() {
    let install = Install::new();
    let registry = std::sync::Arc::new(MemoryRegistry::with_values([
        ("language", Node::from("english")),
        ("SkinV4", Node::from("Default")),
    ]));

    struct Shared(std::sync::Arc<MemoryRegistry>);
    impl RegistryStore for Shared {
        fn get_value(&self, name: &str) -> Result<Option<Node>, steamconf_steam::SteamError> {
            self.0.get_value(name)
        }
        fn set_value(&self, name: &str, value: &Node) -> Result<(), steamconf_steam::SteamError> {
            self.0.set_value(name, value)
        }
    }

    let manager = ConfigManager::new(Paths::with_platform(&install.root, Platform::Windows))
        .with_registry(Box::new(Shared(registry.clone())));
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::Registry]).await.unwrap();

    let mut tree = Node::Table(store.registry.take().unwrap());
    apply_setting(&mut tree, "language", "german").unwrap();
    if let Node::Table(t) = tree {
        store.registry = Some(t);
    }
    manager.save(&mut store, &[FileKind::Registry]).await.unwrap();

    assert_eq!(registry.get_value("language").unwrap(), Some(Node::from("german")));
    assert_eq!(registry.get_value("SkinV4").unwrap(), Some(Node::from("Default")));
}

#[tokio::test]
async fn strip_on_load_prunes_config() {
    let install = Install::new();
    let manager = install.manager().with_options(LoadOptions {
        strip_on_load: true,
        append_apps: false,
    });
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::Config]).await.unwrap();
    let config = store.config.unwrap();
    assert!(config["InstallConfigStore"].as_table().unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_is_not_found_on_save() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();
    manager.load(&mut store, &[FileKind::Config]).await.unwrap();
    fs::remove_file(install.path("config/config.vdf")).unwrap();

    let err = manager.save(&mut store, &[FileKind::Config]).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn login_users_save_requires_a_loaded_list() {
    let install = Install::new();
    let manager = install.manager();
    let mut store = ConfigStore::new();

    let err = manager.save(&mut store, &[FileKind::LoginUsers]).await.unwrap_err();
    assert!(matches!(err, StoreError::NotLoaded(FileKind::LoginUsers)));
    assert_eq!(
        fs::read_to_string(install.path("config/loginusers.vdf")).unwrap(),
        LOGIN_USERS
    );

    manager.load(&mut store, &[FileKind::LoginUsers]).await.unwrap();
    manager.save(&mut store, &[FileKind::LoginUsers]).await.unwrap();
    let users = install.read_tree("config/loginusers.vdf");
    let entry = users["users"].get(ID64).unwrap();
    assert_eq!(entry.get("AccountName"), Some(&Node::from("gabe")));
}
