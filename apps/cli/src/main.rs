//! steamconf command-line entry point.

mod args;

use std::path::PathBuf;

use anyhow::{Context, bail};
use serde_json::{Map, Value, json};
use steamconf_steam::{FileKind, Node, Paths, detect_root, validate_root};
use steamconf_store::config::config_dir;
use steamconf_store::{ConfigManager, ConfigStore, LoadOptions, ToolConfig, apply_setting, find_setting, read_kind_file};
use steamconf_webcache::{CacheDescriptor, request_tags};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command, USAGE};

/// Kinds that are loaded when none are named.
const DEFAULT_KINDS: [FileKind; 7] = [
    FileKind::Registry,
    FileKind::LoginUsers,
    FileKind::Config,
    FileKind::LibraryFolders,
    FileKind::LocalConfig,
    FileKind::SharedConfig,
    FileKind::Shortcuts,
];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = ToolConfig::load();
    tracing::debug!(?config, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: ToolConfig) -> anyhow::Result<()> {
    match &args.command {
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Command::Dump { kind, path } => {
            let kind = match kind {
                Some(kind) => *kind,
                None => FileKind::identify(path)?,
            };
            let value = read_kind_file(kind, path).await?;
            return print_json(&value);
        }
        Command::Tags { force } => return tags(&config, *force).await,
        _ => {}
    }

    let manager = open_manager(&args, &config)?;
    let mut store = ConfigStore::new();
    if let Some(user) = args.user.as_ref().or(config.user.as_ref()) {
        store.select_user(user)?;
    }

    match args.command {
        Command::Show(kinds) => {
            let kinds = if kinds.is_empty() { DEFAULT_KINDS.to_vec() } else { kinds };
            manager.load(&mut store, &kinds).await?;
            print_json(&serde_json::to_value(&store)?)
        }
        Command::Users => {
            load_users(&manager, &mut store).await?;
            let current = store.current_user().ok().map(|u| u.id64.clone());
            for user in store.users.values() {
                let marker = if current.as_deref() == Some(user.id64.as_str()) { "*" } else { " " };
                println!(
                    "{marker} {}  {:>10}  {}  {}",
                    user.id64,
                    user.account_id,
                    user.field("AccountName").unwrap_or("-"),
                    user.field("PersonaName").unwrap_or("-"),
                );
            }
            Ok(())
        }
        Command::Apps => {
            let count = manager.load_all_apps(&mut store).await?;
            tracing::info!(count, "app manifests loaded");
            for app in &store.apps {
                let name = app
                    .data
                    .get("AppState")
                    .and_then(|s| s.get("name"))
                    .and_then(Node::as_str)
                    .unwrap_or("-");
                println!(
                    "{:>10}  {name}  ({})",
                    app.app_id().unwrap_or_default(),
                    app.library.display()
                );
            }
            Ok(())
        }
        Command::Set { name, value } => set(&manager, &mut store, &name, &value).await,
        Command::Backup(path) => backup(&manager, &mut store, path).await,
        Command::Help | Command::Dump { .. } | Command::Tags { .. } => Ok(()),
    }
}

fn open_manager(args: &Args, config: &ToolConfig) -> anyhow::Result<ConfigManager> {
    let root = match args.root.clone().or_else(|| config.root.clone()) {
        Some(root) => root,
        None => detect_root().context("could not find a Steam installation; pass --root")?,
    };
    validate_root(&root)?;
    tracing::info!(root = %root.display(), "using Steam installation");

    let options = LoadOptions {
        strip_on_load: args.strip || config.strip_on_load,
        append_apps: args.append || config.append_apps,
    };
    Ok(ConfigManager::new(Paths::with_base(root)?).with_options(options))
}

/// Loads the user list, and the registry when it is readable so the
/// auto-login user can be detected.
async fn load_users(manager: &ConfigManager, store: &mut ConfigStore) -> anyhow::Result<()> {
    if let Err(e) = manager.load(store, &[FileKind::Registry]).await {
        tracing::warn!(error = %e, "registry not loaded, user detection may be limited");
    }
    manager.load(store, &[FileKind::LoginUsers]).await?;
    Ok(())
}

async fn set(manager: &ConfigManager, store: &mut ConfigStore, name: &str, value: &str) -> anyhow::Result<()> {
    let Some(setting) = find_setting(name) else {
        bail!("unknown setting '{name}'");
    };

    load_users(manager, store).await?;
    manager.load(store, &[setting.kind]).await?;

    let slot = match setting.kind {
        FileKind::Registry => &mut store.registry,
        FileKind::LocalConfig => {
            let id64 = store.current_user()?.id64.clone();
            let user = store
                .users
                .get_mut(&id64)
                .with_context(|| format!("user {id64} disappeared"))?;
            &mut user.localconfig
        }
        other => bail!("settings in {other} are not supported"),
    };

    let tree = slot.take().with_context(|| format!("{} was not loaded", setting.kind))?;
    let mut node = Node::Table(tree);
    let applied = apply_setting(&mut node, name, value);
    if let Node::Table(tree) = node {
        *slot = Some(tree);
    }
    applied?;

    manager.save(store, &[setting.kind]).await?;
    tracing::info!(setting = name, value, "setting saved");
    Ok(())
}

async fn backup(manager: &ConfigManager, store: &mut ConfigStore, path: PathBuf) -> anyhow::Result<()> {
    manager.load(store, &DEFAULT_KINDS).await?;
    manager.load_all_apps(store).await?;

    let mut users = Map::new();
    for user in store.users.values() {
        users.insert(
            user.id64.clone(),
            json!({
                "localconfig": user.localconfig,
                "sharedconfig": user.sharedconfig,
                "shortcuts": user.shortcuts,
            }),
        );
    }

    let backup = json!({
        "registry": store.registry,
        "config": store.config,
        "libraryfolders": store.libraryfolders,
        "loginusers": store.strip_users(),
        "users": Value::Object(users),
        "apps": store.strip_apps(),
    });

    tokio::fs::write(&path, serde_json::to_string_pretty(&backup)?)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "backup written");
    Ok(())
}

async fn tags(config: &ToolConfig, force: bool) -> anyhow::Result<()> {
    let folder = config
        .cache_dir
        .clone()
        .or_else(|| config_dir().map(|dir| dir.join("steamconf").join("cache")));
    let cache = CacheDescriptor::new(config.cache_enabled, folder, "tags.json");

    let client = reqwest::Client::new();
    for tag in request_tags(&client, force, &cache).await? {
        println!("{:>6}  {}", tag.tagid, tag.name);
    }
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
