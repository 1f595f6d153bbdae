//! Known client settings, validated before they are written into a tree.

use steamconf_steam::{FileKind, Node, dot_set};

use crate::error::StoreError;

/// Client UI languages accepted for `language`.
pub const LANGUAGES: &[&str] = &[
    "bulgarian", "czech", "danish", "dutch", "english", "finnish", "french", "german", "greek",
    "hungarian", "italian", "japanese", "koreana", "norwegian", "polish", "portuguese", "russian",
    "romanian", "spanish", "swedish", "thai", "turkish", "ukrainian", "brazilian", "schinese",
    "tchinese",
];

/// Persona states a user can pick, keyed by the stored value.
pub const PERSONA_STATES: &[(&str, &str)] = &[
    ("0", "Offline"),
    ("1", "Online"),
    ("2", "Busy"),
    ("3", "Away"),
    ("5", "Looking to Trade"),
    ("6", "Looking to Play"),
];

/// What values a setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    /// `"0"` or `"1"`.
    Boolean,
    /// Any string.
    String,
    /// A decimal integer.
    Number,
    /// One of a fixed list.
    List(&'static [&'static str]),
    /// One of the keys of a fixed key/label table.
    KeyedChoice(&'static [(&'static str, &'static str)]),
}

impl SettingType {
    fn accepts(&self, value: &str) -> bool {
        match self {
            SettingType::Boolean => value == "0" || value == "1",
            SettingType::String => true,
            SettingType::Number => value.parse::<i64>().is_ok(),
            SettingType::List(allowed) => allowed.iter().any(|a| *a == value),
            SettingType::KeyedChoice(choices) => choices.iter().any(|(key, _)| *key == value),
        }
    }
}

/// A setting and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct Setting {
    pub name: &'static str,
    pub kind: FileKind,
    pub value_type: SettingType,
    /// Dot path from the root of the owning file's tree.
    pub path: &'static str,
}

pub const SETTINGS: &[Setting] = &[
    Setting {
        name: "language",
        kind: FileKind::Registry,
        value_type: SettingType::List(LANGUAGES),
        path: "Registry.HKCU.Software.Valve.Steam.language",
    },
    Setting {
        name: "AutoLoginUser",
        kind: FileKind::Registry,
        value_type: SettingType::String,
        path: "Registry.HKCU.Software.Valve.Steam.AutoLoginUser",
    },
    Setting {
        name: "SkinV4",
        kind: FileKind::Registry,
        value_type: SettingType::String,
        path: "Registry.HKCU.Software.Valve.Steam.SkinV4",
    },
    Setting {
        name: "RememberPassword",
        kind: FileKind::Registry,
        value_type: SettingType::Boolean,
        path: "Registry.HKCU.Software.Valve.Steam.RememberPassword",
    },
    Setting {
        name: "AlreadyRetriedOfflineMode",
        kind: FileKind::Registry,
        value_type: SettingType::Boolean,
        path: "Registry.HKCU.Software.Valve.Steam.AlreadyRetriedOfflineMode",
    },
    Setting {
        name: "LastInstallFolderIndex",
        kind: FileKind::LocalConfig,
        value_type: SettingType::Number,
        path: "UserLocalConfigStore.LastInstallFolderIndex",
    },
    Setting {
        name: "PersonaStateDesired",
        kind: FileKind::LocalConfig,
        value_type: SettingType::KeyedChoice(PERSONA_STATES),
        path: "UserLocalConfigStore.friends.PersonaStateDesired",
    },
];

/// Looks up a setting by name.
pub fn find_setting(name: &str) -> Option<&'static Setting> {
    SETTINGS.iter().find(|s| s.name == name)
}

/// Validates `value` for the setting `name` and writes it into `tree`.
///
/// The path must already exist in `tree`; nothing is created.
pub fn apply_setting(tree: &mut Node, name: &str, value: &str) -> Result<(), StoreError> {
    let setting = find_setting(name)
        .ok_or_else(|| StoreError::InvalidArgument(format!("unknown setting '{name}'")))?;

    if !setting.value_type.accepts(value) {
        return Err(StoreError::InvalidArgument(format!(
            "'{value}' is not a valid value for {name}"
        )));
    }

    if !dot_set(tree, setting.path, Node::from(value)) {
        return Err(StoreError::InvalidArgument(format!(
            "{name} is not present in the loaded {}",
            setting.kind
        )));
    }
    Ok(())
}
