//! Post-load cleanup applied to freshly parsed files.
//!
//! The allow-list templates keep the settings worth carrying between
//! installs and drop caches, timestamps and credentials.

use steamconf_steam::text_vdf;
use steamconf_steam::{FileKind, Table, strip_to_allowlist};
use tracing::warn;

/// Noise fields Steam rewrites on every run.
const LIBRARY_NOISE: [&str; 2] = ["TimeNextStatsReport", "ContentStatsID"];

const CONFIG_TEMPLATE: &str = r#"
"InstallConfigStore"
{
	"Software"
	{
		"Valve"
		{
			"Steam"
			{
				"AutoUpdateWindowEnabled"		""
				"ShaderCacheManager"
				{
					"DisableShaderCache"		""
				}
				"Accounts"		"*"
				"NoSavePersonalInfo"		""
				"MaxServerBrowserPingsPerMin"		""
				"DownloadThrottleKbps"		""
				"AllowDownloadsDuringGameplay"		""
				"StreamingThrottleEnabled"		""
				"ClientBrowserAuth"		""
			}
		}
	}
	"Music"
	{
		"MusicVolume"		""
		"CrawlSteamInstallFolders"		""
		"PauseOnVoiceChat"		""
		"PlaylistNowPlayingNotification"		""
		"MusicPlayerVisible"		""
	}
	"CSettingsPanelGameController.Timeout"		""
}
"#;

const LOCALCONFIG_TEMPLATE: &str = r#"
"UserLocalConfigStore"
{
	"broadcast"
	{
		"Permissions"		""
		"FirstTimeComplete"		""
		"MaxKbps"		""
		"OutputWidth"		""
		"OutputHeight"		""
		"EncoderSetting"		""
		"IncludeDesktop"		""
		"RecordSystemAudio"		""
		"RecordMic"		""
		"ShowDebugInfo"		""
		"ShowReminder"		""
		"ShowChat"		""
	}
	"ParentalSettings"
	{
		"settings"		""
		"Signature"		""
	}
	"friends"
	{
		"VoiceReceiveVolume"		""
		"Notifications_ShowIngame"		""
		"Notifications_ShowOnline"		""
		"Notifications_ShowMessage"		""
		"Notifications_EventsAndAnnouncements"		""
		"Sounds_PlayIngame"		""
		"Sounds_PlayOnline"		""
		"Sounds_PlayMessage"		""
		"Sounds_EventsAndAnnouncements"		""
		"AutoSignIntoFriends"		""
		"ShowTimeInChatLogCheck"		""
		"AlwaysNewChatWindow"		""
		"ChatFlashMode"		""
		"PersonaStateDesired"		""
		"ShowAvatars"		""
	}
	"StartupState.Friends"		""
	"News"
	{
		"NotifyAvailableGames"		""
	}
	"HideSharingNotifications"		""
	"LastInstallFolderIndex"		""
	"system"
	{
		"EnableGameOverlay"		""
		"InGameOverlayShortcutKey"		""
		"InGameOverlayScreenshotNotification"		""
		"InGameOverlayScreenshotPlaySound"		""
		"InGameOverlayScreenshotSaveUncompressed"		""
		"InGameOverlayShowFPSContrast"		""
		"InGameOverlayShowFPSCorner"		""
		"InGameOverlayScreenshotHotKey"		""
		"NavUrlBar"		""
		"displayratesasbits"		""
		"UsePushToTalk"		""
		"PushToTalkKey"		""
		"GameOverlayHomePage"		""
	}
	"offline"
	{
		"Ticket"		""
		"Signature"		""
	}
	"streaming_v2"
	{
		"EnableStreaming"		""
	}
}
"#;

const REGISTRY_TEMPLATE: &str = r#"
"Registry"
{
	"HKCU"
	{
		"Software"
		{
			"Valve"
			{
				"Steam"
				{
					"AutoLoginUser"		""
					"RememberPassword"		""
					"AlreadyRetriedOfflineMode"		""
					"language"		""
					"StartupMode"		""
					"SkinV4"		""
				}
			}
		}
	}
}
"#;

const SHAREDCONFIG_TEMPLATE: &str = r#"
"UserRoamingConfigStore"
{
	"Software"
	{
		"Valve"
		{
			"Steam"
			{
				"Apps"		"*"
				"SteamDefaultDialog"		""
				"DesktopShortcutCheck"		""
				"StartMenuShortcutCheck"		""
			}
		}
	}
	"Web"		"*"
	"controller_config"		"*"
}
"#;

/// Returns the allow-list template for `kind`, if it has one.
pub fn template(kind: FileKind) -> Option<Table> {
    let source = match kind {
        FileKind::Config => CONFIG_TEMPLATE,
        FileKind::LocalConfig => LOCALCONFIG_TEMPLATE,
        FileKind::Registry => REGISTRY_TEMPLATE,
        FileKind::SharedConfig => SHAREDCONFIG_TEMPLATE,
        _ => return None,
    };

    match text_vdf::parse(source) {
        Ok(table) => Some(table),
        Err(e) => {
            warn!(%kind, error = %e, "allow-list template does not parse");
            None
        }
    }
}

/// Prunes `tree` to the template for `kind`. Kinds without a template pass through.
pub fn strip(kind: FileKind, tree: Table) -> Table {
    match template(kind) {
        Some(template) => strip_to_allowlist(&tree, &template),
        None => tree,
    }
}

/// Removes the stats bookkeeping fields from a library-folders tree.
///
/// Both the old `LibraryFolders` and the current `libraryfolders` root
/// keys are handled.
pub fn clean_library_folders(tree: &mut Table) {
    for root in ["LibraryFolders", "libraryfolders"] {
        if let Some(folders) = tree.get_mut(root).and_then(|n| n.as_table_mut()) {
            for key in LIBRARY_NOISE {
                folders.shift_remove(key);
            }
        }
    }
}
