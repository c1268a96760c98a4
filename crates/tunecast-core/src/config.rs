use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// `player.app_name` value that picks the player from the OS version.
pub const AUTO_APP_NAME: &str = "auto";

/// Discord applications registered for each player, so the presence shows
/// the right app name and icon.
const MUSIC_CLIENT_ID: &str = "773825528921849856";
const ITUNES_CLIENT_ID: &str = "979297966739300416";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub player: PlayerConfig,
    pub presence: PresenceConfig,
    pub artwork: ArtworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Seconds between polls; also the worst-case staleness of the presence.
    pub poll_interval: u64,
    /// Seconds a single automation query may run.
    pub query_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Scripting name of the player, or `"auto"`.
    pub app_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Overrides the client ID chosen from `player.app_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub policy: SessionPolicy,
    pub show_paused: bool,
    pub large_image: String,
    pub large_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    pub enabled: bool,
    pub country: String,
    pub cache_limit: usize,
}

/// How the presence connection is held across listening sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Connect when playback starts; clear and close when it stops.
    #[default]
    PerSession,
    /// Connect once and show an explicit stopped card while idle.
    Persistent,
}

impl GeneralConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }
}

impl PlayerConfig {
    pub fn is_auto(&self) -> bool {
        self.app_name.eq_ignore_ascii_case(AUTO_APP_NAME)
    }

    /// Human-readable player name for fallback text.
    pub fn display_name(&self) -> &str {
        if self.is_auto() {
            return "Apple Music";
        }
        match self.app_name.as_str() {
            "Music" => "Apple Music",
            other => other,
        }
    }

    /// Discord client ID registered for this player.
    pub fn default_client_id(&self) -> &'static str {
        if self.app_name == "iTunes" {
            ITUNES_CLIENT_ID
        } else {
            MUSIC_CLIENT_ID
        }
    }
}

impl PresenceConfig {
    /// The configured client ID, or the one registered for `player`.
    pub fn client_id<'a>(&'a self, player: &PlayerConfig) -> &'a str {
        self.client_id
            .as_deref()
            .unwrap_or_else(|| player.default_client_id())
    }
}

impl AppConfig {
    /// Load config: the user file if it exists, else the built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::from_toml(DEFAULT_CONFIG)
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the run loop cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.general.poll_interval == 0 {
            return Err(CoreError::Config("poll_interval must be at least 1".into()));
        }
        if self.general.query_timeout == 0 {
            return Err(CoreError::Config("query_timeout must be at least 1".into()));
        }
        if self.player.app_name.trim().is_empty() {
            return Err(CoreError::Config("player.app_name must not be empty".into()));
        }
        if self
            .presence
            .client_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(CoreError::Config("presence.client_id must not be empty".into()));
        }
        Ok(())
    }

    /// Replace an `"auto"` player name with `detected`.
    pub fn resolve_player(&mut self, detected: &str) {
        if self.player.is_auto() {
            self.player.app_name = detected.to_string();
        }
    }

    /// Discord client ID to connect with.
    pub fn client_id(&self) -> &str {
        self.presence.client_id(&self.player)
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, Application Support on macOS).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory for logs and caches.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn log_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    pub fn artwork_cache_path() -> PathBuf {
        Self::data_dir().join("artwork-cache.json")
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "tunecast")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.general.poll_interval, 15);
        assert_eq!(config.general.query_timeout, 5);
        assert!(config.player.is_auto());
        assert_eq!(config.presence.client_id, None);
        assert_eq!(config.client_id(), "773825528921849856");
        assert_eq!(config.presence.policy, SessionPolicy::PerSession);
        assert!(config.presence.show_paused);
        assert!(!config.artwork.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = AppConfig::from_toml(&serialized).unwrap();
        assert_eq!(deserialized.general.poll_interval, config.general.poll_interval);
        assert_eq!(deserialized.presence.policy, config.presence.policy);
    }

    #[test]
    fn test_persistent_policy() {
        let content = DEFAULT_CONFIG.replace("\"per_session\"", "\"persistent\"");
        let config = AppConfig::from_toml(&content).unwrap();
        assert_eq!(config.presence.policy, SessionPolicy::Persistent);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let content = DEFAULT_CONFIG.replace("poll_interval = 15", "poll_interval = 0");
        let err = AppConfig::from_toml(&content).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.general.poll_interval = 30;
        config.player.app_name = "iTunes".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.general.poll_interval, 30);
        assert_eq!(loaded.general.poll_interval(), Duration::from_secs(30));
        assert_eq!(loaded.player.display_name(), "iTunes");
        assert_eq!(loaded.presence.client_id, None);
        assert_eq!(loaded.client_id(), "979297966739300416");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_display_name() {
        let mut config = AppConfig::default();
        assert_eq!(config.player.display_name(), "Apple Music");
        config.resolve_player("Music");
        assert_eq!(config.player.display_name(), "Apple Music");
    }

    #[test]
    fn test_client_id_follows_player() {
        let content = DEFAULT_CONFIG.replace("app_name = \"auto\"", "app_name = \"iTunes\"");
        let config = AppConfig::from_toml(&content).unwrap();
        assert_eq!(config.player.app_name, "iTunes");
        assert_eq!(config.client_id(), "979297966739300416");

        let content = DEFAULT_CONFIG.replace("app_name = \"auto\"", "app_name = \"Music\"");
        let config = AppConfig::from_toml(&content).unwrap();
        assert_eq!(config.client_id(), "773825528921849856");
    }

    #[test]
    fn test_resolved_player_picks_client_id() {
        let mut config = AppConfig::default();
        config.resolve_player("iTunes");
        assert_eq!(config.player.app_name, "iTunes");
        assert_eq!(config.client_id(), "979297966739300416");

        // An explicit name is kept.
        config.resolve_player("Music");
        assert_eq!(config.player.app_name, "iTunes");
    }

    #[test]
    fn test_explicit_client_id_wins() {
        let mut config = AppConfig::default();
        config.resolve_player("iTunes");
        config.presence.client_id = Some("123".into());
        assert_eq!(config.client_id(), "123");

        config.presence.client_id = Some("  ".into());
        assert!(config.validate().is_err());
    }
}
