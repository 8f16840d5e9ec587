use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CapdeckResult;
use crate::permissions::{Permission, PermissionState};

const SETTINGS_FILE: &str = "settings.json";

fn default_permission_timeout() -> u64 {
    60
}

fn default_screen_timeout() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

/// User settings, persisted as JSON in the config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds to wait for a permission prompt before treating it as denied.
    #[serde(default = "default_permission_timeout")]
    pub permission_timeout_secs: u64,
    /// Seconds a secondary screen may stay open before it is cancelled.
    #[serde(default = "default_screen_timeout")]
    pub screen_timeout_secs: u64,
    /// Replace the built-in catalog with this YAML/JSON file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Starting permission states, applied before the host is consulted.
    #[serde(default)]
    pub seed_permissions: BTreeMap<Permission, PermissionState>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            permission_timeout_secs: default_permission_timeout(),
            screen_timeout_secs: default_screen_timeout(),
            catalog_path: None,
            seed_permissions: BTreeMap::new(),
            log_level: default_log_level(),
            path: PathBuf::new(),
        }
    }
}

impl Settings {
    /// `<config dir>/capdeck`, falling back to the working directory.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capdeck")
    }

    pub fn load(config_dir: &Path) -> CapdeckResult<Self> {
        let path = config_dir.join(SETTINGS_FILE);
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let mut settings: Settings = serde_json::from_str(&data)?;
            settings.path = path;
            Ok(settings)
        } else {
            Ok(Settings {
                path,
                ..Settings::default()
            })
        }
    }

    pub fn save(&self) -> CapdeckResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    pub fn permission_timeout(&self) -> Duration {
        Duration::from_secs(self.permission_timeout_secs)
    }

    pub fn screen_timeout(&self) -> Duration {
        Duration::from_secs(self.screen_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.permission_timeout(), Duration::from_secs(60));
        assert_eq!(settings.screen_timeout(), Duration::from_secs(300));
        assert_eq!(settings.log_level, "info");
        assert!(settings.catalog_path.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load(dir.path()).unwrap();
        settings.permission_timeout_secs = 5;
        settings
            .seed_permissions
            .insert(Permission::CallPhone, PermissionState::Granted);
        settings.save().unwrap();

        let loaded = Settings::load(dir.path()).unwrap();
        assert_eq!(loaded.permission_timeout_secs, 5);
        assert_eq!(
            loaded.seed_permissions.get(&Permission::CallPhone),
            Some(&PermissionState::Granted)
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{ "screen_timeout_secs": 10, "seed_permissions": { "android.permission.CAMERA": "denied" } }"#,
        )
        .unwrap();

        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.screen_timeout_secs, 10);
        assert_eq!(settings.permission_timeout_secs, 60);
        assert_eq!(
            settings.seed_permissions.get(&Permission::Camera),
            Some(&PermissionState::Denied)
        );
    }
}
