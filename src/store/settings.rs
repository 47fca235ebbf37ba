//! Settings store (`settings.json`)
//!
//! Field names match the original file format so existing settings files
//! keep working. The theme string is stored opaquely for the UI client.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StoreError;

fn default_num_keys() -> u8 {
    1
}

fn default_theme() -> String {
    "light".to_string()
}

/// Persisted daemon settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Number of keys captured per session (1 or 2)
    #[serde(rename = "numKeys", default = "default_num_keys")]
    pub num_keys: u8,

    /// Current toggle hotkey, if one has been captured
    #[serde(rename = "toggleHotkey", default)]
    pub toggle_hotkey: Option<String>,

    /// Theme name for the UI client; not interpreted by the daemon
    #[serde(rename = "current_theme", default = "default_theme")]
    pub current_theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_keys: default_num_keys(),
            toggle_hotkey: None,
            current_theme: default_theme(),
        }
    }
}

/// Store for the settings file
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults
    pub fn load(&self) -> Result<Settings, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "settings file missing, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut settings: Settings =
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                path: self.path.display().to_string(),
                source,
            })?;

        // A hand-edited count of 0 would start a capture session that
        // can never complete
        settings.num_keys = settings.num_keys.clamp(1, 2);

        Ok(settings)
    }

    /// Write settings, replacing the whole file
    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string_pretty(settings).map_err(|source| StoreError::Malformed {
                path: self.path.display().to_string(),
                source,
            })?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.num_keys, 1);
        assert_eq!(settings.current_theme, "light");
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let settings = Settings {
            num_keys: 2,
            toggle_hotkey: Some("f6".to_string()),
            current_theme: "dark".to_string(),
        };
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_original_field_names_accepted() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        std::fs::write(
            store.path(),
            r#"{"numKeys": 2, "toggleHotkey": "f6", "current_theme": "matrix"}"#,
        )
        .unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.num_keys, 2);
        assert_eq!(settings.toggle_hotkey.as_deref(), Some("f6"));
        assert_eq!(settings.current_theme, "matrix");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        std::fs::write(store.path(), r#"{"numKeys": 2}"#).unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.num_keys, 2);
        assert_eq!(settings.toggle_hotkey, None);
        assert_eq!(settings.current_theme, "light");
    }

    #[test]
    fn test_out_of_range_num_keys_clamped() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        std::fs::write(store.path(), r#"{"numKeys": 0}"#).unwrap();
        assert_eq!(store.load().unwrap().num_keys, 1);

        std::fs::write(store.path(), r#"{"numKeys": 9}"#).unwrap();
        assert_eq!(store.load().unwrap().num_keys, 2);
    }

    #[test]
    fn test_malformed_settings_error() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        std::fs::write(store.path(), "[1,2,3").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
    }
}
