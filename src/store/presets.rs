//! Preset store (`key_presets.json`)
//!
//! Canonical form is a name-keyed object of `{"hotkey": ..., "keys": [...]}`
//! records. Files written by older builds may instead key entries by the
//! hotkey itself with a bare key array as the value; those are accepted on
//! read and rewritten canonically the next time the entry is saved.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::hotkey::keys;

use super::StoreError;

/// A saved hotkey / key-set pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Toggle hotkey name
    pub hotkey: String,
    /// Keys held when toggled, in capture order
    pub keys: Vec<String>,
}

/// One entry as stored on disk, either canonical or legacy form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredPreset {
    Named { hotkey: String, keys: Vec<String> },
    /// Legacy: entry keyed by the hotkey, value is the bare key list
    Legacy(Vec<String>),
}

impl StoredPreset {
    /// Resolve to a normalized [`Preset`]; `key` is the entry's map key,
    /// which in the legacy form doubles as the hotkey.
    fn resolve(self, key: &str) -> Preset {
        let (hotkey, keys) = match self {
            StoredPreset::Named { hotkey, keys } => (hotkey, keys),
            StoredPreset::Legacy(keys) => (key.to_string(), keys),
        };
        Preset {
            hotkey: keys::normalize(&hotkey).to_string(),
            keys: keys
                .iter()
                .map(|k| keys::normalize(k).to_string())
                .collect(),
        }
    }
}

/// Store of named presets backed by one JSON file
pub struct PresetStore {
    path: PathBuf,
}

impl PresetStore {
    /// Create a store rooted at `path`; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save or overwrite the preset stored under `name`
    pub fn save(&self, name: &str, preset: &Preset) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(
            name.to_string(),
            StoredPreset::Named {
                hotkey: preset.hotkey.clone(),
                keys: preset.keys.clone(),
            },
        );
        self.write_all(&entries)?;
        info!(name, hotkey = %preset.hotkey, "preset saved");
        Ok(())
    }

    /// Load the preset stored under `name`
    pub fn load(&self, name: &str) -> Result<Preset, StoreError> {
        let mut entries = self.read_all()?;
        entries
            .remove(name)
            .map(|stored| stored.resolve(name))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Delete the preset stored under `name`.
    ///
    /// An unknown name reports not-found without rewriting the file.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.write_all(&entries)?;
        info!(name, "preset deleted");
        Ok(())
    }

    /// Names of all stored presets, sorted
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all()?.into_keys().collect())
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredPreset>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Missing file reads as an empty store
                debug!(path = %self.path.display(), "preset file missing, treating as empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, StoredPreset>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Malformed {
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

    fn store_in(dir: &tempfile::TempDir) -> PresetStore {
        PresetStore::new(dir.path().join("key_presets.json"))
    }

    fn sample() -> Preset {
        Preset {
            hotkey: "f6".to_string(),
            keys: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.save("walk", &sample()).unwrap();
        let loaded = store.load("walk").unwrap();

        assert_eq!(loaded.hotkey, "f6");
        assert_eq!(loaded.keys, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.names().unwrap().is_empty());
        assert!(matches!(
            store.load("nothing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_object_matches_missing_file() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{}").unwrap();

        assert!(store.names().unwrap().is_empty());
        assert!(matches!(
            store.load("nothing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_missing_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save("walk", &sample()).unwrap();

        let before = std::fs::read(store.path()).unwrap();
        assert!(matches!(
            store.delete("no_such"),
            Err(StoreError::NotFound(_))
        ));
        let after = std::fs::read(store.path()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_delete_removes_entry() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save("walk", &sample()).unwrap();

        store.delete("walk").unwrap();
        assert!(matches!(store.load("walk"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_malformed_json_fails_loudly() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(
            store.load("walk"),
            Err(StoreError::Malformed { .. })
        ));
        // Saving must also refuse rather than clobber the corrupt file
        assert!(matches!(
            store.save("walk", &sample()),
            Err(StoreError::Malformed { .. })
        ));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn test_legacy_hotkey_keyed_entries_load() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"f6": ["Key.space", "a"]}"#).unwrap();

        let loaded = store.load("f6").unwrap();
        assert_eq!(loaded.hotkey, "f6");
        assert_eq!(loaded.keys, vec!["space", "a"]);
    }

    #[test]
    fn test_legacy_names_normalized_on_load() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"walk": {"hotkey": "Key.f6", "keys": ["Key.space"]}}"#,
        )
        .unwrap();

        let loaded = store.load("walk").unwrap();
        assert_eq!(loaded.hotkey, "f6");
        assert_eq!(loaded.keys, vec!["space"]);
    }

    #[test]
    fn test_names_sorted() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.save("b", &sample()).unwrap();
        store.save("a", &sample()).unwrap();

        assert_eq!(store.names().unwrap(), vec!["a", "b"]);
    }
}
