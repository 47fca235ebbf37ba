//! Configuration loading and management

use std::path::PathBuf;

use anyhow::Result;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Path to the preset store file
    pub presets_path: PathBuf,

    /// Path to the settings file
    pub settings_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("keyhold");

        Ok(Self {
            socket_path: data_dir.join("daemon.sock"),
            presets_path: data_dir.join("key_presets.json"),
            settings_path: data_dir.join("settings.json"),
            data_dir,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load().unwrap();
        assert!(config.socket_path.to_string_lossy().contains("keyhold"));
        assert_eq!(config.presets_path.parent(), config.socket_path.parent());
        assert!(config
            .settings_path
            .to_string_lossy()
            .ends_with("settings.json"));
    }
}
