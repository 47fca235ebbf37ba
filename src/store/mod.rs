//! Persistence for presets and settings
//!
//! Both stores are whole-file JSON documents, read and rewritten in full
//! on every mutation. A single-user local daemon needs neither locking
//! nor partial updates.

mod presets;
mod settings;

pub use presets::{Preset, PresetStore};
pub use settings::{Settings, SettingsStore};

/// Errors from the preset and settings stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("preset not found: {0}")]
    NotFound(String),

    /// Corrupt store files fail loudly; silently defaulting would clobber
    /// the user's saved presets on the next write.
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
