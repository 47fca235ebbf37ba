//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian
//! length. Requests map 1:1 to the buttons of the GUI client.

use serde::{Deserialize, Serialize};

use crate::events::StateEvent;
use crate::state::StatusSnapshot;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to state event notifications
    Subscribe,

    /// Arm a one-shot hotkey capture
    CaptureHotkey,

    /// Start a key capture session for the configured key count
    CaptureKeys,

    /// Set how many keys a capture session collects (1 or 2)
    SetKeyCount { count: u8 },

    /// Persist the UI theme string
    SetTheme { theme: String },

    /// Save the current hotkey and key set as a named preset
    SavePreset { name: String },

    /// Load a named preset into the active hotkey and key set
    LoadPreset { name: String },

    /// Delete a named preset
    DeletePreset { name: String },

    /// List stored preset names
    ListPresets,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Operation accepted
    Ok,

    /// Stored preset names
    Presets { names: Vec<String> },

    /// Error response; `code` is stable, `message` is for display
    Error { code: String, message: String },
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A controller event occurred
    StateEvent { event: StateEvent, feedback: String },
}

impl Notification {
    pub fn from_event(event: StateEvent) -> Self {
        let feedback = event.to_string();
        Self::StateEvent { event, feedback }
    }
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Capture state label: idle, capturing_hotkey, capturing_keys
    pub capture: String,

    /// Whether the key set is currently held
    pub held: bool,

    /// Current toggle hotkey, if captured
    pub hotkey: Option<String>,

    /// Keys held when toggled, in capture order
    pub keys_to_hold: Vec<String>,

    /// Configured capture key count
    pub num_keys: u8,

    /// Theme string stored for the UI
    pub theme: String,

    /// Whether the global keyboard hook is running
    pub hook_running: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl DaemonStatus {
    /// Build a status from a controller snapshot
    pub fn from_snapshot(snapshot: StatusSnapshot, hook_running: bool, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            capture: snapshot.capture.to_string(),
            held: snapshot.held,
            hotkey: snapshot.hotkey,
            keys_to_hold: snapshot.keys_to_hold,
            num_keys: snapshot.num_keys,
            theme: snapshot.theme,
            hook_running,
            uptime_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::SavePreset {
            name: "walk".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("save_preset"));
        assert!(json.contains("walk"));
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"type":"set_key_count","count":2}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(req, Request::SetKeyCount { count: 2 }));
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Error {
            code: "not_found".to_string(),
            message: "preset not found: walk".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("not_found"));
    }

    #[test]
    fn test_notification_carries_feedback_text() {
        let notif = Notification::from_event(StateEvent::HotkeyCaptured {
            hotkey: "f6".to_string(),
        });
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("hotkey_captured"));
        assert!(json.contains("Hotkey captured: f6"));
    }
}
