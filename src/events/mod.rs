//! Events emitted by the controller during capture and toggling
//!
//! Subscribed IPC clients receive these as push notifications; the GUI
//! renders them as its feedback text.

use serde::{Deserialize, Serialize};

/// Events emitted by the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// A hotkey capture session started
    HotkeyCaptureStarted,

    /// The toggle hotkey was captured and assigned
    HotkeyCaptured { hotkey: String },

    /// A key capture session started
    KeyCaptureStarted { target: usize },

    /// One key was captured during a key capture session
    KeyCaptured {
        key: String,
        captured: usize,
        target: usize,
    },

    /// The key capture session completed with the full key set
    KeysCaptureComplete { keys: Vec<String> },

    /// The held key set was pressed
    KeysHeld { keys: Vec<String> },

    /// The held key set was released
    KeysReleased { keys: Vec<String> },

    /// A preset was saved
    PresetSaved { name: String },

    /// A preset was loaded into the active hotkey and key set
    PresetLoaded { name: String },

    /// A preset was deleted
    PresetDeleted { name: String },

    /// A user-input error; the operation was aborted, state unchanged
    InputError { message: String },
}

impl std::fmt::Display for StateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateEvent::HotkeyCaptureStarted => write!(f, "Press the hotkey..."),
            StateEvent::HotkeyCaptured { hotkey } => write!(f, "Hotkey captured: {hotkey}"),
            StateEvent::KeyCaptureStarted { target } => {
                write!(f, "Press the key(s) to hold ({target})")
            }
            StateEvent::KeyCaptured { key, captured, target } => {
                write!(f, "Key captured: {key} ({captured}/{target})")
            }
            StateEvent::KeysCaptureComplete { keys } => {
                write!(f, "Keys to hold: {}", keys.join(", "))
            }
            StateEvent::KeysHeld { .. } => write!(f, "Keys state: Pressed"),
            StateEvent::KeysReleased { .. } => write!(f, "Keys state: Released"),
            StateEvent::PresetSaved { name } => write!(f, "Preset saved: {name}"),
            StateEvent::PresetLoaded { name } => write!(f, "Preset loaded: {name}"),
            StateEvent::PresetDeleted { name } => write!(f, "Preset deleted: {name}"),
            StateEvent::InputError { message } => write!(f, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StateEvent::KeyCaptured {
            key: "space".to_string(),
            captured: 1,
            target: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("key_captured"));
        assert!(json.contains("space"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"keys_held","keys":["a","b"]}"#;
        let event: StateEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, StateEvent::KeysHeld { .. }));
    }

    #[test]
    fn test_display_feedback_text() {
        let event = StateEvent::KeysCaptureComplete {
            keys: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(event.to_string(), "Keys to hold: a, b");
    }
}
