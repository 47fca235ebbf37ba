//! Controller state machine
//!
//! Drives the capture/toggle/persist cycle: capture sessions collect key
//! names from the global hook, the toggle hotkey flips the hold state,
//! and presets/settings are written through the stores on explicit
//! operations only.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::events::StateEvent;
use crate::hotkey::{KeyEvent, KeyInjector};
use crate::store::{Preset, PresetStore, Settings, SettingsStore, StoreError};

/// Capture session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// No capture in progress; hotkey presses toggle the hold state
    Idle,
    /// One-shot: the next recognized key becomes the toggle hotkey
    CapturingHotkey,
    /// Collecting distinct keys until `captured` reaches `target`
    CapturingKeys {
        target: usize,
        captured: Vec<String>,
    },
}

impl CaptureState {
    /// Short name for status reporting
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::CapturingHotkey => "capturing_hotkey",
            CaptureState::CapturingKeys { .. } => "capturing_keys",
        }
    }
}

/// Whether the key set is currently held down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    Released,
    Held,
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldState::Released => write!(f, "Released"),
            HoldState::Held => write!(f, "Held"),
        }
    }
}

/// Errors reported back to the requesting IPC client
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("no keys or hotkey to save")]
    EmptyCapture,

    #[error("preset name must not be empty")]
    EmptyName,

    #[error("key count must be 1 or 2, got {0}")]
    BadKeyCount(u8),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl UserError {
    /// Stable error code for the IPC protocol
    pub fn code(&self) -> &'static str {
        match self {
            UserError::EmptyCapture => "empty_capture",
            UserError::EmptyName => "empty_name",
            UserError::BadKeyCount(_) => "bad_key_count",
            UserError::Store(StoreError::NotFound(_)) => "not_found",
            UserError::Store(StoreError::Malformed { .. }) => "malformed_store",
            UserError::Store(StoreError::Io(_)) => "io",
        }
    }
}

/// Point-in-time view of the controller for status queries
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub capture: &'static str,
    pub held: bool,
    pub hotkey: Option<String>,
    pub keys_to_hold: Vec<String>,
    pub num_keys: u8,
    pub theme: String,
}

/// Commands from the IPC server to the controller
#[derive(Debug)]
pub enum Command {
    GetStatus {
        reply: oneshot::Sender<StatusSnapshot>,
    },
    CaptureHotkey {
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    CaptureKeys {
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    SetKeyCount {
        count: u8,
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    SetTheme {
        theme: String,
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    SavePreset {
        name: String,
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    LoadPreset {
        name: String,
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    DeletePreset {
        name: String,
        reply: oneshot::Sender<Result<(), UserError>>,
    },
    ListPresets {
        reply: oneshot::Sender<Result<Vec<String>, UserError>>,
    },
}

/// The controller owning capture state, hold state, and the stores
pub struct Controller<I: KeyInjector> {
    capture: CaptureState,
    hold: HoldState,
    hotkey: Option<String>,
    keys_to_hold: Vec<String>,
    settings: Settings,
    settings_store: SettingsStore,
    presets: PresetStore,
    injector: I,
    event_tx: broadcast::Sender<StateEvent>,
}

impl<I: KeyInjector> Controller<I> {
    /// Create a controller, loading persisted settings.
    ///
    /// A previously captured hotkey is restored from the settings file so
    /// toggling works across daemon restarts.
    pub fn new(
        presets: PresetStore,
        settings_store: SettingsStore,
        injector: I,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self, StoreError> {
        let settings = settings_store.load()?;
        // Files from the original tool store "" for "no hotkey"
        let hotkey = settings.toggle_hotkey.clone().filter(|h| !h.is_empty());

        Ok(Self {
            capture: CaptureState::Idle,
            hold: HoldState::default(),
            hotkey,
            keys_to_hold: Vec::new(),
            settings,
            settings_store,
            presets,
            injector,
            event_tx,
        })
    }

    pub fn capture_state(&self) -> &CaptureState {
        &self.capture
    }

    pub fn hold_state(&self) -> HoldState {
        self.hold
    }

    pub fn hotkey(&self) -> Option<&str> {
        self.hotkey.as_deref()
    }

    pub fn keys_to_hold(&self) -> &[String] {
        &self.keys_to_hold
    }

    /// Run the controller, consuming key events and IPC commands.
    ///
    /// Returns when the command channel closes (IPC server shut down).
    pub async fn run(
        &mut self,
        mut key_rx: mpsc::Receiver<KeyEvent>,
        mut cmd_rx: mpsc::Receiver<Command>,
    ) {
        info!("controller started in Idle state");

        loop {
            tokio::select! {
                // A closed key channel just means the hook never
                // started; commands still work.
                Some(event) = key_rx.recv() => {
                    self.handle_key(&event.name);
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
            }
        }

        info!("controller stopped");
    }

    /// Dispatch one IPC command
    pub fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::GetStatus { reply } => {
                let _ = reply.send(self.status());
            }
            Command::CaptureHotkey { reply } => {
                let _ = reply.send(self.begin_hotkey_capture());
            }
            Command::CaptureKeys { reply } => {
                let _ = reply.send(self.begin_key_capture());
            }
            Command::SetKeyCount { count, reply } => {
                let _ = reply.send(self.set_key_count(count));
            }
            Command::SetTheme { theme, reply } => {
                let _ = reply.send(self.set_theme(theme));
            }
            Command::SavePreset { name, reply } => {
                let _ = reply.send(self.save_preset(&name));
            }
            Command::LoadPreset { name, reply } => {
                let _ = reply.send(self.load_preset(&name));
            }
            Command::DeletePreset { name, reply } => {
                let _ = reply.send(self.delete_preset(&name));
            }
            Command::ListPresets { reply } => {
                let _ = reply.send(self.presets.names().map_err(UserError::from));
            }
        }
    }

    /// Handle one recognized key-down from the global hook
    pub fn handle_key(&mut self, name: &str) {
        match std::mem::replace(&mut self.capture, CaptureState::Idle) {
            CaptureState::CapturingHotkey => {
                // One-shot: assigning the field replaces any previous
                // binding, so the old trigger is released implicitly.
                self.hotkey = Some(name.to_string());
                self.persist_hotkey();
                info!(hotkey = name, "hotkey captured");
                self.emit(StateEvent::HotkeyCaptured {
                    hotkey: name.to_string(),
                });
            }
            CaptureState::CapturingKeys { target, mut captured } => {
                // Duplicates by normalized name leave the buffer unchanged
                if captured.iter().any(|k| k == name) {
                    debug!(key = name, "duplicate key ignored");
                    self.capture = CaptureState::CapturingKeys { target, captured };
                    return;
                }
                captured.push(name.to_string());
                let n = captured.len();
                info!(key = name, captured = n, target, "key captured");

                // Session auto-completes exactly on the Nth distinct key
                let complete = n == target;
                if complete {
                    self.keys_to_hold = captured;
                } else {
                    self.capture = CaptureState::CapturingKeys { target, captured };
                }

                self.emit(StateEvent::KeyCaptured {
                    key: name.to_string(),
                    captured: n,
                    target,
                });
                if complete {
                    info!(keys = ?self.keys_to_hold, "key capture complete");
                    self.emit(StateEvent::KeysCaptureComplete {
                        keys: self.keys_to_hold.clone(),
                    });
                }
            }
            CaptureState::Idle => {
                if self.hotkey.as_deref() == Some(name) {
                    self.toggle();
                }
            }
        }
    }

    /// Arm a one-shot hotkey capture, discarding any capture in progress
    pub fn begin_hotkey_capture(&mut self) -> Result<(), UserError> {
        self.capture = CaptureState::CapturingHotkey;
        info!("hotkey capture started");
        self.emit(StateEvent::HotkeyCaptureStarted);
        Ok(())
    }

    /// Start a key capture session for the configured key count
    pub fn begin_key_capture(&mut self) -> Result<(), UserError> {
        let target = self.settings.num_keys as usize;
        self.keys_to_hold.clear();
        self.capture = CaptureState::CapturingKeys {
            target,
            captured: Vec::new(),
        };
        info!(target, "key capture started");
        self.emit(StateEvent::KeyCaptureStarted { target });
        Ok(())
    }

    /// Set how many keys the next capture session collects
    pub fn set_key_count(&mut self, count: u8) -> Result<(), UserError> {
        if !(1..=2).contains(&count) {
            return Err(UserError::BadKeyCount(count));
        }
        self.settings.num_keys = count;
        self.settings_store.save(&self.settings)?;
        info!(count, "key count updated");
        Ok(())
    }

    /// Persist the UI theme string
    pub fn set_theme(&mut self, theme: String) -> Result<(), UserError> {
        info!(theme = %theme, "theme updated");
        self.settings.current_theme = theme;
        self.settings_store.save(&self.settings)?;
        Ok(())
    }

    /// Save the current hotkey and key set under `name`
    pub fn save_preset(&mut self, name: &str) -> Result<(), UserError> {
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        let hotkey = match (&self.hotkey, self.keys_to_hold.is_empty()) {
            (Some(hotkey), false) => hotkey.clone(),
            _ => {
                self.emit(StateEvent::InputError {
                    message: "No keys or hotkey to save.".to_string(),
                });
                return Err(UserError::EmptyCapture);
            }
        };

        let preset = Preset {
            hotkey,
            keys: self.keys_to_hold.clone(),
        };
        self.presets.save(name, &preset)?;
        self.emit(StateEvent::PresetSaved {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Load the preset `name` into the active hotkey and key set
    pub fn load_preset(&mut self, name: &str) -> Result<(), UserError> {
        let preset = self.presets.load(name)?;
        self.hotkey = Some(preset.hotkey);
        self.keys_to_hold = preset.keys;
        self.capture = CaptureState::Idle;
        self.persist_hotkey();
        info!(name, hotkey = ?self.hotkey, keys = ?self.keys_to_hold, "preset loaded");
        self.emit(StateEvent::PresetLoaded {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Delete the preset `name`
    pub fn delete_preset(&mut self, name: &str) -> Result<(), UserError> {
        self.presets.delete(name)?;
        self.emit(StateEvent::PresetDeleted {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Build a status snapshot for IPC
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            capture: self.capture.label(),
            held: self.hold == HoldState::Held,
            hotkey: self.hotkey.clone(),
            keys_to_hold: self.keys_to_hold.clone(),
            num_keys: self.settings.num_keys,
            theme: self.settings.current_theme.clone(),
        }
    }

    /// Flip the hold state, pressing or releasing every key in capture
    /// order.
    fn toggle(&mut self) {
        if self.keys_to_hold.is_empty() {
            self.emit(StateEvent::InputError {
                message: "No keys captured to hold.".to_string(),
            });
            return;
        }

        match self.hold {
            HoldState::Released => self.hold_keys(),
            HoldState::Held => self.release_keys(),
        }
    }

    fn hold_keys(&mut self) {
        for (i, key) in self.keys_to_hold.iter().enumerate() {
            if let Err(e) = self.injector.press(key) {
                warn!(key = %key, error = %e, "press failed, aborting hold");
                // Undo the keys already down so none are left stuck
                for held in self.keys_to_hold.iter().take(i).rev() {
                    let _ = self.injector.release(held);
                }
                self.emit(StateEvent::InputError {
                    message: format!("Failed to hold keys: {e}"),
                });
                return;
            }
        }
        self.hold = HoldState::Held;
        info!(keys = ?self.keys_to_hold, "keys pressed");
        self.emit(StateEvent::KeysHeld {
            keys: self.keys_to_hold.clone(),
        });
    }

    fn release_keys(&mut self) {
        let mut failed = false;
        for key in &self.keys_to_hold {
            if let Err(e) = self.injector.release(key) {
                warn!(key = %key, error = %e, "release failed");
                failed = true;
            }
        }
        // Released regardless; re-pressing a half-released set would be
        // worse than reporting the failure.
        self.hold = HoldState::Released;
        info!(keys = ?self.keys_to_hold, "keys released");
        if failed {
            self.emit(StateEvent::InputError {
                message: "Failed to release some keys.".to_string(),
            });
        }
        self.emit(StateEvent::KeysReleased {
            keys: self.keys_to_hold.clone(),
        });
    }

    fn persist_hotkey(&mut self) {
        self.settings.toggle_hotkey = self.hotkey.clone();
        if let Err(e) = self.settings_store.save(&self.settings) {
            warn!(error = %e, "failed to persist settings");
        }
    }

    fn emit(&self, event: StateEvent) {
        debug!(?event, "emitting event");
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
