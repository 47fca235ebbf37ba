//! Global keyboard listener
//!
//! Runs `rdev::listen` on a dedicated thread and forwards every key-down
//! event with a resolvable name to the controller over an mpsc channel.
//! Key-up events and unnamed keys are dropped at the hook; the controller
//! is the only consumer, so capture state never sees concurrent mutation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rdev::EventType;
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};

use super::keys;

/// A recognized key-down event from the global hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Normalized key name, e.g. "space" or "f6"
    pub name: String,
}

/// Errors that can occur in the keyboard listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("keyboard listener is already running")]
    AlreadyRunning,

    #[error("failed to install keyboard hook - check input permissions")]
    Hook,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Global keyboard listener feeding key-down events to the controller
pub struct KeyListener {
    event_tx: mpsc::Sender<KeyEvent>,
    running: Arc<AtomicBool>,
}

impl KeyListener {
    /// Create a new listener that sends events on `event_tx`
    pub fn new(event_tx: mpsc::Sender<KeyEvent>) -> Self {
        Self {
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the listener on a dedicated thread.
    ///
    /// The hook runs until the process exits; `rdev::listen` offers no
    /// unhook API, so stopping the daemon is the only way to detach.
    pub fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("keyhold-listener".to_string())
            .spawn(move || {
                info!("keyboard listener thread started");

                let result = rdev::listen(move |event| {
                    let key = match event.event_type {
                        EventType::KeyPress(key) => key,
                        _ => return,
                    };

                    // Keys without a stable name are silently ignored
                    let name = match keys::name_for(key) {
                        Some(name) => name.to_string(),
                        None => {
                            trace!(?key, "ignoring unnamed key");
                            return;
                        }
                    };

                    if event_tx.blocking_send(KeyEvent { name }).is_err() {
                        warn!("key event channel closed, dropping event");
                    }
                });

                if let Err(e) = result {
                    error!(?e, "keyboard hook failed");
                }

                running.store(false, Ordering::SeqCst);
                info!("keyboard listener thread stopped");
            })
            .map_err(|e| HotkeyError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
