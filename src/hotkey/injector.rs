//! Synthetic key press/release injection
//!
//! The controller toggles held keys through the [`KeyInjector`] trait so
//! the state machine can be tested with a recording fake instead of the
//! real OS event queue.

use std::time::Duration;

use rdev::EventType;
use tracing::debug;

use super::keys;

/// Delay between consecutive simulated events. Some platforms drop
/// synthetic events that arrive back to back.
const INJECT_DELAY: Duration = Duration::from_millis(20);

/// Errors from simulating key events
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("unknown key name: {0}")]
    UnknownKey(String),

    #[error("failed to simulate {event} for key {key}")]
    Simulate { event: &'static str, key: String },
}

/// Sends synthetic key-down / key-up events for named keys
pub trait KeyInjector: Send {
    /// Simulate a key-down for the named key
    fn press(&mut self, name: &str) -> Result<(), InjectError>;

    /// Simulate a key-up for the named key
    fn release(&mut self, name: &str) -> Result<(), InjectError>;
}

/// Injector backed by `rdev::simulate`
pub struct RdevInjector;

impl RdevInjector {
    fn simulate(&self, name: &str, down: bool) -> Result<(), InjectError> {
        let key = keys::key_for(name).ok_or_else(|| InjectError::UnknownKey(name.to_string()))?;

        let (event_type, label) = if down {
            (EventType::KeyPress(key), "press")
        } else {
            (EventType::KeyRelease(key), "release")
        };

        debug!(key = name, event = label, "simulating key event");

        rdev::simulate(&event_type).map_err(|_| InjectError::Simulate {
            event: label,
            key: name.to_string(),
        })?;

        std::thread::sleep(INJECT_DELAY);
        Ok(())
    }
}

impl KeyInjector for RdevInjector {
    fn press(&mut self, name: &str) -> Result<(), InjectError> {
        self.simulate(name, true)
    }

    fn release(&mut self, name: &str) -> Result<(), InjectError> {
        self.simulate(name, false)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Records the sequence of injected events for assertions
    #[derive(Default)]
    pub struct RecordingInjector {
        pub log: Vec<String>,
        pub fail_on: Option<String>,
    }

    impl KeyInjector for RecordingInjector {
        fn press(&mut self, name: &str) -> Result<(), InjectError> {
            if self.fail_on.as_deref() == Some(name) {
                return Err(InjectError::UnknownKey(name.to_string()));
            }
            self.log.push(format!("press {name}"));
            Ok(())
        }

        fn release(&mut self, name: &str) -> Result<(), InjectError> {
            if self.fail_on.as_deref() == Some(name) {
                return Err(InjectError::UnknownKey(name.to_string()));
            }
            self.log.push(format!("release {name}"));
            Ok(())
        }
    }
}
