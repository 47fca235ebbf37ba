//! Hotkey module for global keyboard listening and key injection
//!
//! Wraps the rdev hook: a dedicated listener thread feeds key-down
//! events into the controller, and the injector simulates press/release
//! for the held key set.

pub mod keys;

mod injector;
mod listener;

pub use injector::{InjectError, KeyInjector, RdevInjector};
pub use listener::{HotkeyError, KeyEvent, KeyListener};

#[cfg(test)]
pub use injector::mock::RecordingInjector;
