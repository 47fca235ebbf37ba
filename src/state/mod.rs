//! Capture and hold state management
//!
//! One controller task owns the capture state machine, the hold toggle,
//! and both stores. It is the single consumer of the keyboard listener
//! channel and of IPC commands, so no capture state is ever touched from
//! two places at once.

mod machine;

pub use machine::{
    CaptureState, Command, Controller, HoldState, StatusSnapshot, UserError,
};
