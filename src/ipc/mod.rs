//! IPC module for GUI client communication
//!
//! Length-prefixed JSON messages over a Unix domain socket.

pub mod protocol;
mod server;

pub use server::Server;
