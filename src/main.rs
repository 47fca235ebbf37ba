//! keyhold-daemon: Background daemon for hotkey-toggled key holding
//!
//! The daemon owns the global keyboard hook and provides:
//! - Hotkey and key-set capture via a one-consumer state machine
//! - Hold/release toggling with synthetic key events
//! - Named presets and settings persisted as JSON
//! - IPC server for the GUI client
//!
//! Out of scope here (belongs to the GUI client): layout, theming
//! behavior, sound cues, update checks.

mod config;
mod events;
mod hotkey;
mod ipc;
mod lifecycle;
mod state;
mod store;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::StateEvent;
use crate::hotkey::{KeyListener, RdevInjector};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::state::Controller;
use crate::store::{PresetStore, SettingsStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "keyhold-daemon starting"
    );

    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.data_dir, "configuration loaded");

    let shutdown = ShutdownSignal::new();

    // Keyboard hook -> controller
    let (key_tx, key_rx) = mpsc::channel(64);
    // IPC server -> controller
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    // Controller -> subscribed IPC clients
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    let presets = PresetStore::new(&config.presets_path);
    let settings = SettingsStore::new(&config.settings_path);
    let mut controller = Controller::new(presets, settings, RdevInjector, event_tx.clone())?;

    let listener = KeyListener::new(key_tx);
    let hook_running = match listener.start() {
        Ok(()) => {
            info!("keyboard listener started");
            true
        }
        Err(e) => {
            error!(?e, "failed to start keyboard listener");
            warn!("continuing without capture/toggle support - check input permissions");
            false
        }
    };

    let server = Server::new(&config.socket_path, cmd_tx, event_tx, hook_running)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Controller processes key events and IPC commands
        _ = controller.run(key_rx, cmd_rx) => {
            info!("controller exited");
        }

        // IPC server accepts client connections
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    server.shutdown().await;
    info!("keyhold-daemon stopped");

    Ok(())
}
