//! Unix domain socket server for IPC
//!
//! Request-response over length-prefixed JSON, plus push notifications
//! for controller events to subscribed clients. Every request is routed
//! to the controller task over its command channel; the server itself
//! holds no capture state.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::events::StateEvent;
use crate::state::{Command, UserError};

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// Maximum accepted message size
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    cmd_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<StateEvent>,
    shutdown_tx: broadcast::Sender<()>,
    hook_running: bool,
    start_time: Instant,
}

impl Server {
    /// Bind the IPC socket
    pub fn new(
        socket_path: &Path,
        cmd_tx: mpsc::Sender<Command>,
        event_tx: broadcast::Sender<StateEvent>,
        hook_running: bool,
    ) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only socket
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            cmd_tx,
            event_tx,
            shutdown_tx,
            hook_running,
            start_time: Instant::now(),
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let client = ClientHandler {
                        cmd_tx: self.cmd_tx.clone(),
                        event_tx: self.event_tx.clone(),
                        hook_running: self.hook_running,
                        start_time: self.start_time,
                    };
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = client.handle(stream) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Per-connection state
struct ClientHandler {
    cmd_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<StateEvent>,
    hook_running: bool,
    start_time: Instant,
}

impl ClientHandler {
    /// Handle a single client connection
    async fn handle(&self, stream: UnixStream) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Frames are read on their own task: read_exact is not
        // cancel-safe, so racing it directly against the notification
        // channel could drop a partially read length prefix and desync
        // the stream. Channel recv is cancel-safe.
        let (req_tx, mut req_rx) = mpsc::channel::<Result<Request>>(8);
        tokio::spawn(async move {
            loop {
                match read_message(&mut reader).await {
                    Ok(Some(request)) => {
                        if req_tx.send(Ok(request)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = req_tx.send(Err(e)).await;
                        break;
                    }
                }
            }
            // Dropping req_tx signals EOF to the handler
        });

        let mut events: Option<broadcast::Receiver<StateEvent>> = None;

        loop {
            let request = if let Some(rx) = events.as_mut() {
                // Subscribed clients also receive pushed notifications
                tokio::select! {
                    request = req_rx.recv() => request,
                    event = rx.recv() => {
                        match event {
                            Ok(event) => {
                                let notif = Notification::from_event(event);
                                send_message(&mut writer, &notif).await?;
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                warn!(skipped = n, "notification receiver lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                // Controller gone, daemon is shutting down
                                debug!("event channel closed, dropping client");
                                return Ok(());
                            }
                        }
                        continue;
                    }
                }
            } else {
                req_rx.recv().await
            };

            let request = match request {
                Some(request) => request?,
                None => {
                    debug!("client disconnected");
                    return Ok(());
                }
            };

            debug!(?request, "received request");

            if matches!(request, Request::Subscribe) {
                events = Some(self.event_tx.subscribe());
                debug!("client subscribed to notifications");
                send_message(&mut writer, &Response::Subscribed).await?;
                continue;
            }

            let response = self.process_request(request).await;
            send_message(&mut writer, &response).await?;
        }
    }

    /// Route a request to the controller and build the response
    async fn process_request(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let (reply, rx) = oneshot::channel();
                if self.cmd_tx.send(Command::GetStatus { reply }).await.is_err() {
                    return controller_gone();
                }
                match rx.await {
                    Ok(snapshot) => Response::Status(DaemonStatus::from_snapshot(
                        snapshot,
                        self.hook_running,
                        self.start_time.elapsed().as_secs(),
                    )),
                    Err(_) => controller_gone(),
                }
            }

            Request::ListPresets => {
                let (reply, rx) = oneshot::channel();
                if self
                    .cmd_tx
                    .send(Command::ListPresets { reply })
                    .await
                    .is_err()
                {
                    return controller_gone();
                }
                match rx.await {
                    Ok(Ok(names)) => Response::Presets { names },
                    Ok(Err(e)) => error_response(e),
                    Err(_) => controller_gone(),
                }
            }

            Request::Subscribe => Response::Subscribed,

            Request::CaptureHotkey => {
                self.ack(|reply| Command::CaptureHotkey { reply }).await
            }
            Request::CaptureKeys => self.ack(|reply| Command::CaptureKeys { reply }).await,
            Request::SetKeyCount { count } => {
                self.ack(move |reply| Command::SetKeyCount { count, reply })
                    .await
            }
            Request::SetTheme { theme } => {
                self.ack(move |reply| Command::SetTheme { theme, reply })
                    .await
            }
            Request::SavePreset { name } => {
                self.ack(move |reply| Command::SavePreset { name, reply })
                    .await
            }
            Request::LoadPreset { name } => {
                self.ack(move |reply| Command::LoadPreset { name, reply })
                    .await
            }
            Request::DeletePreset { name } => {
                self.ack(move |reply| Command::DeletePreset { name, reply })
                    .await
            }
        }
    }

    /// Send an ack-style command to the controller and await its result
    async fn ack(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), UserError>>) -> Command,
    ) -> Response {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(make(reply)).await.is_err() {
            return controller_gone();
        }
        match rx.await {
            Ok(Ok(())) => Response::Ok,
            Ok(Err(e)) => error_response(e),
            Err(_) => controller_gone(),
        }
    }
}

fn error_response(e: UserError) -> Response {
    Response::Error {
        code: e.code().to_string(),
        message: e.to_string(),
    }
}

fn controller_gone() -> Response {
    Response::Error {
        code: "shutting_down".to_string(),
        message: "controller unavailable".to_string(),
    }
}

/// Read one length-prefixed JSON message; `None` on clean EOF
async fn read_message(reader: &mut OwnedReadHalf) -> Result<Option<Request>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large: {len} bytes");
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;

    let request = serde_json::from_slice(&msg_buf).context("failed to parse request")?;
    Ok(Some(request))
}

/// Send a length-prefixed JSON message
async fn send_message<T: serde::Serialize>(writer: &mut OwnedWriteHalf, msg: &T) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;

    Ok(())
}
