//! IPC (Inter-Process Communication) module for floatd clients
//!
//! Client processes (settings app, launcher hooks, the CLI) talk to the service
//! over a Unix socket using newline-delimited JSON. Each [`Request`] line gets
//! exactly one [`Reply`] line. A connection that registers itself as an
//! open-count listener additionally receives unsolicited `OpenCount` lines.

use crate::command::Signal;
use crate::error::ListenerError;
use crate::listener::{ListenerId, OpenCountListener};
use crate::service::ServiceHandle;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Replies and pushed counts a slow client may leave unread
const OUTGOING_CAPACITY: usize = 64;

/// Calls accepted from clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    GetVersionName,
    GetVersionCode,
    GetUid,
    CreateWindow,
    GetBuildTime,
    GetConfigJson,
    UpdateConfig { config: String },
    RegisterOpenCountListener,
    UnregisterOpenCountListener,
    OpenAppList,
    CurrentToWindow,
    ResetAllWindow,
    LaunchSideBar,
    /// Broadcast-style signal; unrecognized payloads are acknowledged and dropped
    Signal { signal: serde_json::Value },
}

/// Messages sent to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Reply {
    VersionName { name: String },
    VersionCode { code: u32 },
    Uid { uid: u32 },
    BuildTime { millis: i64 },
    ConfigJson { config: String },
    Ack,
    /// Pushed to registered connections whenever the open count changes
    OpenCount { count: u32 },
    Error { message: String },
}

/// Open-count listener backed by a client connection's outgoing queue
struct ConnectionListener {
    id: ListenerId,
    outgoing: mpsc::Sender<Reply>,
}

impl OpenCountListener for ConnectionListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn on_update(&self, count: u32) -> Result<(), ListenerError> {
        // A client that stops reading is treated as gone
        self.outgoing
            .try_send(Reply::OpenCount { count })
            .map_err(|_| ListenerError::Disconnected)
    }
}

/// Unix socket server exposing a [`ServiceHandle`]
pub struct FloatIpcServer {
    socket_path: PathBuf,
    handle: ServiceHandle,
}

impl FloatIpcServer {
    pub fn new<P: Into<PathBuf>>(socket_path: P, handle: ServiceHandle) -> Self {
        Self {
            socket_path: socket_path.into(),
            handle,
        }
    }

    /// Bind the socket and start accepting connections in the background
    pub async fn start(&self) -> Result<()> {
        // Remove existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).with_context(|| {
                format!("Failed to remove existing socket: {:?}", self.socket_path)
            })?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", self.socket_path))?;

        info!("🔗 floatd IPC server listening on: {:?}", self.socket_path);

        tokio::spawn(Self::accept_connections(listener, self.handle.clone()));

        Ok(())
    }

    async fn accept_connections(listener: UnixListener, handle: ServiceHandle) {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    debug!("🤝 IPC client connected");
                    let handle = handle.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(stream, handle).await {
                            warn!("⚠️ IPC client error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("❌ Error accepting IPC connection: {}", e);
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, handle: ServiceHandle) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        // Replies and pushed counts share one ordered queue
        let (outgoing, mut queue) = mpsc::channel::<Reply>(OUTGOING_CAPACITY);
        let writer_task = tokio::spawn(async move {
            while let Some(reply) = queue.recv().await {
                if let Err(e) = Self::send_message(&mut writer, &reply).await {
                    debug!("📪 Dropping IPC writer: {}", e);
                    break;
                }
            }
        });

        let listener = Arc::new(ConnectionListener {
            id: ListenerId::next(),
            outgoing: outgoing.clone(),
        });
        let mut registered = false;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("⚠️ IPC read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            debug!("📨 Received IPC message: {}", line);

            let reply = match serde_json::from_str::<Request>(&line) {
                Ok(Request::RegisterOpenCountListener) => {
                    // Ack first so the initial count follows it on the wire
                    let _ = outgoing.send(Reply::Ack).await;
                    handle.register_open_count_listener(listener.clone());
                    registered = true;
                    continue;
                }
                Ok(Request::UnregisterOpenCountListener) => {
                    handle.unregister_open_count_listener(listener.id);
                    registered = false;
                    Reply::Ack
                }
                Ok(request) => Self::process_request(request, &handle),
                Err(e) => {
                    warn!("⚠️ Malformed IPC request: {}", e);
                    Reply::Error {
                        message: format!("malformed request: {}", e),
                    }
                }
            };

            if outgoing.send(reply).await.is_err() {
                break;
            }
        }

        if registered {
            handle.unregister_open_count_listener(listener.id);
        }
        drop(listener);
        drop(outgoing);
        let _ = writer_task.await;

        debug!("📪 IPC client disconnected");
        Ok(())
    }

    /// Execute one request against the service
    pub fn process_request(request: Request, handle: &ServiceHandle) -> Reply {
        match request {
            Request::GetVersionName => Reply::VersionName {
                name: handle.version_name().to_string(),
            },
            Request::GetVersionCode => Reply::VersionCode {
                code: handle.version_code(),
            },
            Request::GetUid => Reply::Uid { uid: handle.uid() },
            Request::GetBuildTime => Reply::BuildTime {
                millis: handle.build_time(),
            },
            Request::GetConfigJson => Reply::ConfigJson {
                config: handle.config_json(),
            },
            Request::UpdateConfig { config } => match handle.update_config(&config) {
                Ok(_persist) => Reply::Ack,
                Err(e) => Reply::Error {
                    message: e.to_string(),
                },
            },
            Request::CreateWindow => {
                handle.create_window();
                Reply::Ack
            }
            Request::OpenAppList => {
                handle.open_app_list();
                Reply::Ack
            }
            Request::CurrentToWindow => {
                handle.current_to_window();
                Reply::Ack
            }
            Request::ResetAllWindow => {
                handle.reset_all_window();
                Reply::Ack
            }
            Request::LaunchSideBar => {
                handle.launch_side_bar();
                Reply::Ack
            }
            Request::Signal { signal } => {
                if let Some(signal) = Signal::from_value(signal) {
                    handle.dispatch_signal(signal);
                }
                Reply::Ack
            }
            // Listener registration is bound to the connection
            Request::RegisterOpenCountListener | Request::UnregisterOpenCountListener => {
                Reply::Error {
                    message: "listener registration requires a connection".to_string(),
                }
            }
        }
    }

    /// Send a message to a client
    async fn send_message(
        writer: &mut tokio::net::unix::OwnedWriteHalf,
        message: &Reply,
    ) -> Result<()> {
        let json = serde_json::to_string(message).with_context(|| "Failed to serialize message")?;

        writer
            .write_all(json.as_bytes())
            .await
            .with_context(|| "Failed to write message")?;
        writer
            .write_all(b"\n")
            .await
            .with_context(|| "Failed to write newline")?;

        debug!("📤 Sent IPC message: {}", json);

        Ok(())
    }

    /// Get the socket path
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for FloatIpcServer {
    fn drop(&mut self) {
        // Clean up socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!("⚠️ Failed to remove socket file: {}", e);
            }
        }
    }
}

/// Send one request and wait for its reply (used by the CLI)
pub async fn request_once<P: AsRef<Path>>(socket_path: P, request: &Request) -> Result<Reply> {
    let socket_path = socket_path.as_ref();
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("Failed to connect to {:?}", socket_path))?;
    let (reader, mut writer) = stream.into_split();

    let json = serde_json::to_string(request).context("Failed to serialize request")?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;

    let mut lines = BufReader::new(reader).lines();
    let line = lines
        .next_line()
        .await?
        .context("Connection closed before a reply arrived")?;
    serde_json::from_str(&line).context("Failed to parse reply")
}
