//! Service lifecycle and the thread-safe call surface
//!
//! [`FloatService`] is constructed once at startup. It loads the config, spawns
//! the UI thread that owns all window bookkeeping, and hands out
//! [`ServiceHandle`]s. Handles may be used from any thread: calls that only read
//! build info or the config answer in place, everything else hops onto the UI
//! context.

use crate::command::{Command, Signal};
use crate::config::{ConfigStore, PersistTask, ServiceSettings};
use crate::error::{ConfigError, ServiceError};
use crate::host::{SystemHost, WindowHost};
use crate::listener::{ListenerId, OpenCountListener};
use crate::router::{CommandRouter, RouterSettings, UiEvent};
use crate::runtime::{spawn_ui_thread, IoRuntime};
use crate::window::{DisplayId, SessionId};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

/// Running window service
pub struct FloatService {
    handle: ServiceHandle,
    ui_thread: Option<thread::JoinHandle<()>>,
    io: IoRuntime,
}

impl FloatService {
    /// Load the config and start the UI context
    pub fn start(
        settings: &ServiceSettings,
        window_host: Arc<dyn WindowHost>,
        system_host: Arc<dyn SystemHost>,
    ) -> Result<Self, ServiceError> {
        info!("🏗️ Initializing window service...");

        let io = IoRuntime::new()?;
        let io_context = io.context().ok_or(ServiceError::Stopped)?;
        let config = Arc::new(ConfigStore::open(settings.config_path.clone(), io_context));

        let (events, receiver) = mpsc::unbounded_channel();
        let router = CommandRouter::new(
            window_host,
            system_host,
            config.clone(),
            RouterSettings {
                primary_display: DisplayId(settings.primary_display),
                launcher_package: settings.launcher_package.clone(),
            },
            events.clone(),
        );
        let ui_thread = spawn_ui_thread(move || router.run(receiver))?;

        info!("✅ Window service initialized");
        Ok(Self {
            handle: ServiceHandle { events, config },
            ui_thread: Some(ui_thread),
            io,
        })
    }

    pub fn handle(&self) -> ServiceHandle {
        self.handle.clone()
    }

    /// Stop the UI loop and the background runtime
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(ui_thread) = self.ui_thread.take() else {
            return;
        };
        info!("🔽 Shutting down window service...");
        self.handle.send(UiEvent::Shutdown);
        if ui_thread.join().is_err() {
            error!("❌ UI thread panicked");
        }
        // Queued background writes are dropped with the I/O runtime
        if let Err(e) = self.handle.config.sync() {
            error!("❌ Failed to persist configuration at shutdown: {}", e);
        }
        self.io.shutdown();
        info!("✅ Window service shutdown complete");
    }
}

impl Drop for FloatService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cloneable entry point used by IPC and signal receivers
#[derive(Clone)]
pub struct ServiceHandle {
    events: UnboundedSender<UiEvent>,
    config: Arc<ConfigStore>,
}

impl ServiceHandle {
    fn send(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            warn!("⚠️ Window service stopped, dropping event");
        }
    }

    fn command(&self, command: Command) {
        self.send(UiEvent::Command(command));
    }

    async fn query<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> UiEvent,
    ) -> Result<T, ServiceError> {
        let (tx, rx) = oneshot::channel();
        self.events.send(make(tx)).map_err(|_| ServiceError::Stopped)?;
        rx.await.map_err(|_| ServiceError::Stopped)
    }

    pub fn version_name(&self) -> &'static str {
        crate::VERSION_NAME
    }

    pub fn version_code(&self) -> u32 {
        crate::VERSION_CODE
    }

    /// User id of the service process
    pub fn uid(&self) -> u32 {
        // SAFETY: getuid has no preconditions and cannot fail
        unsafe { libc::getuid() }
    }

    pub fn build_time(&self) -> i64 {
        crate::build_time()
    }

    /// Open an empty window
    pub fn create_window(&self) {
        self.command(Command::CreateWindow(None));
    }

    pub fn config_json(&self) -> String {
        self.config.current_json()
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Replace the config; the returned task completes once it is on disk
    pub fn update_config(&self, json: &str) -> Result<PersistTask, ConfigError> {
        self.config.replace(json)
    }

    /// Register an observer; it receives the current count right away
    pub fn register_open_count_listener(&self, listener: Arc<dyn OpenCountListener>) {
        self.send(UiEvent::RegisterListener(listener));
    }

    pub fn unregister_open_count_listener(&self, id: ListenerId) {
        self.send(UiEvent::UnregisterListener(id));
    }

    pub fn open_app_list(&self) {
        self.command(Command::OpenAppList);
    }

    pub fn current_to_window(&self) {
        self.command(Command::CurrentTaskToWindow);
    }

    pub fn reset_all_window(&self) {
        self.command(Command::ResetAllWindows);
    }

    pub fn launch_side_bar(&self) {
        self.command(Command::LaunchSideBar);
    }

    pub fn dispatch_signal(&self, signal: Signal) {
        if let Some(command) = signal.into_command() {
            self.command(command);
        }
    }

    /// Parse and dispatch a JSON signal; unrecognized input is dropped
    pub fn dispatch_raw_signal(&self, raw: &str) {
        match Signal::parse(raw) {
            Some(signal) => self.dispatch_signal(signal),
            None => debug!("🙈 Signal dropped"),
        }
    }

    /// A window was closed by the user or its host
    pub fn window_closed(&self, id: SessionId) {
        self.send(UiEvent::WindowClosed(id));
    }

    /// A window was touched and should become the front window
    pub fn window_focused(&self, id: SessionId) {
        self.send(UiEvent::WindowFocused(id));
    }

    pub async fn is_front(&self, id: SessionId) -> Result<bool, ServiceError> {
        self.query(|tx| UiEvent::QueryIsFront(id, tx)).await
    }

    /// Open sessions, front to back
    pub async fn stack_snapshot(&self) -> Result<Vec<SessionId>, ServiceError> {
        self.query(UiEvent::QueryStack).await
    }

    pub async fn open_count(&self) -> Result<u32, ServiceError> {
        self.query(UiEvent::QueryOpenCount).await
    }

    /// Wait until every event submitted before this call, and anything those
    /// events queued while being handled, has been processed
    pub async fn flush(&self) -> Result<(), ServiceError> {
        self.query(UiEvent::Flush).await
    }
}
