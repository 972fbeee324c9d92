//! Host collaborators
//!
//! Window surfaces, the status bar, input injection and task lookup all live
//! outside this crate. The service reaches them only through the two traits
//! here, which keeps the bookkeeping testable without a device.

mod logging;

pub use logging::LoggingHost;

use crate::command::StartCommand;
use crate::config::HookLauncherConfig;
use crate::error::HostError;
use crate::router::UiEvent;
use crate::window::{DisplayId, SessionId};
use log::debug;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Appearance of a new window, taken from the current config snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub density_dpi: u32,
    pub flags: u32,
}

/// Single-shot completion for a window under construction.
///
/// The host calls [`SessionReady::complete`] once the window's display exists.
/// Completion is queued onto the UI context, so the session is registered in
/// order with every other window mutation.
pub struct SessionReady {
    events: Option<UnboundedSender<UiEvent>>,
    start: Option<StartCommand>,
}

impl SessionReady {
    pub(crate) fn new(events: UnboundedSender<UiEvent>, start: Option<StartCommand>) -> Self {
        Self {
            events: Some(events),
            start,
        }
    }

    /// Report the id of the ready session
    pub fn complete(mut self, id: SessionId) {
        if let Some(events) = self.events.take() {
            let start = self.start.take();
            if events.send(UiEvent::SessionReady { id, start }).is_err() {
                debug!("🪦 Session {} ready after the service stopped", id);
            }
        }
    }
}

impl Drop for SessionReady {
    fn drop(&mut self) {
        if self.events.is_some() {
            debug!("🗑️ Window construction abandoned before its display was ready");
        }
    }
}

/// Foreground task of a display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: i32,
    /// Package of the task's base activity, if any
    pub base_package: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// Synthesized key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key_code: i32,
    pub display: DisplayId,
    pub time: Instant,
}

impl KeyEvent {
    pub const KEYCODE_HOME: i32 = 3;

    pub fn home(action: KeyAction, display: DisplayId) -> Self {
        Self {
            action,
            key_code: Self::KEYCODE_HOME,
            display,
            time: Instant::now(),
        }
    }
}

/// Launcher hook flags addressed to the package that asked for them
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherConfigReply {
    pub target: Option<String>,
    pub hooks: HookLauncherConfig,
}

/// Window surfaces and system UI
#[cfg_attr(test, mockall::automock)]
pub trait WindowHost: Send + Sync {
    /// Close any expanded status bar panel
    fn collapse_panels(&self) -> Result<(), HostError>;

    /// Construct a floating window; `ready` fires once its display exists
    fn create_window(&self, params: WindowParams, ready: SessionReady) -> Result<(), HostError>;

    /// Launch `start` inside the window of `session`
    fn auto_start(&self, session: SessionId, start: &StartCommand) -> Result<(), HostError>;

    /// Ask every window to reset its position and size
    fn reset_all_windows(&self) -> Result<(), HostError>;

    fn open_app_list(&self) -> Result<(), HostError>;

    fn launch_side_bar(&self) -> Result<(), HostError>;

    /// Best-effort user notification
    fn show_toast(&self, message: &str);
}

/// Activity, input and broadcast services
#[cfg_attr(test, mockall::automock)]
pub trait SystemHost: Send + Sync {
    fn top_root_task(&self, display: DisplayId) -> Option<TaskInfo>;

    fn inject_key(&self, event: KeyEvent) -> Result<(), HostError>;

    fn send_launcher_config(&self, reply: LauncherConfigReply) -> Result<(), HostError>;
}
