use super::{
    KeyEvent, LauncherConfigReply, SessionReady, SystemHost, TaskInfo, WindowHost, WindowParams,
};
use crate::command::StartCommand;
use crate::error::HostError;
use crate::window::{DisplayId, SessionId};
use log::{info, warn};
use std::sync::atomic::{AtomicI32, Ordering};

/// Development host that only logs.
///
/// Windows are "ready" as soon as they are requested, with ids counting up
/// from 1. No display ever has a foreground task.
pub struct LoggingHost {
    next_display: AtomicI32,
}

impl LoggingHost {
    pub fn new() -> Self {
        Self {
            next_display: AtomicI32::new(1),
        }
    }
}

impl Default for LoggingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHost for LoggingHost {
    fn collapse_panels(&self) -> Result<(), HostError> {
        info!("⬆️ collapse status bar panels");
        Ok(())
    }

    fn create_window(&self, params: WindowParams, ready: SessionReady) -> Result<(), HostError> {
        let id = SessionId(self.next_display.fetch_add(1, Ordering::Relaxed));
        info!(
            "🪟 create window {} (density {} dpi, flags {:#x})",
            id, params.density_dpi, params.flags
        );
        ready.complete(id);
        Ok(())
    }

    fn auto_start(&self, session: SessionId, start: &StartCommand) -> Result<(), HostError> {
        info!("🚀 start {:?} in window {}", start.target, session);
        Ok(())
    }

    fn reset_all_windows(&self) -> Result<(), HostError> {
        info!("🔄 reset all windows");
        Ok(())
    }

    fn open_app_list(&self) -> Result<(), HostError> {
        info!("📱 open app list");
        Ok(())
    }

    fn launch_side_bar(&self) -> Result<(), HostError> {
        info!("📐 launch side bar");
        Ok(())
    }

    fn show_toast(&self, message: &str) {
        warn!("🍞 {}", message);
    }
}

impl SystemHost for LoggingHost {
    fn top_root_task(&self, display: DisplayId) -> Option<TaskInfo> {
        info!("🔎 no task information for display {}", display.0);
        None
    }

    fn inject_key(&self, event: KeyEvent) -> Result<(), HostError> {
        info!(
            "⌨️ inject key {} {:?} on display {}",
            event.key_code, event.action, event.display.0
        );
        Ok(())
    }

    fn send_launcher_config(&self, reply: LauncherConfigReply) -> Result<(), HostError> {
        info!("📤 send config to {:?}: {:?}", reply.target, reply.hooks);
        Ok(())
    }
}
