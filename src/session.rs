//! Construction of floating window sessions

use crate::command::StartCommand;
use crate::host::{SessionReady, WindowHost, WindowParams};
use crate::router::UiEvent;
use crate::window::SessionId;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

const CREATE_FAILED_TOAST: &str = "new window failed\nmay you forget reboot";

/// Creates windows through the [`WindowHost`] and routes their completion
/// back onto the UI context.
pub struct SessionFactory {
    host: Arc<dyn WindowHost>,
    events: UnboundedSender<UiEvent>,
}

impl SessionFactory {
    pub(crate) fn new(host: Arc<dyn WindowHost>, events: UnboundedSender<UiEvent>) -> Self {
        Self { host, events }
    }

    pub fn host(&self) -> &Arc<dyn WindowHost> {
        &self.host
    }

    /// Best-effort: a failure here never blocks the caller's command
    pub fn collapse_panels(&self) {
        if let Err(e) = self.host.collapse_panels() {
            debug!("🤷 Could not collapse status bar panels: {}", e);
        }
    }

    /// Start constructing a window.
    ///
    /// Returns `false` when the host refused to build it; the user gets a toast
    /// and nothing is registered. On success the session reaches the stack later,
    /// once the host reports its display as ready.
    pub fn create(&self, params: WindowParams, start: Option<StartCommand>) -> bool {
        self.collapse_panels();

        let ready = SessionReady::new(self.events.clone(), start);
        match self.host.create_window(params, ready) {
            Ok(()) => true,
            Err(e) => {
                error!("❌ new window failed: {}", e);
                self.host.show_toast(CREATE_FAILED_TOAST);
                false
            }
        }
    }

    /// Launch `start` in a ready session; failures are only logged
    pub fn auto_start(&self, id: SessionId, start: &StartCommand) {
        if let Err(e) = self.host.auto_start(id, start) {
            warn!("⚠️ Failed to start {:?} in window {}: {}", start.target, id, e);
        }
    }
}
