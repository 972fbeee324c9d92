//! Shared fixtures for integration tests
#![allow(dead_code)]

use floatd::error::{HostError, ListenerError};
use floatd::host::{
    KeyAction, KeyEvent, LauncherConfigReply, SessionReady, SystemHost, TaskInfo, WindowHost,
    WindowParams,
};
use floatd::listener::ListenerId;
use floatd::window::{DisplayId, SessionId};
use floatd::{FloatService, OpenCountListener, ServiceSettings, StartCommand};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Everything the service asked the host to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CollapsePanels,
    CreateWindow(WindowParams),
    AutoStart(SessionId, StartCommand),
    ResetAllWindows,
    OpenAppList,
    LaunchSideBar,
    Toast(String),
    Key(KeyAction, i32, DisplayId),
    LauncherConfig(LauncherConfigReply),
}

/// Host that records calls and completes windows synchronously with ids 1, 2, 3...
pub struct RecordingHost {
    calls: Mutex<Vec<HostCall>>,
    next_id: AtomicI32,
    fail_create: AtomicBool,
    top_task: Mutex<Option<TaskInfo>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1),
            fail_create: AtomicBool::new(false),
            top_task: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub fn created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, HostCall::CreateWindow(_)))
            .count()
    }

    pub fn fail_next_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_top_task(&self, task_id: i32, package: &str) {
        *self.top_task.lock() = Some(TaskInfo {
            task_id,
            base_package: Some(package.to_string()),
        });
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

impl WindowHost for RecordingHost {
    fn collapse_panels(&self) -> Result<(), HostError> {
        self.record(HostCall::CollapsePanels);
        Ok(())
    }

    fn create_window(&self, params: WindowParams, ready: SessionReady) -> Result<(), HostError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("test host refuses windows".to_string()));
        }
        self.record(HostCall::CreateWindow(params));
        ready.complete(SessionId(self.next_id.fetch_add(1, Ordering::SeqCst)));
        Ok(())
    }

    fn auto_start(&self, session: SessionId, start: &StartCommand) -> Result<(), HostError> {
        self.record(HostCall::AutoStart(session, start.clone()));
        Ok(())
    }

    fn reset_all_windows(&self) -> Result<(), HostError> {
        self.record(HostCall::ResetAllWindows);
        Ok(())
    }

    fn open_app_list(&self) -> Result<(), HostError> {
        self.record(HostCall::OpenAppList);
        Ok(())
    }

    fn launch_side_bar(&self) -> Result<(), HostError> {
        self.record(HostCall::LaunchSideBar);
        Ok(())
    }

    fn show_toast(&self, message: &str) {
        self.record(HostCall::Toast(message.to_string()));
    }
}

impl SystemHost for RecordingHost {
    fn top_root_task(&self, _display: DisplayId) -> Option<TaskInfo> {
        self.top_task.lock().clone()
    }

    fn inject_key(&self, event: KeyEvent) -> Result<(), HostError> {
        self.record(HostCall::Key(event.action, event.key_code, event.display));
        Ok(())
    }

    fn send_launcher_config(&self, reply: LauncherConfigReply) -> Result<(), HostError> {
        self.record(HostCall::LauncherConfig(reply));
        Ok(())
    }
}

/// Listener that records every count it accepts and can be killed
pub struct RecordingListener {
    id: ListenerId,
    seen: Mutex<Vec<u32>>,
    attempts: AtomicU32,
    dead: AtomicBool,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ListenerId::next(),
            seen: Mutex::new(Vec::new()),
            attempts: AtomicU32::new(0),
            dead: AtomicBool::new(false),
        })
    }

    pub fn seen(&self) -> Vec<u32> {
        self.seen.lock().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn kill(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }
}

impl OpenCountListener for RecordingListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn on_update(&self, count: u32) -> Result<(), ListenerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.dead.load(Ordering::SeqCst) {
            return Err(ListenerError::Disconnected);
        }
        self.seen.lock().push(count);
        Ok(())
    }
}

/// A running service wired to a [`RecordingHost`] with its config in a temp dir
pub struct TestService {
    pub service: FloatService,
    pub host: Arc<RecordingHost>,
    pub settings: ServiceSettings,
    pub dir: TempDir,
}

impl TestService {
    pub fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = ServiceSettings {
            socket_path: dir.path().join("floatd.sock"),
            config_path: dir.path().join("floatd.json"),
            ..ServiceSettings::default()
        };
        let host = RecordingHost::new();
        let service = FloatService::start(&settings, host.clone(), host.clone()).unwrap();
        Self {
            service,
            host,
            settings,
            dir,
        }
    }
}
