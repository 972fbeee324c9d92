//! UI-confined command execution
//!
//! [`CommandRouter`] owns the window stack, the listener registry and the open
//! count. It runs on the UI thread and consumes [`UiEvent`]s in submission
//! order, which makes it the single writer of all window bookkeeping.

use crate::command::{Command, Source, StartCommand};
use crate::config::ConfigStore;
use crate::host::{KeyAction, KeyEvent, LauncherConfigReply, SystemHost, WindowHost};
use crate::listener::{ListenerId, ListenerRegistry, OpenCountListener};
use crate::session::SessionFactory;
use crate::window::{DisplayId, SessionId, WindowStack};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

/// Events accepted by the UI context
pub enum UiEvent {
    Command(Command),
    /// A window's display became ready
    SessionReady {
        id: SessionId,
        start: Option<StartCommand>,
    },
    WindowClosed(SessionId),
    WindowFocused(SessionId),
    RegisterListener(Arc<dyn OpenCountListener>),
    UnregisterListener(ListenerId),
    QueryIsFront(SessionId, oneshot::Sender<bool>),
    QueryStack(oneshot::Sender<Vec<SessionId>>),
    QueryOpenCount(oneshot::Sender<u32>),
    /// Answered once every earlier event, and whatever those queued while
    /// being handled, has been processed
    Flush(oneshot::Sender<()>),
    Flushed(oneshot::Sender<()>),
    Shutdown,
}

/// Where commands look for the foreground task
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub primary_display: DisplayId,
    pub launcher_package: String,
}

pub struct CommandRouter {
    stack: WindowStack,
    listeners: ListenerRegistry,
    /// Windows created so far; never decremented
    open_count: u32,
    factory: SessionFactory,
    system: Arc<dyn SystemHost>,
    config: Arc<ConfigStore>,
    settings: RouterSettings,
    /// Back door into our own queue
    events: UnboundedSender<UiEvent>,
}

impl CommandRouter {
    pub(crate) fn new(
        window: Arc<dyn WindowHost>,
        system: Arc<dyn SystemHost>,
        config: Arc<ConfigStore>,
        settings: RouterSettings,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            stack: WindowStack::new(),
            listeners: ListenerRegistry::new(),
            open_count: 0,
            factory: SessionFactory::new(window, events.clone()),
            system,
            config,
            settings,
            events,
        }
    }

    /// Drain events until shutdown
    pub async fn run(mut self, mut events: UnboundedReceiver<UiEvent>) {
        info!("🎬 Window service loop started");
        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("🛑 Window service loop finished");
    }

    /// Handle one event; `false` stops the loop
    pub fn handle_event(&mut self, event: UiEvent) -> bool {
        match event {
            UiEvent::Command(command) => self.dispatch(command),
            UiEvent::SessionReady { id, start } => self.on_session_ready(id, start),
            UiEvent::WindowClosed(id) => {
                if self.stack.remove(id).is_some() {
                    debug!("🗑️ Window {} closed", id);
                }
            }
            UiEvent::WindowFocused(id) => self.stack.promote(id),
            UiEvent::RegisterListener(listener) => {
                self.listeners.register(listener, self.open_count);
            }
            UiEvent::UnregisterListener(id) => {
                self.listeners.unregister(id);
            }
            UiEvent::QueryIsFront(id, reply) => {
                let _ = reply.send(self.stack.is_front(id));
            }
            UiEvent::QueryStack(reply) => {
                let _ = reply.send(self.stack.to_vec());
            }
            UiEvent::QueryOpenCount(reply) => {
                let _ = reply.send(self.open_count);
            }
            UiEvent::Flush(reply) => {
                let _ = self.events.send(UiEvent::Flushed(reply));
            }
            UiEvent::Flushed(reply) => {
                let _ = reply.send(());
            }
            UiEvent::Shutdown => return false,
        }
        true
    }

    pub fn dispatch(&mut self, command: Command) {
        debug!("📨 {:?}", command);
        match command {
            Command::CreateWindow(start) => self.create_window(start),
            Command::OpenAppList => {
                self.factory.collapse_panels();
                if let Err(e) = self.factory.host().open_app_list() {
                    warn!("⚠️ Failed to open app list: {}", e);
                }
            }
            Command::CurrentTaskToWindow => self.current_task_to_window(),
            Command::ResetAllWindows => {
                self.factory.collapse_panels();
                if let Err(e) = self.factory.host().reset_all_windows() {
                    warn!("⚠️ Failed to reset windows: {}", e);
                }
            }
            Command::LaunchSideBar => {
                if let Err(e) = self.factory.host().launch_side_bar() {
                    warn!("⚠️ Failed to launch side bar: {}", e);
                }
            }
            Command::ReplyLauncherConfig { target } => {
                let reply = LauncherConfigReply {
                    target,
                    hooks: self.config.current().hook_launcher.clone(),
                };
                debug!("📤 send config: {:?}", reply.hooks);
                if let Err(e) = self.system.send_launcher_config(reply) {
                    warn!("⚠️ Failed to send launcher config: {}", e);
                }
            }
        }
    }

    fn create_window(&mut self, start: Option<StartCommand>) {
        let config = self.config.current();
        let from_recents = matches!(&start, Some(s) if s.source == Source::Recents);

        if !self.factory.create(config.window_params(), start) {
            return;
        }

        if from_recents && config.recents_back_home {
            self.press_home();
        }
    }

    fn on_session_ready(&mut self, id: SessionId, start: Option<StartCommand>) {
        self.stack.push(id);
        self.open_count += 1;
        info!("🪟 Window {} ready ({} opened)", id, self.open_count);
        self.listeners.notify_all(self.open_count);

        if let Some(start) = start {
            self.factory.auto_start(id, &start);
        }
    }

    fn current_task_to_window(&mut self) {
        let Some(task) = self.system.top_root_task(self.settings.primary_display) else {
            debug!("🔎 No foreground task on display {}", self.settings.primary_display.0);
            return;
        };

        if task.base_package.as_deref() == Some(self.settings.launcher_package.as_str()) {
            debug!("🏠 Foreground task is the launcher, not converting it");
            return;
        }

        self.create_window(Some(StartCommand::task(task.task_id)));
    }

    /// Dismiss recents with a synthesized HOME press (best effort)
    fn press_home(&self) {
        for action in [KeyAction::Down, KeyAction::Up] {
            let event = KeyEvent::home(action, self.settings.primary_display);
            if let Err(e) = self.system.inject_key(event) {
                warn!("⚠️ Failed to inject HOME {:?}: {}", action, e);
            }
        }
    }

    pub fn stack(&self) -> &WindowStack {
        &self.stack
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn open_count(&self) -> u32 {
        self.open_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ComponentName;
    use crate::host::{MockSystemHost, MockWindowHost, TaskInfo};
    use crate::runtime::IoContext;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc;

    struct Harness {
        router: CommandRouter,
        events: UnboundedReceiver<UiEvent>,
        _dir: TempDir,
    }

    impl Harness {
        /// Feed queued completions back into the router, like the UI loop does
        fn pump(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.router.handle_event(event);
            }
        }
    }

    fn settings() -> RouterSettings {
        RouterSettings {
            primary_display: DisplayId::PRIMARY,
            launcher_package: "com.android.launcher3".to_string(),
        }
    }

    fn harness(window: MockWindowHost, system: MockSystemHost) -> Harness {
        let dir = tempdir().unwrap();
        let config = Arc::new(ConfigStore::open(dir.path().join("config.json"), IoContext::current()));
        let (tx, rx): (UnboundedSender<UiEvent>, _) = mpsc::unbounded_channel();
        Harness {
            router: CommandRouter::new(Arc::new(window), Arc::new(system), config, settings(), tx),
            events: rx,
            _dir: dir,
        }
    }

    fn window_host_with_ids(first: i32) -> MockWindowHost {
        let mut host = MockWindowHost::new();
        let mut next = first;
        host.expect_collapse_panels().returning(|| Ok(()));
        host.expect_create_window().returning(move |_, ready| {
            ready.complete(SessionId(next));
            next += 1;
            Ok(())
        });
        host
    }

    #[tokio::test]
    async fn test_ready_session_is_pushed_and_counted() {
        let mut h = harness(window_host_with_ids(10), MockSystemHost::new());

        h.router.dispatch(Command::CreateWindow(None));
        assert!(h.router.stack().is_empty(), "registration waits for the ready event");

        h.pump();
        assert!(h.router.stack().is_front(SessionId(10)));
        assert_eq!(h.router.open_count(), 1);
    }

    #[tokio::test]
    async fn test_auto_start_follows_registration() {
        let mut window = window_host_with_ids(4);
        window
            .expect_auto_start()
            .withf(|id, start| *id == SessionId(4) && *start == StartCommand::task(77))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut h = harness(window, MockSystemHost::new());

        h.router.dispatch(Command::CreateWindow(Some(StartCommand::task(77))));
        h.pump();

        assert_eq!(h.router.stack().to_vec(), vec![SessionId(4)]);
    }

    #[tokio::test]
    async fn test_current_to_window_skips_launcher() {
        let mut window = MockWindowHost::new();
        window.expect_create_window().never();
        let mut system = MockSystemHost::new();
        system.expect_top_root_task().returning(|_| {
            Some(TaskInfo {
                task_id: 1,
                base_package: Some("com.android.launcher3".to_string()),
            })
        });
        let mut h = harness(window, system);

        h.router.dispatch(Command::CurrentTaskToWindow);
        h.pump();

        assert!(h.router.stack().is_empty());
        assert_eq!(h.router.open_count(), 0);
    }

    #[tokio::test]
    async fn test_current_to_window_without_task_is_silent() {
        let mut window = MockWindowHost::new();
        window.expect_create_window().never();
        window.expect_show_toast().never();
        let mut system = MockSystemHost::new();
        system.expect_top_root_task().returning(|_| None);
        let mut h = harness(window, system);

        h.router.dispatch(Command::CurrentTaskToWindow);
        h.pump();

        assert!(h.router.stack().is_empty());
    }

    #[tokio::test]
    async fn test_current_to_window_moves_foreground_task() {
        let mut window = window_host_with_ids(2);
        window
            .expect_auto_start()
            .withf(|_, start| *start == StartCommand::task(31))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut system = MockSystemHost::new();
        system
            .expect_top_root_task()
            .withf(|display| *display == DisplayId::PRIMARY)
            .returning(|_| {
                Some(TaskInfo {
                    task_id: 31,
                    base_package: Some("com.example".to_string()),
                })
            });
        let mut h = harness(window, system);

        h.router.dispatch(Command::CurrentTaskToWindow);
        h.pump();

        assert!(h.router.stack().is_front(SessionId(2)));
    }

    #[tokio::test]
    async fn test_failed_construction_registers_nothing() {
        let mut window = MockWindowHost::new();
        window.expect_collapse_panels().returning(|| Ok(()));
        window
            .expect_create_window()
            .returning(|_, _| Err(crate::error::HostError::Rejected("no surface".into())));
        window.expect_show_toast().times(1).return_const(());
        let mut system = MockSystemHost::new();
        system.expect_inject_key().never();
        let mut h = harness(window, system);

        let start = StartCommand::component(ComponentName::new("a.b", "a.b.C"), 0)
            .with_source(Source::Recents);
        h.router.dispatch(Command::CreateWindow(Some(start)));
        h.pump();

        assert!(h.router.stack().is_empty());
        assert_eq!(h.router.open_count(), 0);
    }

    #[tokio::test]
    async fn test_closing_keeps_open_count() {
        let mut h = harness(window_host_with_ids(1), MockSystemHost::new());
        h.router.dispatch(Command::CreateWindow(None));
        h.router.dispatch(Command::CreateWindow(None));
        h.pump();

        h.router.handle_event(UiEvent::WindowClosed(SessionId(2)));

        assert_eq!(h.router.stack().to_vec(), vec![SessionId(1)]);
        assert_eq!(h.router.open_count(), 2);
    }

    #[tokio::test]
    async fn test_launcher_config_reply_uses_current_hooks() {
        let mut system = MockSystemHost::new();
        system
            .expect_send_launcher_config()
            .withf(|reply| {
                reply.target.as_deref() == Some("com.android.launcher3") && reply.hooks.hook_recents
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut h = harness(MockWindowHost::new(), system);

        h.router.dispatch(Command::ReplyLauncherConfig {
            target: Some("com.android.launcher3".to_string()),
        });
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let mut h = harness(MockWindowHost::new(), MockSystemHost::new());
        assert!(!h.router.handle_event(UiEvent::Shutdown));
    }
}
