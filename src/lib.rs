//! # floatd
//!
//! Bookkeeping core of a floating-window service: apps open inside floating,
//! resizable windows, each rendered on its own virtual display, coordinated by
//! a privileged service.
//!
//! ## Architecture
//!
//! - `window`: session ids and the front-to-back [`WindowStack`]
//! - `listener`: registry of remote open-count observers
//! - `config`: user config record and its store, daemon settings
//! - `command`: normalized commands and the inbound signal vocabulary
//! - `session`: window construction through the host
//! - `router`: UI-confined execution of commands
//! - `service`: lifecycle and the thread-safe [`ServiceHandle`]
//! - `ipc`: newline-delimited JSON over a Unix socket
//! - `host`: traits for the window surfaces and system services we drive
//!
//! ## Usage
//!
//! ```rust,no_run
//! use floatd::{FloatService, LoggingHost, ServiceSettings};
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let host = Arc::new(LoggingHost::new());
//! let service = FloatService::start(&ServiceSettings::default(), host.clone(), host)?;
//! let handle = service.handle();
//! handle.create_window();
//! handle.flush().await?;
//! service.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod ipc;
pub mod listener;
pub mod router;
pub mod runtime;
pub mod service;
pub mod session;
pub mod window;

// Re-export main types for easy access
pub use command::{Command, ComponentName, Signal, Source, StartCommand};
pub use config::{Config, ConfigStore, ServiceSettings};
pub use host::{LoggingHost, SystemHost, WindowHost};
pub use ipc::FloatIpcServer;
pub use listener::{ListenerRegistry, OpenCountListener};
pub use service::{FloatService, ServiceHandle};
pub use window::{SessionId, WindowStack};

/// Version information for floatd
pub const VERSION_NAME: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_CODE: u32 = 1;
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Build timestamp in Unix millis, used by clients to detect version skew
pub fn build_time() -> i64 {
    env!("BUILD_TIME").parse().unwrap_or(0)
}
