//! Execution contexts
//!
//! - The UI context is one dedicated thread running a current-thread tokio
//!   runtime. Everything that touches windows, the stack or the listener set
//!   runs there, in submission order.
//! - The I/O context is a small multi-thread runtime for blocking work such as
//!   config persistence. Nothing on it may mutate UI-owned state directly.

use std::future::Future;
use std::io;
use std::thread;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// Handle for dispatching blocking work off the UI context
#[derive(Clone, Debug)]
pub struct IoContext {
    handle: Handle,
}

impl IoContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running on.
    ///
    /// Panics outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn spawn_blocking<F>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn_blocking(f)
    }
}

/// Owned background runtime backing an [`IoContext`]
pub struct IoRuntime {
    runtime: Option<Runtime>,
}

impl IoRuntime {
    pub fn new() -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("floatd-io")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Some(runtime),
        })
    }

    pub fn context(&self) -> Option<IoContext> {
        self.runtime
            .as_ref()
            .map(|runtime| IoContext::new(runtime.handle().clone()))
    }

    /// Stop without waiting for queued work
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // May run inside another runtime's async context
            runtime.shutdown_background();
        }
    }
}

impl Drop for IoRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the UI thread and drive `make()` to completion on it
pub fn spawn_ui_thread<F, Fut>(make: F) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    thread::Builder::new()
        .name("floatd-ui".to_string())
        .spawn(move || runtime.block_on(make()))
}
