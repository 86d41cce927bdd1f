// Signal handling module
//
// Supported signals:
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGTERM: Graceful shutdown
// A second signal while shutting down exits the process at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Exit status when a second signal cuts shutdown short
const FORCED_EXIT_CODE: i32 = 130;

/// One-shot shutdown flag shared by the signal task and the server loop
pub struct ShutdownSignal {
    notify: Notify,
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
            requested: AtomicBool::new(false),
        }
    }

    /// Request shutdown. Only the first call has an effect; returns whether
    /// this call was it.
    pub fn trigger(&self, source: &str) -> bool {
        if self.requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        logger::log_shutdown_requested(source);
        // notify_one stores a permit if nobody is waiting yet
        self.notify.notify_one();
        true
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested
    pub async fn wait(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward a received signal to `shutdown`, or exit if shutdown is already
/// under way
fn on_signal(shutdown: &ShutdownSignal, source: &str) {
    if !shutdown.trigger(source) {
        logger::log_warning(&format!(
            "{source} received during shutdown, exiting immediately"
        ));
        std::process::exit(FORCED_EXIT_CODE);
    }
}

/// Register SIGINT/SIGTERM handlers. The first signal received starts a
/// graceful shutdown, the next one forces an exit. Registration errors are
/// returned before anything is spawned.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = sigint.recv() => on_signal(&shutdown, "SIGINT (Ctrl+C)"),
                Some(()) = sigterm.recv() => on_signal(&shutdown, "SIGTERM"),
                else => break,
            }
        }
    });
    Ok(())
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            on_signal(&shutdown, "Ctrl+C");
        }
    });
    Ok(())
}
