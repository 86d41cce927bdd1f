//! Companion process module
//!
//! Auxiliary commands (typically topic throttlers) started alongside the
//! daemon. They are best-effort: a companion that fails to start is logged
//! and skipped, and nothing on the request path depends on them.
//! Every running companion is killed on shutdown, and also when its handle
//! is dropped.

use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

use crate::config::CompanionConfig;
use crate::logger;

/// How a companion ended when asked to terminate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Still running; killed and reaped
    Killed,
    /// Had already exited on its own
    AlreadyExited(ExitStatus),
}

/// A launched background command
#[derive(Debug)]
pub struct CompanionHandle {
    name: String,
    child: Child,
}

impl CompanionHandle {
    /// Spawn `command` with `args`. Stdin is closed; stdout and stderr are
    /// inherited so companion output lands next to the daemon's.
    pub fn start(name: &str, command: &str, args: &[String]) -> io::Result<Self> {
        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        Ok(Self {
            name: name.to_string(),
            child,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id, `None` once the process has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the process if it is still running and wait for it
    pub async fn terminate(mut self) -> io::Result<Termination> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(Termination::AlreadyExited(status));
        }
        self.child.kill().await?;
        Ok(Termination::Killed)
    }
}

/// All companions owned by the daemon
#[derive(Debug, Default)]
pub struct Companions {
    handles: Vec<CompanionHandle>,
}

impl Companions {
    /// Start every configured companion, skipping the ones that fail
    pub fn start_all(configs: &[CompanionConfig]) -> Self {
        let handles = configs
            .iter()
            .filter_map(|cfg| {
                match CompanionHandle::start(&cfg.name, &cfg.command, &cfg.args) {
                    Ok(handle) => {
                        logger::log_companion_started(handle.name(), handle.id());
                        Some(handle)
                    }
                    Err(e) => {
                        logger::log_companion_failed(&cfg.name, &e);
                        None
                    }
                }
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Terminate every companion. Failures are logged, never returned.
    pub async fn terminate_all(self) {
        for handle in self.handles {
            let name = handle.name().to_string();
            match handle.terminate().await {
                Ok(Termination::Killed) => logger::log_companion_terminated(&name),
                Ok(Termination::AlreadyExited(status)) => {
                    logger::log_warning(&format!(
                        "[COMPANION] '{name}' had already exited ({status})"
                    ));
                }
                Err(e) => {
                    logger::log_error(&format!("[COMPANION] Failed to terminate '{name}': {e}"));
                }
            }
        }
    }
}
