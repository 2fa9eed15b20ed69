//! Scratch workspace lifetime and exit-time cleanup.
//!
//! Normal and error paths remove the workspace when [`ScratchWorkspace`] is
//! dropped. A signal can end the process without unwinding, so the workspace
//! is also registered in a shared [`CleanupContext`] that the signal watcher
//! drains before exiting.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::runtime::Runtime;

/// Tracks paths that need cleanup on interruption
#[derive(Default)]
pub struct CleanupContext {
    #[cfg(test)]
    pub paths: Vec<PathBuf>,
    #[cfg(not(test))]
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Clean up all registered paths
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            debug!("Cleaning up: {:?}", path);
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(&path);
            } else {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

fn locked<T>(ctx: &SharedCleanupContext, f: impl FnOnce(&mut CleanupContext) -> T) -> T {
    let mut guard = ctx.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Temporary directory exclusively owned by one install run.
///
/// Removed when dropped, on success and failure alike.
pub struct ScratchWorkspace<'a, R: Runtime> {
    runtime: &'a R,
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl<'a, R: Runtime> ScratchWorkspace<'a, R> {
    /// Creates a fresh directory under `root` and registers it for cleanup.
    pub fn create(runtime: &'a R, ctx: SharedCleanupContext, root: &Path) -> Result<Self> {
        let path = runtime
            .create_temp_dir(root, "rzup-install-")
            .with_context(|| format!("command failed: mktemp -d in {}", root.display()))?;
        debug!("Created scratch workspace {}", path.display());
        locked(&ctx, |c| c.add(path.clone()));
        Ok(Self { runtime, ctx, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl<R: Runtime> Drop for ScratchWorkspace<'_, R> {
    fn drop(&mut self) {
        if self.runtime.exists(&self.path) {
            if let Err(e) = self.runtime.remove_dir_all(&self.path) {
                warn!(
                    "failed to remove scratch directory {}: {:#}",
                    self.path.display(),
                    e
                );
                // Leave it registered so a late signal still retries
                return;
            }
            debug!("Removed scratch workspace {}", self.path.display());
        }
        locked(&self.ctx, |c| c.remove(&self.path));
    }
}

/// SIGINT and SIGTERM streams, registered as soon as this is constructed.
#[cfg(unix)]
pub struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    /// Installs the handlers. Must be called from inside a tokio runtime.
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Waits for the next signal, returning the conventional exit code.
    pub async fn recv(&mut self) -> i32 {
        tokio::select! {
            _ = self.interrupt.recv() => 130,
            _ = self.terminate.recv() => 143,
        }
    }
}

/// Spawns a task that drains `ctx` and exits the process on interruption.
///
/// The handlers are in place when this returns. Abort the returned handle
/// once the guarded work has finished.
pub fn spawn_signal_watcher(ctx: SharedCleanupContext) -> tokio::task::JoinHandle<()> {
    #[cfg(unix)]
    let signals = TerminationSignals::register();

    tokio::spawn(async move {
        #[cfg(unix)]
        let code = match signals {
            Ok(mut signals) => signals.recv().await,
            Err(e) => {
                debug!("Cannot watch SIGINT/SIGTERM: {}", e);
                std::future::pending::<i32>().await
            }
        };
        #[cfg(not(unix))]
        let code = {
            let _ = tokio::signal::ctrl_c().await;
            130
        };

        warn!("interrupted, cleaning up");
        locked(&ctx, |c| c.cleanup());
        std::process::exit(code);
    })
}
