//! Install transaction: fetch one artifact and promote it into place.
//!
//! The transaction is safe to re-run. The previous binary is removed before
//! the new one is moved in, and the scratch workspace is removed on every
//! exit path, so repeated runs converge on a single binary at the fixed path.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::cleanup::{ScratchWorkspace, SharedCleanupContext};
use crate::config::BINARY_NAME;
use crate::download::Downloader;
use crate::error::InstallError;
use crate::runtime::Runtime;

/// Everything the transaction needs, resolved before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub url: String,
    pub install_dir: PathBuf,
    pub scratch_root: PathBuf,
}

impl InstallPlan {
    pub fn binary_path(&self) -> PathBuf {
        self.install_dir.join(BINARY_NAME)
    }
}

pub struct Installer<'a, R: Runtime> {
    runtime: &'a R,
    downloader: &'a Downloader,
    cleanup: SharedCleanupContext,
}

impl<'a, R: Runtime> Installer<'a, R> {
    pub fn new(runtime: &'a R, downloader: &'a Downloader, cleanup: SharedCleanupContext) -> Self {
        Self {
            runtime,
            downloader,
            cleanup,
        }
    }

    /// Runs the transaction and returns the installed binary's path.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn install(&self, plan: &InstallPlan) -> Result<PathBuf> {
        self.check_preconditions(plan)?;

        let scratch =
            ScratchWorkspace::create(self.runtime, self.cleanup.clone(), &plan.scratch_root)?;

        let binary_path = plan.binary_path();
        self.remove_previous(&binary_path);

        let artifact = scratch.join(BINARY_NAME);
        self.downloader
            .fetch(self.runtime, &plan.url, &artifact)
            .await?;

        self.runtime
            .set_permissions(&artifact, 0o755)
            .with_context(|| format!("command failed: chmod +x {}", artifact.display()))?;
        if !self.runtime.is_executable(&artifact) {
            return Err(InstallError::NotExecutable(artifact).into());
        }

        self.runtime
            .create_dir_all(&plan.install_dir)
            .with_context(|| {
                format!("command failed: mkdir -p {}", plan.install_dir.display())
            })?;

        self.promote(&artifact, &binary_path)?;
        info!("installed {}", binary_path.display());

        drop(scratch);
        Ok(binary_path)
    }

    fn check_preconditions(&self, plan: &InstallPlan) -> Result<()> {
        if !self.runtime.is_dir(&plan.scratch_root) {
            return Err(InstallError::NoScratchRoot(plan.scratch_root.clone()).into());
        }
        Ok(())
    }

    /// Best effort: a missing binary is fine, a stuck one only warns.
    fn remove_previous(&self, binary_path: &Path) {
        if !self.runtime.exists(binary_path) {
            return;
        }
        debug!("Removing previous {}", binary_path.display());
        if let Err(e) = self.runtime.remove_file(binary_path) {
            warn!(
                "failed to remove previous {}: {:#}",
                binary_path.display(),
                e
            );
        }
    }

    /// Moves the artifact into place, copying when a rename cannot cross filesystems.
    fn promote(&self, artifact: &Path, binary_path: &Path) -> Result<()> {
        if let Err(e) = self.runtime.rename(artifact, binary_path) {
            debug!("rename failed ({:#}), falling back to copy", e);
            self.runtime
                .copy(artifact, binary_path)
                .and_then(|_| self.runtime.remove_file(artifact))
                .with_context(|| {
                    format!(
                        "command failed: mv {} {}",
                        artifact.display(),
                        binary_path.display()
                    )
                })?;
        }
        Ok(())
    }
}
