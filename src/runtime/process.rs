//! Program lookup and child process execution.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::RealRuntime;

/// Exit status of a finished child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, or `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl RealRuntime {
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn which_impl(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) async fn run_command_impl(
        &self,
        program: &Path,
        args: &[String],
    ) -> Result<CommandStatus> {
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to spawn {}", program.display()))?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }
}
