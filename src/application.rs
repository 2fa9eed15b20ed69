//! Bootstrap use case - orchestrates the whole install flow.
//!
//! The stages run strictly in order, each consuming the previous stage's
//! output:
//! - Toolchain precondition (`rustc` on PATH)
//! - Platform probe
//! - Download tool capability check
//! - Install transaction
//! - Shell profile patch

use anyhow::Result;
use log::{debug, info};
use std::path::PathBuf;

use crate::cleanup::{new_shared, spawn_signal_watcher};
use crate::config::Config;
use crate::download::Downloader;
use crate::error::InstallError;
use crate::install::{InstallPlan, Installer};
use crate::platform::ArchitectureTag;
use crate::runtime::Runtime;
use crate::shell::{ConfigureResult, ProfilePatcher};

/// Options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Artifact host override
    pub base_url: Option<String>,
    /// Stage path segment override
    pub env_path: Option<String>,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub tag: ArchitectureTag,
    pub url: String,
    pub binary: PathBuf,
    pub install_dir: PathBuf,
    pub path_setup: ConfigureResult,
}

impl BootstrapReport {
    /// Instructions printed to stdout once everything succeeded.
    pub fn instructions(&self) -> String {
        let mut out = String::new();
        match &self.path_setup {
            ConfigureResult::Added { shell, profile } => {
                out.push_str(&format!(
                    "Detected your preferred shell is {} and added rzup to PATH.\n",
                    shell
                ));
                out.push_str(&format!(
                    "Run 'source {}' or start a new terminal session to use rzup.\n",
                    profile.display()
                ));
            }
            ConfigureResult::AlreadyConfigured { .. } => {
                out.push_str(&format!(
                    "{} is already on your PATH.\n",
                    self.install_dir.display()
                ));
            }
        }
        out.push_str("Then, simply run 'rzup install' to install the RISC Zero toolchain.\n");
        out
    }
}

/// Fails unless a Rust compiler is reachable on PATH.
pub fn check_toolchain<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    runtime.which("rustc").ok_or_else(|| {
        InstallError::MissingCommand {
            command: "rustc".to_string(),
            hint: "Install Rust from https://rustup.rs and run the installer again.".to_string(),
        }
        .into()
    })
}

/// Runs every stage and returns what was done.
///
/// A SIGINT/SIGTERM arriving after the capability checks removes the scratch
/// workspace before the process exits.
#[tracing::instrument(level = "debug", skip(runtime))]
pub async fn bootstrap<R: Runtime>(runtime: &R, options: &BootstrapOptions) -> Result<BootstrapReport> {
    let rustc = check_toolchain(runtime)?;
    debug!("Found rustc at {}", rustc.display());

    let tag = ArchitectureTag::probe(runtime)?;
    info!("detected platform {}", tag);

    let downloader = Downloader::detect(runtime)?;
    let config = Config::new(runtime, options.base_url.clone(), options.env_path.clone())?;

    let plan = InstallPlan {
        url: config.download_url(tag),
        install_dir: config.install_dir(),
        scratch_root: config.scratch_root.clone(),
    };

    let cleanup_ctx = new_shared();
    let watcher = spawn_signal_watcher(cleanup_ctx.clone());
    let result = async {
        let binary = Installer::new(runtime, &downloader, cleanup_ctx)
            .install(&plan)
            .await?;
        let path_setup =
            ProfilePatcher::new(runtime, &config.home).configure_path(&plan.install_dir)?;
        Ok::<_, anyhow::Error>((binary, path_setup))
    }
    .await;
    watcher.abort();
    let (binary, path_setup) = result?;

    Ok(BootstrapReport {
        tag,
        url: plan.url,
        binary,
        install_dir: plan.install_dir,
        path_setup,
    })
}
