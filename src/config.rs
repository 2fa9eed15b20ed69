//! Resolved installer configuration and derived paths.

use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::error::InstallError;
use crate::platform::ArchitectureTag;
use crate::runtime::Runtime;

/// Name of the installed binary and of the artifact on the host.
pub const BINARY_NAME: &str = "rzup";

/// Production artifact host.
pub const DEFAULT_BASE_URL: &str = "https://risc0-artifacts.s3.us-west-2.amazonaws.com/rzup";

/// Default stage path segment on the artifact host.
pub const DEFAULT_ENV_PATH: &str = "prod";

/// Install directory relative to the home directory.
pub const INSTALL_SUBDIR: &str = ".risc0/bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub env_path: String,
    pub home: PathBuf,
    /// Directory under which the scratch workspace is created
    pub scratch_root: PathBuf,
}

impl Config {
    /// Builds the configuration from overrides and the host environment.
    ///
    /// Empty overrides count as unset.
    pub fn new<R: Runtime>(
        runtime: &R,
        base_url: Option<String>,
        env_path: Option<String>,
    ) -> Result<Self> {
        let base_url = base_url
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let env_path = env_path
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ENV_PATH.to_string());
        let home = runtime.home_dir().ok_or(InstallError::NoHomeDir)?;

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            env_path: env_path.trim_matches('/').to_string(),
            home,
            scratch_root: runtime.temp_dir(),
        };
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    pub fn install_dir(&self) -> PathBuf {
        self.home.join(INSTALL_SUBDIR)
    }

    pub fn binary_path(&self) -> PathBuf {
        self.install_dir().join(BINARY_NAME)
    }

    /// `<base-url>/<env-path>/<architecture-tag>/<binary-name>`
    pub fn download_url(&self, tag: ArchitectureTag) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url, self.env_path, tag, BINARY_NAME
        )
    }
}
