//! Shell configuration for automatic PATH setup.
//!
//! Detects the user's login shell and appends a PATH entry for the install
//! directory to its startup file, unless the directory is already on the live
//! PATH of this process.
//!
//! ## Supported Shells
//!
//! - Zsh: `$ZDOTDIR/.zshrc` (or `~/.zshrc`)
//! - Bash: `~/.bashrc`
//! - Fish: `~/.config/fish/config.fish`
//! - Ash: `~/.profile`
//!
//! ## Configuration Format
//!
//! For zsh/bash/ash:
//! ```bash
//! export PATH="$PATH:/home/user/.risc0/bin"
//! ```
//!
//! For fish:
//! ```fish
//! fish_add_path -a /home/user/.risc0/bin
//! ```

use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::runtime::Runtime;

/// Represents supported shell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Zsh,
    Bash,
    Fish,
    Ash,
}

impl Shell {
    /// Parses a shell from a path string (e.g., "/bin/bash").
    pub fn from_path(path: &str) -> Option<Self> {
        let shell_name = Path::new(path).file_name()?.to_str()?;
        match shell_name {
            "zsh" => Some(Self::Zsh),
            "bash" => Some(Self::Bash),
            "fish" => Some(Self::Fish),
            "ash" => Some(Self::Ash),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
            Self::Fish => "fish",
            Self::Ash => "ash",
        }
    }

    /// Startup file sourced by interactive sessions of this shell.
    pub fn profile_path(self, home: &Path, zdotdir: Option<&Path>) -> PathBuf {
        match self {
            Self::Zsh => zdotdir.unwrap_or(home).join(".zshrc"),
            Self::Bash => home.join(".bashrc"),
            Self::Fish => home.join(".config").join("fish").join("config.fish"),
            Self::Ash => home.join(".profile"),
        }
    }

    /// Text appended to the profile: a blank line, then the PATH statement.
    ///
    /// POSIX shells escape `\`, `$`, backticks and `"` inside double quotes;
    /// fish single-quotes paths that contain special characters.
    pub fn path_config(self, bin_path: &Path) -> String {
        match self {
            Self::Zsh | Self::Bash | Self::Ash => {
                let escaped_path = bin_path
                    .display()
                    .to_string()
                    .replace('\\', "\\\\")
                    .replace('$', "\\$")
                    .replace('`', "\\`")
                    .replace('"', "\\\"");
                format!("\nexport PATH=\"$PATH:{escaped_path}\"\n")
            }
            Self::Fish => {
                let path_str = bin_path.display().to_string();
                let needs_quotes = path_str.chars().any(|c| {
                    matches!(
                        c,
                        ' ' | '$' | '\\' | '\'' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}'
                    )
                });
                let formatted_path = if needs_quotes {
                    format!("'{}'", path_str.replace('\\', "\\\\").replace('\'', "\\'"))
                } else {
                    path_str
                };
                format!("\nfish_add_path -a {formatted_path}\n")
            }
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns true if `dir` is one of the colon-separated segments of `path_var`.
///
/// Segments are compared exactly; `/a/bin/` does not match `/a/bin`.
pub fn path_contains(path_var: &str, dir: &Path) -> bool {
    let dir = dir.display().to_string();
    path_var.split(':').any(|segment| segment == dir)
}

/// Result of making the install directory discoverable on PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigureResult {
    /// The live PATH already contains the directory; nothing was written.
    AlreadyConfigured { shell: Shell, profile: PathBuf },
    /// A PATH statement was appended to the profile.
    Added { shell: Shell, profile: PathBuf },
}

impl ConfigureResult {
    pub fn shell(&self) -> Shell {
        match self {
            Self::AlreadyConfigured { shell, .. } | Self::Added { shell, .. } => *shell,
        }
    }

    pub fn profile(&self) -> &Path {
        match self {
            Self::AlreadyConfigured { profile, .. } | Self::Added { profile, .. } => profile,
        }
    }
}

pub struct ProfilePatcher<'a, R: Runtime> {
    runtime: &'a R,
    home: &'a Path,
}

impl<'a, R: Runtime> ProfilePatcher<'a, R> {
    pub fn new(runtime: &'a R, home: &'a Path) -> Self {
        Self { runtime, home }
    }

    fn env(&self, key: &str) -> Option<String> {
        self.runtime.env_var(key).ok().filter(|v| !v.is_empty())
    }

    /// Reads the login shell from `SHELL`, falling back to the passwd entry.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnknownShell`] for anything outside the
    /// supported set, naming `install_dir` so the user can add it manually.
    pub fn detect_shell(&self, install_dir: &Path) -> Result<Shell> {
        let value = self
            .env("SHELL")
            .or_else(|| self.runtime.login_shell())
            .unwrap_or_default();
        debug!("Login shell: {:?}", value);

        Shell::from_path(&value).ok_or_else(|| {
            InstallError::UnknownShell {
                shell: value,
                install_dir: install_dir.to_path_buf(),
            }
            .into()
        })
    }

    /// Appends a PATH entry for `install_dir` unless the live PATH has it.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn configure_path(&self, install_dir: &Path) -> Result<ConfigureResult> {
        let shell = self.detect_shell(install_dir)?;
        let zdotdir = self.env("ZDOTDIR").map(PathBuf::from);
        let profile = shell.profile_path(self.home, zdotdir.as_deref());

        let live_path = self.env("PATH").unwrap_or_default();
        if path_contains(&live_path, install_dir) {
            debug!("{} is already on PATH", install_dir.display());
            return Ok(ConfigureResult::AlreadyConfigured { shell, profile });
        }

        if let Some(parent) = profile.parent() {
            self.runtime
                .create_dir_all(parent)
                .with_context(|| format!("command failed: mkdir -p {}", parent.display()))?;
        }
        self.runtime
            .append(&profile, shell.path_config(install_dir).as_bytes())
            .with_context(|| format!("command failed: append to {}", profile.display()))?;
        info!("added {} to PATH in {}", install_dir.display(), profile.display());

        Ok(ConfigureResult::Added { shell, profile })
    }
}
