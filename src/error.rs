//! Failure kinds the installer can stop on.
//!
//! Every variant is fatal. They travel inside `anyhow::Error` so callers can
//! attach context, and tests recover them with `downcast_ref`.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// A required external program is not on PATH
    MissingCommand { command: String, hint: String },
    /// The kernel name is not one we ship binaries for
    UnsupportedOs(String),
    /// The CPU identifier is not one we ship binaries for
    UnsupportedCpu(String),
    /// OS and CPU are each known, but no artifact exists for the pair
    UnsupportedPlatform { cpu: String, os: String },
    /// The download tool ran and reported failure
    DownloadFailed {
        tool: String,
        url: String,
        code: Option<i32>,
    },
    /// The downloaded file did not end up executable
    NotExecutable(PathBuf),
    /// The login shell is outside the set we know how to configure
    UnknownShell { shell: String, install_dir: PathBuf },
    /// No home directory could be determined
    NoHomeDir,
    /// The scratch root does not exist
    NoScratchRoot(PathBuf),
}

impl std::fmt::Display for InstallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallError::MissingCommand { command, hint } => {
                write!(f, "need '{}' (command not found). {}", command, hint)
            }
            InstallError::UnsupportedOs(os) => write!(f, "unsupported OS type: {}", os),
            InstallError::UnsupportedCpu(cpu) => write!(f, "unsupported CPU type: {}", cpu),
            InstallError::UnsupportedPlatform { cpu, os } => {
                write!(f, "unsupported platform: {} on {}", cpu, os)
            }
            InstallError::DownloadFailed { tool, url, code } => match code {
                Some(code) => write!(
                    f,
                    "failed to download {} ({} exited with status {})",
                    url, tool, code
                ),
                None => write!(
                    f,
                    "failed to download {} ({} was terminated by a signal)",
                    url, tool
                ),
            },
            InstallError::NotExecutable(path) => {
                write!(f, "failed to make {} executable", path.display())
            }
            InstallError::UnknownShell { shell, install_dir } => write!(
                f,
                "could not detect shell '{}', manually add {} to your PATH",
                shell,
                install_dir.display()
            ),
            InstallError::NoHomeDir => write!(f, "could not determine the home directory"),
            InstallError::NoScratchRoot(path) => write!(
                f,
                "temporary directory {} does not exist",
                path.display()
            ),
        }
    }
}

impl std::error::Error for InstallError {}
