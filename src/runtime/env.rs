//! Environment and system information operations.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

/// Raw host identity as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uname {
    /// Kernel name, e.g. `Linux` or `Darwin`.
    pub sysname: String,
    /// Hardware identifier, e.g. `x86_64` or `arm64`.
    pub machine: String,
}

impl RealRuntime {
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn temp_dir_impl(&self) -> PathBuf {
        env::temp_dir()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn uname_impl(&self) -> Result<Uname> {
        #[cfg(unix)]
        {
            use anyhow::Context;

            let uts = nix::sys::utsname::uname().context("Failed to query uname")?;
            Ok(Uname {
                sysname: uts.sysname().to_string_lossy().into_owned(),
                machine: uts.machine().to_string_lossy().into_owned(),
            })
        }
        #[cfg(not(unix))]
        {
            Ok(Uname {
                sysname: env::consts::OS.to_string(),
                machine: env::consts::ARCH.to_string(),
            })
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn login_shell_impl(&self) -> Option<String> {
        #[cfg(unix)]
        {
            let uid = nix::unistd::getuid();
            let user = nix::unistd::User::from_uid(uid).ok()??;
            Some(user.shell.to_string_lossy().into_owned())
        }
        #[cfg(not(unix))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_env_and_dirs() {
        let runtime = RealRuntime;

        // PATH should exist on all systems
        assert!(runtime.env_var("PATH").is_ok());
        assert!(runtime.env_var("RZUP_INSTALL_SURELY_UNSET_VAR").is_err());

        let temp = runtime.temp_dir();
        assert!(temp.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_real_runtime_uname() {
        let runtime = RealRuntime;
        let uname = runtime.uname().unwrap();

        assert!(!uname.sysname.is_empty());
        assert!(!uname.machine.is_empty());

        #[cfg(target_os = "linux")]
        assert_eq!(uname.sysname, "Linux");

        #[cfg(target_os = "macos")]
        assert_eq!(uname.sysname, "Darwin");
    }

    #[cfg(unix)]
    #[test]
    fn test_real_runtime_login_shell_does_not_panic() {
        let runtime = RealRuntime;
        // Containers may lack a passwd entry for the current uid
        if let Some(shell) = runtime.login_shell() {
            assert!(!shell.is_empty());
        }
    }
}
