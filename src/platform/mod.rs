//! Platform detection and artifact selection.
//!
//! Maps the kernel name and CPU identifier reported by the host onto the
//! architecture tag used as a path segment on the artifact host.
//!
//! ## Supported Platforms
//!
//! - Linux `x86_64` (`Linux-X64`)
//! - macOS ARM64 (`macOS-ARM64`)
//!
//! The table is a whitelist. `arm64` Linux and `x86_64` macOS are rejected
//! even though both OS and CPU are individually recognised.

use anyhow::Result;
use log::debug;
use std::fmt;

use crate::error::InstallError;
use crate::runtime::Runtime;

/// Normalised operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
}

impl Os {
    /// Parses a kernel name as printed by `uname -s`.
    pub fn from_kernel_name(name: &str) -> Result<Self> {
        match name {
            "Linux" => Ok(Self::Linux),
            "Darwin" => Ok(Self::Darwin),
            other => Err(InstallError::UnsupportedOs(other.to_string()).into()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised CPU family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cpu {
    X86_64,
    Arm64,
}

impl Cpu {
    /// Parses a machine identifier as printed by `uname -m`.
    pub fn from_machine(machine: &str) -> Result<Self> {
        match machine {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            other => Err(InstallError::UnsupportedCpu(other.to_string()).into()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical platform identifier used to build the download URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchitectureTag {
    LinuxX64,
    MacosArm64,
}

impl ArchitectureTag {
    /// Looks up the tag for a normalised CPU/OS pair.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedPlatform`] for any pair outside the
    /// whitelist.
    pub fn from_parts(cpu: Cpu, os: Os) -> Result<Self> {
        match (cpu, os) {
            (Cpu::X86_64, Os::Linux) => Ok(Self::LinuxX64),
            (Cpu::Arm64, Os::Darwin) => Ok(Self::MacosArm64),
            (cpu, os) => Err(InstallError::UnsupportedPlatform {
                cpu: cpu.to_string(),
                os: os.to_string(),
            }
            .into()),
        }
    }

    /// Detects the tag for the running host.
    ///
    /// The OS is validated before the CPU, so an unsupported kernel is
    /// reported even on an unsupported CPU.
    #[tracing::instrument(level = "debug", skip(runtime))]
    pub fn probe<R: Runtime>(runtime: &R) -> Result<Self> {
        let uname = runtime.uname()?;
        debug!("uname: {} {}", uname.sysname, uname.machine);

        let os = Os::from_kernel_name(&uname.sysname)?;
        let cpu = Cpu::from_machine(&uname.machine)?;
        Self::from_parts(cpu, os)
    }

    /// Returns the tag string used as a path segment on the artifact host.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxX64 => "Linux-X64",
            Self::MacosArm64 => "macOS-ARM64",
        }
    }
}

impl fmt::Display for ArchitectureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, Uname};

    fn runtime_reporting(sysname: &str, machine: &str) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let uname = Uname {
            sysname: sysname.to_string(),
            machine: machine.to_string(),
        };
        runtime.expect_uname().returning(move || Ok(uname.clone()));
        runtime
    }

    fn probe_error(sysname: &str, machine: &str) -> InstallError {
        let runtime = runtime_reporting(sysname, machine);
        let err = ArchitectureTag::probe(&runtime).unwrap_err();
        err.downcast_ref::<InstallError>()
            .cloned()
            .expect("expected an InstallError")
    }

    #[test]
    fn test_supported_pairs() {
        let cases = [
            ("Linux", "x86_64", ArchitectureTag::LinuxX64),
            ("Linux", "amd64", ArchitectureTag::LinuxX64),
            ("Darwin", "arm64", ArchitectureTag::MacosArm64),
            ("Darwin", "aarch64", ArchitectureTag::MacosArm64),
        ];
        for (sysname, machine, expected) in cases {
            // MockRuntime only expects uname: any filesystem or network call would panic
            let runtime = runtime_reporting(sysname, machine);
            assert_eq!(ArchitectureTag::probe(&runtime).unwrap(), expected);
        }
    }

    #[test]
    fn test_tag_strings() {
        assert_eq!(ArchitectureTag::LinuxX64.as_str(), "Linux-X64");
        assert_eq!(ArchitectureTag::MacosArm64.to_string(), "macOS-ARM64");
    }

    #[test]
    fn test_plausible_but_unlisted_pairs_are_rejected() {
        assert_eq!(
            probe_error("Linux", "aarch64"),
            InstallError::UnsupportedPlatform {
                cpu: "arm64".into(),
                os: "linux".into()
            }
        );
        assert_eq!(
            probe_error("Darwin", "x86_64"),
            InstallError::UnsupportedPlatform {
                cpu: "x86_64".into(),
                os: "darwin".into()
            }
        );
    }

    #[test]
    fn test_unsupported_os() {
        assert_eq!(
            probe_error("FreeBSD", "amd64"),
            InstallError::UnsupportedOs("FreeBSD".into())
        );
        // Case matters, as with uname output
        assert_eq!(
            probe_error("linux", "x86_64"),
            InstallError::UnsupportedOs("linux".into())
        );
    }

    #[test]
    fn test_unsupported_cpu() {
        assert_eq!(
            probe_error("Linux", "riscv64"),
            InstallError::UnsupportedCpu("riscv64".into())
        );
        assert_eq!(
            probe_error("Darwin", "i686"),
            InstallError::UnsupportedCpu("i686".into())
        );
    }

    #[test]
    fn test_uname_failure_propagates() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_uname()
            .returning(|| Err(anyhow::anyhow!("uname unavailable")));
        let err = ArchitectureTag::probe(&runtime).unwrap_err();
        assert!(err.to_string().contains("uname unavailable"));
    }
}
