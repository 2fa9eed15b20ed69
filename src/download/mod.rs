//! Artifact transport through an external download tool.
//!
//! `curl` is preferred and `wget` is used only when `curl` is absent. A
//! present `curl` that fails reports its own failure; there is no fallback
//! and no retry. Both tools run in fail-on-error mode, so an HTTP error or a
//! truncated transfer surfaces as a non-zero exit status.

use anyhow::Result;
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::runtime::Runtime;

/// Supported download tools, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTool {
    Curl,
    Wget,
}

impl DownloadTool {
    pub const PREFERENCE: [DownloadTool; 2] = [DownloadTool::Curl, DownloadTool::Wget];

    pub fn program(self) -> &'static str {
        match self {
            Self::Curl => "curl",
            Self::Wget => "wget",
        }
    }

    /// Command line for fetching `url` into `dest`.
    pub fn args(self, url: &str, dest: &Path) -> Vec<String> {
        let https = url.starts_with("https://");
        let dest = dest.display().to_string();
        let mut args: Vec<String> = Vec::new();
        match self {
            Self::Curl => {
                if https {
                    args.extend(["--proto", "=https", "--tlsv1.2"].map(String::from));
                }
                args.extend(["--silent", "--show-error", "--fail", "--location"].map(String::from));
                args.push(url.to_string());
                args.push("--output".to_string());
                args.push(dest);
            }
            Self::Wget => {
                if https {
                    args.extend(["--https-only", "--secure-protocol=TLSv1_2"].map(String::from));
                }
                args.push("--quiet".to_string());
                args.push("--output-document".to_string());
                args.push(dest);
                args.push(url.to_string());
            }
        }
        args
    }
}

impl fmt::Display for DownloadTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// A download tool that was found on PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloader {
    pub tool: DownloadTool,
    pub program: PathBuf,
}

impl Downloader {
    /// Picks the first available tool.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::MissingCommand`] if neither tool is on PATH.
    #[tracing::instrument(level = "debug", skip(runtime))]
    pub fn detect<R: Runtime>(runtime: &R) -> Result<Self> {
        for tool in DownloadTool::PREFERENCE {
            if let Some(program) = runtime.which(tool.program()) {
                debug!("Using {} at {}", tool, program.display());
                return Ok(Self { tool, program });
            }
        }
        Err(InstallError::MissingCommand {
            command: "curl or wget".to_string(),
            hint: "Install either of them and run the installer again.".to_string(),
        }
        .into())
    }

    /// Fetches `url` into `dest`.
    #[tracing::instrument(level = "debug", skip(self, runtime))]
    pub async fn fetch<R: Runtime>(&self, runtime: &R, url: &str, dest: &Path) -> Result<()> {
        info!("downloading {}", url);

        let args = self.tool.args(url, dest);
        let status = runtime.run_command(&self.program, &args).await?;
        if !status.success() {
            return Err(InstallError::DownloadFailed {
                tool: self.tool.to_string(),
                url: url.to_string(),
                code: status.code,
            }
            .into());
        }

        debug!("Download of {} complete", url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandStatus, MockRuntime};
    use mockall::predicate::eq;

    const URL: &str = "https://example.com/rzup/prod/Linux-X64/rzup";

    #[test]
    fn test_detect_prefers_curl() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .with(eq("curl"))
            .returning(|_| Some(PathBuf::from("/usr/bin/curl")));
        // wget is never consulted when curl exists
        runtime.expect_which().with(eq("wget")).never();

        let downloader = Downloader::detect(&runtime).unwrap();
        assert_eq!(downloader.tool, DownloadTool::Curl);
        assert_eq!(downloader.program, PathBuf::from("/usr/bin/curl"));
    }

    #[test]
    fn test_detect_falls_back_to_wget_when_curl_absent() {
        let mut runtime = MockRuntime::new();
        runtime.expect_which().with(eq("curl")).returning(|_| None);
        runtime
            .expect_which()
            .with(eq("wget"))
            .returning(|_| Some(PathBuf::from("/usr/bin/wget")));

        let downloader = Downloader::detect(&runtime).unwrap();
        assert_eq!(downloader.tool, DownloadTool::Wget);
    }

    #[test]
    fn test_detect_fails_without_any_tool() {
        let mut runtime = MockRuntime::new();
        runtime.expect_which().returning(|_| None);

        let err = Downloader::detect(&runtime).unwrap_err();
        match err.downcast_ref::<InstallError>() {
            Some(InstallError::MissingCommand { command, .. }) => {
                assert_eq!(command, "curl or wget")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_curl_args() {
        let args = DownloadTool::Curl.args(URL, Path::new("/tmp/x/rzup"));
        assert_eq!(
            args,
            [
                "--proto",
                "=https",
                "--tlsv1.2",
                "--silent",
                "--show-error",
                "--fail",
                "--location",
                URL,
                "--output",
                "/tmp/x/rzup"
            ]
        );
    }

    #[test]
    fn test_plain_http_skips_tls_flags() {
        let url = "http://localhost:8080/rzup";
        let curl = DownloadTool::Curl.args(url, Path::new("/tmp/rzup"));
        assert!(!curl.iter().any(|a| a == "--proto"));
        assert!(curl.iter().any(|a| a == "--fail"));

        let wget = DownloadTool::Wget.args(url, Path::new("/tmp/rzup"));
        assert_eq!(
            wget,
            ["--quiet", "--output-document", "/tmp/rzup", url]
        );
    }

    #[test]
    fn test_wget_https_args() {
        let args = DownloadTool::Wget.args(URL, Path::new("/tmp/rzup"));
        assert_eq!(args[0], "--https-only");
        assert_eq!(args[1], "--secure-protocol=TLSv1_2");
        assert_eq!(args.last().map(String::as_str), Some(URL));
    }

    #[tokio::test]
    async fn test_fetch_runs_resolved_program() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .withf(|program, args| {
                program == Path::new("/opt/bin/curl") && args.contains(&URL.to_string())
            })
            .times(1)
            .returning(|_, _| Ok(CommandStatus { code: Some(0) }));

        let downloader = Downloader {
            tool: DownloadTool::Curl,
            program: PathBuf::from("/opt/bin/curl"),
        };
        downloader
            .fetch(&runtime, URL, Path::new("/tmp/x/rzup"))
            .await
            .unwrap();
    }

    #[test_log::test(tokio::test)]
    async fn test_failing_curl_does_not_fall_back() {
        let mut runtime = MockRuntime::new();
        // curl is present but exits with 22 (HTTP error under --fail)
        runtime
            .expect_run_command()
            .times(1)
            .returning(|_, _| Ok(CommandStatus { code: Some(22) }));
        runtime.expect_which().never();

        let downloader = Downloader {
            tool: DownloadTool::Curl,
            program: PathBuf::from("/usr/bin/curl"),
        };
        let err = downloader
            .fetch(&runtime, URL, Path::new("/tmp/x/rzup"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<InstallError>(),
            Some(&InstallError::DownloadFailed {
                tool: "curl".into(),
                url: URL.into(),
                code: Some(22),
            })
        );
    }
}
