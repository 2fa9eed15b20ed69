//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over everything the
//! installer touches on the host, enabling dependency injection and
//! testability.
//!
//! # Structure
//!
//! - `env` - Environment variables, directories and host identity (uname, login shell)
//! - `fs` - File system operations (create, remove, move, permissions, append)
//! - `process` - Program lookup on PATH and child process execution

mod env;
mod fs;
mod process;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use env::Uname;
pub use process::CommandStatus;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    /// Kernel name and machine hardware name, as `uname -s` / `uname -m` report them.
    fn uname(&self) -> Result<Uname>;

    /// Login shell recorded for the current user in the passwd database.
    fn login_shell(&self) -> Option<String>;

    // File System
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Set file permissions (mode) on Unix systems. No-op elsewhere.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;

    /// Returns true if any execute bit is set on a regular file.
    fn is_executable(&self, path: &Path) -> bool;

    /// Append bytes to a file, creating it if needed. Never truncates.
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create a fresh, uniquely named directory under `parent`.
    fn create_temp_dir(&self, parent: &Path, prefix: &str) -> Result<PathBuf>;

    // Processes
    /// Resolve a program name against PATH.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run a program to completion, inheriting stdio.
    async fn run_command(&self, program: &Path, args: &[String]) -> Result<CommandStatus>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn temp_dir(&self) -> PathBuf;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn uname(&self) -> Result<Uname> {
        self.uname_impl()
    }

    fn login_shell(&self) -> Option<String> {
        self.login_shell_impl()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.set_permissions_impl(path, mode)
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.is_executable_impl(path)
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.append_impl(path, contents)
    }

    fn create_temp_dir(&self, parent: &Path, prefix: &str) -> Result<PathBuf> {
        self.create_temp_dir_impl(parent, prefix)
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.which_impl(program)
    }

    async fn run_command(&self, program: &Path, args: &[String]) -> Result<CommandStatus> {
        self.run_command_impl(program, args).await
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp_dir_impl()
    }
}
