pub mod application;
pub mod cleanup;
pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod platform;
pub mod runtime;
pub mod shell;
