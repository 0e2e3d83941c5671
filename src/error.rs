//! Error types for budswitch.
//!
//! This module defines all error types that can occur in the daemon and
//! the IPC client, including D-Bus, I/O, and protocol errors.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for budswitch.
#[derive(Error, Debug)]
pub enum Error {
   #[error("D-Bus error: {0}")]
   DBus(#[from] zbus::Error),

   #[error("D-Bus error: {0}")]
   Fdo(#[from] zbus::fdo::Error),

   #[error("I/O error: {0}")]
   Io(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   Json(#[from] serde_json::Error),

   #[error("TOML parsing error: {0}")]
   TomlParse(#[from] toml::de::Error),

   #[error("TOML serialization error: {0}")]
   TomlSerialize(#[from] toml::ser::Error),

   #[error("could not determine config directory")]
   ConfigDirNotFound,

   #[error("org.bluez not found on the system bus (is bluetooth.service running?)")]
   ServiceNotFound,

   #[error("invalid Bluetooth address: {0:?}")]
   InvalidAddress(String),

   #[error("property {interface}.{name} is not a boolean")]
   NotABoolean { interface: String, name: String },

   #[error("connect to daemon at {path}: {source} (is `budswitch daemon` running?)")]
   DaemonUnreachable {
      path: PathBuf,
      source: std::io::Error,
   },

   #[error("daemon closed the connection without a response")]
   EmptyResponse,

   #[error("{0}")]
   Daemon(String),

   #[error("no device specified and the config lists none")]
   NoDefaultDevice,
}

/// Convenience type alias for Results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
