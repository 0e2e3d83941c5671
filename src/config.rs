//! Configuration management for budswitch.
//!
//! This module handles loading and saving configuration from disk: the
//! list of known devices the `toggle` subcommand can default to.

use std::{env, fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
   address::Address,
   error::{Error, Result},
};

/// Main configuration structure.
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Config {
   #[serde(default)]
   pub devices: Vec<KnownDevice>,
}

/// A known device that `toggle` can target without an explicit address.
#[derive(Serialize, Deserialize, Clone)]
pub struct KnownDevice {
   pub address: Address,
   #[serde(default)]
   pub name: String,
}

impl Config {
   /// Loads configuration from disk or creates a default if not exists.
   pub fn load() -> Result<Self> {
      let config_path = Self::config_path()?;

      if config_path.exists() {
         let contents = fs::read_to_string(&config_path)?;
         Ok(toml::from_str(&contents)?)
      } else {
         let config = Self::default();
         config.save()?;
         Ok(config)
      }
   }

   /// Saves the current configuration to disk.
   pub fn save(&self) -> Result<()> {
      let config_path = Self::config_path()?;

      if let Some(parent) = config_path.parent() {
         fs::create_dir_all(parent)?;
      }

      let contents = toml::to_string_pretty(self)?;
      fs::write(&config_path, contents)?;

      Ok(())
   }

   fn config_path() -> Result<PathBuf> {
      let config_dir = if let Ok(home) = env::var("BUDSWITCH_HOME") {
         PathBuf::from(home)
      } else if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
         PathBuf::from(config_home)
      } else if let Ok(home) = env::var("HOME") {
         PathBuf::from(home).join(".config")
      } else {
         return Err(Error::ConfigDirNotFound);
      };

      Ok(config_dir.join("budswitch").join("config.toml"))
   }

   /// The device `toggle` targets when invoked without an address.
   pub fn default_device(&self) -> Option<Address> {
      self.devices.first().map(|d| d.address)
   }
}
