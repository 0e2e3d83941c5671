//! BlueZ access layer.
//!
//! This module talks to the BlueZ daemon over the system D-Bus: property
//! reads and writes, connect/disconnect calls, and the property-change
//! signal subscription the daemon reacts to.

use std::future::Future;

use crate::{address::Address, error::Result};

pub mod client;
pub mod state;

#[cfg(test)]
pub mod mock;

pub use client::{BluezClient, PropertyChange};

/// Well-known name of the BlueZ service on the system bus.
pub const SERVICE_NAME: &str = "org.bluez";
/// Object path of the default adapter.
pub const ADAPTER_PATH: &str = "/org/bluez/hci0";
/// Adapter interface (power state).
pub const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
/// Device interface (paired/connected/blocked, Connect/Disconnect).
pub const DEVICE_IFACE: &str = "org.bluez.Device1";

/// Returns the BlueZ object path for a device on the default adapter,
/// e.g. `/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF`.
pub fn device_path(addr: Address) -> String {
   format!("{ADAPTER_PATH}/dev_{}", addr.to_string().replace(':', "_"))
}

/// Extracts the device address from a BlueZ object path, if it is one.
pub fn address_from_path(path: &str) -> Option<Address> {
   let rest = path.strip_prefix(ADAPTER_PATH)?.strip_prefix("/dev_")?;
   rest.replace('_', ":").parse().ok()
}

/// The BlueZ operations the daemon performs.
///
/// The session, the toggle logic, and the disconnect watcher are generic
/// over this trait so they can be driven by a mock in tests. The futures
/// are `Send` because every caller runs inside a spawned task.
pub trait Bluez: Send + Sync {
   fn adapter_powered(&self) -> impl Future<Output = Result<bool>> + Send;
   fn set_adapter_powered(&self, powered: bool) -> impl Future<Output = Result<()>> + Send;

   fn device_paired(&self, addr: Address) -> impl Future<Output = Result<bool>> + Send;
   fn device_connected(&self, addr: Address) -> impl Future<Output = Result<bool>> + Send;
   fn device_blocked(&self, addr: Address) -> impl Future<Output = Result<bool>> + Send;
   fn set_blocked(&self, addr: Address, blocked: bool) -> impl Future<Output = Result<()>> + Send;

   fn connect(&self, addr: Address) -> impl Future<Output = Result<()>> + Send;
   fn disconnect(&self, addr: Address) -> impl Future<Output = Result<()>> + Send;
}
