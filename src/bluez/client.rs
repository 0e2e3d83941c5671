//! System-bus client for BlueZ.
//!
//! One persistent connection serves the whole daemon: property access and
//! method calls go through the generic helpers here, and a single signal
//! subscription delivers `PropertiesChanged` notifications for everything
//! under the `/org/bluez` namespace.

use std::collections::HashMap;

use futures::{StreamExt, future, stream::BoxStream};
use log::debug;
use zbus::{
   Connection, MatchRule, Message, MessageStream, fdo,
   zvariant::{OwnedValue, Value},
};

use crate::{
   address::Address,
   bluez::{ADAPTER_IFACE, ADAPTER_PATH, Bluez, DEVICE_IFACE, SERVICE_NAME, device_path},
   error::{Error, Result},
};

const PROPS_IFACE: &str = "org.freedesktop.DBus.Properties";
const PROPS_CHANGED: &str = "PropertiesChanged";

/// Queue depth for the signal subscription. BlueZ emits property changes
/// at human interaction rates, so a small buffer is plenty.
const SIGNAL_QUEUE: usize = 64;

/// A `PropertiesChanged` notification from BlueZ.
#[derive(Debug)]
pub struct PropertyChange {
   /// Object path the change was emitted for.
   pub path: String,
   /// Interface the changed properties belong to.
   pub interface: String,
   /// Changed property names mapped to their new values.
   pub changed: HashMap<String, OwnedValue>,
   /// Properties whose values were invalidated without a replacement.
   pub invalidated: Vec<String>,
}

impl PropertyChange {
   fn from_message(msg: &Message) -> Option<Self> {
      let header = msg.header();
      if header.interface().map(|i| i.as_str()) != Some(PROPS_IFACE)
         || header.member().map(|m| m.as_str()) != Some(PROPS_CHANGED)
      {
         return None;
      }
      let path = header.path()?.to_string();
      let (interface, changed, invalidated): (String, HashMap<String, OwnedValue>, Vec<String>) =
         msg.body().deserialize().ok()?;
      Some(Self {
         path,
         interface,
         changed,
         invalidated,
      })
   }
}

/// Client for the BlueZ service on the system D-Bus.
pub struct BluezClient {
   connection: Connection,
}

impl BluezClient {
   /// Connects to the system bus and verifies BlueZ is present.
   ///
   /// The presence check is a startup precondition: without org.bluez on
   /// the bus every later call would fail with a less useful error.
   pub async fn new() -> Result<Self> {
      let connection = Connection::system().await?;

      let names = fdo::DBusProxy::new(&connection).await?.list_names().await?;
      if !names.iter().any(|name| name.as_str() == SERVICE_NAME) {
         return Err(Error::ServiceNotFound);
      }

      Ok(Self { connection })
   }

   /// Reads a boolean property, failing if the value has another type.
   async fn get_bool(&self, path: &str, interface: &str, name: &str) -> Result<bool> {
      let reply = self
         .connection
         .call_method(
            Some(SERVICE_NAME),
            path,
            Some(PROPS_IFACE),
            "Get",
            &(interface, name),
         )
         .await?;
      let body = reply.body();
      let value: Value<'_> = body.deserialize()?;
      value.downcast_ref::<bool>().map_err(|_| Error::NotABoolean {
         interface: interface.to_owned(),
         name: name.to_owned(),
      })
   }

   async fn set_property(&self, path: &str, interface: &str, name: &str, value: bool) -> Result<()> {
      self
         .connection
         .call_method(
            Some(SERVICE_NAME),
            path,
            Some(PROPS_IFACE),
            "Set",
            &(interface, name, Value::Bool(value)),
         )
         .await?;
      Ok(())
   }

   async fn call(&self, path: &str, interface: &str, method: &str) -> Result<()> {
      self
         .connection
         .call_method(Some(SERVICE_NAME), path, Some(interface), method, &())
         .await?;
      Ok(())
   }

   /// Subscribes to `PropertiesChanged` signals under `/org/bluez`.
   ///
   /// The subscription lives as long as the returned stream; signals that
   /// do not parse as a property change are dropped.
   pub async fn property_changes(&self) -> Result<BoxStream<'static, PropertyChange>> {
      let rule = MatchRule::builder()
         .msg_type(zbus::message::Type::Signal)
         .interface(PROPS_IFACE)?
         .member(PROPS_CHANGED)?
         .path_namespace("/org/bluez")?
         .build();

      let stream = MessageStream::for_match_rule(rule, &self.connection, Some(SIGNAL_QUEUE)).await?;
      debug!("subscribed to property changes under /org/bluez");

      Ok(stream
         .filter_map(|msg| {
            future::ready(msg.ok().and_then(|msg| PropertyChange::from_message(&msg)))
         })
         .boxed())
   }
}

impl Bluez for BluezClient {
   async fn adapter_powered(&self) -> Result<bool> {
      self.get_bool(ADAPTER_PATH, ADAPTER_IFACE, "Powered").await
   }

   async fn set_adapter_powered(&self, powered: bool) -> Result<()> {
      self
         .set_property(ADAPTER_PATH, ADAPTER_IFACE, "Powered", powered)
         .await
   }

   async fn device_paired(&self, addr: Address) -> Result<bool> {
      self
         .get_bool(&device_path(addr), DEVICE_IFACE, "Paired")
         .await
   }

   async fn device_connected(&self, addr: Address) -> Result<bool> {
      self
         .get_bool(&device_path(addr), DEVICE_IFACE, "Connected")
         .await
   }

   async fn device_blocked(&self, addr: Address) -> Result<bool> {
      self
         .get_bool(&device_path(addr), DEVICE_IFACE, "Blocked")
         .await
   }

   async fn set_blocked(&self, addr: Address, blocked: bool) -> Result<()> {
      self
         .set_property(&device_path(addr), DEVICE_IFACE, "Blocked", blocked)
         .await
   }

   async fn connect(&self, addr: Address) -> Result<()> {
      self.call(&device_path(addr), DEVICE_IFACE, "Connect").await
   }

   async fn disconnect(&self, addr: Address) -> Result<()> {
      self
         .call(&device_path(addr), DEVICE_IFACE, "Disconnect")
         .await
   }
}
