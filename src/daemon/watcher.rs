//! Disconnect watcher.
//!
//! One long-lived task drains the BlueZ property-change stream and tells
//! the session about disconnection edges. Everything else on the stream
//! is dropped; failures never propagate anywhere because nobody is
//! waiting on this task.

use std::{pin::pin, sync::Arc};

use futures::{Stream, StreamExt};
use log::debug;

use crate::{
   address::Address,
   bluez::{Bluez, DEVICE_IFACE, PropertyChange, address_from_path},
   daemon::session::Session,
};

/// Returns the device address a notification reports as freshly
/// disconnected, if that is what it is.
///
/// Filters in order: device interface only, a `Connected` change must be
/// present, only the falling edge counts (connects are the session's
/// business, not ours), and the path must map back to an address.
pub fn disconnect_edge(change: &PropertyChange) -> Option<Address> {
   if change.interface != DEVICE_IFACE {
      return None;
   }
   let connected = change.changed.get("Connected")?;
   if connected.downcast_ref::<bool>().ok()? {
      return None;
   }
   address_from_path(&change.path)
}

/// Consumes the property-change stream until it ends at shutdown.
pub async fn run<B: Bluez>(
   session: Arc<Session<B>>,
   changes: impl Stream<Item = PropertyChange> + Send,
) {
   let mut changes = pin!(changes);
   while let Some(change) = changes.next().await {
      if let Some(addr) = disconnect_edge(&change) {
         session.handle_disconnect(addr).await;
      }
   }
   debug!("property change stream ended");
}
