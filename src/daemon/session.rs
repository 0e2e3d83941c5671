//! The daemon session: owner of the active-device state.
//!
//! All request handling and the watcher's auto-block serialize on one
//! async mutex, held for the whole operation including the remote calls
//! made under it. A slow BlueZ call therefore stalls every other request;
//! that trade is fine for a daemon driven by one person's command-line
//! invocations, and it makes the ordering story trivial: whichever
//! operation takes the lock first runs to completion before the next one
//! observes anything.

use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
   address::Address,
   bluez::{
      Bluez,
      state::{DeviceState, resolve_state, toggle},
   },
   protocol::{Request, Response},
};

/// Shared daemon state: the bus handle and the active device.
///
/// The active device starts empty, is set by the first toggle (before the
/// transition runs, so concurrent observers see the intended target), and
/// is only ever replaced, never cleared.
pub struct Session<B> {
   bus: B,
   active: Mutex<Option<Address>>,
}

impl<B: Bluez> Session<B> {
   pub fn new(bus: B) -> Self {
      Self {
         bus,
         active: Mutex::new(None),
      }
   }

   /// Handles one IPC request under the session lock.
   pub async fn handle_request(&self, request: Request) -> Response {
      let mut active = self.active.lock().await;

      match request.command.as_str() {
         "status" => match *active {
            None => Response::state(DeviceState::Disabled),
            Some(addr) => Response::for_device(resolve_state(&self.bus, addr).await, addr),
         },

         "toggle" => {
            let Some(addr) = request.device else {
               return Response::error("device address is required");
            };

            if let Some(prev) = *active
               && prev != addr
            {
               self.retire(prev, addr).await;
            }
            *active = Some(addr);

            match toggle(&self.bus, addr).await {
               Ok(state) => Response::for_device(state, addr),
               Err(e) => Response::error(e.to_string()),
            }
         },

         other => Response::error(format!("unknown command: {other:?}")),
      }
   }

   /// Takes a connected previous device out of the picture before a
   /// toggle targets another one, so two devices never both hold a
   /// connection. Best effort: failures are logged and the switch
   /// proceeds.
   async fn retire(&self, prev: Address, next: Address) {
      if resolve_state(&self.bus, prev).await != DeviceState::Connected {
         return;
      }
      info!("switching from {prev} to {next}, disconnecting the old device");
      if let Err(e) = self.bus.disconnect(prev).await {
         warn!("disconnect of {prev} failed: {e}");
      }
      if let Err(e) = self.bus.set_blocked(prev, true).await {
         warn!("block of {prev} failed: {e}");
      }
   }

   /// Reacts to an unsolicited disconnect of `addr`: if it is the active
   /// device, block it so a stale session cannot silently reconnect.
   /// Runs under the session lock so it cannot interleave with a toggle.
   pub async fn handle_disconnect(&self, addr: Address) {
      let active = self.active.lock().await;
      if *active != Some(addr) {
         return;
      }
      info!("active device {addr} disconnected, blocking it");
      if let Err(e) = self.bus.set_blocked(addr, true).await {
         warn!("auto-block of {addr} failed: {e}");
      }
   }

   #[cfg(test)]
   pub fn bus(&self) -> &B {
      &self.bus
   }

   #[cfg(test)]
   pub async fn set_active(&self, addr: Option<Address>) {
      *self.active.lock().await = addr;
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::bluez::mock::{Call, Flags, MockBus};

   fn addr_a() -> Address {
      "AA:BB:CC:DD:EE:FF".parse().unwrap()
   }

   fn addr_b() -> Address {
      "11:22:33:44:55:66".parse().unwrap()
   }

   #[tokio::test]
   async fn test_status_without_active_device() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      let resp = session.handle_request(Request::status()).await;
      assert_eq!(resp.state, Some(DeviceState::Disabled));
      assert!(resp.device.is_none());
      assert!(resp.error.is_none());
      // Nothing was asked of the bus.
      assert!(session.bus.calls().is_empty());
   }

   #[tokio::test]
   async fn test_status_resolves_active_device() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      session.set_active(Some(addr_a())).await;
      let resp = session.handle_request(Request::status()).await;
      assert_eq!(resp.state, Some(DeviceState::Connected));
      assert_eq!(resp.device, Some(addr_a()));
   }

   #[tokio::test]
   async fn test_toggle_requires_device() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      let request = Request {
         command: "toggle".to_owned(),
         device: None,
      };
      let resp = session.handle_request(request).await;
      assert_eq!(resp.error.as_deref(), Some("device address is required"));
      assert!(session.bus.calls().is_empty());

      // The active device is untouched.
      let resp = session.handle_request(Request::status()).await;
      assert_eq!(resp.state, Some(DeviceState::Disabled));
   }

   #[tokio::test]
   async fn test_unknown_command() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      let request = Request {
         command: "frobnicate".to_owned(),
         device: None,
      };
      let resp = session.handle_request(request).await;
      assert_eq!(resp.error.as_deref(), Some("unknown command: \"frobnicate\""));
      assert!(session.bus.calls().is_empty());
   }

   #[tokio::test]
   async fn test_toggle_status_toggle_scenario() {
      // Powered-off adapter: the first toggle wakes everything up.
      let session = Session::new(MockBus::with_flags(Flags::disabled()));

      let resp = session.handle_request(Request::toggle(addr_a())).await;
      assert_eq!(resp.state, Some(DeviceState::Connected));
      assert_eq!(resp.device, Some(addr_a()));
      assert_eq!(
         session.bus.actions(),
         vec![
            Call::SetAdapterPowered(true),
            Call::SetBlocked(addr_a(), false),
            Call::Connect(addr_a()),
         ]
      );

      let resp = session.handle_request(Request::status()).await;
      assert_eq!(resp.state, Some(DeviceState::Connected));
      assert_eq!(resp.device, Some(addr_a()));

      // The second toggle lands on the blocked state.
      let resp = session.handle_request(Request::toggle(addr_a())).await;
      assert_eq!(resp.state, Some(DeviceState::Idle));
      assert_eq!(
         serde_json::to_string(&resp).unwrap(),
         r#"{"state":"blocked","device":"AA:BB:CC:DD:EE:FF"}"#
      );
   }

   #[tokio::test]
   async fn test_switchover_retires_connected_previous_device() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      session.set_active(Some(addr_a())).await;

      let resp = session.handle_request(Request::toggle(addr_b())).await;
      assert_eq!(resp.state, Some(DeviceState::Connected));
      assert_eq!(resp.device, Some(addr_b()));

      // Exactly one disconnect and one block of the old device, both
      // before anything touches the new one.
      assert_eq!(
         session.bus.actions(),
         vec![
            Call::Disconnect(addr_a()),
            Call::SetBlocked(addr_a(), true),
            Call::SetBlocked(addr_b(), false),
            Call::Connect(addr_b()),
         ]
      );
   }

   #[tokio::test]
   async fn test_switchover_skips_unconnected_previous_device() {
      let session = Session::new(MockBus::with_flags(Flags::idle()));
      session.set_active(Some(addr_a())).await;

      session.handle_request(Request::toggle(addr_b())).await;
      assert_eq!(
         session.bus.actions(),
         vec![Call::SetBlocked(addr_b(), false), Call::Connect(addr_b())]
      );
   }

   #[tokio::test]
   async fn test_failed_toggle_still_records_new_active_device() {
      let session = Session::new(MockBus::with_flags(Flags::idle()));
      session.bus.fail_on("connect");

      let resp = session.handle_request(Request::toggle(addr_a())).await;
      assert!(resp.error.unwrap().starts_with("connect: "));
      assert!(resp.state.is_none());

      // The address became active before the toggle ran, so status now
      // reports it (unblocked but not connected).
      let resp = session.handle_request(Request::status()).await;
      assert_eq!(resp.state, Some(DeviceState::Connecting));
      assert_eq!(resp.device, Some(addr_a()));
   }

   #[tokio::test]
   async fn test_disconnect_of_nonactive_device_is_ignored() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      session.set_active(Some(addr_a())).await;

      session.handle_disconnect(addr_b()).await;
      assert!(session.bus.calls().is_empty());

      // No active device at all: also a no-op.
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      session.handle_disconnect(addr_a()).await;
      assert!(session.bus.calls().is_empty());
   }

   #[tokio::test]
   async fn test_disconnect_of_active_device_blocks_it() {
      let session = Session::new(MockBus::with_flags(Flags::connected()));
      session.set_active(Some(addr_a())).await;

      session.handle_disconnect(addr_a()).await;
      assert_eq!(
         session.bus.calls(),
         vec![Call::SetBlocked(addr_a(), true)]
      );
   }
}
