//! Device state resolution and the toggle state machine.
//!
//! A device's state is never cached: BlueZ is the sole source of truth and
//! can change underneath us at any time (the peripheral itself, the system
//! Bluetooth settings), so every decision starts from a fresh read of the
//! remote flags.

use serde::{Deserialize, Serialize};

use crate::{address::Address, bluez::Bluez, error::Error};

/// Logical state of a device, derived from the remote flags.
#[derive(
   Debug,
   Clone,
   Copy,
   PartialEq,
   Eq,
   Serialize,
   Deserialize,
   strum::Display,
   strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceState {
   /// An active connection exists.
   Connected,
   /// Unblocked but not connected — a connect attempt is pending or failed.
   Connecting,
   /// Not connected and held down by the block flag. Clients see this as
   /// `blocked`, the condition they can observe in other Bluetooth UIs.
   #[serde(rename = "blocked")]
   #[strum(serialize = "blocked")]
   Idle,
   /// The adapter is off or the device is not paired (or neither flag
   /// could be read, which amounts to the same thing).
   Disabled,
}

/// The remote flags a resolution is based on, read in one pass.
///
/// The gating flags keep their read failures (`None`) because no
/// meaningful state can be derived without them; failures on the other two
/// degrade to `false`.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
   pub powered: Option<bool>,
   pub paired: Option<bool>,
   pub connected: bool,
   pub blocked: bool,
}

impl Snapshot {
   /// Reads the flags for `addr`, short-circuiting in gating order: a
   /// powered-off adapter skips the device reads entirely, and a
   /// connected device skips the block flag.
   pub async fn read<B: Bluez>(bus: &B, addr: Address) -> Self {
      let mut snapshot = Self {
         powered: bus.adapter_powered().await.ok(),
         paired: None,
         connected: false,
         blocked: false,
      };
      if snapshot.powered != Some(true) {
         return snapshot;
      }

      snapshot.paired = bus.device_paired(addr).await.ok();
      if snapshot.paired != Some(true) {
         return snapshot;
      }

      snapshot.connected = bus.device_connected(addr).await.unwrap_or(false);
      if snapshot.connected {
         return snapshot;
      }

      snapshot.blocked = bus.device_blocked(addr).await.unwrap_or(false);
      snapshot
   }
}

impl From<Snapshot> for DeviceState {
   fn from(snapshot: Snapshot) -> Self {
      if snapshot.powered != Some(true) {
         return Self::Disabled;
      }
      if snapshot.paired != Some(true) {
         return Self::Disabled;
      }
      if snapshot.connected {
         return Self::Connected;
      }
      if !snapshot.blocked {
         return Self::Connecting;
      }
      Self::Idle
   }
}

/// Resolves the current state of `addr` from a fresh flag snapshot.
pub async fn resolve_state<B: Bluez>(bus: &B, addr: Address) -> DeviceState {
   DeviceState::from(Snapshot::read(bus, addr).await)
}

/// A toggle transition that failed partway through.
///
/// Carries the step that failed and the state the device was resolved to
/// before the transition started. Steps already performed are not rolled
/// back, so the device may be somewhere between the two states.
#[derive(Debug, thiserror::Error)]
#[error("{step}: {source}")]
pub struct ToggleError {
   pub step: &'static str,
   pub state: DeviceState,
   pub source: Error,
}

/// Flips `addr` to the opposite of its current state.
///
/// Resolves once, then runs the state-specific call sequence. Each call is
/// a single attempt; the first failure aborts the sequence and is reported
/// with its step name.
pub async fn toggle<B: Bluez>(
   bus: &B,
   addr: Address,
) -> std::result::Result<DeviceState, ToggleError> {
   let state = resolve_state(bus, addr).await;
   let fail = |step: &'static str| move |source: Error| ToggleError { step, state, source };

   match state {
      DeviceState::Connected => {
         bus.disconnect(addr).await.map_err(fail("disconnect"))?;
         bus.set_blocked(addr, true).await.map_err(fail("block"))?;
         Ok(DeviceState::Idle)
      },
      DeviceState::Connecting => {
         bus.set_blocked(addr, true).await.map_err(fail("block"))?;
         Ok(DeviceState::Idle)
      },
      DeviceState::Idle => {
         bus.set_blocked(addr, false).await.map_err(fail("unblock"))?;
         bus.connect(addr).await.map_err(fail("connect"))?;
         Ok(DeviceState::Connected)
      },
      DeviceState::Disabled => {
         bus.set_adapter_powered(true).await.map_err(fail("power on"))?;
         bus.set_blocked(addr, false).await.map_err(fail("unblock"))?;
         bus.connect(addr).await.map_err(fail("connect"))?;
         Ok(DeviceState::Connected)
      },
   }
}
