//! Test double for the [`Bluez`] trait.
//!
//! Holds the four remote flags behind plain mutexes, records every call
//! (attempted calls included, so aborted sequences are visible), and can
//! be told to fail individual operations.

use std::{collections::HashSet, io, sync::Mutex};

use crate::{
   address::Address,
   bluez::Bluez,
   error::{Error, Result},
};

/// Flag values served by the mock. `None` makes the read fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
   pub powered: Option<bool>,
   pub paired: Option<bool>,
   pub connected: Option<bool>,
   pub blocked: Option<bool>,
}

impl Flags {
   pub fn connected() -> Self {
      Self {
         powered: Some(true),
         paired: Some(true),
         connected: Some(true),
         blocked: Some(false),
      }
   }

   pub fn connecting() -> Self {
      Self {
         connected: Some(false),
         blocked: Some(false),
         ..Self::connected()
      }
   }

   pub fn idle() -> Self {
      Self {
         connected: Some(false),
         blocked: Some(true),
         ..Self::connected()
      }
   }

   pub fn disabled() -> Self {
      Self {
         powered: Some(false),
         ..Self::idle()
      }
   }
}

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
   AdapterPowered,
   SetAdapterPowered(bool),
   Paired(Address),
   Connected(Address),
   Blocked(Address),
   SetBlocked(Address, bool),
   Connect(Address),
   Disconnect(Address),
}

impl Call {
   const fn is_action(&self) -> bool {
      matches!(
         self,
         Self::SetAdapterPowered(_) | Self::SetBlocked(..) | Self::Connect(_) | Self::Disconnect(_)
      )
   }
}

#[derive(Default)]
pub struct MockBus {
   flags: Mutex<Flags>,
   fail: Mutex<HashSet<&'static str>>,
   calls: Mutex<Vec<Call>>,
}

impl MockBus {
   pub fn with_flags(flags: Flags) -> Self {
      Self {
         flags: Mutex::new(flags),
         ..Self::default()
      }
   }

   /// Makes the named mutating operation fail from now on. The names match
   /// the trait methods: `set_adapter_powered`, `set_blocked`, `connect`,
   /// `disconnect`.
   pub fn fail_on(&self, op: &'static str) {
      self.fail.lock().unwrap().insert(op);
   }

   pub fn flags(&self) -> Flags {
      *self.flags.lock().unwrap()
   }

   /// Every call made so far, reads included, in order.
   pub fn calls(&self) -> Vec<Call> {
      self.calls.lock().unwrap().clone()
   }

   /// Only the mutating calls (set/connect/disconnect), in order.
   pub fn actions(&self) -> Vec<Call> {
      self.calls().into_iter().filter(Call::is_action).collect()
   }

   fn record(&self, call: Call) {
      self.calls.lock().unwrap().push(call);
   }

   fn check_fail(&self, op: &'static str) -> Result<()> {
      if self.fail.lock().unwrap().contains(op) {
         return Err(Error::Io(io::Error::other(format!("{op} refused"))));
      }
      Ok(())
   }

   fn read(flag: Option<bool>, what: &'static str) -> Result<bool> {
      flag.ok_or_else(|| Error::Io(io::Error::other(format!("{what} unreadable"))))
   }
}

impl Bluez for MockBus {
   async fn adapter_powered(&self) -> Result<bool> {
      self.record(Call::AdapterPowered);
      Self::read(self.flags().powered, "powered")
   }

   async fn set_adapter_powered(&self, powered: bool) -> Result<()> {
      self.record(Call::SetAdapterPowered(powered));
      self.check_fail("set_adapter_powered")?;
      self.flags.lock().unwrap().powered = Some(powered);
      Ok(())
   }

   async fn device_paired(&self, addr: Address) -> Result<bool> {
      self.record(Call::Paired(addr));
      Self::read(self.flags().paired, "paired")
   }

   async fn device_connected(&self, addr: Address) -> Result<bool> {
      self.record(Call::Connected(addr));
      Self::read(self.flags().connected, "connected")
   }

   async fn device_blocked(&self, addr: Address) -> Result<bool> {
      self.record(Call::Blocked(addr));
      Self::read(self.flags().blocked, "blocked")
   }

   async fn set_blocked(&self, addr: Address, blocked: bool) -> Result<()> {
      self.record(Call::SetBlocked(addr, blocked));
      self.check_fail("set_blocked")?;
      self.flags.lock().unwrap().blocked = Some(blocked);
      Ok(())
   }

   async fn connect(&self, addr: Address) -> Result<()> {
      self.record(Call::Connect(addr));
      self.check_fail("connect")?;
      self.flags.lock().unwrap().connected = Some(true);
      Ok(())
   }

   async fn disconnect(&self, addr: Address) -> Result<()> {
      self.record(Call::Disconnect(addr));
      self.check_fail("disconnect")?;
      self.flags.lock().unwrap().connected = Some(false);
      Ok(())
   }
}
