//! Bluetooth device addresses.
//!
//! A device is identified by its 48-bit hardware address. Addresses are
//! parsed from the usual colon-separated hex form and always render
//! uppercase, so they can be compared as strings on the wire.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{Error, Result};

/// A Bluetooth device address (`AA:BB:CC:DD:EE:FF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 6]);

impl Address {
   pub const fn new(octets: [u8; 6]) -> Self {
      Self(octets)
   }
}

impl fmt::Display for Address {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let [o0, o1, o2, o3, o4, o5] = self.0;
      write!(f, "{o0:02X}:{o1:02X}:{o2:02X}:{o3:02X}:{o4:02X}:{o5:02X}")
   }
}

impl FromStr for Address {
   type Err = Error;

   fn from_str(s: &str) -> Result<Self> {
      let invalid = || Error::InvalidAddress(s.to_owned());
      let mut octets = [0u8; 6];
      let mut parts = s.split(':');
      for octet in &mut octets {
         let part = parts.next().ok_or_else(invalid)?;
         if part.len() != 2 {
            return Err(invalid());
         }
         *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
      }
      if parts.next().is_some() {
         return Err(invalid());
      }
      Ok(Self(octets))
   }
}

impl Serialize for Address {
   fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
      serializer.collect_str(self)
   }
}

impl<'de> Deserialize<'de> for Address {
   fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
      let s = String::deserialize(deserializer)?;
      s.parse().map_err(de::Error::custom)
   }
}
