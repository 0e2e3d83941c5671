//! IPC wire types.
//!
//! One JSON request and one JSON response per connection. A response
//! carries either a state (with the device it applies to, when one is
//! recorded) or an error string, never both.

use serde::{Deserialize, Serialize};

use crate::{address::Address, bluez::state::DeviceState};

/// A request from the CLI client to the daemon.
///
/// The command is kept as a free string so the daemon can name an
/// unrecognized command in its error instead of failing the parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
   pub command: String,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub device: Option<Address>,
}

impl Request {
   pub fn status() -> Self {
      Self {
         command: "status".to_owned(),
         device: None,
      }
   }

   pub fn toggle(device: Address) -> Self {
      Self {
         command: "toggle".to_owned(),
         device: Some(device),
      }
   }
}

/// The daemon's response to a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub state: Option<DeviceState>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub device: Option<Address>,
   #[serde(default, skip_serializing_if = "Option::is_none")]
   pub error: Option<String>,
}

impl Response {
   /// A success response with no device recorded.
   pub fn state(state: DeviceState) -> Self {
      Self {
         state: Some(state),
         ..Self::default()
      }
   }

   /// A success response for a specific device.
   pub fn for_device(state: DeviceState, device: Address) -> Self {
      Self {
         state: Some(state),
         device: Some(device),
         ..Self::default()
      }
   }

   pub fn error(message: impl Into<String>) -> Self {
      Self {
         error: Some(message.into()),
         ..Self::default()
      }
   }
}
