//! IPC client side.
//!
//! Connects to the daemon socket, sends one request, reads one response.
//! Successful responses are printed as JSON for scripting; an error field
//! in the response fails the whole invocation.

use tokio::{
   io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
   net::UnixStream,
};

use crate::{
   address::Address,
   daemon,
   error::{Error, Result},
   protocol::{Request, Response},
};

async fn call(request: Request) -> Result<Response> {
   let path = daemon::socket_path();
   let mut stream = UnixStream::connect(&path)
      .await
      .map_err(|source| Error::DaemonUnreachable { path, source })?;

   let mut payload = serde_json::to_vec(&request)?;
   payload.push(b'\n');
   stream.write_all(&payload).await?;

   let mut line = String::new();
   if BufReader::new(stream).read_line(&mut line).await? == 0 {
      return Err(Error::EmptyResponse);
   }
   Ok(serde_json::from_str(&line)?)
}

/// Queries the daemon for the active device's state and prints it.
pub async fn status() -> Result<()> {
   print(&call(Request::status()).await?)
}

/// Asks the daemon to toggle `device` and prints the outcome.
pub async fn toggle(device: Address) -> Result<()> {
   let response = call(Request::toggle(device)).await?;
   if let Some(error) = response.error {
      return Err(Error::Daemon(error));
   }
   print(&response)
}

fn print(response: &Response) -> Result<()> {
   println!("{}", serde_json::to_string(response)?);
   Ok(())
}
