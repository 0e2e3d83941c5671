//! The budswitch daemon.
//!
//! Wires the pieces together: one BlueZ connection, one Unix socket, one
//! accept loop spawning a task per client, and the disconnect watcher in
//! the background. Startup failures are fatal; once the loop is running,
//! nothing is.

use std::{env, fs, os::unix::fs::PermissionsExt, path::PathBuf, sync::Arc};

use log::{debug, error, info};
use tokio::{
   io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
   net::{UnixListener, UnixStream},
   select,
   signal::unix::{SignalKind, signal},
};

use crate::{
   bluez::{Bluez, BluezClient},
   error::Result,
   protocol::{Request, Response},
};

pub mod session;
pub mod watcher;

use session::Session;

/// Path of the daemon's listening socket, in the per-user runtime
/// directory when there is one.
pub fn socket_path() -> PathBuf {
   dirs::runtime_dir()
      .unwrap_or_else(env::temp_dir)
      .join("budswitch.sock")
}

/// Runs the daemon until an interrupt or terminate signal arrives.
pub async fn run() -> Result<()> {
   let bus = BluezClient::new().await?;
   let changes = bus.property_changes().await?;
   let session = Arc::new(Session::new(bus));

   let path = socket_path();
   // A stale socket from a previous run would make the bind fail.
   let _ = fs::remove_file(&path);
   let listener = UnixListener::bind(&path)?;
   fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
   info!("listening on {}", path.display());

   tokio::spawn(watcher::run(Arc::clone(&session), changes));

   let mut sigint = signal(SignalKind::interrupt())?;
   let mut sigterm = signal(SignalKind::terminate())?;

   loop {
      select! {
         _ = sigint.recv() => break,
         _ = sigterm.recv() => break,
         accepted = listener.accept() => match accepted {
            Ok((stream, _)) => {
               tokio::spawn(handle_connection(Arc::clone(&session), stream));
            },
            Err(e) => error!("failed to accept connection: {e}"),
         },
      }
   }

   info!("shutting down");
   let _ = fs::remove_file(&path);
   Ok(())
}

async fn handle_connection<B: Bluez + 'static>(session: Arc<Session<B>>, stream: UnixStream) {
   if let Err(e) = serve(session, stream).await {
      debug!("client connection error: {e}");
   }
}

/// One request, one response, connection closed.
async fn serve<B: Bluez>(session: Arc<Session<B>>, mut stream: UnixStream) -> Result<()> {
   let (reader, mut writer) = stream.split();

   let mut line = String::new();
   BufReader::new(reader).read_line(&mut line).await?;

   // A request that does not parse is answered without ever touching the
   // session, so no remote calls happen on behalf of garbage input.
   let response = match serde_json::from_str::<Request>(&line) {
      Ok(request) => session.handle_request(request).await,
      Err(e) => Response::error(format!("invalid request: {e}")),
   };

   let mut payload = serde_json::to_vec(&response)?;
   payload.push(b'\n');
   writer.write_all(&payload).await?;
   Ok(())
}
