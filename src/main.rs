//! budswitch — toggle daemon for Bluetooth audio devices.
//!
//! One binary, three subcommands: `daemon` runs the long-lived service
//! that owns the BlueZ connection and the IPC socket; `status` and
//! `toggle` are thin clients talking to it over that socket.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

mod address;
mod bluez;
mod client;
mod config;
mod daemon;
mod error;
mod protocol;

use crate::{
   address::Address,
   config::Config,
   error::{Error, Result},
};

#[derive(Parser)]
#[command(
   name = "budswitch",
   version,
   about = "Toggle a Bluetooth audio device's connection on or off"
)]
struct Cli {
   #[command(subcommand)]
   command: Command,
}

#[derive(Subcommand)]
enum Command {
   /// Run the daemon in the foreground
   Daemon,
   /// Report the state of the active device
   Status,
   /// Toggle a device between connected and blocked
   Toggle {
      /// Device address; defaults to the first configured device
      device: Option<Address>,
   },
}

#[tokio::main]
async fn main() -> ExitCode {
   env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

   let cli = Cli::parse();
   if let Err(e) = run(cli.command).await {
      eprintln!("error: {e}");
      return ExitCode::FAILURE;
   }
   ExitCode::SUCCESS
}

async fn run(command: Command) -> Result<()> {
   match command {
      Command::Daemon => {
         info!("starting budswitch daemon");
         daemon::run().await
      },
      Command::Status => client::status().await,
      Command::Toggle { device } => {
         let device = match device {
            Some(addr) => addr,
            None => Config::load()?
               .default_device()
               .ok_or(Error::NoDefaultDevice)?,
         };
         client::toggle(device).await
      },
   }
}
