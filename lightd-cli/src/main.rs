//! thinkpadlightd — toggle the ThinkPad keyboard light over TCP.
//!
//! # Usage
//!
//! ```text
//! thinkpadlightd [--host <host>] [--port <port>] [--device <path>]
//! thinkpadlightd [--host <host>] [--port <port>] set <on|off>
//! ```
//!
//! Once running, any line client works: `nc localhost 9698`, then `1` / `0`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use lightd_core::Command;
use lightd_daemon::config::{DEFAULT_DEVICE_PATH, DEFAULT_HOST, DEFAULT_PORT};
use lightd_daemon::DaemonConfig;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "thinkpadlightd",
    version,
    about = "Network daemon that switches the ThinkPad keyboard light",
    long_about = None,
)]
struct Cli {
    /// Host to listen on (or to connect to with `set`).
    #[arg(long, global = true, default_value = DEFAULT_HOST)]
    host: String,

    /// TCP port to listen on (or to connect to with `set`).
    #[arg(long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Light control file written by the daemon.
    #[arg(long, default_value = DEFAULT_DEVICE_PATH)]
    device: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a running daemon to switch the light.
    Set {
        /// on, off, 1 or 0.
        state: Command,
    },
}

impl Cli {
    fn daemon_config(&self) -> DaemonConfig {
        DaemonConfig {
            host: self.host.clone(),
            port: self.port,
            device_path: self.device.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.daemon_config();
    match cli.command {
        None => commands::serve::run(config),
        Some(Commands::Set { state }) => commands::set::run(&config, state),
    }
}
