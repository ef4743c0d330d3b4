//! `thinkpadlightd set` — switch the light through a running daemon.

use anyhow::{bail, Context, Result};

use lightd_core::Command;
use lightd_daemon::{request_state, DaemonConfig, DaemonError};

pub fn run(config: &DaemonConfig, state: Command) -> Result<()> {
    let addr = config.address();
    match request_state(&addr, state) {
        Ok(()) => println!("light {state}"),
        Err(DaemonError::DaemonNotRunning { .. }) => {
            bail!("thinkpadlightd is not running on {addr}");
        }
        Err(err) => return Err(err).context("failed to switch light"),
    }
    Ok(())
}
