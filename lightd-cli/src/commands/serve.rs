//! `thinkpadlightd` — run the daemon in the foreground.

use anyhow::{Context, Result};

use lightd_daemon::{start_blocking, DaemonConfig};

pub fn run(config: DaemonConfig) -> Result<()> {
    start_blocking(config).context("thinkpadlightd exited with error")
}
