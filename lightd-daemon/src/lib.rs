//! thinkpadlightd daemon: TCP line protocol in front of the light control file.

pub mod config;
pub mod device;
mod error;
pub mod protocol;
mod runtime;

pub use config::DaemonConfig;
pub use device::{DeviceHandle, SharedDevice};
pub use error::DaemonError;
pub use protocol::{request_state, send_command};
pub use runtime::{run, start_blocking, Daemon};
