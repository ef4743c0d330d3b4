use std::path::PathBuf;

use lightd_core::DeviceError;
use thiserror::Error;

/// Error surface for the daemon runtime, device writer, and client protocol.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {value:?} to {}: {source}", .path.display())]
    DeviceWrite {
        path: PathBuf,
        value: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon is not running (nothing listening on {addr})")]
    DaemonNotRunning { addr: String },
}

pub(crate) fn io_err(context: impl ToString, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        context: context.to_string(),
        source,
    }
}
