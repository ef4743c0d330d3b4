use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9698;
pub const DEFAULT_DEVICE_PATH: &str = "/proc/acpi/ibm/light";

/// Pending set-requests buffered in front of the device writer.
pub const DEVICE_QUEUE_DEPTH: usize = 64;

/// Pause after a failed `accept` so fd exhaustion does not spin the loop.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Address and device the daemon is bound to for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub device_path: PathBuf,
}

impl DaemonConfig {
    /// `host:port`, as used for binding and for client connections.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
        }
    }
}
