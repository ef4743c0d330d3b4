//! Error types for lightd-core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to open the light control file at startup.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The control file is absent: the kernel driver does not expose it.
    #[error(
        "{} does not exist. Please make sure your device is supported: on http://www.thinkwiki.org/wiki/ThinkLight",
        .path.display()
    )]
    NotFound { path: PathBuf },

    /// The control file exists but this process may not write to it.
    #[error("{} is not open for writing. This program must be run as root!", .path.display())]
    NotWritable { path: PathBuf },

    /// Any other OS-level open failure.
    #[error("failed to open light device {}: {source}", .path.display())]
    Other {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeviceError {
    /// Classify an `open` failure for `path` by its OS error kind.
    pub fn from_open_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::NotWritable { path },
            _ => Self::Other { path, source },
        }
    }

    /// The control file that failed to open.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound { path } | Self::NotWritable { path } | Self::Other { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHT: &str = "/proc/acpi/ibm/light";

    #[test]
    fn not_found_names_path_and_support_page() {
        let err = DeviceError::from_open_error(LIGHT, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, DeviceError::NotFound { .. }), "got: {err:?}");
        let msg = err.to_string();
        assert!(msg.starts_with(LIGHT), "got: {msg}");
        assert!(msg.contains("ThinkLight"), "got: {msg}");
    }

    #[test]
    fn permission_denied_asks_for_root() {
        let err =
            DeviceError::from_open_error(LIGHT, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, DeviceError::NotWritable { .. }), "got: {err:?}");
        assert!(err.to_string().contains("must be run as root"));
    }

    #[test]
    fn other_kinds_keep_source() {
        let source = io::Error::new(io::ErrorKind::Other, "device busy");
        let err = DeviceError::from_open_error(LIGHT, source);
        assert!(matches!(err, DeviceError::Other { .. }), "got: {err:?}");
        assert_eq!(err.path(), std::path::Path::new(LIGHT));
        let source_msg = std::error::Error::source(&err)
            .map(|s| s.to_string())
            .unwrap_or_default();
        assert_eq!(source_msg, "device busy");
    }
}
