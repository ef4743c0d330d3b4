//! thinkpadlightd core library — wire commands, device values, errors.
//!
//! Public API surface:
//! - [`types`] — [`Command`] and the [`Reply`] indicators sent back to clients
//! - [`error`] — [`DeviceError`] and open-failure classification

pub mod error;
pub mod types;

pub use error::DeviceError;
pub use types::{Command, Reply};
