//! The light control file and the single task allowed to write to it.
//!
//! [`SharedDevice`] is opened once at startup and moved into the writer task
//! spawned by [`spawn_writer`]. Connection handlers never touch the file; they
//! hold a cloneable [`DeviceHandle`] and wait on a reply slot until their
//! write has reached the device.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use lightd_core::{Command, DeviceError};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::DEVICE_QUEUE_DEPTH;
use crate::error::DaemonError;

/// Open write handle to the light control file.
#[derive(Debug)]
pub struct SharedDevice {
    path: PathBuf,
    file: File,
}

impl SharedDevice {
    /// Open `path` for writing. The file is truncated but never created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|err| DeviceError::from_open_error(path, err))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: File::from_std(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the device value for `command` and flush it through.
    pub async fn set(&mut self, command: Command) -> Result<(), DaemonError> {
        let value = command.device_value();
        let write_err = |source| DaemonError::DeviceWrite {
            path: self.path.clone(),
            value,
            source,
        };
        self.file.write_all(value.as_bytes()).await.map_err(write_err)?;
        self.file.flush().await.map_err(write_err)?;
        Ok(())
    }
}

struct SetRequest {
    command: Command,
    respond_to: oneshot::Sender<Result<(), DaemonError>>,
}

/// Cloneable sender side of the device writer.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    tx: mpsc::Sender<SetRequest>,
}

impl DeviceHandle {
    /// Queue `command` and wait until the writer has applied it.
    pub async fn set(&self, command: Command) -> Result<(), DaemonError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SetRequest {
                command,
                respond_to: tx,
            })
            .await
            .map_err(|_| DaemonError::ChannelClosed("device queue"))?;

        rx.await
            .map_err(|_| DaemonError::ChannelClosed("device response"))?
    }
}

/// Move `device` into a dedicated writer task.
///
/// The task stops on shutdown or once every [`DeviceHandle`] is dropped. A
/// request already taken off the queue is always written before it checks
/// for shutdown again. When the task exits it broadcasts shutdown itself.
pub fn spawn_writer(
    device: SharedDevice,
    shutdown: &broadcast::Sender<()>,
) -> (DeviceHandle, JoinHandle<Result<(), DaemonError>>) {
    let (tx, rx) = mpsc::channel::<SetRequest>(DEVICE_QUEUE_DEPTH);
    let shutdown = shutdown.clone();
    let shutdown_rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let result = writer_task(device, rx, shutdown_rx).await;
        let _ = shutdown.send(());
        result
    });
    (DeviceHandle { tx }, handle)
}

async fn writer_task(
    mut device: SharedDevice,
    mut rx: mpsc::Receiver<SetRequest>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_request = rx.recv() => {
                let Some(request) = maybe_request else { break };
                let outcome = device.set(request.command).await;
                match &outcome {
                    Ok(()) => tracing::debug!(state = %request.command, "light device updated"),
                    Err(err) => tracing::error!(error = %err, "light device write failed"),
                }
                let _ = request.respond_to.send(outcome);
            }
        }
    }

    tracing::debug!(path = %device.path().display(), "device writer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    fn light_file() -> NamedTempFile {
        let file = NamedTempFile::new().expect("temp light file");
        std::fs::write(file.path(), "stale contents").expect("seed light file");
        file
    }

    /// Split device contents into the values written, failing on any garbage.
    fn written_values(contents: &str) -> Vec<&str> {
        let mut values = Vec::new();
        let mut rest = contents;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("off") {
                values.push("off");
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("on") {
                values.push("on");
                rest = tail;
            } else {
                panic!("interleaved or corrupt device contents: {contents:?}");
            }
        }
        values
    }

    #[test]
    fn open_missing_path_is_not_found_and_not_created() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("light");
        let err = SharedDevice::open(&path).unwrap_err();
        assert!(matches!(err, DeviceError::NotFound { .. }), "got: {err}");
        assert!(!path.exists(), "open must never create the control file");
    }

    #[test]
    fn open_directory_is_unclassified() {
        let dir = TempDir::new().expect("dir");
        let err = SharedDevice::open(dir.path()).unwrap_err();
        assert!(matches!(err, DeviceError::Other { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn set_writes_device_values_in_order() {
        let file = light_file();
        let mut device = SharedDevice::open(file.path()).expect("open");

        device.set(Command::TurnOn).await.expect("on");
        device.set(Command::TurnOff).await.expect("off");
        device.set(Command::TurnOn).await.expect("on");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        assert_eq!(contents, "onoffon", "open truncates, writes are unbuffered");
    }

    #[tokio::test]
    async fn writer_applies_before_replying() {
        let file = light_file();
        let device = SharedDevice::open(file.path()).expect("open");
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let (handle, writer) = spawn_writer(device, &shutdown_tx);

        handle.set(Command::TurnOff).await.expect("set");
        assert_eq!(std::fs::read_to_string(file.path()).expect("read"), "off");

        drop(handle);
        writer.await.expect("join").expect("writer result");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_handles_never_interleave() {
        let file = light_file();
        let device = SharedDevice::open(file.path()).expect("open");
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let (handle, writer) = spawn_writer(device, &shutdown_tx);

        let mut tasks = Vec::new();
        for i in 0..32 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                let command = if i % 2 == 0 { Command::TurnOn } else { Command::TurnOff };
                for _ in 0..8 {
                    handle.set(command).await.expect("set");
                }
            }));
        }
        for task in tasks {
            task.await.expect("task");
        }
        drop(handle);
        writer.await.expect("join").expect("writer result");

        let contents = std::fs::read_to_string(file.path()).expect("read");
        let values = written_values(&contents);
        assert_eq!(values.len(), 32 * 8, "no write may be lost");
        assert_eq!(values.iter().filter(|v| **v == "on").count(), 16 * 8);
    }

    #[tokio::test]
    async fn writer_listens_for_shutdown_before_it_first_runs() {
        let file = light_file();
        let device = SharedDevice::open(file.path()).expect("open");
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let (_handle, writer) = spawn_writer(device, &shutdown_tx);

        // current-thread runtime: the writer task has not been polled yet
        assert_eq!(shutdown_tx.receiver_count(), 1);
        shutdown_tx.send(()).expect("send shutdown");
        writer.await.expect("join").expect("writer result");
    }

    #[tokio::test]
    async fn shutdown_stops_writer_and_closes_queue() {
        let file = light_file();
        let device = SharedDevice::open(file.path()).expect("open");
        let (shutdown_tx, _) = broadcast::channel::<()>(4);
        let (handle, writer) = spawn_writer(device, &shutdown_tx);

        shutdown_tx.send(()).expect("send shutdown");
        writer.await.expect("join").expect("writer result");

        let err = handle.set(Command::TurnOn).await.unwrap_err();
        assert!(matches!(err, DaemonError::ChannelClosed(_)), "got: {err}");
    }
}
