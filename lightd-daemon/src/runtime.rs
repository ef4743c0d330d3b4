use std::io::Write;
use std::net::SocketAddr;

use lightd_core::{Command, Reply};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::{DaemonConfig, ACCEPT_ERROR_BACKOFF};
use crate::device::{spawn_writer, DeviceHandle, SharedDevice};
use crate::error::{io_err, DaemonError};

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: DaemonConfig) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon until Ctrl-C or SIGTERM.
pub async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    let daemon = Daemon::bind(&config).await?;
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = shutdown_signal() => {
                    match signal {
                        Ok(name) => {
                            tracing::info!(signal = name, "shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("signal handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let serve_result = daemon.serve(shutdown_tx.clone()).await;
    let _ = shutdown_tx.send(());
    handle_join("signal_handler", signal_handle.await)?;
    serve_result
}

/// A daemon whose device is open and whose listener is bound, not yet serving.
#[derive(Debug)]
pub struct Daemon {
    device: SharedDevice,
    listener: TcpListener,
}

impl Daemon {
    /// Open the light device, then bind the listener.
    ///
    /// Device failures are reported before any socket is bound.
    pub async fn bind(config: &DaemonConfig) -> Result<Self, DaemonError> {
        let device = SharedDevice::open(&config.device_path).map_err(|err| {
            tracing::error!(device = %err.path().display(), "cannot open light device");
            err
        })?;
        let addr = config.address();
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|source| DaemonError::Bind {
                addr: addr.clone(),
                source,
            })?;

        tracing::info!(
            addr = %addr,
            device = %device.path().display(),
            "thinkpadlightd listening",
        );
        Ok(Self { device, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DaemonError> {
        self.listener
            .local_addr()
            .map_err(|e| io_err("listener address", e))
    }

    /// Accept connections until `shutdown` fires.
    pub async fn serve(self, shutdown: broadcast::Sender<()>) -> Result<(), DaemonError> {
        let Self { device, listener } = self;
        let (device, writer_handle) = spawn_writer(device, &shutdown);

        let listener_handle = {
            let shutdown = shutdown.clone();
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                let result = listener_task(listener, device, shutdown.clone(), shutdown_rx).await;
                let _ = shutdown.send(());
                result
            })
        };

        let (writer_result, listener_result) = tokio::join!(writer_handle, listener_handle);
        handle_join("device_writer", writer_result)?;
        handle_join("listener", listener_result)?;
        Ok(())
    }
}

async fn listener_task(
    listener: TcpListener,
    device: DeviceHandle,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                };
                tracing::debug!(peer = %peer, "client connected");

                let device = device.clone();
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(async move {
                    match handle_connection(stream, &peer.to_string(), device, shutdown_rx).await {
                        Ok(()) => tracing::debug!(peer = %peer, "client disconnected"),
                        Err(err @ DaemonError::DeviceWrite { .. }) => {
                            tracing::error!(peer = %peer, error = %err, "closing client after device failure");
                        }
                        Err(err) => tracing::debug!(peer = %peer, error = %err, "client connection ended"),
                    }
                });
            }
        }
    }

    Ok(())
}

/// Serve the line protocol on one connection.
///
/// Returns `Ok` on EOF, after an invalid line, or on shutdown. Each valid
/// command is acknowledged only after the device write completed.
async fn handle_connection<S>(
    stream: S,
    peer: &str,
    device: DeviceHandle,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = tokio::select! {
            _ = shutdown_rx.recv() => return Ok(()),
            read = reader.read_until(b'\n', &mut line) => read.map_err(|e| io_err(peer, e))?,
        };
        if read == 0 {
            return Ok(());
        }

        let Some(command) = Command::parse_line(&line) else {
            echo_indicator(Reply::Invalid);
            write_reply(&mut writer, peer, Reply::Invalid).await?;
            return Ok(());
        };

        echo_indicator(Reply::Ack(command));
        device.set(command).await?;
        write_reply(&mut writer, peer, Reply::Ack(command)).await?;
    }
}

async fn write_reply<W>(writer: &mut W, peer: &str, reply: Reply) -> Result<(), DaemonError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(&reply.to_line())
        .await
        .map_err(|e| io_err(peer, e))?;
    writer.flush().await.map_err(|e| io_err(peer, e))
}

/// Operator echo: one character per processed line, no newline.
fn echo_indicator(reply: Reply) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(&[reply.indicator()]);
    let _ = stdout.flush();
}

async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "ctrl-c"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
