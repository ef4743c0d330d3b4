use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use lightd_core::{Command, Reply};

use crate::error::{io_err, DaemonError};

/// The request line for `command`.
pub fn command_line(command: Command) -> [u8; 2] {
    [command.digit(), b'\n']
}

/// Send one command to the daemon at `addr` and return its reply.
pub fn send_command(addr: &str, command: Command) -> Result<Reply, DaemonError> {
    let mut stream = TcpStream::connect(addr).map_err(|err| {
        if matches!(
            err.kind(),
            std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::ConnectionReset
        ) {
            DaemonError::DaemonNotRunning {
                addr: addr.to_string(),
            }
        } else {
            io_err(addr, err)
        }
    })?;

    stream
        .write_all(&command_line(command))
        .map_err(|e| io_err(addr, e))?;
    stream.flush().map_err(|e| io_err(addr, e))?;

    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let read = reader
        .read_until(b'\n', &mut line)
        .map_err(|e| io_err(addr, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "daemon closed connection before responding".to_string(),
        ));
    }

    Reply::parse_line(&line).ok_or_else(|| {
        DaemonError::Protocol(format!(
            "unexpected reply {:?}",
            String::from_utf8_lossy(&line)
        ))
    })
}

/// Send `command` and require the daemon to acknowledge it.
pub fn request_state(addr: &str, command: Command) -> Result<(), DaemonError> {
    match send_command(addr, command)? {
        Reply::Ack(acked) if acked == command => Ok(()),
        Reply::Ack(other) => Err(DaemonError::Protocol(format!(
            "daemon acknowledged '{}' instead of '{}'",
            other.digit() as char,
            command.digit() as char
        ))),
        Reply::Invalid => Err(DaemonError::Protocol(
            "daemon rejected the command".to_string(),
        )),
    }
}
