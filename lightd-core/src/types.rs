//! Domain types for the light protocol.
//!
//! A client line is either a [`Command`] or invalid; every processed line
//! produces exactly one [`Reply`] indicator.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A light state change requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TurnOff,
    TurnOn,
}

impl Command {
    /// Parse one protocol line.
    ///
    /// Trailing whitespace (including the `\n` terminator and a `\r` from
    /// telnet-style clients) is ignored. Only the exact digits `0` and `1`
    /// are commands; everything else, leading whitespace included, is `None`.
    /// This is a right-strip only, not a full strip: `" 1"` is rejected.
    pub fn parse_line(line: &[u8]) -> Option<Self> {
        match line.trim_ascii_end() {
            b"0" => Some(Self::TurnOff),
            b"1" => Some(Self::TurnOn),
            _ => None,
        }
    }

    /// The single digit clients use for this command.
    pub fn digit(self) -> u8 {
        match self {
            Self::TurnOff => b'0',
            Self::TurnOn => b'1',
        }
    }

    /// The string the control file expects for this state.
    pub fn device_value(self) -> &'static str {
        match self {
            Self::TurnOff => "off",
            Self::TurnOn => "on",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.device_value())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "off" => Ok(Self::TurnOff),
            "1" | "on" => Ok(Self::TurnOn),
            other => Err(format!("unknown light state '{other}'; expected: on, off, 1, 0")),
        }
    }
}

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// Indicator written back to the client after each processed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// The command was applied to the device; echoes its digit.
    Ack(Command),
    /// The line was not a command; the connection closes after this reply.
    Invalid,
}

impl Reply {
    pub const INVALID_INDICATOR: u8 = b'i';

    /// The single indicator character, without terminator.
    pub fn indicator(self) -> u8 {
        match self {
            Self::Ack(command) => command.digit(),
            Self::Invalid => Self::INVALID_INDICATOR,
        }
    }

    /// The full reply line as sent on the wire.
    pub fn to_line(self) -> [u8; 2] {
        [self.indicator(), b'\n']
    }

    /// Parse a reply line read back by a client.
    pub fn parse_line(line: &[u8]) -> Option<Self> {
        match line.trim_ascii_end() {
            [Self::INVALID_INDICATOR] => Some(Self::Invalid),
            other => Command::parse_line(other).map(Self::Ack),
        }
    }
}
