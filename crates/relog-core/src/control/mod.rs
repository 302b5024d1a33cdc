//! Control Protocol
//!
//! The synchronous line protocol that lets a front end drive a playback
//! process: one command per line in, exactly one response line out, in
//! order. Verbs mirror the playback operations; malformed input earns an
//! `ERR` and the channel keeps reading.

mod channel;
mod client;

pub use channel::ControlChannel;
pub use client::ReplayClient;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing or exchanging control lines
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Empty command line")]
    Empty,

    #[error("Unknown command verb: {0}")]
    UnknownVerb(String),

    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument for {0}: {1}")]
    InvalidArgument(&'static str, String),

    #[error("Unexpected response line: {0:?}")]
    UnexpectedResponse(String),

    #[error("Control process not running")]
    NotRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed control command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect the publish sink to a host and port
    SetServer {
        /// Sink host name or address
        host: String,
        /// Sink TCP port
        port: u16,
    },
    /// Load an interchange file
    LoadCsv {
        /// Path to the interchange file
        path: PathBuf,
    },
    /// Jump to a position in seconds
    Seek {
        /// Target position; the scheduler clamps it
        seconds: f64,
    },
    /// Start or resume playback
    Play,
    /// Freeze playback
    Pause,
    /// Halt and rewind
    Stop,
    /// Start writing advances to the sink
    PublishOn,
    /// Stop writing advances to the sink
    PublishOff,
    /// Terminate the playback process
    Quit,
}

impl Command {
    /// Parse one command line.
    ///
    /// The verb runs to the first space; everything after it is the
    /// argument text, so `LOAD_CSV` paths may contain spaces. Surrounding
    /// quotes on paths are stripped.
    pub fn parse(line: &str) -> Result<Self, ControlError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ControlError::Empty);
        }
        let (verb, rest) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "SET_SERVER" => {
                let mut args = rest.split_whitespace();
                let host = args
                    .next()
                    .ok_or(ControlError::MissingArgument("SET_SERVER"))?
                    .to_string();
                let port = args
                    .next()
                    .ok_or(ControlError::MissingArgument("SET_SERVER"))?;
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ControlError::InvalidArgument("SET_SERVER", port.to_string()))?;
                Ok(Command::SetServer { host, port })
            }
            "LOAD_CSV" => {
                if rest.is_empty() {
                    return Err(ControlError::MissingArgument("LOAD_CSV"));
                }
                Ok(Command::LoadCsv {
                    path: PathBuf::from(unquote(rest)),
                })
            }
            "SEEK" => {
                if rest.is_empty() {
                    return Err(ControlError::MissingArgument("SEEK"));
                }
                let seconds = rest
                    .parse::<f64>()
                    .map_err(|_| ControlError::InvalidArgument("SEEK", rest.to_string()))?;
                Ok(Command::Seek { seconds })
            }
            "PLAY" => Ok(Command::Play),
            "PAUSE" => Ok(Command::Pause),
            "STOP" => Ok(Command::Stop),
            "PUBLISH_ON" => Ok(Command::PublishOn),
            "PUBLISH_OFF" => Ok(Command::PublishOff),
            "QUIT" => Ok(Command::Quit),
            other => Err(ControlError::UnknownVerb(other.to_string())),
        }
    }
}

/// A response line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Command executed
    Ok,
    /// Command rejected or failed
    Err,
    /// Channel closing after `QUIT`
    Bye,
}

impl Response {
    /// Parse a response line received from the playback process
    pub fn parse(line: &str) -> Result<Self, ControlError> {
        match line.trim() {
            "OK" => Ok(Response::Ok),
            "ERR" => Ok(Response::Err),
            "BYE" => Ok(Response::Bye),
            other => Err(ControlError::UnexpectedResponse(other.to_string())),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Response::Ok => "OK",
            Response::Err => "ERR",
            Response::Bye => "BYE",
        })
    }
}

/// Strip one layer of matching surrounding quotes
fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
