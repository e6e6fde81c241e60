//! Error types for the `sse` crate.
//!
//! Follows the same shape as the other crates in this workspace: a root `Error`
//! struct carrying an `error_kind` and an optional `source` for chaining.

use std::error::Error as StdError;
use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// Top-level error type for the channel engine.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// The kinds of errors the channel engine can report.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The channel has been closed and accepts no further publish or subscribe calls.
    ChannelClosed,
    /// An event name contained a line break and cannot be framed.
    InvalidEventName,
    /// A filter pattern failed to compile as a regular expression.
    InvalidPattern,
    /// A structured payload could not be serialized to JSON.
    Serialization,
    /// A write to a subscriber stream failed (stream ended or peer went away).
    Transport,
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub fn channel_closed() -> Self {
        Self::new(ErrorKind::ChannelClosed)
    }

    pub fn transport() -> Self {
        Self::new(ErrorKind::Transport)
    }

    pub fn is_channel_closed(&self) -> bool {
        self.error_kind == ErrorKind::ChannelClosed
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::ChannelClosed => write!(f, "channel closed"),
            ErrorKind::InvalidEventName => write!(f, "event name must not contain line breaks"),
            ErrorKind::InvalidPattern => write!(f, "invalid event filter pattern"),
            ErrorKind::Serialization => write!(f, "failed to serialize payload"),
            ErrorKind::Transport => write!(f, "subscriber stream is closed"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE Error: {}: {source}", self.error_kind),
            None => write!(f, "SSE Error: {}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Serialization,
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::InvalidPattern,
        }
    }
}
