//! Error types for mpdwire
//!
//! Provides a unified error type for every client operation.

use std::fmt;

use thiserror::Error;

/// Result type alias using MpdError
pub type Result<T> = std::result::Result<T, MpdError>;

/// Unified error type for mpdwire operations
#[derive(Debug, Error)]
pub enum MpdError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Socket-level failure. Recovered once by reconnecting, then surfaced.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Not connected to the server")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// The server answered with an `ACK` line
    #[error("Protocol error: {0}")]
    Protocol(Ack),

    #[error("Handshake error: {0}")]
    Handshake(String),

    /// The reply stream does not match the state the client is in
    #[error("Framing error: {0}")]
    Framing(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MpdError {
    /// True for socket-level failures, the only errors that trigger a reconnect
    pub fn is_transport(&self) -> bool {
        matches!(self, MpdError::Transport(_))
    }

    /// The server error, if this is one
    pub fn ack(&self) -> Option<&Ack> {
        match self {
            MpdError::Protocol(ack) => Some(ack),
            _ => None,
        }
    }
}

/// An `ACK` line sent by the server
///
/// Well-formed lines look like `ACK [50@0] {play} No such song`. The raw text
/// after the `ACK ` prefix is always kept; the structured fields are filled
/// in only when the line follows that layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Everything after `ACK `, trimmed
    pub message: String,

    /// Numeric error code (`50` above)
    pub code: Option<u32>,

    /// Index of the failing command inside a command list
    pub list_index: Option<u32>,

    /// Name of the failing command, empty when the server did not name one
    pub command: Option<String>,

    /// Human-readable part of the message
    pub text: String,
}

impl Ack {
    /// Well-known error codes
    pub const NOT_LIST: u32 = 1;
    pub const ARG: u32 = 2;
    pub const PASSWORD: u32 = 3;
    pub const PERMISSION: u32 = 4;
    pub const UNKNOWN: u32 = 5;
    pub const NO_EXIST: u32 = 50;
    pub const PLAYLIST_MAX: u32 = 51;
    pub const SYSTEM: u32 = 52;
    pub const PLAYLIST_LOAD: u32 = 53;
    pub const UPDATE_ALREADY: u32 = 54;
    pub const PLAYER_SYNC: u32 = 55;
    pub const EXIST: u32 = 56;

    /// Parse the remainder of an `ACK` line
    pub fn parse(rest: &str) -> Self {
        let message = rest.trim().to_string();
        let mut ack = Ack {
            message: message.clone(),
            code: None,
            list_index: None,
            command: None,
            text: message.clone(),
        };

        let Some(body) = message.strip_prefix('[') else {
            return ack;
        };
        let Some((location, tail)) = body.split_once(']') else {
            return ack;
        };
        let Some((code, index)) = location.split_once('@') else {
            return ack;
        };
        let (Ok(code), Ok(index)) = (code.parse::<u32>(), index.parse::<u32>()) else {
            return ack;
        };

        ack.code = Some(code);
        ack.list_index = Some(index);

        let tail = tail.trim_start();
        if let Some(after) = tail.strip_prefix('{') {
            if let Some((command, text)) = after.split_once('}') {
                if !command.is_empty() {
                    ack.command = Some(command.to_string());
                }
                ack.text = text.trim().to_string();
                return ack;
            }
        }
        ack.text = tail.to_string();
        ack
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
