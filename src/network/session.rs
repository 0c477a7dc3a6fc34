//! Session
//!
//! Owns the connection and the command-list state machine.
//!
//! ## States
//! ```text
//!            connect()                     begin_batch()
//! Disconnected ───────▶ Connected (idle) ─────────────▶ Connected (batching)
//!      ▲                   │      ▲                          │
//!      └── disconnect() ───┘      └────── end_batch() ───────┘
//! ```
//!
//! A transport failure marks the connection stale. The failing operation is
//! retried once on a fresh connection (full handshake); a second failure is
//! surfaced. Server errors (`ACK`) and framing errors are never retried.

use std::io;
use std::sync::Arc;

use crate::commands;
use crate::config::Config;
use crate::error::{MpdError, Result};
use crate::log::{log_at, Log, Logger};
use crate::protocol::{encode_command, Arg, ProtocolVersion, Reply, ResponseShape, Terminator};

use super::binary::{BinaryAssembly, BinaryObject};
use super::connection::Connection;
use super::transport::{Connector, SocketConnector};

/// Opens a command list whose items each end with `list_OK`
pub const BATCH_BEGIN: &str = "command_list_ok_begin";

/// Closes a command list
pub const BATCH_END: &str = "command_list_end";

/// A single logical session with one daemon
pub struct Session {
    config: Config,
    connector: Box<dyn Connector>,

    /// `Some` exactly while connected
    conn: Option<Connection>,

    /// Set by `connect()`, cleared by `disconnect()`: whether a lost
    /// connection should be re-established on demand
    wanted: bool,

    /// Shapes of the commands queued since the command list opened
    batch: Option<Vec<ResponseShape>>,

    log: Log,
}

impl Session {
    /// Create a disconnected session
    pub fn new(config: Config) -> Self {
        Self {
            config,
            connector: Box::new(SocketConnector),
            conn: None,
            wanted: false,
            batch: None,
            log: Log::default(),
        }
    }

    /// Use `logger` for session events
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.log = Log::new(logger);
        self
    }

    /// Use `connector` to open transports
    pub fn with_connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Box::new(connector);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connect and handshake; a no-op when already connected
    pub fn connect(&mut self) -> Result<()> {
        self.wanted = true;
        if self.is_connected() {
            return Ok(());
        }
        self.reconnect()
    }

    /// Drop the connection and reset all session state
    pub fn disconnect(&mut self) {
        self.wanted = false;
        self.reset();
        log_at!(self.log, INFO, "disconnected");
    }

    /// Replace the connection with a fresh one
    pub fn reconnect(&mut self) -> Result<()> {
        self.reset();
        self.open()
    }

    /// False once the connection has failed, even before the next exchange
    /// replaces it
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| !conn.is_stale())
    }

    /// Version announced by the server, `None` while disconnected
    pub fn version(&self) -> Option<&ProtocolVersion> {
        self.conn
            .as_ref()
            .filter(|conn| !conn.is_stale())
            .map(Connection::version)
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    /// Number of commands queued in the open command list
    pub fn pending(&self) -> usize {
        self.batch.as_ref().map_or(0, Vec::len)
    }

    fn open(&mut self) -> Result<()> {
        let endpoint = self.config.endpoint();
        let conn = Connection::open(&*self.connector, &endpoint, &self.config, self.log.clone())?;
        self.conn = Some(conn);
        Ok(())
    }

    fn reset(&mut self) {
        self.conn = None;
        self.batch = None;
    }

    /// The live connection, re-established first if it went stale
    fn live(&mut self) -> Result<&mut Connection> {
        let needs_open = match &self.conn {
            None => self.wanted && self.config.reconnect,
            Some(conn) => conn.is_stale(),
        };

        if needs_open {
            if !self.config.reconnect {
                self.reset();
                return Err(MpdError::Transport(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "connection lost and reconnect is disabled",
                )));
            }
            log_at!(self.log, WARN, "connection lost, reconnecting");
            self.reconnect()?;
        }

        self.conn.as_mut().ok_or(MpdError::NotConnected)
    }

    /// Run `op` on the live connection, retrying once after a reconnect
    fn with_retry<T>(&mut self, mut op: impl FnMut(&mut Connection) -> Result<T>) -> Result<T> {
        let conn = self.live()?;
        match op(conn) {
            Err(e) if e.is_transport() && self.config.reconnect => {
                log_at!(self.log, WARN, "{}; reconnecting and retrying", e);
                self.reconnect()?;
                let conn = self.conn.as_mut().ok_or(MpdError::NotConnected)?;
                op(conn)
            }
            other => other,
        }
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    /// Write one raw command line (no retry)
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.live()?.write_line(line)
    }

    /// Read the reply to a previously written line
    pub fn read_shape(&mut self, shape: ResponseShape) -> Result<Reply> {
        if self.batch.is_some() {
            return Err(MpdError::Framing(
                "replies inside a command list are resolved when it ends".to_string(),
            ));
        }
        self.live()?.read_reply(shape, Terminator::Ok)
    }

    /// Encode and send a command, resolving its reply as `shape`
    ///
    /// Inside a command list the shape is queued and `Reply::Deferred`
    /// is returned.
    pub fn send(&mut self, command: &str, args: &[Arg], shape: ResponseShape) -> Result<Reply> {
        let line = encode_command(command, args)?;
        self.send_line(&line, shape)
    }

    /// Send an already encoded line
    pub fn send_line(&mut self, line: &str, shape: ResponseShape) -> Result<Reply> {
        if self.batch.is_some() {
            return self.queue(line, shape);
        }
        self.with_retry(|conn| {
            conn.write_line(line)?;
            conn.read_reply(shape, Terminator::Ok)
        })
    }

    /// Send a command from the command table
    pub fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply> {
        let entry = commands::lookup(command)
            .ok_or_else(|| MpdError::UnknownCommand(command.to_string()))?;
        self.send(entry.name, args, entry.shape)
    }

    // =========================================================================
    // Command Lists
    // =========================================================================

    /// Open a command list
    pub fn begin_batch(&mut self) -> Result<()> {
        if self.batch.is_some() {
            return Err(MpdError::Framing("command list already open".to_string()));
        }
        self.with_retry(|conn| conn.write_line(BATCH_BEGIN))?;
        self.batch = Some(Vec::new());
        log_at!(self.log, DEBUG, "command list opened");
        Ok(())
    }

    fn queue(&mut self, line: &str, shape: ResponseShape) -> Result<Reply> {
        let written = match self.conn.as_mut() {
            Some(conn) => conn.write_line(line),
            None => Err(MpdError::NotConnected),
        };
        if let Err(e) = written {
            log_at!(self.log, WARN, "command list abandoned: {}", e);
            self.batch = None;
            return Err(e);
        }
        if let Some(queue) = self.batch.as_mut() {
            queue.push(shape);
        }
        Ok(Reply::Deferred)
    }

    /// Close the command list and resolve every queued reply in order
    ///
    /// An `ACK` aborts the remaining items; nothing after it is read.
    pub fn end_batch(&mut self) -> Result<Vec<Reply>> {
        let queue = self
            .batch
            .take()
            .ok_or_else(|| MpdError::Framing("no command list is open".to_string()))?;
        let expected = queue.len();
        let conn = self.conn.as_mut().ok_or(MpdError::NotConnected)?;

        conn.write_line(BATCH_END)?;

        let mut replies = Vec::with_capacity(expected);
        for shape in queue {
            let reply = conn
                .read_reply(shape, Terminator::ListOk)
                .map_err(|e| truncated(e, replies.len(), expected))?;
            replies.push(reply);
        }

        let trailing = conn
            .read_pairs(Terminator::Ok)
            .map_err(|e| truncated(e, expected, expected))?;
        if !trailing.is_empty() {
            return Err(MpdError::Framing(format!(
                "{} unexpected pairs after the command list",
                trailing.len()
            )));
        }

        log_at!(self.log, DEBUG, "command list resolved {} replies", replies.len());
        Ok(replies)
    }

    // =========================================================================
    // Binary Transfers
    // =========================================================================

    /// Fetch a complete binary object, e.g. `fetch_binary("albumart", &[uri])`
    ///
    /// The offset argument is appended to `args` on every request. Returns
    /// `Ok(None)` when the server has nothing to send.
    pub fn fetch_binary(&mut self, command: &str, args: &[Arg]) -> Result<Option<BinaryObject>> {
        if self.batch.is_some() {
            return Err(MpdError::Framing(
                "binary transfers cannot run inside a command list".to_string(),
            ));
        }

        let mut assembly = BinaryAssembly::new();
        let mut args = args.to_vec();
        args.push(Arg::Int(0));

        loop {
            let offset = assembly.offset();
            if let Some(last) = args.last_mut() {
                *last = Arg::try_from(offset)?;
            }
            let line = encode_command(command, &args)?;

            let chunk = self.with_retry(|conn| {
                conn.write_line(&line)?;
                conn.read_chunk()
            })?;

            let Some(chunk) = chunk else {
                if offset == 0 {
                    return Ok(None);
                }
                return Err(MpdError::Framing(format!(
                    "binary transfer stopped at offset {}",
                    offset
                )));
            };

            if assembly.push(chunk)? {
                let object = assembly.finish();
                log_at!(self.log, DEBUG, "{} transferred {} bytes", command, object.data.len());
                return Ok(Some(object));
            }
        }
    }
}

/// End-of-stream inside a command list reply is a framing error
fn truncated(err: MpdError, read: usize, expected: usize) -> MpdError {
    match err {
        MpdError::Transport(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            if read < expected {
                MpdError::Framing(format!(
                    "command list reply ended after {} of {} items",
                    read, expected
                ))
            } else {
                MpdError::Framing("command list reply ended before the final OK".to_string())
            }
        }
        other => other,
    }
}
