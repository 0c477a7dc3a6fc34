//! Shared client handle
//!
//! Wraps a [`Session`] in a mutex so foreground code and the watcher can
//! share one connection. Each call holds the lock for one write+read unit;
//! a [`CommandList`] holds it from open to close.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::Config;
use crate::error::Result;
use crate::log::Logger;
use crate::protocol::{Arg, ProtocolVersion, Record, Reply, ResponseShape};

use super::binary::BinaryObject;
use super::session::Session;

/// Thread-safe client
pub struct Client {
    session: Mutex<Session>,
}

impl Client {
    /// Wrap an existing (possibly unconnected) session
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Build a session for `config`, log through `logger`, and connect
    pub fn connect_with(config: Config, logger: Arc<dyn Logger>) -> Result<Self> {
        let client = Self::new(Session::new(config).with_logger(logger));
        client.connect()?;
        Ok(client)
    }

    /// Connect (no-op if connected)
    pub fn connect(&self) -> Result<()> {
        self.session.lock().connect()
    }

    pub fn disconnect(&self) {
        self.session.lock().disconnect();
    }

    pub fn reconnect(&self) -> Result<()> {
        self.session.lock().reconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.session.lock().is_connected()
    }

    pub fn version(&self) -> Option<ProtocolVersion> {
        self.session.lock().version().cloned()
    }

    /// Exclusive access to the session for raw exchanges
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn send(&self, command: &str, args: &[Arg], shape: ResponseShape) -> Result<Reply> {
        self.session.lock().send(command, args, shape)
    }

    /// Send a command from the command table
    pub fn call(&self, command: &str, args: &[Arg]) -> Result<Reply> {
        self.session.lock().call(command, args)
    }

    /// Open a command list; the lock is held until it ends or is dropped
    pub fn command_list(&self) -> Result<CommandList<'_>> {
        let mut session = self.session.lock();
        session.begin_batch()?;
        Ok(CommandList {
            session,
            open: true,
        })
    }

    pub fn fetch_binary(&self, command: &str, args: &[Arg]) -> Result<Option<BinaryObject>> {
        self.session.lock().fetch_binary(command, args)
    }

    // =========================================================================
    // Typed Helpers
    // =========================================================================

    pub fn ping(&self) -> Result<()> {
        self.call("ping", &[]).map(|_| ())
    }

    /// Player status, or an empty record when the server sent nothing
    pub fn status(&self) -> Result<Record> {
        Ok(self.call("status", &[])?.into_record().unwrap_or_default())
    }

    /// The current song, if any
    pub fn current_song(&self) -> Result<Option<Record>> {
        Ok(self.call("currentsong", &[])?.into_record())
    }

    /// Cover art file from the song's directory
    pub fn album_art(&self, uri: &str) -> Result<Option<BinaryObject>> {
        self.fetch_binary("albumart", &[Arg::from(uri)])
    }

    /// Picture embedded in the song file
    pub fn read_picture(&self, uri: &str) -> Result<Option<BinaryObject>> {
        self.fetch_binary("readpicture", &[Arg::from(uri)])
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: formatting must not wait on (or deadlock with) a caller
        let mut debug = f.debug_struct("Client");
        match self.session.try_lock() {
            Some(session) => debug
                .field("endpoint", &session.config().endpoint())
                .field("connected", &session.is_connected())
                .field("batching", &session.is_batching()),
            None => debug.field("session", &"<locked>"),
        };
        debug.finish()
    }
}

/// An open command list holding the session lock
///
/// Every `send`/`call` returns `Reply::Deferred`; [`CommandList::end`]
/// resolves them in order. Dropping an unfinished list closes it and
/// discards the replies.
pub struct CommandList<'a> {
    session: MutexGuard<'a, Session>,
    open: bool,
}

impl CommandList<'_> {
    pub fn send(&mut self, command: &str, args: &[Arg], shape: ResponseShape) -> Result<Reply> {
        self.session.send(command, args, shape)
    }

    pub fn call(&mut self, command: &str, args: &[Arg]) -> Result<Reply> {
        self.session.call(command, args)
    }

    /// Commands queued so far
    pub fn len(&self) -> usize {
        self.session.pending()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the list and resolve every queued reply
    pub fn end(mut self) -> Result<Vec<Reply>> {
        self.open = false;
        self.session.end_batch()
    }
}

impl Drop for CommandList<'_> {
    fn drop(&mut self) {
        if self.open && self.session.is_batching() {
            let _ = self.session.end_batch();
        }
    }
}
