//! Connection
//!
//! One live transport plus the version the server greeted it with.

use std::io::{BufReader, Write};

use crate::config::{Config, Endpoint};
use crate::error::{MpdError, Result};
use crate::log::{log_at, Log};
use crate::protocol::{
    assemble, encode_command, read_hello, Arg, Frame, Pair, ProtocolVersion, Record, Reply,
    ResponseReader, ResponseShape, Terminator,
};

use super::binary::Chunk;
use super::transport::{Connector, Transport};

/// A handshaken connection
pub(crate) struct Connection {
    /// Buffered stream; writes go straight to the inner transport
    stream: BufReader<Box<dyn Transport>>,

    /// Version from the greeting
    version: ProtocolVersion,

    /// Set after a transport failure or end-of-stream; the next exchange
    /// reconnects first
    stale: bool,

    log: Log,
}

impl Connection {
    /// Connect, read the greeting and authenticate if a password is set
    pub(crate) fn open(
        connector: &dyn Connector,
        endpoint: &Endpoint,
        config: &Config,
        log: Log,
    ) -> Result<Self> {
        let transport = connector.connect(endpoint, config)?;
        let mut stream = BufReader::new(transport);
        let version = read_hello(&mut stream)?;

        log_at!(log, INFO, "connected to {} (protocol {})", endpoint, version);

        let mut conn = Self {
            stream,
            version,
            stale: false,
            log,
        };

        if let Some(password) = &config.password {
            let line = encode_command("password", &[Arg::from(password.as_str())])?;
            conn.write_line(&line)?;
            conn.read_reply(ResponseShape::Nothing, Terminator::Ok)?;
            log_at!(conn.log, DEBUG, "authenticated");
        }

        Ok(conn)
    }

    pub(crate) fn version(&self) -> &ProtocolVersion {
        &self.version
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale
    }

    /// Send one command line
    pub(crate) fn write_line(&mut self, line: &str) -> Result<()> {
        log_at!(self.log, TRACE, "> {}", line);

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        let inner = self.stream.get_mut();
        let result = inner.write_all(&bytes).and_then(|_| inner.flush());
        self.track(result.map_err(MpdError::from))
    }

    /// Read one reply body up to `expect` and assemble it
    pub(crate) fn read_reply(&mut self, shape: ResponseShape, expect: Terminator) -> Result<Reply> {
        let pairs = self.read_pairs(expect)?;
        if shape == ResponseShape::Nothing && !pairs.is_empty() {
            log_at!(self.log, DEBUG, "discarding {} unexpected pairs", pairs.len());
        }
        assemble(shape, pairs)
    }

    pub(crate) fn read_pairs(&mut self, expect: Terminator) -> Result<Vec<Pair>> {
        let mut reader = ResponseReader::new(&mut self.stream);
        let result = reader.read_pairs(expect);
        let eof = reader.is_eof();
        self.note_eof(eof);
        self.track(result)
    }

    /// Read one reply of a chunked binary command
    ///
    /// Returns `Ok(None)` for an empty reply (nothing to transfer).
    pub(crate) fn read_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut reader = ResponseReader::new(&mut self.stream);
        let mut meta = Record::new();
        let mut data = None;

        let result = loop {
            match reader.next_frame(Terminator::Ok) {
                Ok(Some(Frame::Pair(pair))) => meta.push(pair),
                Ok(Some(Frame::Binary(bytes))) => {
                    if data.replace(bytes).is_some() {
                        break Err(MpdError::Framing(
                            "more than one binary payload in a reply".to_string(),
                        ));
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        let eof = reader.is_eof();
        self.note_eof(eof);
        self.track(result)?;

        if meta.is_empty() && data.is_none() {
            return Ok(None);
        }
        Chunk::from_reply(meta, data).map(Some)
    }

    fn note_eof(&mut self, eof: bool) {
        if eof && !self.stale {
            log_at!(self.log, WARN, "server closed the connection");
            self.stale = true;
        }
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_transport() {
                self.stale = true;
            }
        }
        result
    }
}
