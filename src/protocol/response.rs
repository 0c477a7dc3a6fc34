//! Response reading
//!
//! Pulls newline-terminated lines off the session stream and classifies
//! them: data line, binary payload, error line or terminator.

use std::io::{self, BufRead, Read};

use bytes::Bytes;

use crate::error::{Ack, MpdError, Result};

use super::{Pair, ProtocolVersion};

/// Prefix of the line the server sends on connect
pub const HELLO_PREFIX: &str = "OK MPD ";

/// Plain success terminator
pub const OK: &str = "OK";

/// Per-command terminator inside a command list
pub const LIST_OK: &str = "list_OK";

/// Error line prefix
pub const ACK: &str = "ACK";

/// Key announcing a raw binary payload
pub const BINARY_KEY: &str = "binary";

/// Largest binary chunk accepted (16 MB)
pub const MAX_BINARY_CHUNK: usize = 16 * 1024 * 1024;

/// Longest text line accepted, newline included (1 MB)
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Which terminator ends the reply being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `OK`, outside a command list
    Ok,

    /// `list_OK`, one per command inside a command list
    ListOk,
}

/// One unit of a reply body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Pair(Pair),

    /// Payload announced by a `binary: <len>` line
    Binary(Bytes),
}

/// Reads one reply at a time from a buffered stream
pub struct ResponseReader<'a, R> {
    inner: &'a mut R,
    line: Vec<u8>,
    eof: bool,
}

impl<'a, R: BufRead> ResponseReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self {
            inner,
            line: Vec::with_capacity(256),
            eof: false,
        }
    }

    /// True once the stream ended (or ended mid-line) before a terminator
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Next frame of the current reply
    ///
    /// Returns `Ok(None)` at the expected terminator. End-of-stream before
    /// it is a transport error of kind `UnexpectedEof`. An `ACK` line
    /// becomes [`MpdError::Protocol`]; the wrong terminator for the current
    /// state becomes [`MpdError::Framing`].
    pub fn next_frame(&mut self, expect: Terminator) -> Result<Option<Frame>> {
        let Some(line) = self.read_line()? else {
            return Err(MpdError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before the reply was terminated",
            )));
        };

        if line == OK {
            return match expect {
                Terminator::Ok => Ok(None),
                Terminator::ListOk => Err(MpdError::Framing(
                    "plain OK while command list items are pending".to_string(),
                )),
            };
        }
        if line == LIST_OK {
            return match expect {
                Terminator::ListOk => Ok(None),
                Terminator::Ok => Err(MpdError::Framing(
                    "list_OK outside of a command list".to_string(),
                )),
            };
        }
        if let Some(rest) = line.strip_prefix(ACK) {
            if rest.is_empty() || rest.starts_with(' ') {
                return Err(MpdError::Protocol(Ack::parse(rest)));
            }
        }

        let pair = Pair::parse(&line)
            .ok_or_else(|| MpdError::Framing(format!("malformed response line: {:?}", line)))?;

        if pair.key == BINARY_KEY {
            let len: usize = pair.value.trim().parse().map_err(|_| {
                MpdError::Framing(format!("invalid binary length: {:?}", pair.value))
            })?;
            return self.read_binary(len).map(|data| Some(Frame::Binary(data)));
        }

        Ok(Some(Frame::Pair(pair)))
    }

    /// Next data pair; a binary payload here is a framing error
    pub fn next_pair(&mut self, expect: Terminator) -> Result<Option<Pair>> {
        match self.next_frame(expect)? {
            None => Ok(None),
            Some(Frame::Pair(pair)) => Ok(Some(pair)),
            Some(Frame::Binary(data)) => Err(MpdError::Framing(format!(
                "unexpected binary payload of {} bytes",
                data.len()
            ))),
        }
    }

    /// Drain the current reply into pairs
    pub fn read_pairs(&mut self, expect: Terminator) -> Result<Vec<Pair>> {
        let mut pairs = Vec::new();
        while let Some(pair) = self.next_pair(expect)? {
            pairs.push(pair);
        }
        Ok(pairs)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.line.clear();
        read_bounded_line(&mut *self.inner, &mut self.line)?;
        if self.line.last() != Some(&b'\n') {
            self.eof = true;
            return Ok(None);
        }
        self.line.pop();
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.line).into_owned()))
    }

    fn read_binary(&mut self, len: usize) -> Result<Bytes> {
        if len > MAX_BINARY_CHUNK {
            return Err(MpdError::Framing(format!(
                "binary chunk too large: {} bytes (max {})",
                len, MAX_BINARY_CHUNK
            )));
        }

        let mut data = vec![0u8; len];
        self.inner.read_exact(&mut data)?;

        let mut newline = [0u8; 1];
        self.inner.read_exact(&mut newline)?;
        if newline[0] != b'\n' {
            return Err(MpdError::Framing(
                "binary payload not followed by a newline".to_string(),
            ));
        }

        Ok(Bytes::from(data))
    }
}

/// Read and validate the hello line
pub fn read_hello<R: BufRead>(reader: &mut R) -> Result<ProtocolVersion> {
    let mut line = Vec::with_capacity(32);
    read_bounded_line(reader, &mut line)?;

    if line.last() != Some(&b'\n') {
        return Err(MpdError::Handshake(
            "connection closed before the server greeting".to_string(),
        ));
    }

    let line = String::from_utf8_lossy(&line);
    let line = line.trim_end_matches(['\r', '\n']);
    let version = line
        .strip_prefix(HELLO_PREFIX)
        .ok_or_else(|| MpdError::Handshake(format!("unexpected greeting: {:?}", line)))?;

    ProtocolVersion::parse(version.trim())
        .ok_or_else(|| MpdError::Handshake(format!("invalid protocol version: {:?}", version)))
}

/// `read_until` newline, refusing lines longer than [`MAX_LINE_LENGTH`]
fn read_bounded_line<R: BufRead + ?Sized>(reader: &mut R, line: &mut Vec<u8>) -> Result<()> {
    let limit = MAX_LINE_LENGTH as u64;
    let n = reader.take(limit).read_until(b'\n', line)?;
    if n == MAX_LINE_LENGTH && line.last() != Some(&b'\n') {
        return Err(MpdError::Framing(format!(
            "response line longer than {} bytes",
            MAX_LINE_LENGTH
        )));
    }
    Ok(())
}
