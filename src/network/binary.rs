//! Chunked binary transfers
//!
//! `albumart` and `readpicture` return large objects a chunk at a time.
//! Each reply carries the total `size`, a `binary: <len>` payload and any
//! metadata (`type: image/png`). The client re-issues the command with a
//! growing offset until `offset + len >= size`; the server picks the chunk
//! length and may change it between calls.

use bytes::{Bytes, BytesMut};

use crate::error::{MpdError, Result};
use crate::protocol::Record;

/// Field carrying the total object size
pub const SIZE_KEY: &str = "size";

/// Upper bound on the buffer reserved up front from the declared size
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// One parsed chunk reply
#[derive(Debug, Clone)]
pub(crate) struct Chunk {
    pub(crate) meta: Record,
    pub(crate) total: u64,
    pub(crate) data: Bytes,
}

impl Chunk {
    pub(crate) fn from_reply(meta: Record, data: Option<Bytes>) -> Result<Self> {
        let total = meta
            .parse::<u64>(SIZE_KEY)?
            .ok_or_else(|| MpdError::Framing("chunk reply without a size field".to_string()))?;
        let data = data
            .ok_or_else(|| MpdError::Framing("chunk reply without a binary field".to_string()))?;
        Ok(Self { meta, total, data })
    }
}

/// A completely transferred object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryObject {
    /// Metadata of the first chunk (`size`, `type`, ...)
    pub meta: Record,

    pub data: Bytes,
}

impl BinaryObject {
    /// MIME type, when the server reports one
    pub fn mime_type(&self) -> Option<&str> {
        self.meta.get("type")
    }
}

/// Accumulates chunks for the duration of one fetch
#[derive(Debug)]
pub(crate) struct BinaryAssembly {
    meta: Option<Record>,
    buffer: BytesMut,
    offset: u64,
    total: u64,
}

impl BinaryAssembly {
    pub(crate) fn new() -> Self {
        Self {
            meta: None,
            buffer: BytesMut::new(),
            offset: 0,
            total: 0,
        }
    }

    /// Offset to request next
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Append a chunk; returns true once the object is complete
    pub(crate) fn push(&mut self, chunk: Chunk) -> Result<bool> {
        let len = chunk.data.len() as u64;
        self.total = chunk.total;

        if self.meta.is_none() {
            let capacity = usize::try_from(chunk.total).unwrap_or(0).min(MAX_PREALLOC);
            self.buffer.reserve(capacity);
            self.meta = Some(chunk.meta);
        }

        let done = self.offset + len >= self.total;
        if len == 0 && !done {
            return Err(MpdError::Framing(format!(
                "empty chunk at offset {} of {}",
                self.offset, self.total
            )));
        }

        self.buffer.extend_from_slice(&chunk.data);
        self.offset += len;
        Ok(done)
    }

    pub(crate) fn finish(self) -> BinaryObject {
        BinaryObject {
            meta: self.meta.unwrap_or_default(),
            data: self.buffer.freeze(),
        }
    }
}
