//! Protocol Module
//!
//! Defines the line-oriented text protocol spoken with the daemon.
//!
//! ## Exchange
//! ```text
//! server: OK MPD 0.23.5                  (greeting, once per connection)
//! client: status
//! server: volume: 100
//! server: state: play
//! server: OK                             (or: ACK [code@index] {cmd} text)
//! ```
//!
//! ### Command Lists
//! ```text
//! client: command_list_ok_begin
//! client: clearerror
//! client: currentsong
//! client: command_list_end
//! server: list_OK                        (one per queued command)
//! server: file: a.flac
//! server: list_OK
//! server: OK
//! ```
//!
//! ### Binary Chunks
//! ```text
//! client: albumart "a.flac" 0
//! server: size: 24680
//! server: binary: 8192
//! server: <8192 raw bytes>\n
//! server: OK
//! ```

mod codec;
mod filter;
mod range;
mod record;
mod response;
mod version;

pub use codec::{encode_command, escape, quote, Arg};
pub use filter::{Filter, Operator, TagFilter};
pub use range::Range;
pub use record::{assemble, into_grouped, into_list, into_records, Pair, Record, Reply, ResponseShape};
pub use response::{
    read_hello, Frame, ResponseReader, Terminator, ACK, BINARY_KEY, HELLO_PREFIX, LIST_OK,
    MAX_BINARY_CHUNK, MAX_LINE_LENGTH, OK,
};
pub use version::ProtocolVersion;
