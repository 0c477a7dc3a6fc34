//! Network Module
//!
//! Session lifecycle and exchanges with the daemon.
//!
//! ## Architecture
//! - `Session`: one connection, handshake, reconnect, command lists
//! - `Client`: the session behind a mutex, shareable across threads
//! - Transports opened through a pluggable `Connector`

mod binary;
mod client;
mod connection;
mod session;
mod transport;

pub use binary::{BinaryObject, SIZE_KEY};
pub use client::{Client, CommandList};
pub use session::{Session, BATCH_BEGIN, BATCH_END};
pub use transport::{Connector, SocketConnector, Transport};
