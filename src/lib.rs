//! # mpdwire
//!
//! A client-side engine for the Music Player Daemon's text protocol:
//! - Command encoding with quoting, ranges, filters and option maps
//! - Reply framing into pairs, records and lists
//! - Command lists (pipelined batches) resolved in order
//! - Chunked binary transfers (album art, embedded pictures)
//! - Transparent reconnect-and-retry on transport failure
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Client  (Mutex<Session>, shareable)             │
//! │        call / send / command_list / fetch_binary             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Session                                │
//! │    handshake · reconnect · command-list queue of shapes      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Codec    │          │   Reader    │
//!   │  (encode)   │          │ (frames) ───┼──▶ Records / Lists
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │  Transport  │
//!                           │ (TCP/Unix)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod log;

pub mod protocol;
pub mod network;
pub mod commands;
pub mod watcher;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Ack, MpdError, Result};
pub use config::{Config, Endpoint};
pub use log::{Logger, NoopLogger, TracingLogger};
pub use network::{BinaryObject, Client, CommandList, Session};
pub use protocol::{Arg, Filter, Pair, ProtocolVersion, Range, Record, Reply, ResponseShape};
pub use watcher::{WatchEvent, Watcher};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mpdwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
