//! Logging port
//!
//! The session logs through an injected [`Logger`] rather than a global
//! subscriber. [`NoopLogger`] is the default; [`TracingLogger`] forwards to
//! `tracing` under the `mpdwire` target.

use std::fmt;
use std::sync::Arc;

use tracing::Level;

/// Sink for session events
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    /// Skip formatting for levels the sink drops
    fn enabled(&self, _level: Level) -> bool {
        true
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _message: fmt::Arguments<'_>) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Forwards to the `tracing` macros
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        match level {
            Level::ERROR => tracing::error!(target: "mpdwire", "{}", message),
            Level::WARN => tracing::warn!(target: "mpdwire", "{}", message),
            Level::INFO => tracing::info!(target: "mpdwire", "{}", message),
            Level::DEBUG => tracing::debug!(target: "mpdwire", "{}", message),
            _ => tracing::trace!(target: "mpdwire", "{}", message),
        }
    }
}

/// Shared handle used inside the session
#[derive(Clone)]
pub(crate) struct Log(Arc<dyn Logger>);

impl Log {
    pub(crate) fn new(logger: Arc<dyn Logger>) -> Self {
        Self(logger)
    }

    pub(crate) fn emit(&self, level: Level, message: fmt::Arguments<'_>) {
        if self.0.enabled(level) {
            self.0.log(level, message);
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self(Arc::new(NoopLogger))
    }
}

macro_rules! log_at {
    ($log:expr, $level:ident, $($arg:tt)+) => {
        $log.emit(::tracing::Level::$level, format_args!($($arg)+))
    };
}

pub(crate) use log_at;
