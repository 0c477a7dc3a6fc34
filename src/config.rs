//! Configuration for mpdwire
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MpdError, Result};

/// Default daemon port
pub const DEFAULT_PORT: u16 = 6600;

/// Main configuration for a client session
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Host name or address. A value starting with `/` is a Unix socket path.
    pub host: String,

    /// TCP port (ignored for Unix sockets)
    pub port: u16,

    /// Optional credential sent with `password` right after the handshake
    pub password: Option<String>,

    // -------------------------------------------------------------------------
    // Recovery Configuration
    // -------------------------------------------------------------------------
    /// Reconnect and retry once when the transport fails
    pub reconnect: bool,

    // -------------------------------------------------------------------------
    // Socket Configuration (0 = no timeout)
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Socket read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Watcher Configuration
    // -------------------------------------------------------------------------
    /// Interval between status polls (milliseconds)
    pub poll_interval_ms: u64,
}

/// Where a session connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("reconnect", &self.reconnect)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            password: None,
            reconnect: true,
            connect_timeout_ms: 5000,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            poll_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults overridden by `MPD_HOST` and `MPD_PORT`
    ///
    /// `MPD_HOST` may carry a credential as `password@host`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("MPD_HOST").ok();
        let port = std::env::var("MPD_PORT").ok();
        Self::from_vars(host.as_deref(), port.as_deref())
    }

    fn from_vars(host: Option<&str>, port: Option<&str>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(raw) = host.filter(|h| !h.is_empty()) {
            match raw.rsplit_once('@') {
                // A leading '@' is an abstract socket name, not a credential
                Some((password, host)) if !password.is_empty() && !raw.starts_with('@') => {
                    config.password = Some(password.to_string());
                    config.host = host.to_string();
                }
                _ => config.host = raw.to_string(),
            }
        }

        if let Some(raw) = port.filter(|p| !p.is_empty()) {
            config.port = raw
                .parse()
                .map_err(|_| MpdError::Config(format!("invalid MPD_PORT: {:?}", raw)))?;
        }

        Ok(config)
    }

    /// Resolve the configured host into a concrete endpoint
    pub fn endpoint(&self) -> Endpoint {
        if self.host.starts_with('/') {
            Endpoint::Unix(PathBuf::from(&self.host))
        } else {
            Endpoint::Tcp {
                host: self.host.clone(),
                port: self.port,
            }
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the host (or Unix socket path)
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the credential sent after every handshake
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Enable or disable reconnect-and-retry on transport failure
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.config.reconnect = enabled;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the watcher poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
