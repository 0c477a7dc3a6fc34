//! Transports
//!
//! Opens the byte stream a session talks over: TCP, or a Unix-domain socket
//! when the configured host is a filesystem path.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::config::{Config, Endpoint};

/// A connected, bidirectional byte stream
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// Opens transports for a session (and again on every reconnect)
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint, config: &Config) -> io::Result<Box<dyn Transport>>;
}

/// Real sockets
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketConnector;

impl Connector for SocketConnector {
    fn connect(&self, endpoint: &Endpoint, config: &Config) -> io::Result<Box<dyn Transport>> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = connect_tcp(host, *port, config)?;
                Ok(Box::new(stream))
            }
            Endpoint::Unix(path) => {
                #[cfg(unix)]
                {
                    let stream = std::os::unix::net::UnixStream::connect(path)?;
                    stream.set_read_timeout(config.read_timeout())?;
                    stream.set_write_timeout(config.write_timeout())?;
                    Ok(Box::new(stream))
                }
                #[cfg(not(unix))]
                {
                    Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("Unix sockets are not available: {}", path.display()),
                    ))
                }
            }
        }
    }
}

fn connect_tcp(host: &str, port: u16, config: &Config) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                // Disable Nagle's algorithm; every exchange is one short line
                stream.set_nodelay(true)?;
                stream.set_read_timeout(config.read_timeout())?;
                stream.set_write_timeout(config.write_timeout())?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses for {}:{}", host, port),
        )
    }))
}
