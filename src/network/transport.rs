//! Transport
//!
//! The client only needs "something to connect to" that yields a readable and
//! writable stream. Unix domain sockets are the production transport.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;

/// Opens one stream per exchange
pub trait Connector {
    type Stream: Read + Write;

    /// Establish a fresh connection
    fn connect(&self) -> io::Result<Self::Stream>;

    /// Release the connection. Called exactly once per connected stream,
    /// right before it is dropped.
    fn close(&self, _stream: &mut Self::Stream) -> io::Result<()> {
        Ok(())
    }

    /// Human readable endpoint for logging
    fn endpoint(&self) -> String;
}

/// Connects to a filesystem-path addressed Unix domain socket
#[derive(Debug, Clone)]
pub struct UnixConnector {
    path: PathBuf,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl UnixConnector {
    /// Connector with no socket timeouts
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Connector using the socket path and timeouts from a config
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.socket_path.clone(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        }
    }

    /// Apply socket timeouts to every connection
    pub fn with_timeouts(mut self, read: Option<Duration>, write: Option<Duration>) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for UnixConnector {
    type Stream = UnixStream;

    fn connect(&self) -> io::Result<UnixStream> {
        let stream = UnixStream::connect(&self.path)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(stream)
    }

    fn close(&self, stream: &mut UnixStream) -> io::Result<()> {
        match stream.shutdown(Shutdown::Both) {
            // The agent usually closes first.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    fn endpoint(&self) -> String {
        self.path.display().to_string()
    }
}
