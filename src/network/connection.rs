//! Connection Handler
//!
//! Serves a single accepted agent connection: one command in, one response
//! out, then the socket is closed.

use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::network::HandlerRegistry;
use crate::protocol::{read_command, write_response, Response};

/// Handles a single client connection
pub struct Connection {
    /// Accepted socket
    stream: UnixStream,

    /// Handlers to dispatch the command to
    registry: Arc<HandlerRegistry>,

    /// Longest command line accepted
    max_command_line_length: usize,

    /// Sequence number for logging (Unix peers are usually unnamed)
    id: u64,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        stream: UnixStream,
        registry: Arc<HandlerRegistry>,
        max_command_line_length: usize,
        id: u64,
    ) -> Self {
        Self {
            stream,
            registry,
            max_command_line_length,
            id,
        }
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(read)?;
        self.stream.set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until the response is written)
    ///
    /// Clients that go away before sending a full command are not errors.
    pub fn handle(mut self) -> Result<()> {
        tracing::debug!("Connection {} accepted", self.id);

        let command = match read_command(&mut self.stream, self.max_command_line_length) {
            Ok(cmd) => cmd,
            Err(AgentError::ConnectionClosed) => {
                tracing::debug!("Connection {} closed before sending a command", self.id);
                return Ok(());
            }
            Err(AgentError::ReadFailed(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                tracing::debug!("Read timeout for connection {}", self.id);
                return Ok(());
            }
            Err(AgentError::ReadFailed(ref e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted
                ) =>
            {
                tracing::debug!("Connection {} reset by client", self.id);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Error reading command on connection {}: {}", self.id, e);
                let reply = Response::error(&format!("ERROR {}", e));
                if let Err(write_err) = write_response(&mut self.stream, &reply) {
                    tracing::debug!(
                        "Failed to send error reply on connection {}: {}",
                        self.id,
                        write_err
                    );
                }
                self.close();
                return Err(e);
            }
        };

        tracing::trace!("Received command on connection {}: {:?}", self.id, command);

        let response = self.registry.dispatch(&command);

        if let Err(e) = write_response(&mut self.stream, &response) {
            if let AgentError::WriteFailed(ref io_err) = e {
                if matches!(
                    io_err.kind(),
                    std::io::ErrorKind::BrokenPipe
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::ConnectionAborted
                ) {
                    tracing::debug!(
                        "Client on connection {} went away before the response was sent: {}",
                        self.id,
                        e
                    );
                    return Ok(());
                }
            }
            tracing::warn!("Error writing response on connection {}: {}", self.id, e);
            return Err(e);
        }

        self.close();
        Ok(())
    }

    fn close(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::trace!("Shutdown of connection {} failed: {}", self.id, e);
        }
    }

    /// Connection sequence number
    pub fn id(&self) -> u64 {
        self.id
    }
}
