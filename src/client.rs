//! Client
//!
//! Runs one command per connection: encode, connect, write, read the
//! response, close. Encoding happens before connecting, so a command that
//! cannot be encoded never opens a socket.

use std::io::Write;
use std::path::Path;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::network::{Connector, UnixConnector};
use crate::protocol::{encode_command, read_response, Command, Response};

/// Outcome of a command at the caller boundary
///
/// Failures of any kind collapse into `succeeded == false` with no status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Status starts with `SUCCESS` and all declared data arrived
    pub succeeded: bool,

    /// Status line, when a response was read
    pub status: Option<String>,

    /// Response data, when the response declared any
    pub data: Option<Bytes>,

    /// The stream ended before all declared data arrived
    pub truncated: bool,
}

impl Reply {
    /// Reply for a call that produced no response
    pub fn failed() -> Self {
        Self::default()
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        let succeeded = response.is_success();
        let truncated = response.is_truncated();
        let (status, data) = response.into_parts();
        Self {
            succeeded,
            status: Some(status),
            data,
            truncated,
        }
    }
}

/// One-shot command client
pub struct AgentClient<C: Connector = UnixConnector> {
    connector: C,
    max_command_line_length: usize,
}

impl AgentClient<UnixConnector> {
    /// Client for the socket and limits in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            UnixConnector::from_config(config),
            config.max_command_line_length,
        ))
    }
}

impl<C: Connector> AgentClient<C> {
    pub fn new(connector: C, max_command_line_length: usize) -> Self {
        Self {
            connector,
            max_command_line_length,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Execute a command, reporting every failure as an error
    pub fn execute(&self, command: &Command) -> Result<Response> {
        let request = encode_command(command, self.max_command_line_length)?;

        let stream = self
            .connector
            .connect()
            .map_err(AgentError::ConnectFailed)?;
        let mut exchange = Exchange {
            connector: &self.connector,
            stream,
        };

        tracing::debug!(
            "Sending {} ({} bytes) to {}",
            command.name,
            request.len(),
            self.connector.endpoint()
        );

        exchange.send(&request)?;
        let response = read_response(&mut exchange.stream)?;

        tracing::debug!("{} returned status {:?}", command.name, response.status);
        Ok(response)
    }

    /// Execute a command without surfacing errors
    ///
    /// Errors are logged and turned into a failed [`Reply`].
    pub fn send(&self, command: &Command) -> Reply {
        match self.execute(command) {
            Ok(response) => Reply::from(response),
            Err(e) => {
                tracing::warn!(
                    "Command {} to {} failed: {}",
                    command.name,
                    self.connector.endpoint(),
                    e
                );
                Reply::failed()
            }
        }
    }
}

/// A connected stream that is closed exactly once, on drop
struct Exchange<'a, C: Connector> {
    connector: &'a C,
    stream: C::Stream,
}

impl<C: Connector> Exchange<'_, C> {
    fn send(&mut self, request: &[u8]) -> Result<()> {
        self.stream.write_all(request).map_err(AgentError::WriteFailed)?;
        self.stream.flush().map_err(AgentError::WriteFailed)
    }
}

impl<C: Connector> Drop for Exchange<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.connector.close(&mut self.stream) {
            tracing::debug!("Closing connection to {} failed: {}", self.connector.endpoint(), e);
        }
    }
}

/// Send one command to the agent listening at `socket_path`
pub fn send_command(
    socket_path: impl AsRef<Path>,
    command: &Command,
    max_command_line_length: usize,
) -> Reply {
    AgentClient::new(UnixConnector::new(socket_path.as_ref()), max_command_line_length).send(command)
}
