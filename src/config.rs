//! Configuration for agentcmd
//!
//! Centralized configuration with sensible defaults. The same struct serves
//! the one-shot client and the agent server.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Default bound on the command line (header) length, in bytes
pub const DEFAULT_MAX_COMMAND_LINE_LENGTH: usize = 20480;

/// Main configuration for a client or agent
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Filesystem path of the Unix domain socket
    pub socket_path: PathBuf,

    /// Socket read timeout (milliseconds, 0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = block indefinitely)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Header lines of this length or more are rejected
    pub max_command_line_length: usize,

    // -------------------------------------------------------------------------
    // Agent Server Configuration
    // -------------------------------------------------------------------------
    /// Number of worker threads serving accepted connections
    pub worker_threads: usize,

    /// Read timeout applied to each accepted connection (milliseconds)
    pub client_idle_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/agentcmd.sock"),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_command_line_length: DEFAULT_MAX_COMMAND_LINE_LENGTH,
            worker_threads: 4,
            client_idle_timeout_ms: 300,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values that would otherwise make every call fail
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(AgentError::Config("socket path must not be empty".to_string()));
        }
        if self.max_command_line_length == 0 {
            return Err(AgentError::Config(
                "max_command_line_length must be greater than zero".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(AgentError::Config(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Read timeout as a socket option value
    pub fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    /// Write timeout as a socket option value
    pub fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub fn client_idle_timeout(&self) -> Option<Duration> {
        millis(self.client_idle_timeout_ms)
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
    /// Set the socket file path
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.socket_path = path.into();
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

    /// Set the maximum command line length (in bytes)
    pub fn max_command_line_length(mut self, len: usize) -> Self {
        self.config.max_command_line_length = len;
        self
    }

    /// Set the agent worker pool size
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the idle timeout for accepted connections (in milliseconds)
    pub fn client_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.client_idle_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
