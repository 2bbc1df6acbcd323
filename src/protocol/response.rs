//! Response definitions
//!
//! Represents the status line and optional data returned by the agent.

use bytes::Bytes;

/// Status prefix that marks a successful command
pub const SUCCESS: &str = "SUCCESS";

/// Status used by the agent for failures without a message
pub const ERROR: &str = "ERROR";

/// Data carried after the response header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseData {
    /// The header declared no data length (or zero)
    None,

    /// All declared bytes were received
    Complete(Bytes),

    /// The stream ended before `expected` bytes arrived
    Truncated { data: Bytes, expected: usize },
}

/// A response to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status text preceding the data length, trailing whitespace trimmed
    pub status: String,

    /// Payload following the header line
    pub data: ResponseData,
}

impl Response {
    /// Create a SUCCESS response with optional data
    pub fn success(data: Option<Bytes>) -> Self {
        Self::with_status(SUCCESS, data)
    }

    /// Create an error response. An empty message falls back to `ERROR`.
    pub fn error(message: &str) -> Self {
        let status = if message.is_empty() { ERROR } else { message };
        Self::with_status(status, None)
    }

    /// Create a response with an arbitrary status
    pub fn with_status(status: impl Into<String>, data: Option<Bytes>) -> Self {
        Self {
            status: status.into(),
            data: data.map_or(ResponseData::None, ResponseData::Complete),
        }
    }

    /// True when the status starts with `SUCCESS` and no data was lost
    pub fn is_success(&self) -> bool {
        self.status.starts_with(SUCCESS) && !self.is_truncated()
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.data, ResponseData::Truncated { .. })
    }

    /// Received data bytes, complete or not
    pub fn data(&self) -> Option<&Bytes> {
        match &self.data {
            ResponseData::None => None,
            ResponseData::Complete(data) | ResponseData::Truncated { data, .. } => Some(data),
        }
    }

    /// Consume the response, returning status and received data
    pub fn into_parts(self) -> (String, Option<Bytes>) {
        let data = match self.data {
            ResponseData::None => None,
            ResponseData::Complete(data) | ResponseData::Truncated { data, .. } => Some(data),
        };
        (self.status, data)
    }
}
