//! Command definitions
//!
//! A command is a name, an ordered set of `key=value` parameters and an
//! optional binary payload. The same type is produced by the agent-side
//! interpreter when a command line is read off the wire.

use bytes::Bytes;

/// Parameter key under which the caller's correlation id is sent
pub const REQUEST_ID_PARAM: &str = "requestID";

/// Ordered parameter mapping
///
/// Iteration follows insertion order. Inserting an existing key replaces its
/// value in place, so the key keeps its original position on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate values in wire order
    pub fn values(&self) -> impl Iterator<Item = &str> + Clone {
        self.entries.iter().map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A single command exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name (first token of the line)
    pub name: String,

    /// Parameters, sent as `key=value` in order
    pub params: Params,

    /// Optional payload. `Some` of an empty buffer still declares a `0` length.
    pub payload: Option<Bytes>,

    /// Caller correlation id, sent as the `requestID` parameter
    pub correlation_id: Option<String>,
}

impl Command {
    /// Create a command with no params and no payload
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
            payload: None,
            correlation_id: None,
        }
    }

    /// Add a parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replace all parameters
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Attach a payload
    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Tag the command with a correlation id. It wins over an explicit
    /// `requestID` parameter.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Parameters as they go on the wire, with the correlation id applied
    pub fn wire_params(&self) -> std::borrow::Cow<'_, Params> {
        match &self.correlation_id {
            Some(id) => {
                let mut params = self.params.clone();
                params.insert(REQUEST_ID_PARAM, id.clone());
                std::borrow::Cow::Owned(params)
            }
            None => std::borrow::Cow::Borrowed(&self.params),
        }
    }
}
