//! Command handlers
//!
//! The agent maps command names to handlers. Lookups take a read lock;
//! registration takes the write lock and may happen while serving.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{AgentError, Result};
use crate::protocol::{Command, Response};

/// Executes one command on the agent
pub trait CommandHandler: Send + Sync {
    fn handle(&self, command: &Command) -> Result<Response>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Command) -> Result<Response> + Send + Sync,
{
    fn handle(&self, command: &Command) -> Result<Response> {
        self(command)
    }
}

/// Name to handler mapping shared by all worker threads
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `PING` and `ECHO` already registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("PING", PingHandler);
        registry.register("ECHO", EchoHandler);
        registry
    }

    /// Register a handler, replacing any previous one for the same name
    pub fn register(&self, name: impl Into<String>, handler: impl CommandHandler + 'static) {
        self.handlers.write().insert(name.into(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.read().get(name).cloned()
    }

    /// Registered command names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run a command and turn every failure into an error response
    pub fn dispatch(&self, command: &Command) -> Response {
        // Clone the handler out so the lock is not held while it runs.
        let handler = match self.get(&command.name) {
            Some(handler) => handler,
            None => {
                tracing::debug!("No handler registered for {}", command.name);
                return Response::error(&format!(
                    "ERROR {}",
                    AgentError::UnknownCommand(command.name.clone())
                ));
            }
        };

        match handler.handle(command) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Handler for {} failed: {}", command.name, e);
                Response::error(&format!("ERROR {}", e))
            }
        }
    }
}

/// Health check: always `SUCCESS`
pub struct PingHandler;

impl CommandHandler for PingHandler {
    fn handle(&self, _command: &Command) -> Result<Response> {
        Ok(Response::success(None))
    }
}

/// Returns the command data unchanged
pub struct EchoHandler;

impl CommandHandler for EchoHandler {
    fn handle(&self, command: &Command) -> Result<Response> {
        Ok(Response::success(command.payload.clone().filter(|p| !p.is_empty())))
    }
}
